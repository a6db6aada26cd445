//! Numeral conversions for list labels.
//!
//! Only the six basic formats are covered:
//!
//! ```text
//! -- bullet
//! 1  decimal
//! a  lowerLetter
//! A  upperLetter
//! i  lowerRoman
//! I  upperRoman
//! ```
//!
//! Extracted text may land in ASCII-only files, so bullets are `--` rather
//! than a glyph, and Roman numerals never switch to vinculum notation; numbers
//! past 3999 simply accumulate `m` characters.

use crate::common::error::{Error, Result};

const ASCII_LOWERCASE: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

// Subtractive-notation values, largest first
const ROMAN_VALUES: [(i64, &str); 13] = [
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

/// Convert a positive integer to bijective base-26 letters.
///
/// The kind of "numbering" used for lettered lists and spreadsheet columns:
/// a, b, c, ..., z, aa, ab, ... Zero is undefined.
///
/// # Examples
///
/// ```
/// use longan::docx::numerals::lower_letter;
/// assert_eq!(lower_letter(1).unwrap(), "a");
/// assert_eq!(lower_letter(26).unwrap(), "z");
/// assert_eq!(lower_letter(27).unwrap(), "aa");
/// ```
pub fn lower_letter(n: i64) -> Result<String> {
    if n < 1 {
        return Err(Error::NumeralDomain(n));
    }
    let mut n = n;
    let mut result = Vec::new();
    while n > 0 {
        let remainder = ((n - 1) % 26) as usize;
        n = (n - 1) / 26;
        result.push(ASCII_LOWERCASE[remainder]);
    }
    result.reverse();
    Ok(String::from_utf8(result).expect("letters are ascii"))
}

/// Convert a positive integer to uppercase bijective base-26 letters.
pub fn upper_letter(n: i64) -> Result<String> {
    Ok(lower_letter(n)?.to_uppercase())
}

/// Convert a positive integer to a lowercase Roman numeral.
///
/// Classic subtractive notation with no upper bound; every extra thousand is
/// one more `m`.
///
/// # Examples
///
/// ```
/// use longan::docx::numerals::lower_roman;
/// assert_eq!(lower_roman(1).unwrap(), "i");
/// assert_eq!(lower_roman(9).unwrap(), "ix");
/// assert_eq!(lower_roman(44).unwrap(), "xliv");
/// assert_eq!(lower_roman(5000).unwrap(), "mmmmm");
/// ```
pub fn lower_roman(n: i64) -> Result<String> {
    if n < 1 {
        return Err(Error::NumeralDomain(n));
    }
    let mut n = n;
    let mut result = String::new();
    for (value, numeral) in ROMAN_VALUES {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }
    Ok(result)
}

/// Convert a positive integer to an uppercase Roman numeral.
pub fn upper_roman(n: i64) -> Result<String> {
    Ok(lower_roman(n)?.to_uppercase())
}

/// Base-10 string of `n`, such that parsing it back yields `n`.
pub fn decimal(n: i64) -> String {
    n.to_string()
}

/// The string standing in for every bullet glyph.
#[inline]
pub fn bullet() -> &'static str {
    "--"
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_lower_letter_fixed_points() {
        assert_eq!(lower_letter(1).unwrap(), "a");
        assert_eq!(lower_letter(26).unwrap(), "z");
        assert_eq!(lower_letter(27).unwrap(), "aa");
        assert_eq!(lower_letter(52).unwrap(), "az");
        assert_eq!(lower_letter(53).unwrap(), "ba");
    }

    #[test]
    fn test_lower_letter_domain() {
        assert!(matches!(lower_letter(0), Err(Error::NumeralDomain(0))));
        assert!(matches!(lower_letter(-1), Err(Error::NumeralDomain(-1))));
    }

    #[test]
    fn test_lower_letter_injective() {
        let seen: HashSet<String> = (1..=10_000)
            .map(|n| lower_letter(n).unwrap())
            .collect();
        assert_eq!(seen.len(), 10_000);
    }

    #[test]
    fn test_lower_roman_fixed_points() {
        let expected = [
            (1, "i"),
            (2, "ii"),
            (3, "iii"),
            (4, "iv"),
            (5, "v"),
            (9, "ix"),
            (14, "xiv"),
            (40, "xl"),
            (44, "xliv"),
            (90, "xc"),
            (400, "cd"),
            (900, "cm"),
            (1994, "mcmxciv"),
            (3999, "mmmcmxcix"),
            (10_000, "mmmmmmmmmm"),
        ];
        for (n, roman) in expected {
            assert_eq!(lower_roman(n).unwrap(), roman);
        }
    }

    #[test]
    fn test_lower_roman_domain() {
        assert!(matches!(lower_roman(0), Err(Error::NumeralDomain(0))));
        assert!(matches!(lower_roman(-3), Err(Error::NumeralDomain(-3))));
    }

    #[test]
    fn test_bullet_is_two_dashes() {
        assert_eq!(bullet(), "--");
    }

    proptest! {
        #[test]
        fn prop_decimal_round_trips(n in i64::MIN..i64::MAX) {
            prop_assert_eq!(decimal(n).parse::<i64>().unwrap(), n);
        }

        #[test]
        fn prop_upper_letter_is_uppercased_lower(n in 1i64..100_000) {
            prop_assert_eq!(upper_letter(n).unwrap(), lower_letter(n).unwrap().to_uppercase());
        }

        #[test]
        fn prop_upper_roman_is_uppercased_lower(n in 1i64..10_000) {
            prop_assert_eq!(upper_roman(n).unwrap(), lower_roman(n).unwrap().to_uppercase());
        }

        #[test]
        fn prop_roman_injective_on_neighbors(n in 1i64..10_000) {
            prop_assert_ne!(lower_roman(n).unwrap(), lower_roman(n + 1).unwrap());
        }

        #[test]
        fn prop_roman_alphabet(n in 1i64..10_000) {
            let roman = lower_roman(n).unwrap();
            prop_assert!(roman.chars().all(|c| "ivxlcdm".contains(c)));
        }
    }
}
