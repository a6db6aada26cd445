//! Numbering definitions from `word/numbering.xml`.
//!
//! `word/numbering.xml` has two sections: `w:abstractNum` elements defining
//! per-indentation-level formats, and `w:num` instances referencing them by
//! id. Paragraphs name a `numId` and an `ilvl`; this module resolves that
//! pair to one of the six supported formats. Explicit numbering values are
//! not stored in the document at all; counting is the job of
//! [`crate::docx::counters`].
//!
//! Documents routinely reference numbering that Pages, LibreOffice, or Google
//! Docs never wrote. Resolution therefore cannot fail: anything unknown falls
//! back to the bullet format with a diagnostic.

use crate::common::diagnostics::{Diagnostic, DiagnosticSink};
use crate::common::error::{Error, Result};
use crate::docx::numerals;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// The six supported numbering formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Decimal,
    LowerLetter,
    UpperLetter,
    LowerRoman,
    UpperRoman,
    Bullet,
}

impl NumberFormat {
    /// Parse a `w:numFmt` value; `None` for the many formats not covered.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "decimal" => Some(Self::Decimal),
            "lowerLetter" => Some(Self::LowerLetter),
            "upperLetter" => Some(Self::UpperLetter),
            "lowerRoman" => Some(Self::LowerRoman),
            "upperRoman" => Some(Self::UpperRoman),
            "bullet" => Some(Self::Bullet),
            _ => None,
        }
    }

    /// Render a count in this format.
    pub fn render(self, count: u32) -> Result<String> {
        let n = i64::from(count);
        match self {
            Self::Decimal => Ok(numerals::decimal(n)),
            Self::LowerLetter => numerals::lower_letter(n),
            Self::UpperLetter => numerals::upper_letter(n),
            Self::LowerRoman => numerals::lower_roman(n),
            Self::UpperRoman => numerals::upper_roman(n),
            Self::Bullet => Ok(numerals::bullet().to_string()),
        }
    }
}

/// One indentation level of a numbering definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFormat {
    /// The raw `w:numFmt` value (kept for diagnostics)
    pub format: String,
    /// Optional starting value for the counter at this level
    pub start: Option<u32>,
}

/// Numbering definitions: `numId` mapped to formats per indentation level.
#[derive(Debug, Clone, Default)]
pub struct NumberingTable {
    levels_by_num_id: HashMap<String, Vec<LevelFormat>>,
}

impl NumberingTable {
    /// Create an empty table (the common case: no `word/numbering.xml`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of numbering instances defined.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels_by_num_id.len()
    }

    /// Check if no numbering is defined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels_by_num_id.is_empty()
    }

    /// Insert a definition directly (used by tests and by callers that carry
    /// their own numbering source).
    pub fn insert(&mut self, num_id: impl Into<String>, levels: Vec<LevelFormat>) {
        self.levels_by_num_id.insert(num_id.into(), levels);
    }

    /// The level formats for a numbering instance, if defined.
    pub fn levels(&self, num_id: &str) -> Option<&[LevelFormat]> {
        self.levels_by_num_id.get(num_id).map(Vec::as_slice)
    }

    /// Resolve `(numId, ilvl)` to a supported format.
    ///
    /// Never fails: an unknown id, a level past the defined levels, or an
    /// unsupported format name all fall back to [`NumberFormat::Bullet`] with
    /// a diagnostic.
    pub fn resolve(&self, num_id: &str, level: usize, sink: &mut DiagnosticSink) -> NumberFormat {
        let Some(level_format) = self
            .levels_by_num_id
            .get(num_id)
            .and_then(|levels| levels.get(level))
        else {
            sink.warn(Diagnostic::UnresolvedNumbering {
                num_id: num_id.to_string(),
            });
            return NumberFormat::Bullet;
        };
        match NumberFormat::from_name(&level_format.format) {
            Some(format) => format,
            None => {
                sink.warn(Diagnostic::UnknownNumberFormat {
                    format: level_format.format.clone(),
                });
                NumberFormat::Bullet
            },
        }
    }

    /// The start override for `(numId, ilvl)`, if one is defined.
    pub fn start_at(&self, num_id: &str, level: usize) -> Option<u32> {
        self.levels_by_num_id
            .get(num_id)
            .and_then(|levels| levels.get(level))
            .and_then(|level_format| level_format.start)
    }

    /// Parse numbering definitions from `word/numbering.xml` bytes.
    pub fn from_xml(xml_bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml_bytes);
        reader.config_mut().trim_text(true);

        let mut abstract_levels: HashMap<String, Vec<LevelFormat>> = HashMap::new();
        let mut table = Self::new();

        let mut in_abstract_num = false;
        let mut current_abstract_id: Option<String> = None;
        let mut current_levels: Vec<LevelFormat> = Vec::new();
        let mut current_lvl_fmt: Option<String> = None;
        let mut current_lvl_start: Option<u32> = None;

        let mut in_num = false;
        let mut current_num_id: Option<String> = None;
        let mut current_abstract_ref: Option<String> = None;
        let mut current_override_ilvl: Option<usize> = None;
        let mut start_overrides: HashMap<usize, u32> = HashMap::new();
        let mut buf = Vec::with_capacity(1024);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.local_name().as_ref() {
                        b"abstractNum" => {
                            in_abstract_num = true;
                            current_abstract_id = attr_value(&e, b"abstractNumId");
                            current_levels = Vec::new();
                        },
                        b"lvl" if in_abstract_num => {
                            current_lvl_fmt = None;
                            current_lvl_start = None;
                        },
                        b"numFmt" if in_abstract_num => {
                            current_lvl_fmt = attr_value(&e, b"val");
                        },
                        b"start" if in_abstract_num => {
                            current_lvl_start = attr_value(&e, b"val")
                                .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok());
                        },
                        b"num" if !in_abstract_num => {
                            in_num = true;
                            current_num_id = attr_value(&e, b"numId");
                            current_abstract_ref = None;
                            current_override_ilvl = None;
                            start_overrides.clear();
                        },
                        b"abstractNumId" if in_num => {
                            current_abstract_ref = attr_value(&e, b"val");
                        },
                        b"lvlOverride" if in_num => {
                            current_override_ilvl = attr_value(&e, b"ilvl")
                                .and_then(|v| atoi_simd::parse::<usize, false, false>(v.as_bytes()).ok());
                        },
                        b"startOverride" if in_num => {
                            if let (Some(ilvl), Some(start)) = (
                                current_override_ilvl,
                                attr_value(&e, b"val")
                                    .and_then(|v| atoi_simd::parse::<u32, false, false>(v.as_bytes()).ok()),
                            ) {
                                start_overrides.insert(ilvl, start);
                            }
                        },
                        _ => {},
                    }
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"lvl" if in_abstract_num => {
                        // A lvl without numFmt defines nothing we can use
                        if let Some(format) = current_lvl_fmt.take() {
                            current_levels.push(LevelFormat {
                                format,
                                start: current_lvl_start.take(),
                            });
                        }
                    },
                    b"abstractNum" => {
                        if let Some(id) = current_abstract_id.take() {
                            abstract_levels.insert(id, std::mem::take(&mut current_levels));
                        }
                        in_abstract_num = false;
                    },
                    b"num" => {
                        if let (Some(num_id), Some(abstract_ref)) =
                            (current_num_id.take(), current_abstract_ref.take())
                        {
                            if let Some(levels) = abstract_levels.get(&abstract_ref) {
                                let mut levels = levels.clone();
                                for (ilvl, start) in start_overrides.drain() {
                                    if let Some(level) = levels.get_mut(ilvl) {
                                        level.start = Some(start);
                                    }
                                }
                                table.insert(num_id, levels);
                            }
                        }
                        in_num = false;
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        Ok(table)
    }
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING_XML: &[u8] = br#"<?xml version="1.0"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="lowerLetter"/></w:lvl>
    <w:lvl w:ilvl="2"><w:numFmt w:val="upperRoman"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
  <w:num w:numId="3">
    <w:abstractNumId w:val="0"/>
    <w:lvlOverride w:ilvl="0"><w:startOverride w:val="5"/></w:lvlOverride>
  </w:num>
</w:numbering>"#;

    #[test]
    fn test_parse_numbering_table() {
        let table = NumberingTable::from_xml(NUMBERING_XML).unwrap();
        assert_eq!(table.len(), 3);

        let levels = table.levels("1").unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].format, "decimal");
        assert_eq!(levels[1].format, "lowerLetter");
        assert_eq!(levels[2].format, "upperRoman");
        assert_eq!(levels[0].start, Some(1));
        assert_eq!(levels[2].start, None);
    }

    #[test]
    fn test_start_override_applies_to_instance() {
        let table = NumberingTable::from_xml(NUMBERING_XML).unwrap();
        assert_eq!(table.start_at("3", 0), Some(5));
        // the instance without an override keeps the abstract start
        assert_eq!(table.start_at("1", 0), Some(1));
    }

    #[test]
    fn test_resolve_known_format() {
        let table = NumberingTable::from_xml(NUMBERING_XML).unwrap();
        let mut sink = DiagnosticSink::new();
        assert_eq!(table.resolve("1", 0, &mut sink), NumberFormat::Decimal);
        assert_eq!(table.resolve("1", 1, &mut sink), NumberFormat::LowerLetter);
        assert_eq!(table.resolve("2", 0, &mut sink), NumberFormat::Bullet);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_resolve_unknown_num_id_falls_back_to_bullet() {
        let table = NumberingTable::from_xml(NUMBERING_XML).unwrap();
        let mut sink = DiagnosticSink::new();
        assert_eq!(table.resolve("99", 0, &mut sink), NumberFormat::Bullet);
        assert_eq!(
            sink.items(),
            [Diagnostic::UnresolvedNumbering {
                num_id: "99".to_string()
            }]
        );
    }

    #[test]
    fn test_resolve_level_out_of_range_falls_back_to_bullet() {
        let table = NumberingTable::from_xml(NUMBERING_XML).unwrap();
        let mut sink = DiagnosticSink::new();
        assert_eq!(table.resolve("2", 5, &mut sink), NumberFormat::Bullet);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_format_name() {
        let mut table = NumberingTable::new();
        table.insert(
            "7",
            vec![LevelFormat {
                format: "undefined".to_string(),
                start: None,
            }],
        );
        let mut sink = DiagnosticSink::new();
        assert_eq!(table.resolve("7", 0, &mut sink), NumberFormat::Bullet);
        assert_eq!(
            sink.items(),
            [Diagnostic::UnknownNumberFormat {
                format: "undefined".to_string()
            }]
        );
    }

    #[test]
    fn test_render_formats() {
        assert_eq!(NumberFormat::Decimal.render(12).unwrap(), "12");
        assert_eq!(NumberFormat::LowerLetter.render(2).unwrap(), "b");
        assert_eq!(NumberFormat::UpperLetter.render(27).unwrap(), "AA");
        assert_eq!(NumberFormat::LowerRoman.render(4).unwrap(), "iv");
        assert_eq!(NumberFormat::UpperRoman.render(9).unwrap(), "IX");
        assert_eq!(NumberFormat::Bullet.render(99).unwrap(), "--");
    }
}
