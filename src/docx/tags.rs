//! The tags this crate knows how to handle.
//!
//! A lot of the information in a docx file isn't text or text attributes.
//! Word records spelling errors, revision history, proofing state, and more;
//! all of that is ignored by design. Every element kind that provokes some
//! action during extraction appears in [`Tag`]; everything else classifies as
//! [`Tag::Unknown`] and is recursed into without any action of its own.

use crate::common::xml::XmlElement;

/// The closed set of element kinds extraction dispatches on.
///
/// Classification is by qualified name as written (`w:p`, `a:blip`, ...).
/// Word emits the conventional namespace prefixes, so matching the prefixed
/// name is equivalent to matching the Clark-notation expansion and a great
/// deal cheaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Body,
    Break,
    CommentRangeEnd,
    CommentRangeStart,
    Document,
    Endnote,
    EndnoteReference,
    Footnote,
    FootnoteReference,
    FormCheckbox,
    FormDropdown,
    Hyperlink,
    /// `a:blip` inside a drawing
    Image,
    /// `wp:docPr`, which carries the image alt text
    ImageAlt,
    /// Legacy VML `v:imagedata`
    ImageData,
    Math,
    Paragraph,
    ParProperties,
    Run,
    RunProperties,
    /// Structured document tag (content control) wrapper
    Sdt,
    /// The content inside a structured document tag
    SdtContent,
    /// Structured document tag metadata (`w:sdtPr`)
    SdtProperties,
    Symbol,
    Tab,
    Table,
    TableCell,
    TableRow,
    Text,
    TextMath,
    /// Anything not in the register
    Unknown,
}

impl Tag {
    /// Classify a qualified tag name.
    pub fn classify(name: &str) -> Tag {
        match name {
            "w:body" => Tag::Body,
            "w:br" | "w:cr" => Tag::Break,
            "w:commentRangeEnd" => Tag::CommentRangeEnd,
            "w:commentRangeStart" => Tag::CommentRangeStart,
            "w:document" => Tag::Document,
            "w:endnote" => Tag::Endnote,
            "w:endnoteReference" => Tag::EndnoteReference,
            "w:footnote" => Tag::Footnote,
            "w:footnoteReference" => Tag::FootnoteReference,
            "w:checkBox" => Tag::FormCheckbox,
            "w:ddList" => Tag::FormDropdown,
            "w:hyperlink" => Tag::Hyperlink,
            "a:blip" => Tag::Image,
            "wp:docPr" => Tag::ImageAlt,
            "v:imagedata" => Tag::ImageData,
            "m:oMath" => Tag::Math,
            "w:p" => Tag::Paragraph,
            "w:pPr" => Tag::ParProperties,
            "w:r" => Tag::Run,
            "w:rPr" => Tag::RunProperties,
            "w:sdt" => Tag::Sdt,
            "w:sdtContent" => Tag::SdtContent,
            "w:sdtPr" => Tag::SdtProperties,
            "w:sym" => Tag::Symbol,
            "w:tab" => Tag::Tab,
            "w:tbl" => Tag::Table,
            "w:tc" => Tag::TableCell,
            "w:tr" => Tag::TableRow,
            "w:t" => Tag::Text,
            "m:t" => Tag::TextMath,
            _ => Tag::Unknown,
        }
    }

    /// Classify an element by its tag name.
    #[inline]
    pub fn of(elem: &XmlElement) -> Tag {
        Tag::classify(&elem.name)
    }

    /// Whether elements of this kind carry or contain extractable content.
    ///
    /// Properties elements describe formatting, not content, and unknown
    /// elements only matter for what they contain.
    pub fn is_content(self) -> bool {
        !matches!(
            self,
            Tag::ParProperties | Tag::RunProperties | Tag::SdtProperties | Tag::Unknown
        )
    }
}

/// Does the element or any descendant carry extractable content?
///
/// Spell-check, revision, and proofing elements are skipped during merging,
/// but only once it is certain no content (paragraph, run, text, link, ...)
/// hides beneath them.
pub fn has_content(elem: &XmlElement) -> bool {
    if Tag::of(elem).is_content() {
        return true;
    }
    elem.children.iter().any(has_content)
}

/// Is this a qualified name an XML parser could have legitimately produced?
///
/// Lossy third-party converters occasionally write garbage tag names; those
/// elements are skipped with a diagnostic rather than aborting extraction.
pub fn is_well_formed_name(name: &str) -> bool {
    let mut parts = name.split(':');
    let (first, second) = (parts.next(), parts.next());
    if parts.next().is_some() {
        return false;
    }
    let ncname_ok = |part: &str| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' => {},
            _ => return false,
        }
        chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    };
    match (first, second) {
        (Some(local), None) => ncname_ok(local),
        (Some(prefix), Some(local)) => ncname_ok(prefix) && ncname_ok(local),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse_xml;

    #[test]
    fn test_classify_known_tags() {
        assert_eq!(Tag::classify("w:p"), Tag::Paragraph);
        assert_eq!(Tag::classify("w:tbl"), Tag::Table);
        assert_eq!(Tag::classify("w:t"), Tag::Text);
        assert_eq!(Tag::classify("m:t"), Tag::TextMath);
        assert_eq!(Tag::classify("a:blip"), Tag::Image);
    }

    #[test]
    fn test_unregistered_tags_are_unknown() {
        assert_eq!(Tag::classify("w:proofErr"), Tag::Unknown);
        assert_eq!(Tag::classify("w:bookmarkStart"), Tag::Unknown);
        assert_eq!(Tag::classify("nonsense"), Tag::Unknown);
    }

    #[test]
    fn test_properties_are_not_content() {
        assert!(!Tag::ParProperties.is_content());
        assert!(!Tag::RunProperties.is_content());
        assert!(Tag::Run.is_content());
        assert!(Tag::Hyperlink.is_content());
    }

    #[test]
    fn test_has_content_sees_through_wrappers() {
        // proofErr itself is nothing, but a run nested under an unknown
        // wrapper still counts
        let wrapped = parse_xml(b"<w:proofErr><w:r><w:t>x</w:t></w:r></w:proofErr>").unwrap();
        assert!(has_content(&wrapped));

        let empty = parse_xml(b"<w:proofErr w:type=\"spellStart\"/>").unwrap();
        assert!(!has_content(&empty));
    }

    #[test]
    fn test_well_formed_names() {
        assert!(is_well_formed_name("w:p"));
        assert!(is_well_formed_name("document"));
        assert!(is_well_formed_name("w14:paraId"));
        assert!(!is_well_formed_name("w:p:extra"));
        assert!(!is_well_formed_name("1badtag"));
        assert!(!is_well_formed_name(""));
        assert!(!is_well_formed_name("w:"));
    }
}
