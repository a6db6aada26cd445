//! Form checkboxes, dropdowns, and other non-text elements visible in Word.
//!
//! Word represents some special characters as non-text elements. These
//! functions examine those elements to infer suitable text replacements.
//!
//! The `\u{2610}` and `\u{2612}` below are the open and crossed-out checkbox
//! glyphs.

use crate::common::diagnostics::{Diagnostic, DiagnosticSink};
use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;

/// Text standing in for a checkbox whose value cannot be read.
pub const CHECKBOX_FAILED: &str = "----checkbox failed----";

/// Text representation for a legacy `w:checkBox` form field.
///
/// ```xml
/// <w:checkBox>
///     <w:sizeAuto/>
///     <w:default w:val="1"/>
///     <w:checked w:val="0"/>
/// </w:checkBox>
/// ```
///
/// The `checked` element wins when present (a bare `<w:checked/>` means
/// checked); otherwise `default` decides. These fields are malformed often
/// enough in circulating documents that an unreadable value produces the
/// [`CHECKBOX_FAILED`] sentinel and a diagnostic, never an error.
///
/// The modern `w:checkbox` (lowercase) control prints its state as a `w:t`
/// glyph and needs no help from here.
pub fn checkbox_entry(checkbox: &XmlElement, sink: &mut DiagnosticSink) -> String {
    let value = read_checkbox_value(checkbox);
    match value.as_deref() {
        Some("0") | Some("false") => "\u{2610}".to_string(),
        Some("1") | Some("true") => "\u{2612}".to_string(),
        _ => {
            sink.warn(Diagnostic::MalformedCheckbox);
            CHECKBOX_FAILED.to_string()
        },
    }
}

fn read_checkbox_value(checkbox: &XmlElement) -> Option<String> {
    if let Some(checked) = checkbox.find_child("w:checked") {
        // present without a w:val means checked
        let val = checked.attr("w:val").filter(|v| !v.is_empty()).unwrap_or("1");
        return Some(val.to_string());
    }
    checkbox
        .find_child("w:default")
        .and_then(|default| default.attr("w:val"))
        .map(String::from)
}

/// The selected entry of a `w:ddList` dropdown form field.
///
/// ```xml
/// <w:ddList>
///     <w:result w:val="1"/>
///     <w:listEntry w:val="selection 1"/>
///     <w:listEntry w:val="selection 2"/>
/// </w:ddList>
/// ```
///
/// A missing `w:result` (or one without a value) means the first entry is
/// selected. An index past the entries indicates genuinely corrupt input and
/// is a hard error, unlike every other form anomaly.
pub fn dropdown_entry(dd_list: &XmlElement) -> Result<String> {
    let entries: Vec<&str> = dd_list
        .children_named("w:listEntry")
        .map(|entry| entry.attr("w:val").unwrap_or(""))
        .collect();

    let index = dd_list
        .find_child("w:result")
        .and_then(|result| result.attr("w:val"))
        .and_then(|val| atoi_simd::parse::<usize, false, false>(val.as_bytes()).ok())
        .unwrap_or(0);

    entries
        .get(index)
        .map(|entry| entry.to_string())
        .ok_or(Error::DropdownIndex {
            index,
            len: entries.len(),
        })
}
