//! Merge consecutive elements Word split for its own bookkeeping.
//!
//! Word fractures a single user-intended run or hyperlink into several
//! elements to track revision history, spelling errors, and rsid churn,
//! none of which matters here. This pass fuses consecutive sibling elements
//! whose merge key (tag, resolved relationship target, visible style) is
//! equal, so downstream extraction sees one run where the author typed one
//! run:
//!
//! ```xml
//! <w:p>
//!     <w:hyperlink r:id="rId7">  <!-- -> http://example.com -->
//!         <w:r><w:t>hy</w:t></w:r>
//!     </w:hyperlink>
//!     <w:proofErr/>              <!-- ignored, does not break the group -->
//!     <w:hyperlink r:id="rId8">  <!-- -> http://example.com -->
//!         <w:r><w:t>per</w:t></w:r>
//!     </w:hyperlink>
//!     <w:hyperlink r:id="rId9">  <!-- -> http://example.com -->
//!         <w:r w:rsid="A"><w:t>link</w:t></w:r>
//!     </w:hyperlink>
//! </w:p>
//! ```
//!
//! condenses (hyperlinks by target, then runs by style, then text) to
//!
//! ```xml
//! <w:p>
//!     <w:hyperlink r:id="rId7">
//!         <w:r><w:t>hyperlink</w:t></w:r>
//!     </w:hyperlink>
//! </w:p>
//! ```
//!
//! Hyperlinks merge whenever their relationship ids resolve to the same
//! target, whatever their visible styles; different rIds routinely point at
//! one address. Only runs, hyperlinks, and text merge; fusing anything
//! larger would destroy structure extraction wants to keep.

use crate::common::xml::XmlElement;
use crate::docx::style::get_html_formatting;
use crate::docx::tags::{Tag, has_content};
use std::collections::HashMap;

/// Enough information to tell if two elements are more-or-less identically
/// formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MergeKey {
    tag: String,
    rel_target: String,
    style: Vec<String>,
}

fn is_mergeable(tag: Tag) -> bool {
    matches!(tag, Tag::Run | Tag::Hyperlink | Tag::Text | Tag::TextMath)
}

/// The merge key for an element.
///
/// Relationship ids are replaced by the target they resolve to, because
/// different rIds can point to identical targets.
fn elem_key(elem: &XmlElement, rels: &HashMap<String, String>, html: bool) -> MergeKey {
    let tag = Tag::of(elem);
    if !is_mergeable(tag) {
        return MergeKey {
            tag: elem.name.clone(),
            rel_target: String::new(),
            style: Vec::new(),
        };
    }

    // Always join links pointing to the same address
    if let Some(r_id) = elem.attr("r:id") {
        return MergeKey {
            tag: elem.name.clone(),
            rel_target: rels.get(r_id).cloned().unwrap_or_default(),
            style: Vec::new(),
        };
    }

    MergeKey {
        tag: elem.name.clone(),
        rel_target: String::new(),
        style: get_html_formatting(elem, html),
    }
}

/// Recursively merge duplicate (as far as extraction is concerned) elements.
///
/// Merges happen at each level before descending, so hyperlinks fuse before
/// the runs inside them, and runs before their text elements. Non-content
/// siblings (proofing marks, bookmarks) are left in place and do not break a
/// group. Running the pass twice changes nothing.
pub fn merge_elems(tree: &mut XmlElement, rels: &HashMap<String, String>, html: bool) {
    let children = std::mem::take(&mut tree.children);
    let mut merged: Vec<XmlElement> = Vec::with_capacity(children.len());
    let mut open_group: Option<(usize, MergeKey)> = None;

    for child in children {
        if !has_content(&child) {
            // Spell-check and revision debris carries no content; keep it
            // where it was without ending the current group.
            merged.push(child);
            continue;
        }

        let key = elem_key(&child, rels, html);
        if is_mergeable(Tag::of(&child)) {
            if let Some((head_idx, head_key)) = &open_group {
                if *head_key == key {
                    let head = &mut merged[*head_idx];
                    match Tag::of(&child) {
                        Tag::Text | Tag::TextMath => {
                            let text = child.text.unwrap_or_default();
                            match &mut head.text {
                                Some(existing) => existing.push_str(&text),
                                None => head.text = Some(text),
                            }
                        },
                        _ => head.children.extend(child.children),
                    }
                    continue;
                }
            }
        }

        let idx = merged.len();
        merged.push(child);
        open_group = Some((idx, key));
    }

    tree.children = merged;
    for child in &mut tree.children {
        merge_elems(child, rels, html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse_xml;

    fn rels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_same_style_runs_fuse() {
        let mut par = parse_xml(
            br#"<w:p>
                <w:r><w:t>one </w:t></w:r>
                <w:r><w:t>two</w:t></w:r>
            </w:p>"#,
        )
        .unwrap();
        merge_elems(&mut par, &HashMap::new(), false);

        assert_eq!(par.children.len(), 1);
        let run = &par.children[0];
        assert_eq!(run.children.len(), 1);
        assert_eq!(run.children[0].text.as_deref(), Some("one two"));
    }

    #[test]
    fn test_different_style_runs_stay_apart() {
        let mut par = parse_xml(
            br#"<w:p>
                <w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r>
                <w:r><w:t>plain</w:t></w:r>
            </w:p>"#,
        )
        .unwrap();
        merge_elems(&mut par, &HashMap::new(), true);
        assert_eq!(par.children.len(), 2);
    }

    #[test]
    fn test_style_ignored_when_html_off() {
        // With formatting extraction off, the style key is empty for every
        // run, so differently-styled runs fuse.
        let mut par = parse_xml(
            br#"<w:p>
                <w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r>
                <w:r><w:t>plain</w:t></w:r>
            </w:p>"#,
        )
        .unwrap();
        merge_elems(&mut par, &HashMap::new(), false);
        assert_eq!(par.children.len(), 1);
    }

    #[test]
    fn test_hyperlinks_merge_by_target_despite_styles() {
        let mut par = parse_xml(
            br#"<w:p>
                <w:hyperlink r:id="rId7"><w:r><w:rPr><w:b/></w:rPr><w:t>hy</w:t></w:r></w:hyperlink>
                <w:hyperlink r:id="rId8"><w:r><w:rPr><w:i/></w:rPr><w:t>per</w:t></w:r></w:hyperlink>
                <w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink>
            </w:p>"#,
        )
        .unwrap();
        let rels = rels(&[
            ("rId7", "http://example.com"),
            ("rId8", "http://example.com"),
            ("rId9", "http://example.com"),
        ]);
        merge_elems(&mut par, &rels, true);

        assert_eq!(par.children.len(), 1);
        let link = &par.children[0];
        assert_eq!(link.name, "w:hyperlink");
        // differently-styled runs remain separate inside the fused link,
        // in source order
        assert_eq!(link.children.len(), 3);
        assert_eq!(link.itertext(), "hyperlink");
    }

    #[test]
    fn test_hyperlinks_with_different_targets_stay_apart() {
        let mut par = parse_xml(
            br#"<w:p>
                <w:hyperlink r:id="rId1"><w:r><w:t>a</w:t></w:r></w:hyperlink>
                <w:hyperlink r:id="rId2"><w:r><w:t>b</w:t></w:r></w:hyperlink>
            </w:p>"#,
        )
        .unwrap();
        let rels = rels(&[("rId1", "http://one.com"), ("rId2", "http://two.com")]);
        merge_elems(&mut par, &rels, false);
        assert_eq!(par.children.len(), 2);
    }

    #[test]
    fn test_proofing_marks_do_not_break_groups() {
        let mut par = parse_xml(
            br#"<w:p>
                <w:r><w:t>be</w:t></w:r>
                <w:proofErr w:type="spellStart"/>
                <w:r><w:t>fore</w:t></w:r>
            </w:p>"#,
        )
        .unwrap();
        merge_elems(&mut par, &HashMap::new(), false);

        // The proofErr survives in place; the runs around it fused.
        let names: Vec<&str> = par.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["w:r", "w:proofErr"]);
        assert_eq!(par.itertext(), "before");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut par = parse_xml(
            br#"<w:p>
                <w:hyperlink r:id="rId1"><w:r><w:t>a</w:t></w:r></w:hyperlink>
                <w:hyperlink r:id="rId2"><w:r><w:t>b</w:t></w:r></w:hyperlink>
                <w:r><w:t>c</w:t></w:r>
                <w:r><w:t>d</w:t></w:r>
            </w:p>"#,
        )
        .unwrap();
        let rels = rels(&[("rId1", "http://x.com"), ("rId2", "http://x.com")]);

        merge_elems(&mut par, &rels, false);
        let once = par.clone();
        merge_elems(&mut par, &rels, false);
        assert_eq!(par, once);
    }

    #[test]
    fn test_paragraphs_never_merge() {
        let mut body = parse_xml(
            br#"<w:body>
                <w:p><w:r><w:t>one</w:t></w:r></w:p>
                <w:p><w:r><w:t>two</w:t></w:r></w:p>
            </w:body>"#,
        )
        .unwrap();
        merge_elems(&mut body, &HashMap::new(), false);
        assert_eq!(body.children.len(), 2);
    }
}
