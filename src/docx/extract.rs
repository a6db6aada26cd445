//! Walk one content part's element tree and collect its text.
//!
//! The walker visits elements depth-first. On the way in it moves the
//! collector's caret to the element's depth and runs the element's open
//! action; on the way out it runs the close action and moves the caret again.
//! Dispatch is a `match` over [`Tag`], one arm per element kind.
//!
//! An element's depth is not decided by its tag but by a breadth-first search
//! for the nearest paragraph descendant: a table has paragraphs three levels
//! down (row, cell, paragraph), so it sits at depth 1; a row at 2, a cell at
//! 3, a paragraph at 4. Searching instead of matching tags is what flattens
//! pathological nesting: a table inside a cell contains paragraphs three
//! levels down like any other table, so it re-enters at depth 1 as a new
//! top-level table. Content controls are transparent to the search: an `sdt`
//! wrapper never adds a level.

use crate::common::diagnostics::{Diagnostic, DiagnosticSink};
use crate::common::error::Result;
use crate::common::xml::XmlElement;
use crate::docx::ExtractOptions;
use crate::docx::collector::{CollectedPart, DepthCollector, Run, par_strings, paragraph_strings};
use crate::docx::counters::BulletGenerator;
use crate::docx::forms::{checkbox_entry, dropdown_entry};
use crate::docx::numbering::NumberingTable;
use crate::docx::style::{gather_pr, get_run_formatting};
use crate::docx::tags::{Tag, is_well_formed_name};
use std::collections::HashMap;

/// What depth is this element in the nested structure, relative to
/// paragraphs at depth 4?
///
/// `None` means the element does not affect depth: the document and body
/// wrappers (which contain *a* paragraph but not every next paragraph),
/// content-control wrappers, and anything with no paragraph beneath it.
/// There is only ever one document list, so the minimum returned is 1.
fn elem_depth(elem: &XmlElement) -> Option<usize> {
    match Tag::of(elem) {
        Tag::Document | Tag::Body | Tag::Sdt | Tag::SdtContent | Tag::SdtProperties => {
            return None;
        },
        _ => {},
    }

    let mut level: Vec<&XmlElement> = vec![elem];
    let mut depth = 0usize;
    while !level.is_empty() {
        if level.iter().any(|e| Tag::of(e) == Tag::Paragraph) {
            return Some(4usize.saturating_sub(depth).max(1));
        }
        let mut next = Vec::new();
        for e in &level {
            push_structural_children(e, &mut next);
        }
        level = next;
        depth += 1;
    }
    None
}

/// Children as the depth search sees them: content controls are flattened
/// away so wrapping a paragraph in an `sdt` does not move it a level deeper.
fn push_structural_children<'e>(elem: &'e XmlElement, out: &mut Vec<&'e XmlElement>) {
    for child in &elem.children {
        match Tag::of(child) {
            Tag::Sdt | Tag::SdtContent => push_structural_children(child, out),
            Tag::SdtProperties => {},
            _ => out.push(child),
        }
    }
}

/// Record or stage text from one content part's elements.
pub(crate) struct TagWalker<'a> {
    rels: &'a HashMap<String, String>,
    numbering: &'a NumberingTable,
    options: &'a ExtractOptions,
    collector: DepthCollector,
    bullets: BulletGenerator<'a>,
    /// Tag values of the content controls currently open, outermost first
    sdt_tags: Vec<Option<String>>,
}

impl<'a> TagWalker<'a> {
    pub fn new(
        rels: &'a HashMap<String, String>,
        numbering: &'a NumberingTable,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            rels,
            numbering,
            options,
            collector: DepthCollector::new(options.html),
            bullets: BulletGenerator::new(numbering),
            sdt_tags: Vec::new(),
        }
    }

    /// Walk a (merged) element tree and return everything collected.
    pub fn walk(mut self, root: &XmlElement, sink: &mut DiagnosticSink) -> Result<CollectedPart> {
        self.walk_elem(root, sink)?;
        self.collector.finish()
    }

    fn walk_elem(&mut self, elem: &XmlElement, sink: &mut DiagnosticSink) -> Result<()> {
        let recurse = self.open(elem, sink)?;
        if recurse {
            for child in &elem.children {
                self.walk_elem(child, sink)?;
            }
        }
        self.close(elem, sink)
    }

    /// Open an element: move the caret, then stage any text it produces.
    ///
    /// Returns whether to recurse into the element's children.
    fn open(&mut self, elem: &XmlElement, sink: &mut DiagnosticSink) -> Result<bool> {
        let depth = elem_depth(elem);
        self.collector.set_caret(depth, Some(elem.local_name()))?;

        match Tag::of(elem) {
            Tag::Paragraph => {
                let (label, list_position) = self.bullets.bullet(elem, sink);
                let sdt_tag = self
                    .sdt_tags
                    .iter()
                    .rev()
                    .find_map(|tag| tag.clone());
                let do_pstyle = self.options.paragraph_styles;

                let par = self.collector.commence_paragraph(Some(elem));
                par.list_position = list_position;
                par.sdt_tag = sdt_tag;
                if do_pstyle {
                    let style = if par.style.is_empty() {
                        "None".to_string()
                    } else {
                        par.style.clone()
                    };
                    par.runs.insert(0, Run::with_text(Vec::new(), style));
                }
                self.collector.insert_text_as_new_run(label);
                Ok(true)
            },
            Tag::Run => {
                self.collector
                    .commence_run(get_run_formatting(elem, self.options.html));
                Ok(true)
            },
            Tag::Text | Tag::TextMath => {
                self.collector
                    .add_text_into_open_run(elem.text.as_deref().unwrap_or(""));
                Ok(true)
            },
            Tag::Math => {
                let latex = elem.itertext();
                self.collector
                    .insert_text_as_new_run(format!("<latex>{latex}</latex>"));
                Ok(false)
            },
            Tag::Break => {
                self.collector.add_text_into_open_run("\n");
                Ok(true)
            },
            Tag::Symbol => {
                let font = elem.attr("w:font").unwrap_or("");
                if let Some(char_code) = elem.attr("w:char").filter(|c| !c.is_empty()) {
                    // Word stores symbol codes in the private-use area;
                    // dropping the leading nibble maps back to the base char.
                    self.collector.add_code_into_open_run(&format!(
                        "<span style=font-family:{font}>&#x0{};</span>",
                        &char_code[1..]
                    ));
                }
                Ok(true)
            },
            Tag::Tab => {
                self.collector.insert_text_as_new_run("\t");
                Ok(true)
            },
            Tag::Footnote => {
                self.open_note(elem, "footnote");
                Ok(true)
            },
            Tag::Endnote => {
                self.open_note(elem, "endnote");
                Ok(true)
            },
            Tag::FootnoteReference => {
                let id = elem.attr("w:id").unwrap_or("");
                self.collector
                    .insert_text_as_new_run(format!("----footnote{id}----"));
                Ok(true)
            },
            Tag::EndnoteReference => {
                let id = elem.attr("w:id").unwrap_or("");
                self.collector
                    .insert_text_as_new_run(format!("----endnote{id}----"));
                Ok(true)
            },
            Tag::Hyperlink => {
                self.open_hyperlink(elem, sink)?;
                Ok(false)
            },
            Tag::FormCheckbox => {
                let entry = checkbox_entry(elem, sink);
                self.collector.insert_text_as_new_run(entry);
                Ok(true)
            },
            Tag::FormDropdown => {
                let entry = dropdown_entry(elem)?;
                self.collector.insert_text_as_new_run(entry);
                Ok(true)
            },
            Tag::Image => {
                self.open_image(elem, "r:embed", sink);
                Ok(true)
            },
            Tag::ImageData => {
                self.open_image(elem, "r:id", sink);
                Ok(true)
            },
            Tag::ImageAlt => {
                if let Some(descr) = elem.attr("descr") {
                    self.collector
                        .insert_text_as_new_run(format!("----Image alt text---->{descr}<"));
                }
                Ok(true)
            },
            Tag::CommentRangeStart => {
                if let Some(id) = elem.attr("w:id") {
                    self.collector.start_comment_range(id);
                }
                Ok(false)
            },
            Tag::CommentRangeEnd => {
                if let Some(id) = elem.attr("w:id") {
                    self.collector.end_comment_range(id);
                }
                Ok(false)
            },
            Tag::Sdt => {
                self.sdt_tags.push(sdt_tag_value(elem));
                Ok(true)
            },
            Tag::SdtProperties => Ok(false),
            Tag::Unknown => {
                if !is_well_formed_name(&elem.name) {
                    sink.warn(Diagnostic::UnparsableTag {
                        tag: elem.name.clone(),
                    });
                }
                Ok(true)
            },
            // structural and pass-through tags need no open action
            _ => Ok(true),
        }
    }

    /// Close an element: run any cleanup, then move the caret back.
    fn close(&mut self, elem: &XmlElement, sink: &mut DiagnosticSink) -> Result<()> {
        match Tag::of(elem) {
            Tag::Paragraph => self.collector.conclude_paragraph()?,
            Tag::Run => self.collector.conclude_run(),
            Tag::TableCell => self.close_table_cell(elem, sink)?,
            Tag::Sdt => {
                self.sdt_tags.pop();
            },
            _ => {},
        }
        self.collector.set_caret(elem_depth(elem), None)
    }

    /// Footnote/endnote definition: label the content unless it is one of
    /// the separator pseudo-notes.
    fn open_note(&mut self, elem: &XmlElement, kind: &str) {
        let note_type = elem.attr("w:type").unwrap_or("").to_lowercase();
        if !note_type.contains("separator") {
            let id = elem.attr("w:id").unwrap_or("");
            self.collector
                .insert_text_as_new_run(format!("{kind}{id})\t"));
        }
    }

    /// Hyperlink: wrap the gathered subtree text in an `<a>` when the
    /// relationship resolves; internal (anchor-only) links degrade to their
    /// bare text.
    fn open_hyperlink(&mut self, elem: &XmlElement, sink: &mut DiagnosticSink) -> Result<()> {
        let text = self.text_below(elem, sink)?;
        let target = elem
            .attr("r:id")
            .and_then(|r_id| self.rels.get(r_id))
            .filter(|target| !target.is_empty());

        match target {
            Some(target) => {
                let href = match elem.attr("w:anchor") {
                    Some(anchor) => format!("{target}#{anchor}"),
                    None => target.clone(),
                };
                self.collector
                    .insert_text_as_new_run(format!("<a href=\"{href}\">{text}</a>"));
            },
            None => self.collector.insert_text_as_new_run(text),
        }
        Ok(())
    }

    /// All text below an element, extracted through a fresh collector.
    fn text_below(&self, elem: &XmlElement, sink: &mut DiagnosticSink) -> Result<String> {
        let mut walker = TagWalker::new(self.rels, self.numbering, self.options);
        for child in &elem.children {
            walker.walk_elem(child, sink)?;
        }
        let part = walker.collector.finish()?;
        let pars = paragraph_strings(&par_strings(&part.pars));
        Ok(pars.join("\n\n"))
    }

    fn open_image(&mut self, elem: &XmlElement, rel_attr: &str, sink: &mut DiagnosticSink) {
        // A missing id attribute is malformed source; skip without comment.
        let Some(r_id) = elem.attr(rel_attr) else {
            return;
        };
        match self.rels.get(r_id) {
            Some(image) => self
                .collector
                .insert_text_as_new_run(format!("----{image}----")),
            None => sink.warn(Diagnostic::MissingImageRelationship {
                r_id: r_id.to_string(),
            }),
        }
    }

    /// Merged and spanned cells, handled as the cell closes.
    ///
    /// A vertical-merge continuation is a `w:vMerge` without a value (or an
    /// explicit `continue`). With duplication on, the cell above is copied in
    /// so consumers see a rectangular grid, and column spans are expanded the
    /// same way; with it off, the continuation stays empty and its position
    /// is recorded. A continuation in the first row has nothing to continue
    /// (nested dropdown-selector tables produce these) and is ignored.
    fn close_table_cell(&mut self, elem: &XmlElement, sink: &mut DiagnosticSink) -> Result<()> {
        if elem_depth(elem).is_none() {
            return Ok(());
        }

        let pr = gather_pr(elem);
        let vmerge_continue = pr.iter().any(|(tag, val)| {
            tag == "vMerge" && matches!(val.as_deref(), None | Some("continue"))
        });

        if !self.options.duplicate_merged_cells {
            if vmerge_continue && !self.collector.record_vmerged_cell()? {
                sink.warn(Diagnostic::FirstRowVerticalMerge);
            }
            return Ok(());
        }

        if vmerge_continue && !self.collector.duplicate_cell_above()? {
            sink.warn(Diagnostic::FirstRowVerticalMerge);
        }

        let grid_span = pr
            .iter()
            .find(|(tag, _)| tag == "gridSpan")
            .and_then(|(_, val)| val.as_deref())
            .and_then(|val| atoi_simd::parse::<usize, false, false>(val.as_bytes()).ok())
            .unwrap_or(1);
        self.collector.duplicate_current_cell(grid_span.saturating_sub(1))
    }
}

fn sdt_tag_value(sdt: &XmlElement) -> Option<String> {
    sdt.find_child("w:sdtPr")?
        .find_child("w:tag")?
        .attr("w:val")
        .map(String::from)
}
