//! Comments: definitions, threading, and range matching.
//!
//! Comments live outside the nested table structure. Their definitions are in
//! `word/comments.xml`; the body marks the commented spans with
//! `commentRangeStart`/`commentRangeEnd` pairs, which the collector records
//! as run-count offsets. This module matches the two up and reads
//! `word/commentsExtended.xml` (when present) to distinguish an initial
//! comment from a threaded reply.

use crate::common::diagnostics::{Diagnostic, DiagnosticSink};
use crate::common::error::Result;
use crate::common::xml::{XmlElement, parse_xml};
use crate::docx::ExtractOptions;
use crate::docx::collector::{par_strings, paragraph_strings};
use crate::docx::extract::TagWalker;
use crate::docx::numbering::NumberingTable;
use std::collections::HashMap;

/// Whether a comment starts a thread or answers one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentEvent {
    /// An initial comment
    Comment,
    /// A threaded reply to an earlier comment
    Response,
}

/// One comment, matched to the body text it annotates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The commented body text (runs between the range markers)
    pub reference: String,
    /// Comment author, as written
    pub author: String,
    /// Comment date, as written
    pub date: String,
    /// The comment's own text
    pub text: String,
    /// Initial comment or threaded response
    pub event: CommentEvent,
}

/// Match comment definitions against the ranges collected from the body.
///
/// A length mismatch between ranges and definitions means the pairing cannot
/// be trusted; extraction records a diagnostic and returns no comments rather
/// than mispairing them.
#[allow(clippy::too_many_arguments)]
pub(crate) fn collect_comments(
    comments_root: Option<&XmlElement>,
    extended_bytes: Option<&[u8]>,
    comment_ranges: &HashMap<String, (usize, usize)>,
    body_runs: &[String],
    comments_rels: &HashMap<String, String>,
    numbering: &NumberingTable,
    options: &ExtractOptions,
    sink: &mut DiagnosticSink,
) -> Result<Vec<Comment>> {
    let Some(root) = comments_root else {
        return Ok(Vec::new());
    };
    let definitions: Vec<&XmlElement> = root.children_named("w:comment").collect();
    if comment_ranges.len() != definitions.len() {
        sink.warn(Diagnostic::CommentMismatch {
            ranges: comment_ranges.len(),
            definitions: definitions.len(),
        });
        return Ok(Vec::new());
    }
    if definitions.is_empty() {
        return Ok(Vec::new());
    }

    let replies = reply_para_ids(extended_bytes)?;

    let mut comments = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let id = definition.attr("w:id").unwrap_or("");
        let author = definition.attr("w:author").unwrap_or("").to_string();
        let date = definition.attr("w:date").unwrap_or("").to_string();

        let text = comment_text(definition, comments_rels, numbering, options, sink)?;

        let reference = match comment_ranges.get(id) {
            Some(&(beg, end)) => body_runs
                .get(beg..end.min(body_runs.len()))
                .unwrap_or_default()
                .concat(),
            None => String::new(),
        };

        let event = match last_para_id(definition) {
            Some(para_id) if replies.contains(&para_id) => CommentEvent::Response,
            _ => CommentEvent::Comment,
        };

        comments.push(Comment {
            reference,
            author,
            date,
            text,
            event,
        });
    }
    Ok(comments)
}

/// Extract one comment definition's text through a fresh collector.
fn comment_text(
    definition: &XmlElement,
    rels: &HashMap<String, String>,
    numbering: &NumberingTable,
    options: &ExtractOptions,
    sink: &mut DiagnosticSink,
) -> Result<String> {
    let part = TagWalker::new(rels, numbering, options).walk(definition, sink)?;
    let pars = paragraph_strings(&par_strings(&part.pars));
    Ok(pars.join("\n\n"))
}

/// The `w14:paraId` of a comment's last paragraph, which is how
/// `commentsExtended.xml` addresses comments.
fn last_para_id(definition: &XmlElement) -> Option<String> {
    definition
        .children_named("w:p")
        .last()?
        .attr("w14:paraId")
        .map(String::from)
}

/// Paragraph ids that `commentsExtended.xml` marks as replies.
fn reply_para_ids(extended_bytes: Option<&[u8]>) -> Result<Vec<String>> {
    let Some(bytes) = extended_bytes else {
        return Ok(Vec::new());
    };
    let root = parse_xml(bytes)?;
    Ok(root
        .children_named("w15:commentEx")
        .filter(|ex| ex.attr("w15:paraIdParent").is_some())
        .filter_map(|ex| ex.attr("w15:paraId").map(String::from))
        .collect())
}
