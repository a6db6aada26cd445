//! List counters and bullet/number label generation.
//!
//! Docx content does not carry explicit numbering values. Each numbered
//! paragraph holds only:
//!
//! ```xml
//! <w:ilvl w:val="0"/>   <!-- indentation level -->
//! <w:numId w:val="9"/>  <!-- reference into word/numbering.xml -->
//! ```
//!
//! The counters here track the current value per `(numId, level)` as numbered
//! paragraphs are encountered, resetting sub-list counters whenever a
//! shallower level increments:
//!
//! ```text
//! 1. top-level list
//!     a. sublist
//!     b. sublist continues
//! 2. back to top-level list
//!     a. sublist counter has been reset
//! ```
//!
//! One [`BulletGenerator`] lives per content part, matching how Word scopes
//! list continuation. Extracting partial text can therefore number items
//! differently than Word renders them, because not every paragraph of a list
//! may be seen.

use crate::common::diagnostics::DiagnosticSink;
use crate::common::xml::XmlElement;
use crate::docx::numbering::NumberingTable;
use crate::docx::numerals;
use std::collections::{BTreeMap, HashMap};

/// Where a paragraph falls in a list.
///
/// `counts` holds the current count at each open level, shallowest first, so
/// the third sub-item under the first item of list "2" is
/// `ListPosition { num_id: "2", counts: vec![1, 3] }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPosition {
    /// The `numId` grouping this paragraph's list
    pub num_id: String,
    /// Count at each open level, shallowest first
    pub counts: Vec<u32>,
}

/// Counters per `(numId, level)`, lazily created at zero.
#[derive(Debug, Default)]
pub struct ListCounters {
    counts: HashMap<String, BTreeMap<usize, u32>>,
}

impl ListCounters {
    /// Create an empty counter table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase the counter at `level`, resetting every deeper level.
    ///
    /// A level touched for the first time starts at `start - 1` (default 0),
    /// so the first returned count is `start` (default 1).
    pub fn increment(&mut self, num_id: &str, level: usize, start: Option<u32>) -> u32 {
        let ilvl2count = self.counts.entry(num_id.to_string()).or_default();
        let count = ilvl2count
            .entry(level)
            .or_insert_with(|| start.unwrap_or(1).saturating_sub(1));
        *count += 1;
        let result = *count;
        // Sub-list counters restart when a parent list moves on
        let _ = ilvl2count.split_off(&(level + 1));
        result
    }

    /// Counts at every open level up to and including `level`.
    pub fn position(&self, num_id: &str, level: usize) -> Vec<u32> {
        match self.counts.get(num_id) {
            Some(ilvl2count) => ilvl2count
                .range(..=level)
                .map(|(_, &count)| count)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Generates bullet and number label strings for numbered paragraphs.
pub struct BulletGenerator<'a> {
    numbering: &'a NumberingTable,
    counters: ListCounters,
}

impl<'a> BulletGenerator<'a> {
    /// Create a generator over the document's numbering definitions.
    pub fn new(numbering: &'a NumberingTable) -> Self {
        Self {
            numbering,
            counters: ListCounters::new(),
        }
    }

    /// Label for a paragraph, e.g. `"--\t"` or `"\t1)\t"`.
    ///
    /// Returns the empty string (and no position) when the paragraph is not
    /// numbered. The label is indented with one tab per level and ends with a
    /// tab separating it from the paragraph's own text; numbered (non-bullet)
    /// labels carry a `)` suffix.
    pub fn bullet(
        &mut self,
        paragraph: &XmlElement,
        sink: &mut DiagnosticSink,
    ) -> (String, Option<ListPosition>) {
        let Some((num_id, level)) = numbering_reference(paragraph) else {
            return (String::new(), None);
        };

        let format = self.numbering.resolve(&num_id, level, sink);
        let start = self.numbering.start_at(&num_id, level);
        let count = self.counters.increment(&num_id, level, start);

        // count is always >= 1 here, so rendering cannot leave the domain
        let mut label = format
            .render(count)
            .unwrap_or_else(|_| numerals::bullet().to_string());
        if label != numerals::bullet() {
            label.push(')');
        }

        let position = ListPosition {
            num_id: num_id.clone(),
            counts: self.counters.position(&num_id, level),
        };
        (
            format!("{}{}\t", "\t".repeat(level), label),
            Some(position),
        )
    }
}

/// Read `(numId, ilvl)` from a paragraph's properties, if it is numbered.
fn numbering_reference(paragraph: &XmlElement) -> Option<(String, usize)> {
    let num_pr = paragraph.find_child("w:pPr")?.find_child("w:numPr")?;
    let num_id = num_pr.find_child("w:numId")?.attr("w:val")?;
    let ilvl = num_pr.find_child("w:ilvl")?.attr("w:val")?;
    let level = atoi_simd::parse::<usize, false, false>(ilvl.as_bytes()).ok()?;
    Some((num_id.to_string(), level))
}
