//! Collect extracted text into a nested structure at a consistent depth.
//!
//! ```text
//! [  # document
//!     [  # table
//!         [  # row
//!             [  # cell
//!                 [  # paragraph
//!                     ""  # text run
//!                 ]
//!             ]
//!         ]
//!     ]
//! ]
//! ```
//!
//! Extraction recursively descends into a content part's elements, so the
//! points where a table, row, cell, or paragraph begins and ends are known.
//! The collector drops and raises a caret as those boundaries open and close,
//! and inserts text where the caret points. Content outside any table lands
//! in a synthetic single-row, single-cell table, so the produced structure is
//! always exactly four levels deep no matter how the source nests.
//!
//! The caret is an explicit depth into the rightmost open branch of the tree
//! rather than a chain of aliased references; moving it above the root or
//! below paragraph depth is a contract violation, not input variance.

use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;
use crate::docx::counters::ListPosition;
use crate::docx::style::{get_paragraph_formatting, get_pstyle, html_close, html_open};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Content appears at this depth; the caret never goes below it.
const PAR_DEPTH: usize = 4;

/// A text run: HTML style and text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    /// Opening-tag interiors for this run's style
    pub html_style: Vec<String>,
    /// Text content accumulated so far
    pub text: String,
}

impl Run {
    /// A run with a style and no text yet.
    pub fn new(html_style: Vec<String>) -> Self {
        Self {
            html_style,
            text: String::new(),
        }
    }

    /// A run with explicit style and text.
    pub fn with_text(html_style: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            html_style,
            text: text.into(),
        }
    }

    /// The run rendered with its style wrapping, or `""` if it has no text.
    pub fn render(&self) -> String {
        if self.text.is_empty() {
            return String::new();
        }
        format!(
            "{}{}{}",
            html_open(&self.html_style),
            self.text,
            html_close(&self.html_style)
        )
    }
}

/// The localnames of the elements open at each depth when a paragraph was
/// collected. The document root is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    pub table: Option<String>,
    pub row: Option<String>,
    pub cell: Option<String>,
    pub par: Option<String>,
}

impl Lineage {
    fn set(&mut self, depth: usize, value: Option<&str>) {
        let slot = match depth {
            1 => &mut self.table,
            2 => &mut self.row,
            3 => &mut self.cell,
            _ => &mut self.par,
        };
        *slot = value.map(String::from);
    }
}

/// A collected paragraph: style, lineage, runs, and list bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Par {
    /// Paragraph-level HTML style (from the paragraph's `pStyle`)
    pub html_style: Vec<String>,
    /// The paragraph style name (`pStyle` value), or `""`
    pub style: String,
    /// Where in the source structure this paragraph was found
    pub lineage: Lineage,
    /// The paragraph's runs in order
    pub runs: Vec<Run>,
    /// Position in a numbered/bulleted list, if the paragraph is in one
    pub list_position: Option<ListPosition>,
    /// Tag value of the innermost enclosing content control, resolved at
    /// collection time
    pub sdt_tag: Option<String>,
}

impl Par {
    /// A string for each run with text content; empty renders are dropped.
    pub fn run_strings(&self) -> Vec<String> {
        self.runs
            .iter()
            .map(Run::render)
            .filter(|x| !x.is_empty())
            .collect()
    }
}

/// The nested structure: tables of rows of cells of paragraphs.
pub type ParsTable = Vec<Vec<Vec<Vec<Par>>>>;

/// The runs view: tables of rows of cells of paragraphs of run strings.
pub type RunsTable = Vec<Vec<Vec<Vec<Vec<String>>>>>;

/// Convert collected [`Par`] instances into nested run strings.
pub fn par_strings(tables: &ParsTable) -> RunsTable {
    tables
        .iter()
        .map(|table| {
            table
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.iter().map(Par::run_strings).collect())
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Everything one content part's traversal produced.
#[derive(Debug, Default)]
pub(crate) struct CollectedPart {
    pub pars: ParsTable,
    /// Comment id mapped to `(first run, one-past-last run)` offsets
    pub comment_ranges: HashMap<String, (usize, usize)>,
    /// Positions of vertical-merge continuation cells left empty
    pub vmerged_cells: Vec<(usize, usize, usize)>,
}

/// Insert items into a tree at a consistent depth.
///
/// Instances never escape the crate; traversal results leave through
/// [`CollectedPart`].
pub(crate) struct DepthCollector {
    html: bool,
    tree: ParsTable,
    caret_depth: usize,
    lineage: Lineage,
    open_pars: Vec<Par>,
    orphan_runs: Vec<Run>,
    comment_ranges: HashMap<String, (usize, usize)>,
    vmerged_cells: Vec<(usize, usize, usize)>,
}

impl DepthCollector {
    pub fn new(html: bool) -> Self {
        Self {
            html,
            tree: Vec::new(),
            caret_depth: 1,
            lineage: Lineage::default(),
            open_pars: Vec::new(),
            orphan_runs: Vec::new(),
            comment_ranges: HashMap::new(),
            vmerged_cells: Vec::new(),
        }
    }

    /// Depth of the lowest open branch, 1 (root) to 4 (cell contents).
    #[inline]
    pub fn caret_depth(&self) -> usize {
        self.caret_depth
    }

    fn last_table(&mut self) -> Result<&mut Vec<Vec<Vec<Par>>>> {
        self.tree
            .last_mut()
            .ok_or_else(|| Error::CaretDepth("no open table".to_string()))
    }

    fn last_row(&mut self) -> Result<&mut Vec<Vec<Par>>> {
        self.last_table()?
            .last_mut()
            .ok_or_else(|| Error::CaretDepth("no open row".to_string()))
    }

    fn last_cell(&mut self) -> Result<&mut Vec<Par>> {
        self.last_row()?
            .last_mut()
            .ok_or_else(|| Error::CaretDepth("no open cell".to_string()))
    }

    /// Open a new branch under the caret.
    fn drop_caret(&mut self) -> Result<()> {
        match self.caret_depth {
            1 => self.tree.push(Vec::new()),
            2 => self.last_table()?.push(Vec::new()),
            3 => self.last_row()?.push(Vec::new()),
            _ => {
                return Err(Error::CaretDepth(
                    "will not lower caret beneath paragraph depth".to_string(),
                ));
            },
        }
        self.caret_depth += 1;
        Ok(())
    }

    /// Close the branch at the caret and move up to its parent.
    fn raise_caret(&mut self) -> Result<()> {
        if self.caret_depth == 1 {
            return Err(Error::CaretDepth(
                "will not raise caret above root".to_string(),
            ));
        }
        self.caret_depth -= 1;
        Ok(())
    }

    /// Set the caret at the given depth, recording the element localname in
    /// the lineage at that depth (`None` clears it, which is what closing
    /// elements do).
    ///
    /// `depth: None` means the element does not affect depth at all.
    pub fn set_caret(&mut self, depth: Option<usize>, localname: Option<&str>) -> Result<()> {
        let Some(depth) = depth else {
            return Ok(());
        };
        while self.caret_depth > depth {
            self.lineage.set(depth, None);
            self.raise_caret()?;
        }
        while self.caret_depth < depth {
            self.drop_caret()?;
        }
        self.lineage.set(depth, localname);
        Ok(())
    }

    /// Gather any cached orphan runs and open a new paragraph.
    pub fn commence_paragraph(&mut self, elem: Option<&XmlElement>) -> &mut Par {
        let html_style = elem
            .map(|e| get_paragraph_formatting(e, self.html))
            .unwrap_or_default();
        let style = elem.map(get_pstyle).unwrap_or_default();

        let mut runs: Vec<Run> = std::mem::take(&mut self.orphan_runs);
        runs.push(Run::with_text(Vec::new(), html_open(&html_style)));

        self.open_pars.push(Par {
            html_style,
            style,
            lineage: self.lineage.clone(),
            runs,
            list_position: None,
            sdt_tag: None,
        });
        self.open_pars.last_mut().expect("paragraph just pushed")
    }

    /// Close the current paragraph and add it to the tree.
    pub fn conclude_paragraph(&mut self) -> Result<()> {
        let mut par = self
            .open_pars
            .pop()
            .ok_or_else(|| Error::CaretDepth("no open paragraph to conclude".to_string()))?;
        par.runs
            .push(Run::with_text(Vec::new(), html_close(&par.html_style)));
        self.insert(par)
    }

    /// Whether a paragraph is currently open.
    #[inline]
    pub fn has_open_par(&self) -> bool {
        !self.open_pars.is_empty()
    }

    /// Whether any runs were cached outside a paragraph.
    #[inline]
    pub fn has_orphan_runs(&self) -> bool {
        !self.orphan_runs.is_empty()
    }

    /// Add a paragraph at paragraph depth, opening branches as needed.
    fn insert(&mut self, par: Par) -> Result<()> {
        self.set_caret(Some(PAR_DEPTH), None)?;
        self.last_cell()?.push(par);
        Ok(())
    }

    /// Open a new run in the current paragraph.
    pub fn commence_run(&mut self, html_style: Vec<String>) {
        self.open_runs().push(Run::new(html_style));
    }

    /// Close the current run.
    pub fn conclude_run(&mut self) {
        self.commence_run(Vec::new());
    }

    /// Runs of the current open paragraph, or the orphan cache outside one.
    fn open_runs(&mut self) -> &mut Vec<Run> {
        match self.open_pars.last_mut() {
            Some(par) => &mut par.runs,
            None => &mut self.orphan_runs,
        }
    }

    /// The last run in the current paragraph, opened on demand.
    fn open_run(&mut self) -> &mut Run {
        let runs = self.open_runs();
        if runs.is_empty() {
            runs.push(Run::default());
        }
        runs.last_mut().expect("run just pushed")
    }

    /// Add text into the open run, escaping angle brackets in HTML mode.
    ///
    /// Ampersands are left alone: the XML layer already unescaped entities,
    /// so a literal `&` here is real document text, and re-escaping is the
    /// caller's concern.
    pub fn add_text_into_open_run(&mut self, text: &str) {
        if self.html {
            let escaped = text.replace('<', "&lt;").replace('>', "&gt;");
            self.open_run().text.push_str(&escaped);
        } else {
            self.open_run().text.push_str(text);
        }
    }

    /// Add text into the open run without escaping symbols.
    pub fn add_code_into_open_run(&mut self, text: &str) {
        self.open_run().text.push_str(text);
    }

    /// Close the open run, insert `item` as its own run, then re-open a run
    /// with the cached style.
    ///
    /// For items like links and footnote markers that sit inside a styled
    /// run but should not carry its style:
    ///
    /// ```text
    /// <run><b>some text           <- open run
    /// <run><b>some text</b></run> <- closed here
    /// <a href="...">link</a>      <- item as its own run
    /// <run><b>                    <- fresh run, same style as before
    /// ```
    pub fn insert_text_as_new_run(&mut self, item: impl Into<String>) {
        let open_style = self.open_run().html_style.clone();
        let runs = self.open_runs();
        runs.push(Run::with_text(Vec::new(), item));
        runs.push(Run::new(open_style));
    }

    /// Number of rendered runs seen so far, in closed and open paragraphs.
    ///
    /// This is the address space for comment ranges.
    fn count_runs(&self) -> usize {
        let closed: usize = self
            .tree
            .iter()
            .flat_map(|table| table.iter())
            .flat_map(|row| row.iter())
            .flat_map(|cell| cell.iter())
            .map(|par| par.run_strings().len())
            .sum();
        let open: usize = self.open_pars.iter().map(|p| p.run_strings().len()).sum();
        let orphans = self.orphan_runs.iter().filter(|r| !r.text.is_empty()).count();
        closed + open + orphans
    }

    /// Start a comment range at the current run count.
    pub fn start_comment_range(&mut self, id: &str) {
        let count = self.count_runs();
        self.comment_ranges.insert(id.to_string(), (count, count));
    }

    /// End a comment range at the current run count.
    pub fn end_comment_range(&mut self, id: &str) {
        let count = self.count_runs();
        let entry = self
            .comment_ranges
            .entry(id.to_string())
            .or_insert((count, count));
        entry.1 = count;
    }

    /// Replace the just-closed cell with a copy of the cell above it.
    ///
    /// Returns `false` (taking no action) when there is no cell above: a
    /// vertical-merge continuation in a table's first row, or pointing at a
    /// column the previous row lacks. Both arise from real documents and are
    /// ignored rather than propagated.
    pub fn duplicate_cell_above(&mut self) -> Result<bool> {
        self.set_caret(Some(3), None)?;
        let table = self.last_table()?;
        let row_idx = table.len().saturating_sub(1);
        if row_idx == 0 {
            return Ok(false);
        }
        let cell_idx = table[row_idx].len().saturating_sub(1);
        let Some(above) = table[row_idx - 1].get(cell_idx).cloned() else {
            return Ok(false);
        };
        table[row_idx][cell_idx] = above;
        Ok(true)
    }

    /// Duplicate the just-closed cell `times` more times (column spans).
    pub fn duplicate_current_cell(&mut self, times: usize) -> Result<()> {
        if times == 0 {
            return Ok(());
        }
        self.set_caret(Some(3), None)?;
        let row = self.last_row()?;
        if let Some(cell) = row.last().cloned() {
            for _ in 0..times {
                row.push(cell.clone());
            }
        }
        Ok(())
    }

    /// Record the just-closed cell as an empty vertical-merge continuation.
    ///
    /// Returns `false` (recording nothing) in a table's first row, where a
    /// continuation has nothing to continue.
    pub fn record_vmerged_cell(&mut self) -> Result<bool> {
        self.set_caret(Some(3), None)?;
        let table_idx = self.tree.len().saturating_sub(1);
        let table = self.last_table()?;
        let row_idx = table.len().saturating_sub(1);
        if row_idx == 0 {
            return Ok(false);
        }
        let cell_idx = table[row_idx].len().saturating_sub(1);
        self.vmerged_cells.push((table_idx, row_idx, cell_idx));
        Ok(true)
    }

    /// Flush trailing content and return everything collected.
    pub fn finish(mut self) -> Result<CollectedPart> {
        if self.has_orphan_runs() {
            self.commence_paragraph(None);
        }
        if self.has_open_par() {
            self.conclude_paragraph()?;
        }
        Ok(CollectedPart {
            pars: self.tree,
            comment_ranges: self.comment_ranges,
            vmerged_cells: self.vmerged_cells,
        })
    }
}

/// Join one paragraph's runs (pStyle pseudo-runs included) into a string.
pub fn join_par_runs(runs: &[String]) -> String {
    let mut joined = String::with_capacity(runs.iter().map(String::len).sum());
    for run in runs {
        joined.push_str(run);
    }
    joined
}

/// All paragraph strings in a runs table, depth-first, as a flat list.
pub(crate) fn paragraph_strings(tables: &RunsTable) -> SmallVec<[String; 32]> {
    tables
        .iter()
        .flat_map(|table| table.iter())
        .flat_map(|row| row.iter())
        .flat_map(|cell| cell.iter())
        .map(|runs| join_par_runs(runs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse_xml;

    #[test]
    fn test_single_paragraph_lands_at_depth_four() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.add_text_into_open_run("hello");
        collector.conclude_paragraph().unwrap();

        let part = collector.finish().unwrap();
        assert_eq!(part.pars.len(), 1);
        assert_eq!(part.pars[0].len(), 1);
        assert_eq!(part.pars[0][0].len(), 1);
        assert_eq!(part.pars[0][0][0].len(), 1);
        assert_eq!(part.pars[0][0][0][0].run_strings(), ["hello"]);
    }

    #[test]
    fn test_caret_will_not_drop_below_paragraph_depth() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(4), None).unwrap();
        assert!(matches!(
            collector.drop_caret(),
            Err(Error::CaretDepth(_))
        ));
    }

    #[test]
    fn test_caret_will_not_raise_above_root() {
        let mut collector = DepthCollector::new(false);
        assert!(matches!(
            collector.raise_caret(),
            Err(Error::CaretDepth(_))
        ));
    }

    #[test]
    fn test_sibling_tables_stay_separate() {
        let mut collector = DepthCollector::new(false);
        for text in ["first", "second"] {
            collector.set_caret(Some(1), Some("tbl")).unwrap();
            collector.set_caret(Some(4), Some("p")).unwrap();
            collector.commence_paragraph(None);
            collector.add_text_into_open_run(text);
            collector.conclude_paragraph().unwrap();
            collector.set_caret(Some(1), None).unwrap();
        }
        let part = collector.finish().unwrap();
        assert_eq!(part.pars.len(), 2);
    }

    #[test]
    fn test_lineage_for_body_paragraph() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(4), Some("p")).unwrap();
        let par = collector.commence_paragraph(None);
        assert_eq!(par.lineage.table, None);
        assert_eq!(par.lineage.par.as_deref(), Some("p"));
    }

    #[test]
    fn test_lineage_inside_table() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(1), Some("tbl")).unwrap();
        collector.set_caret(Some(2), Some("tr")).unwrap();
        collector.set_caret(Some(3), Some("tc")).unwrap();
        collector.set_caret(Some(4), Some("p")).unwrap();
        let par = collector.commence_paragraph(None);
        assert_eq!(par.lineage.table.as_deref(), Some("tbl"));
        assert_eq!(par.lineage.row.as_deref(), Some("tr"));
        assert_eq!(par.lineage.cell.as_deref(), Some("tc"));
        assert_eq!(par.lineage.par.as_deref(), Some("p"));
    }

    #[test]
    fn test_insert_text_as_new_run_restores_style() {
        let mut collector = DepthCollector::new(true);
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.commence_run(vec!["b".to_string()]);
        collector.add_text_into_open_run("before ");
        collector.insert_text_as_new_run("[marker]");
        collector.add_text_into_open_run(" after");
        collector.conclude_paragraph().unwrap();

        let part = collector.finish().unwrap();
        let runs = part.pars[0][0][0][0].run_strings();
        assert_eq!(runs, ["<b>before </b>", "[marker]", "<b> after</b>"]);
    }

    #[test]
    fn test_angle_brackets_escaped_in_html_mode() {
        let mut collector = DepthCollector::new(true);
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.add_text_into_open_run("a < b & c > d");
        collector.conclude_paragraph().unwrap();

        let part = collector.finish().unwrap();
        assert_eq!(
            part.pars[0][0][0][0].run_strings(),
            ["a &lt; b & c &gt; d"]
        );
    }

    #[test]
    fn test_paragraph_style_wraps_whole_paragraph() {
        let elem = parse_xml(
            br#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr></w:p>"#,
        )
        .unwrap();
        let mut collector = DepthCollector::new(true);
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(Some(&elem));
        collector.add_text_into_open_run("Title");
        collector.conclude_paragraph().unwrap();

        let part = collector.finish().unwrap();
        let joined = join_par_runs(&part.pars[0][0][0][0].run_strings());
        assert_eq!(joined, "<h1>Title</h1>");
        assert_eq!(part.pars[0][0][0][0].style, "Heading1");
    }

    #[test]
    fn test_orphan_runs_become_a_paragraph_on_finish() {
        let mut collector = DepthCollector::new(false);
        collector.add_text_into_open_run("stray");
        let part = collector.finish().unwrap();
        assert_eq!(part.pars[0][0][0][0].run_strings(), ["stray"]);
    }

    #[test]
    fn test_nested_paragraphs_close_innermost_first() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.add_text_into_open_run("outer before ");
        // a text-box paragraph opens while the outer one is still open
        collector.commence_paragraph(None);
        collector.add_text_into_open_run("inner");
        collector.conclude_paragraph().unwrap();
        collector.add_text_into_open_run("outer after");
        collector.conclude_paragraph().unwrap();

        let part = collector.finish().unwrap();
        let cell = &part.pars[0][0][0];
        assert_eq!(cell.len(), 2);
        assert_eq!(cell[0].run_strings(), ["inner"]);
        assert_eq!(
            cell[1].run_strings(),
            ["outer before ", "outer after"]
        );
    }

    #[test]
    fn test_duplicate_cell_above_copies_content() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(1), Some("tbl")).unwrap();
        // row 1
        collector.set_caret(Some(2), Some("tr")).unwrap();
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.add_text_into_open_run("spanned");
        collector.conclude_paragraph().unwrap();
        collector.set_caret(Some(2), None).unwrap();
        // row 2, continuation cell stays empty until duplicated
        collector.set_caret(Some(2), Some("tr")).unwrap();
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.conclude_paragraph().unwrap();
        assert!(collector.duplicate_cell_above().unwrap());

        let part = collector.finish().unwrap();
        assert_eq!(part.pars[0][1][0][0].run_strings(), ["spanned"]);
    }

    #[test]
    fn test_duplicate_cell_above_ignores_first_row() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(1), Some("tbl")).unwrap();
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.conclude_paragraph().unwrap();
        assert!(!collector.duplicate_cell_above().unwrap());
    }

    #[test]
    fn test_comment_ranges_count_rendered_runs() {
        let mut collector = DepthCollector::new(false);
        collector.set_caret(Some(4), Some("p")).unwrap();
        collector.commence_paragraph(None);
        collector.add_text_into_open_run("first");
        collector.start_comment_range("0");
        collector.insert_text_as_new_run("commented");
        collector.end_comment_range("0");
        collector.conclude_paragraph().unwrap();

        let part = collector.finish().unwrap();
        assert_eq!(part.comment_ranges["0"], (1, 2));
    }
}
