/// Word (.docx) structured text extraction.
///
/// A .docx package is a ZIP archive of XML parts. This module turns those
/// parts into a strict four-deep nesting (tables, rows, cells, paragraphs)
/// with content outside any table wrapped in synthetic single-cell tables,
/// so consumers always address text the same way.
///
/// # Architecture
///
/// The module is organized around these key pieces:
/// - `Package`: archive access and part discovery
/// - `merge`: fuses elements Word split for revision/spelling bookkeeping
/// - `collector`: the caret-driven tree collector producing the nesting
/// - `extract`: the per-part walker dispatching on recognized tags
/// - `numbering` / `counters` / `numerals`: list label reconstruction
/// - `style`: the visible-formatting subset, as merge keys and HTML
/// - `content`: the `DocxContent` façade tying the parts together
///
/// # Example
///
/// ```rust,no_run
/// use longan::docx::{ExtractOptions, Package, PartType};
/// use longan::docx::iterators::iter_paragraphs;
///
/// let pkg = Package::open("document.docx")?;
/// let content = pkg.extract(ExtractOptions::default())?;
///
/// // Flattened text, paragraphs separated by blank lines
/// println!("{}", content.text());
///
/// // Or walk the nested structure
/// for par in iter_paragraphs(content.pars(PartType::Body)) {
///     println!("style={:?} runs={:?}", par.style, par.run_strings());
/// }
///
/// for diagnostic in content.diagnostics() {
///     eprintln!("note: {diagnostic}");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod collector;
pub mod comments;
pub mod content;
pub mod counters;
pub(crate) mod extract;
pub mod forms;
pub mod iterators;
pub mod merge;
pub mod numbering;
pub mod numerals;
pub mod package;
pub mod properties;
pub mod rels;
pub mod style;
pub mod tags;

pub use collector::{Lineage, Par, ParsTable, Run, RunsTable};
pub use comments::{Comment, CommentEvent};
pub use content::{DocxContent, ExtractOptions, MergedCellRef, PartType};
pub use counters::ListPosition;
pub use numbering::{NumberFormat, NumberingTable};
pub use package::Package;
