//! Longan - structured text extraction for Office Open XML word-processing
//! documents.
//!
//! Longan opens a .docx package and re-projects its arbitrarily nested
//! content into a strict four-level structure (tables, rows, cells,
//! paragraphs) while reconstructing the list numbering Word never writes
//! down, fusing runs Word split for revision tracking, and resolving
//! hyperlink, image, footnote, and comment references along the way.
//!
//! # Features
//!
//! - **Fixed-depth output**: every document extracts to `tables → rows →
//!   cells → paragraphs`, with flow content wrapped in synthetic tables
//! - **List reconstruction**: bullet and number labels rebuilt from
//!   `word/numbering.xml` with per-list, per-level counters
//! - **Run merging**: consecutive runs, text nodes, and hyperlinks split by
//!   revision bookkeeping are fused before extraction
//! - **Optional inline HTML**: bold/italic/size/color and friends as tags
//! - **Structured diagnostics**: recoverable source anomalies are collected
//!   on the result (and logged), never thrown
//!
//! # Example - Extracting text
//!
//! ```no_run
//! use longan::docx::{ExtractOptions, Package};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pkg = Package::open("document.docx")?;
//! let content = pkg.extract(ExtractOptions::default())?;
//!
//! // All text, paragraphs joined by blank lines
//! println!("{}", content.text());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Walking the nested structure
//!
//! ```no_run
//! use longan::docx::{ExtractOptions, Package, PartType};
//! use longan::docx::iterators::{enum_at_depth, is_tbl};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pkg = Package::open("document.docx")?;
//! let content = pkg.extract(ExtractOptions {
//!     html: true,
//!     ..ExtractOptions::default()
//! })?;
//!
//! for table in content.body_pars() {
//!     println!("real table: {}", is_tbl(table));
//! }
//! for (index, cell) in enum_at_depth(content.body_pars(), 3)? {
//!     println!("cell {index:?}: {cell:?}");
//! }
//! # Ok(())
//! # }
//! ```

/// Common types and utilities: errors, diagnostics, XML trees
pub mod common;

/// Word (.docx) structured text extraction
pub mod docx;

// Re-export commonly used types for convenience
pub use common::{Diagnostic, Error, Result};
pub use docx::{DocxContent, ExtractOptions, Package};
