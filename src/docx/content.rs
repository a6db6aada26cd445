//! Extracted document content and the extraction pipeline.
//!
//! [`Package::extract`] runs each content part (main body, headers, footers,
//! footnotes, endnotes) through the same pipeline: parse to an owned tree,
//! merge artificially split elements, walk into the nested table structure.
//! [`DocxContent`] holds the results: per-part nested tables, a combined
//! `document` view, flattened text, comments, core properties, and every
//! diagnostic the pipeline raised along the way.

use crate::common::diagnostics::{Diagnostic, DiagnosticSink};
use crate::common::error::Result;
use crate::common::xml::{XmlElement, parse_xml};
use crate::docx::collector::{Par, ParsTable, RunsTable, par_strings};
use crate::docx::comments::{Comment, collect_comments};
use crate::docx::extract::TagWalker;
use crate::docx::iterators::{Nested4, get_html_map, index_paragraphs, join_runs};
use crate::docx::package::Package;
use crate::docx::properties::collect_core_properties;
use crate::docx::rels::PartEntry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Options controlling extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Render recognized formatting as inline HTML tags
    pub html: bool,
    /// Prepend each paragraph's style name as a leading pseudo-run
    pub paragraph_styles: bool,
    /// Copy vertically merged cell content down so every table is
    /// rectangular; off, continuations stay empty and are recorded
    pub duplicate_merged_cells: bool,
    /// Copy document images into this directory during extraction
    pub image_dir: Option<PathBuf>,
}

/// The five content-part kinds, in `document`-view order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    Header,
    Body,
    Footer,
    Footnotes,
    Endnotes,
}

impl PartType {
    const ORDER: [PartType; 5] = [
        PartType::Header,
        PartType::Body,
        PartType::Footer,
        PartType::Footnotes,
        PartType::Endnotes,
    ];

    fn from_type_name(type_name: &str) -> Option<Self> {
        match type_name {
            "header" => Some(Self::Header),
            "officeDocument" => Some(Self::Body),
            "footer" => Some(Self::Footer),
            "footnotes" => Some(Self::Footnotes),
            "endnotes" => Some(Self::Endnotes),
            _ => None,
        }
    }
}

/// A vertically merged cell left empty during extraction, addressed within
/// its part's nested table view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedCellRef {
    pub part: PartType,
    pub table: usize,
    pub row: usize,
    pub cell: usize,
}

/// A merged content-part tree kept for the light save pass.
struct SavedPart {
    path: String,
    root: XmlElement,
}

/// Everything extracted from one document.
pub struct DocxContent {
    package: Package,
    options: ExtractOptions,
    header: ParsTable,
    body: ParsTable,
    footer: ParsTable,
    footnotes: ParsTable,
    endnotes: ParsTable,
    comments: Vec<Comment>,
    core_properties: BTreeMap<String, Option<String>>,
    merged_cells: Vec<MergedCellRef>,
    diagnostics: Vec<Diagnostic>,
    saved_parts: Vec<SavedPart>,
}

impl Package {
    /// Extract the document's content.
    ///
    /// Consumes the package into a [`DocxContent`]; the archive stays
    /// available through it for images and saving until
    /// [`DocxContent::close`].
    pub fn extract(self, options: ExtractOptions) -> Result<DocxContent> {
        DocxContent::extract(self, options)
    }
}

impl DocxContent {
    fn extract(package: Package, options: ExtractOptions) -> Result<Self> {
        let mut sink = DiagnosticSink::new();
        let numbering = package.numbering()?;
        let all_parts = package.parts()?;

        let mut content = Self {
            package,
            options,
            header: Vec::new(),
            body: Vec::new(),
            footer: Vec::new(),
            footnotes: Vec::new(),
            endnotes: Vec::new(),
            comments: Vec::new(),
            core_properties: BTreeMap::new(),
            merged_cells: Vec::new(),
            diagnostics: Vec::new(),
            saved_parts: Vec::new(),
        };

        // Content parts in a fixed order: part type first, then path, so
        // header1 precedes header2 and reruns are deterministic.
        let mut body_comment_ranges: HashMap<String, (usize, usize)> = HashMap::new();
        let mut seen_paths: HashSet<String> = HashSet::new();
        for &part_type in &PartType::ORDER {
            let mut entries: Vec<&PartEntry> = all_parts
                .iter()
                .filter(|p| PartType::from_type_name(&p.type_name) == Some(part_type))
                .collect();
            entries.sort_by_key(|p| p.path());

            for entry in entries {
                if !seen_paths.insert(entry.path()) {
                    continue;
                }
                let Some(bytes) = content.package.try_read(&entry.path())? else {
                    continue;
                };
                let mut root = parse_xml(&bytes)?;
                let rels = content.package.rels_for(entry)?;
                crate::docx::merge::merge_elems(&mut root, &rels, content.options.html);

                let part = TagWalker::new(&rels, &numbering, &content.options)
                    .walk(&root, &mut sink)?;

                let bucket = content.bucket_mut(part_type);
                let table_offset = bucket.len();
                for (table, row, cell) in part.vmerged_cells {
                    content.merged_cells.push(MergedCellRef {
                        part: part_type,
                        table: table + table_offset,
                        row,
                        cell,
                    });
                }
                content.bucket_mut(part_type).extend(part.pars);
                if part_type == PartType::Body {
                    body_comment_ranges.extend(part.comment_ranges);
                }
                content.saved_parts.push(SavedPart {
                    path: entry.path(),
                    root,
                });
            }
        }

        content.collect_document_comments(&all_parts, &body_comment_ranges, &numbering, &mut sink)?;
        content.collect_properties(&all_parts, &mut sink)?;

        if let Some(image_dir) = content.options.image_dir.clone() {
            let _ = content.package.pull_image_files(Some(&image_dir))?;
        }

        content.diagnostics = sink.into_items();
        Ok(content)
    }

    fn collect_document_comments(
        &mut self,
        all_parts: &[PartEntry],
        body_comment_ranges: &HashMap<String, (usize, usize)>,
        numbering: &crate::docx::numbering::NumberingTable,
        sink: &mut DiagnosticSink,
    ) -> Result<()> {
        let mut comments_entries: Vec<&PartEntry> = all_parts
            .iter()
            .filter(|p| p.type_name == "comments")
            .collect();
        comments_entries.sort_by_key(|p| p.path());
        comments_entries.dedup_by_key(|p| p.path());
        if comments_entries.len() > 1 {
            sink.warn(Diagnostic::MultiplePartsOfType {
                type_name: "comments".to_string(),
            });
        }

        let Some(entry) = comments_entries.first() else {
            return Ok(());
        };
        let Some(bytes) = self.package.try_read(&entry.path())? else {
            return Ok(());
        };
        let rels = self.package.rels_for(entry)?;
        let mut root = parse_xml(&bytes)?;
        crate::docx::merge::merge_elems(&mut root, &rels, self.options.html);

        let extended = self.package.try_read("word/commentsExtended.xml")?;
        let body_runs: Vec<String> = all_run_strings(&self.body);

        self.comments = collect_comments(
            Some(&root),
            extended.as_deref(),
            body_comment_ranges,
            &body_runs,
            &rels,
            numbering,
            &self.options,
            sink,
        )?;
        self.saved_parts.push(SavedPart {
            path: entry.path(),
            root,
        });
        Ok(())
    }

    fn collect_properties(
        &mut self,
        all_parts: &[PartEntry],
        sink: &mut DiagnosticSink,
    ) -> Result<()> {
        let entry = all_parts
            .iter()
            .find(|p| p.type_name == "core-properties");
        let bytes = match entry {
            Some(entry) => self.package.try_read(&entry.path())?,
            None => None,
        };
        match bytes {
            Some(bytes) => self.core_properties = collect_core_properties(&bytes)?,
            // Files created in Google Docs have no core-properties part, so
            // this may be expected.
            None => sink.warn(Diagnostic::MissingCoreProperties),
        }
        Ok(())
    }

    fn bucket_mut(&mut self, part_type: PartType) -> &mut ParsTable {
        match part_type {
            PartType::Header => &mut self.header,
            PartType::Body => &mut self.body,
            PartType::Footer => &mut self.footer,
            PartType::Footnotes => &mut self.footnotes,
            PartType::Endnotes => &mut self.endnotes,
        }
    }

    /// Collected paragraphs for one part type.
    pub fn pars(&self, part_type: PartType) -> &ParsTable {
        match part_type {
            PartType::Header => &self.header,
            PartType::Body => &self.body,
            PartType::Footer => &self.footer,
            PartType::Footnotes => &self.footnotes,
            PartType::Endnotes => &self.endnotes,
        }
    }

    /// Header paragraphs.
    pub fn header_pars(&self) -> &ParsTable {
        &self.header
    }

    /// Main body paragraphs.
    pub fn body_pars(&self) -> &ParsTable {
        &self.body
    }

    /// Footer paragraphs.
    pub fn footer_pars(&self) -> &ParsTable {
        &self.footer
    }

    /// Footnote paragraphs.
    pub fn footnotes_pars(&self) -> &ParsTable {
        &self.footnotes
    }

    /// Endnote paragraphs.
    pub fn endnotes_pars(&self) -> &ParsTable {
        &self.endnotes
    }

    /// All parts concatenated: header, body, footer, footnotes, endnotes.
    pub fn document_pars(&self) -> ParsTable {
        let mut document = ParsTable::new();
        for part_type in PartType::ORDER {
            document.extend(self.pars(part_type).iter().cloned());
        }
        document
    }

    /// The runs view of one part type.
    pub fn runs(&self, part_type: PartType) -> RunsTable {
        par_strings(self.pars(part_type))
    }

    /// The runs view of the whole document.
    pub fn document_runs(&self) -> RunsTable {
        par_strings(&self.document_pars())
    }

    /// The paragraphs view (runs joined) of one part type.
    pub fn paragraphs(&self, part_type: PartType) -> Nested4<String> {
        self.join_view(&self.runs(part_type))
    }

    /// The paragraphs view (runs joined) of the whole document.
    pub fn document(&self) -> Nested4<String> {
        self.join_view(&self.document_runs())
    }

    fn join_view(&self, runs: &RunsTable) -> Nested4<String> {
        if self.options.paragraph_styles {
            // Style descriptors were inserted as each paragraph's first run;
            // the joined view leaves them out.
            let stripped: RunsTable = runs
                .iter()
                .map(|table| {
                    table
                        .iter()
                        .map(|row| {
                            row.iter()
                                .map(|cell| {
                                    cell.iter()
                                        .map(|par| par.iter().skip(1).cloned().collect())
                                        .collect()
                                })
                                .collect()
                        })
                        .collect()
                })
                .collect();
            join_runs(&stripped)
        } else {
            join_runs(runs)
        }
    }

    /// All document paragraphs joined with blank lines.
    pub fn text(&self) -> String {
        let document = self.document();
        let paragraphs: Vec<String> = document
            .into_iter()
            .flatten()
            .flatten()
            .flatten()
            .collect();
        paragraphs.join("\n\n")
    }

    /// A browsable HTML rendering of the whole structure, each paragraph
    /// prefixed with its index tuple.
    pub fn html_map(&self) -> String {
        get_html_map(&index_paragraphs(&self.document()))
    }

    /// Comments matched to the body text they annotate.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Core document properties; empty (with a diagnostic) when the package
    /// has none.
    pub fn core_properties(&self) -> &BTreeMap<String, Option<String>> {
        &self.core_properties
    }

    /// Diagnostics recorded during extraction.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Vertically merged cells left empty (only populated when
    /// `duplicate_merged_cells` is off).
    pub fn merged_cells(&self) -> &[MergedCellRef] {
        &self.merged_cells
    }

    /// Image basenames mapped to bytes.
    pub fn images(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        self.package.pull_image_files(None)
    }

    /// Write images to disk and return them.
    pub fn save_images<P: AsRef<Path>>(&self, image_dir: P) -> Result<BTreeMap<String, Vec<u8>>> {
        self.package.pull_image_files(Some(image_dir.as_ref()))
    }

    /// Save the (merged, possibly edited) document.
    ///
    /// Content parts are re-serialized from their merged trees; every other
    /// archive member is copied through unchanged.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let replaced: HashSet<&str> = self
            .saved_parts
            .iter()
            .map(|p| p.path.as_str())
            .collect();

        let file = std::fs::File::create(path)?;
        let mut zout = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for name in self.package.member_names()? {
            if replaced.contains(name.as_str()) {
                continue;
            }
            zout.start_file(&name, options)?;
            zout.write_all(&self.package.read(&name)?)?;
        }
        for part in &self.saved_parts {
            zout.start_file(&part.path, options)?;
            zout.write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
            zout.write_all(part.root.to_xml().as_bytes())?;
        }
        zout.finish()?;
        Ok(())
    }

    /// Close the underlying archive. Further image or save calls fail fast.
    pub fn close(&mut self) {
        self.package.close();
    }
}

/// Every rendered run string in a part, document order.
pub(crate) fn all_run_strings(tables: &ParsTable) -> Vec<String> {
    tables
        .iter()
        .flat_map(|table| table.iter())
        .flat_map(|row| row.iter())
        .flat_map(|cell| cell.iter())
        .flat_map(Par::run_strings)
        .collect()
}
