//! Relationship (`.rels`) files: part discovery and id-to-target tables.
//!
//! A docx lists its internal files in several `.rels` files. `_rels/.rels`
//! names the main document part (which is *usually* `word/document.xml`, but
//! checking is the only way to be sure); `word/_rels/document.xml.rels` names
//! the images, headers, and hyperlink targets the body references;
//! `word/_rels/header1.xml.rels` does the same for `header1.xml`, and so on.
//! Relationship ids are only unique within one `.rels` file.

use crate::common::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// One `<Relationship>` entry from a `.rels` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelEntry {
    /// Relationship id, e.g. `rId4`
    pub id: String,
    /// Relationship type URI
    pub type_uri: String,
    /// Target reference (part path or external URL)
    pub target: String,
}

/// A content-bearing file named by some `.rels` file, with enough context to
/// locate it and its own relationships inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartEntry {
    /// Relationship id that named this part
    pub id: String,
    /// Basename of the relationship type URI, e.g. `officeDocument`,
    /// `header`, `footnotes`, `image`
    pub type_name: String,
    /// Target as written in the `.rels` file
    pub target: String,
    /// Directory of the `.rels` file that named this part, e.g. `word/_rels`
    pub dir: String,
}

impl PartEntry {
    /// Path of this part inside the archive.
    ///
    /// Inferred from where the naming `.rels` file lives and the target:
    /// `_rels` + `word/document.xml` -> `word/document.xml`;
    /// `word/_rels` + `header1.xml` -> `word/header1.xml`.
    pub fn path(&self) -> String {
        let dirs = [dirname(&self.dir), dirname(&self.target)];
        let mut parts: Vec<&str> = dirs.iter().copied().filter(|d| !d.is_empty()).collect();
        parts.push(basename(&self.target));
        parts.join("/")
    }

    /// Path of this part's own `.rels` file (which may not exist).
    pub fn rels_path(&self) -> String {
        let path = self.path();
        let dir = dirname(&path);
        if dir.is_empty() {
            format!("_rels/{}.rels", basename(&path))
        } else {
            format!("{dir}/_rels/{}.rels", basename(&path))
        }
    }
}

pub(crate) fn dirname(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

pub(crate) fn basename(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, base)) => base,
        None => path,
    }
}

/// Parse the `<Relationship>` entries of one `.rels` file.
pub(crate) fn parse_rels_xml(xml_bytes: &[u8]) -> Result<Vec<RelEntry>> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::with_capacity(512);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut type_uri = None;
                    let mut target = None;
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).into_owned();
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value),
                            b"Type" => type_uri = Some(value),
                            b"Target" => target = Some(value),
                            _ => {},
                        }
                    }
                    if let (Some(id), Some(type_uri), Some(target)) = (id, type_uri, target) {
                        entries.push(RelEntry {
                            id,
                            type_uri,
                            target,
                        });
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
        buf.clear();
    }

    Ok(entries)
}

/// Collapse rel entries into the id-to-target table extraction consults.
pub(crate) fn rels_map(entries: &[RelEntry]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|rel| (rel.id.clone(), rel.target.clone()))
        .collect()
}
