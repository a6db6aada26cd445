//! The .docx package: archive access and part discovery.
//!
//! A .docx file is a ZIP archive of XML parts. [`Package`] owns the archive
//! bytes and builds a fresh reader per access, so shared references suffice
//! for reading many parts. [`Package::close`] releases the bytes exactly
//! once; any access afterwards fails fast with [`Error::ArchiveClosed`]
//! rather than silently reopening.

use crate::common::error::{Error, Result};
use crate::docx::numbering::NumberingTable;
use crate::docx::rels::{PartEntry, basename, dirname, parse_rels_xml, rels_map};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// A Word (.docx) package.
///
/// This is the entry point for extraction.
///
/// # Examples
///
/// ```rust,no_run
/// use longan::docx::{ExtractOptions, Package};
///
/// let pkg = Package::open("document.docx")?;
/// let content = pkg.extract(ExtractOptions::default())?;
/// println!("{}", content.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package {
    /// Archive bytes; `None` once the package has been closed
    data: Option<Vec<u8>>,
}

impl Package {
    /// Open a .docx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Create a package from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create a package from owned bytes.
    ///
    /// Validates that the bytes parse as a ZIP archive; a malformed archive
    /// is an immediate error, never a partial extraction.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let _ = ZipArchive::new(Cursor::new(data.as_slice()))?;
        Ok(Self { data: Some(data) })
    }

    /// Close the package, releasing the archive bytes.
    ///
    /// Reads after closing fail with [`Error::ArchiveClosed`].
    pub fn close(&mut self) {
        self.data = None;
    }

    /// Whether the package has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.data.is_none()
    }

    fn archive(&self) -> Result<ZipArchive<Cursor<&[u8]>>> {
        let data = self.data.as_deref().ok_or(Error::ArchiveClosed)?;
        Ok(ZipArchive::new(Cursor::new(data))?)
    }

    /// Read one archive member.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive()?;
        let mut file = archive
            .by_name(name)
            .map_err(|_| Error::PartNotFound(name.to_string()))?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Read one archive member, `None` if it is absent.
    pub(crate) fn try_read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.read(name) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(Error::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All member names in the archive.
    pub fn member_names(&self) -> Result<Vec<String>> {
        let archive = self.archive()?;
        Ok(archive.file_names().map(String::from).collect())
    }

    /// Every part named by any `.rels` file in the archive.
    pub(crate) fn parts(&self) -> Result<Vec<PartEntry>> {
        let rels_files: Vec<String> = self
            .member_names()?
            .into_iter()
            .filter(|name| name.ends_with(".rels"))
            .collect();

        let mut parts = Vec::new();
        for rels_file in rels_files {
            let dir = dirname(&rels_file).to_string();
            for rel in parse_rels_xml(&self.read(&rels_file)?)? {
                parts.push(PartEntry {
                    id: rel.id,
                    type_name: basename(&rel.type_uri).to_string(),
                    target: rel.target,
                    dir: dir.clone(),
                });
            }
        }
        Ok(parts)
    }

    /// The id-to-target relationship table for a content part.
    ///
    /// Not every part has a `.rels` file; absence yields an empty table.
    pub(crate) fn rels_for(&self, part: &PartEntry) -> Result<HashMap<String, String>> {
        match self.try_read(&part.rels_path())? {
            Some(bytes) => Ok(rels_map(&parse_rels_xml(&bytes)?)),
            None => Ok(HashMap::new()),
        }
    }

    /// Numbering definitions, or an empty table when `word/numbering.xml`
    /// is absent (in which case there should be no lists; any that slip
    /// through are "numbered" with `--`).
    pub(crate) fn numbering(&self) -> Result<NumberingTable> {
        match self.try_read("word/numbering.xml")? {
            Some(bytes) => NumberingTable::from_xml(&bytes),
            None => Ok(NumberingTable::new()),
        }
    }

    /// Copy image parts out of the archive.
    ///
    /// Returns image basenames mapped to bytes. Given a directory, also
    /// writes each image there, creating the directory if needed.
    pub fn pull_image_files(&self, image_dir: Option<&Path>) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut images = BTreeMap::new();
        for part in self.parts()? {
            if part.type_name != "image" {
                continue;
            }
            if let Some(bytes) = self.try_read(&part.path())? {
                images.insert(basename(&part.target).to_string(), bytes);
            }
        }
        if let Some(dir) = image_dir {
            std::fs::create_dir_all(dir)?;
            for (name, bytes) in &images {
                std::fs::write(dir.join(name), bytes)?;
            }
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::content::tests::build_docx;

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Package::from_bytes(b"not a zip archive".to_vec()).is_err());
    }

    #[test]
    fn test_read_after_close_fails_fast() {
        let bytes = build_docx(&[(
            "word/document.xml",
            "<w:document><w:body><w:p/></w:body></w:document>",
        )]);
        let mut pkg = Package::from_bytes(bytes).unwrap();
        assert!(pkg.read("word/document.xml").is_ok());

        pkg.close();
        assert!(pkg.is_closed());
        assert!(matches!(
            pkg.read("word/document.xml"),
            Err(Error::ArchiveClosed)
        ));
    }

    #[test]
    fn test_missing_member_is_part_not_found() {
        let bytes = build_docx(&[("word/document.xml", "<w:document/>")]);
        let pkg = Package::from_bytes(bytes).unwrap();
        assert!(matches!(
            pkg.read("word/nothing.xml"),
            Err(Error::PartNotFound(_))
        ));
        assert_eq!(pkg.try_read("word/nothing.xml").unwrap(), None);
    }

    #[test]
    fn test_parts_discovered_from_rels() {
        let bytes = build_docx(&[("word/document.xml", "<w:document/>")]);
        let pkg = Package::from_bytes(bytes).unwrap();
        let parts = pkg.parts().unwrap();
        let main = parts
            .iter()
            .find(|p| p.type_name == "officeDocument")
            .unwrap();
        assert_eq!(main.path(), "word/document.xml");
    }

    #[test]
    fn test_missing_numbering_is_empty_table() {
        let bytes = build_docx(&[("word/document.xml", "<w:document/>")]);
        let pkg = Package::from_bytes(bytes).unwrap();
        assert!(pkg.numbering().unwrap().is_empty());
    }

    #[test]
    fn test_pull_image_files_writes_to_dir() {
        let bytes = build_docx(&[
            ("word/document.xml", "<w:document/>"),
            ("word/media/image1.png", "fakepngbytes"),
        ]);
        let pkg = Package::from_bytes(bytes).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let images = pkg.pull_image_files(Some(dir.path())).unwrap();
        assert_eq!(images["image1.png"], b"fakepngbytes");
        assert!(dir.path().join("image1.png").exists());
    }
}
