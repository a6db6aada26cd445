//! Unified error types for the Longan library.
use thiserror::Error;

/// Main error type for Longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Archive member or document part not found
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Caret moved out of range while collecting content.
    ///
    /// Raising the caret above the document root or dropping it below
    /// paragraph depth indicates a traversal bug, not input variance.
    #[error("Caret depth error: {0}")]
    CaretDepth(String),

    /// Numeral conversion called with a number outside its domain
    #[error("{0} is not defined for this numbering")]
    NumeralDomain(i64),

    /// Dropdown form field selects an entry that does not exist
    #[error("dropdown selection {index} out of range for {len} entries")]
    DropdownIndex { index: usize, len: usize },

    /// Archive accessed after it was closed
    #[error("package archive has been closed")]
    ArchiveClosed,

    /// Depth-indexed iteration asked to descend past the structure's leaves
    #[error("will not iterate at depth {0}: structure is 4 levels deep")]
    IterationDepth(usize),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Result type for Longan operations.
pub type Result<T> = std::result::Result<T, Error>;
