//! Structured diagnostics for recoverable source anomalies.
//!
//! Word documents produced by tools other than Word routinely reference
//! numbering that was never written, carry malformed form fields, or point
//! images at relationships that do not exist. Extraction must complete for all
//! of these, so none of them are errors. Each one is recorded as a
//! [`Diagnostic`] on the extraction result and mirrored to the `log` facade at
//! warn level, so callers can either inspect the collected list or watch the
//! log stream.

use std::fmt;

/// A recoverable anomaly observed during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A `numFmt` value outside the six supported formats; rendered as `--`.
    UnknownNumberFormat {
        /// The format name found in the document
        format: String,
    },
    /// A paragraph references a numbering id with no usable definition;
    /// rendered as `--`.
    UnresolvedNumbering {
        /// The `numId` referenced by the paragraph
        num_id: String,
    },
    /// A checkbox form field with no readable `checked` or `default` value
    MalformedCheckbox,
    /// An image reference whose relationship id resolves to nothing
    MissingImageRelationship {
        /// The relationship id named by the drawing
        r_id: String,
    },
    /// An element whose tag name could not be read as a qualified XML name
    UnparsableTag {
        /// The offending tag name
        tag: String,
    },
    /// A vertical-merge continuation in a table's first row (no cell above)
    FirstRowVerticalMerge,
    /// The package has no docProps/core.xml; common for files not authored
    /// in Word
    MissingCoreProperties,
    /// Comment ranges in the body do not line up with comment definitions
    CommentMismatch {
        /// Number of comment ranges found in the body
        ranges: usize,
        /// Number of comment definitions found in word/comments.xml
        definitions: usize,
    },
    /// More than one part of a type that should be unique (first one used)
    MultiplePartsOfType {
        /// The duplicated part type
        type_name: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNumberFormat { format } => {
                write!(f, "numbering format '{format}' not implemented, substituting '--'")
            },
            Self::UnresolvedNumbering { num_id } => {
                write!(f, "no usable numbering definition for numId '{num_id}', substituting '--'")
            },
            Self::MalformedCheckbox => write!(f, "checkbox form field has no readable value"),
            Self::MissingImageRelationship { r_id } => {
                write!(f, "image relationship '{r_id}' not found in part rels")
            },
            Self::UnparsableTag { tag } => write!(f, "skipping element with unparsable tag '{tag}'"),
            Self::FirstRowVerticalMerge => {
                write!(f, "ignoring vertical-merge continuation in first table row")
            },
            Self::MissingCoreProperties => {
                write!(
                    f,
                    "could not find core-properties (docProps/core.xml); files created \
                     outside Word may not have one"
                )
            },
            Self::CommentMismatch { ranges, definitions } => {
                write!(
                    f,
                    "comment ranges ({ranges}) and comment definitions ({definitions}) \
                     have different lengths; comments not extracted"
                )
            },
            Self::MultiplePartsOfType { type_name } => {
                write!(f, "multiple parts of type '{type_name}' found, using first")
            },
        }
    }
}

/// Collects diagnostics during one extraction.
///
/// Every recorded diagnostic is also emitted through `log::warn!`.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    items: Vec<Diagnostic>,
}

impl DiagnosticSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log facade.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    /// All diagnostics recorded so far.
    #[inline]
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Consume the sink and return the collected diagnostics.
    #[inline]
    pub fn into_items(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Number of diagnostics recorded.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether any diagnostics were recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_collects_in_order() {
        let mut sink = DiagnosticSink::new();
        sink.warn(Diagnostic::MalformedCheckbox);
        sink.warn(Diagnostic::UnknownNumberFormat {
            format: "undefined".to_string(),
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.items()[0], Diagnostic::MalformedCheckbox);
        assert!(matches!(
            sink.items()[1],
            Diagnostic::UnknownNumberFormat { .. }
        ));
    }

    #[test]
    fn test_display_names_the_substitution() {
        let d = Diagnostic::UnknownNumberFormat {
            format: "undefined".to_string(),
        };
        assert!(d.to_string().contains("undefined"));
        assert!(d.to_string().contains("--"));
    }
}
