//! Unified error types for the Longan library.
//!
//! This module provides a single error type covering archive access, XML
//! parsing, and the extraction contract violations described in the crate
//! documentation. Recoverable source anomalies never appear here; those are
//! surfaced through [`crate::common::diagnostics`].

// Submodule declarations
pub mod types;

// Re-exports
pub use types::{Error, Result};
