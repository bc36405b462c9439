//! Error types for Wayline boundary operations.
//!
//! The geometry engine itself never fails; every placement, route and layout
//! call returns a best-effort result. Errors only arise at the edges of the
//! crate: reading a snapshot, parsing it, and exporting a rendering.

use std::io;

use thiserror::Error;

/// The main error type for Wayline operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the JSON error so a
/// front end can point at the failing line and column.
#[derive(Debug, Error)]
pub enum WaylineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse {
        err: serde_json::Error,
        src: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::export::Error> for WaylineError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl WaylineError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
