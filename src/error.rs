//! # Error Types
//!
//! This module defines error types used throughout the sello library.

use thiserror::Error;

/// Main error type for sello operations
#[derive(Debug, Error)]
pub enum SelloError {
    /// Spreadsheet import errors (unsupported file type, parse failure)
    #[error("Import error: {0}")]
    Import(String),

    /// Invalid template or template operation
    #[error("Template error: {0}")]
    Template(String),

    /// Export was requested for a template with no elements
    #[error("template has no elements")]
    EmptyTemplate,

    /// QR symbol encoding error (e.g. payload too large for a fixed version)
    #[error("QR encode error: {0}")]
    QrEncode(String),

    /// Image loading/decoding/encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Archive packaging error
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
