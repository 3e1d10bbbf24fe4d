//! Error types for the screening results console

use thiserror::Error;

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, ScreenerError>;

#[derive(Error, Debug)]
pub enum ScreenerError {

    // =============================
    // Core Errors
    // =============================

    /// The pipeline service rejected or failed a request. Carries the
    /// server-supplied message when one was present in the body.
    #[error("Pipeline API error (status {status}): {message}")]
    Pipeline { status: u16, message: String },

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
