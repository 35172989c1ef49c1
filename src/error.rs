use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads configuration, reads workbooks, or talks to SeaTable.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Wrapper for IO failures such as reading config or workbook files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook does not contain the expected sheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a sync profile is missing required keys or holds
    /// out-of-range values.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Transport-level failures talking to the SeaTable server.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when the SeaTable API answers with a non-success status.
    #[error("SeaTable API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Raised when a required environment variable is unset or empty.
    #[error("environment variable {0} is not set or empty")]
    MissingCredential(String),

    /// Raised when the profile directory holds no recognisable sync profiles.
    #[error("no sync profiles found in {0}")]
    NoProfiles(PathBuf),
}
