//! Error types for readalong

use std::io;
use thiserror::Error;

/// Main error type for readalong
#[derive(Error, Debug)]
pub enum ReadalongError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Manuscript error: {0}")]
    Manuscript(String),

    #[error("Playback backend error: {0}")]
    Backend(String),

    #[error("Playback rate out of range: {0} (must be a positive, finite number)")]
    RateOutOfRange(f64),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for readalong operations
pub type Result<T> = std::result::Result<T, ReadalongError>;

impl From<String> for ReadalongError {
    fn from(s: String) -> Self {
        ReadalongError::Other(s)
    }
}

impl From<&str> for ReadalongError {
    fn from(s: &str) -> Self {
        ReadalongError::Other(s.to_string())
    }
}
