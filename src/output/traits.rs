//! Exporter trait and output errors

use crate::extract::Record;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Serializes a record list to one file format
pub trait Exporter {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Writes every record to `writer`
    fn write(&self, records: &[Record], writer: &mut dyn Write) -> OutputResult<()>;
}
