// ABOUTME: Error types for spreadsheet processing.
// ABOUTME: Only batch-level failures live here; per-page problems never become errors.

use std::fmt;
use thiserror::Error;

/// Errors that abort a whole batch.
#[derive(Debug, Error)]
pub enum SheetError {
    /// No header could be identified as the keyword column.
    #[error("could not identify the keyword column (headers: {0})")]
    MissingRequiredColumn(String),

    /// The source file could not be read.
    #[error("failed to read spreadsheet: {0}")]
    Read(String),

    /// The output file could not be written.
    #[error("failed to write spreadsheet: {0}")]
    Write(String),

    /// JSON interchange data was malformed.
    #[error("invalid JSON data: {0}")]
    Json(String),
}

impl SheetError {
    /// Creates a MissingRequiredColumn error listing the headers that were seen.
    pub fn missing_keyword_column(headers: &[String]) -> Self {
        SheetError::MissingRequiredColumn(headers.join(", "))
    }

    /// Creates a Read error from any displayable cause.
    pub fn read(err: impl fmt::Display) -> Self {
        SheetError::Read(err.to_string())
    }

    /// Creates a Write error from any displayable cause.
    pub fn write(err: impl fmt::Display) -> Self {
        SheetError::Write(err.to_string())
    }

    /// Creates a Json error from any displayable cause.
    pub fn json(err: impl fmt::Display) -> Self {
        SheetError::Json(err.to_string())
    }
}
