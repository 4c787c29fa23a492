//! Error types for report extraction and sheet reconciliation.

use std::path::PathBuf;
use thiserror::Error;

/// Every way a sync can fail. All variants are terminal for the current run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The report could not be opened or read as text.
    #[error("could not read report {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet path does not point at an existing file.
    #[error("Excel file not found: {0}")]
    SpreadsheetNotFound(PathBuf),

    /// No row in the scan window carries every mapped header.
    #[error("Header row not found in the Excel sheet (searched rows 1-{scanned})")]
    HeaderNotFound { scanned: u32 },

    /// A field's header is not among the discovered headers.
    #[error("Column for '{field}' not found in the Excel sheet")]
    MissingColumn { field: String },

    /// No pre-numbered blank row is left below the header row.
    #[error("No suitable row found for updating")]
    NoTargetRow,

    /// The file exists but could not be read or written as a workbook.
    #[error("workbook error: {0}")]
    Workbook(String),

    /// Settings or column map could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
