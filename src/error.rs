//! Parse error types.
//!
//! Only a byte buffer that cannot be read as any supported container is an
//! error. Missing columns, unrecognized sheets and unparseable dates all
//! degrade to blank data instead.

use crate::report_type::ReportType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File is empty")]
    EmptyInput,

    #[error("Unsupported file format: expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv")]
    UnsupportedContainer,

    #[error("Failed to open workbook: {0}")]
    Workbook(String),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for pipeline operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Why an upload did not replace the current analysis.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Message of the underlying [`ParseError`].
    #[error("{0}")]
    Parse(String),

    #[error(
        "No valid data found in the uploaded file. Please ensure it contains sheets named {}.",
        expected_sheet_names()
    )]
    NoData,
}

fn expected_sheet_names() -> String {
    ReportType::ALL
        .iter()
        .map(|t| format!("'{}'", t.full_name()))
        .collect::<Vec<_>>()
        .join(", ")
}
