//! Off-thread parsing.
//!
//! A request carries the file bytes in, a response carries either the
//! analysis or an error message back. No progress reporting, no
//! cancellation: once submitted, a parse runs to completion.

use crate::analysis::WorkbookAnalysis;
use crate::workbook::{parse, parse_named};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub file_buffer: Vec<u8>,
    /// Used only to name the sheet of a CSV upload.
    #[serde(default)]
    pub file_name: Option<String>,
}

impl ParseRequest {
    pub fn new(file_buffer: Vec<u8>) -> Self {
        Self {
            file_buffer,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseResponse {
    Success { data: WorkbookAnalysis },
    Error { error: String },
}

impl ParseResponse {
    pub fn into_result(self) -> Result<WorkbookAnalysis, String> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Error { error } => Err(error),
        }
    }
}

/// Run the pipeline synchronously and wrap the outcome.
pub fn handle(request: &ParseRequest) -> ParseResponse {
    let result = match request.file_name.as_deref() {
        Some(name) => parse_named(name, &request.file_buffer),
        None => parse(&request.file_buffer),
    };
    match result {
        Ok(data) => ParseResponse::Success { data },
        Err(e) => ParseResponse::Error {
            error: e.to_string(),
        },
    }
}

/// Parse on the blocking thread pool so large workbooks do not stall the
/// async runtime.
pub async fn run_parse(request: ParseRequest) -> ParseResponse {
    let size = request.file_buffer.len();
    info!(
        "Parsing upload {} ({} bytes)",
        request.file_name.as_deref().unwrap_or("<unnamed>"),
        size
    );

    match tokio::task::spawn_blocking(move || handle(&request)).await {
        Ok(response) => response,
        Err(e) => {
            error!("Parse task failed: {}", e);
            ParseResponse::Error {
                error: "Unknown error during parsing".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_format() {
        let err = ParseResponse::Error {
            error: "bad file".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"type": "ERROR", "error": "bad file"}));

        let ok = handle(&ParseRequest::new(b"a,b\n1,2\n".to_vec()));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["type"], "SUCCESS");
        assert_eq!(json["data"]["sheets"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_handle_error_message() {
        let response = handle(&ParseRequest::new(Vec::new()));
        assert_eq!(response.into_result().unwrap_err(), "File is empty");
    }

    #[tokio::test]
    async fn test_run_parse_named_csv() {
        let request = ParseRequest::new(b"Video/Posts URL,Status\nhttp://a,Active\n".to_vec())
            .with_file_name("Ads Tutorials- Social Media.csv");
        let analysis = run_parse(request).await.into_result().unwrap();
        assert_eq!(analysis.sheets[1].total_urls, 1);
        assert_eq!(analysis.active_count, 1);
    }
}
