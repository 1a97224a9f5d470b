//! Single-slot holder for the current analysis.
//!
//! Each successful upload replaces the slot wholesale. There is no history.

use crate::analysis::WorkbookAnalysis;
use crate::error::IngestError;
use crate::worker::{run_parse, ParseRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Hex SHA-256 of an uploaded file.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// An analysis together with where it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    pub id: String,
    pub source_file: String,
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
    pub analysis: WorkbookAnalysis,
}

impl StoredAnalysis {
    pub fn new(source_file: impl Into<String>, data: &[u8], analysis: WorkbookAnalysis) -> Self {
        Self::with_hash(source_file, content_hash(data), analysis)
    }

    /// Like [`StoredAnalysis::new`] for bytes that were already hashed.
    pub fn with_hash(
        source_file: impl Into<String>,
        content_hash: String,
        analysis: WorkbookAnalysis,
    ) -> Self {
        Self {
            id: format!("wa_{}", Uuid::new_v4().simple()),
            source_file: source_file.into(),
            content_hash,
            uploaded_at: Utc::now(),
            analysis,
        }
    }
}

/// Cheap-to-clone handle over the slot. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct AnalysisStore {
    inner: Arc<RwLock<Option<Arc<StoredAnalysis>>>>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current analysis, returning the shared snapshot.
    pub fn set(&self, stored: StoredAnalysis) -> Arc<StoredAnalysis> {
        let stored = Arc::new(stored);
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        tracing::debug!("AnalysisStore: replaced with '{}' ({})", stored.id, stored.source_file);
        *slot = Some(Arc::clone(&stored));
        stored
    }

    pub fn get(&self) -> Option<Arc<StoredAnalysis>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Parse an upload and make it the current analysis.
    ///
    /// The slot is only replaced when the file parses and at least one known
    /// report sheet holds records; otherwise the previous analysis stays.
    pub async fn ingest(
        &self,
        source_file: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Arc<StoredAnalysis>, IngestError> {
        let source_file = source_file.into();
        // Hashed up front: the buffer moves into the parse task
        let hash = content_hash(&data);

        let request = ParseRequest::new(data).with_file_name(source_file.clone());
        let analysis = run_parse(request)
            .await
            .into_result()
            .map_err(IngestError::Parse)?;

        if !analysis.has_data() {
            warn!("No report sheets with data in {}", source_file);
            return Err(IngestError::NoData);
        }

        let stored = self.set(StoredAnalysis::with_hash(source_file, hash, analysis));
        info!("Analysis stored: {}", stored.id);
        Ok(stored)
    }

    /// Empty the slot. Returns true if it held an analysis.
    pub fn clear(&self) -> bool {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        slot.take().is_some()
    }
}
