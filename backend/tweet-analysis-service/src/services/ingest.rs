use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::store::{BulkIndexReport, PostStore, StoreError};

/// Documents per bulk request.
pub const BULK_CHUNK_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("dataset file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read dataset {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset {} is not a JSON array of documents: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Bulk-loads raw Post documents into the store exactly as they appear in the dataset.
pub struct DatasetLoader {
    store: Arc<dyn PostStore>,
    chunk_size: usize,
}

impl DatasetLoader {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self {
            store,
            chunk_size: BULK_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub async fn load_file(&self, path: &Path) -> Result<BulkIndexReport, IngestError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                IngestError::NotFound(path.to_path_buf())
            } else {
                IngestError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let documents: Vec<Value> =
            serde_json::from_slice(&bytes).map_err(|e| IngestError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(path = %path.display(), documents = documents.len(), "loading dataset");
        Ok(self.load_documents(documents).await?)
    }

    /// Index documents chunk by chunk. Entries that are not JSON objects count as failures.
    pub async fn load_documents(
        &self,
        documents: Vec<Value>,
    ) -> Result<BulkIndexReport, StoreError> {
        let mut report = BulkIndexReport::default();

        let (objects, rejected): (Vec<Value>, Vec<Value>) =
            documents.into_iter().partition(Value::is_object);
        if !rejected.is_empty() {
            warn!(count = rejected.len(), "skipping dataset entries that are not objects");
            report.failed += rejected.len();
        }

        for chunk in objects.chunks(self.chunk_size) {
            let chunk_report = self.store.bulk_index(chunk).await?;
            report.indexed += chunk_report.indexed;
            report.failed += chunk_report.failed;
        }

        info!(
            indexed = report.indexed,
            failed = report.failed,
            "dataset load finished"
        );
        Ok(report)
    }
}
