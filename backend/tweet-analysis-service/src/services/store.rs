use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::query::PostQuery;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid Elasticsearch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build transport: {0}")]
    TransportBuild(#[from] elasticsearch::http::transport::BuildError),
    #[error("transport error: {0}")]
    Transport(#[from] elasticsearch::Error),
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Transport failures, conflicts, throttling and 5xx may succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Status { status, .. } => {
                *status >= 500 || *status == 429 || *status == 409
            }
            _ => false,
        }
    }
}

/// One raw document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub document_id: String,
    pub source: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Matches in range, independent of the requested size.
    pub total: u64,
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkIndexReport {
    pub indexed: usize,
    pub failed: usize,
}

/// The search index holding Post documents, bound to a single index.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn search(&self, query: &PostQuery) -> Result<SearchHits, StoreError>;

    /// Partial update of one field. `field` is a dotted path such as `metrics.emotion`.
    async fn update_field(
        &self,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    async fn index_exists(&self) -> Result<bool, StoreError>;

    async fn create_index(&self, mapping: &Value) -> Result<(), StoreError>;

    async fn bulk_index(&self, documents: &[Value]) -> Result<BulkIndexReport, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Index mapping for Post documents. Unlisted fields are mapped dynamically.
pub fn post_index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "user": {
                    "properties": {
                        "username": { "type": "keyword" },
                        "handle": { "type": "keyword" },
                        "verified": { "type": "boolean" }
                    }
                },
                "meta": {
                    "properties": {
                        "created_at": { "type": "date" },
                        "hashtags": { "type": "keyword" }
                    }
                },
                "payload": {
                    "properties": {
                        "tweet": {
                            "properties": {
                                "content": { "type": "text" }
                            }
                        }
                    }
                },
                "metrics": {
                    "properties": {
                        "retweets": { "type": "long" },
                        "likes": { "type": "long" },
                        "replies": { "type": "long" },
                        "emotion": { "type": "keyword" },
                        "stance": { "type": "keyword" }
                    }
                }
            }
        }
    })
}

/// Create the index when missing. Returns `true` if it was created by this call.
pub async fn ensure_index(store: &dyn PostStore, mapping: &Value) -> Result<bool, StoreError> {
    if store.index_exists().await? {
        return Ok(false);
    }
    store.create_index(mapping).await?;
    Ok(true)
}

/// Expand `a.b.c` into `{"a": {"b": {"c": value}}}` for a partial update.
pub fn nest_field(field: &str, value: Value) -> Value {
    field
        .rsplit('.')
        .fold(value, |inner, segment| json!({ segment: inner }))
}
