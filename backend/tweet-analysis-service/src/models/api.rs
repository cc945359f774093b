//! Request and response bodies of the HTTP surface.
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::Post;
use crate::query::DateRange;

/// Date window and limit shared by both Post endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RangeParams {
    /// First calendar day, `YYYY-MM-DD` (inclusive)
    pub start_date: Option<String>,
    /// Last calendar day, `YYYY-MM-DD` (inclusive)
    pub end_date: Option<String>,
    /// Maximum number of Posts to touch
    pub limit: Option<i64>,
}

/// Bounds actually applied to the query, `null` when unbounded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RangeApplied {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl From<&DateRange> for RangeApplied {
    fn from(range: &DateRange) -> Self {
        Self {
            start: range.start_rfc3339(),
            end: range.end_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TweetsResponse {
    pub tweets: Vec<Post>,
    /// Posts in this response
    pub count: usize,
    /// Posts in range according to the store
    pub total: u64,
    pub limit: u32,
    pub range_applied: RangeApplied,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmotionResponse {
    pub message: String,
    /// Posts whose emotion label was written
    pub processed: usize,
    /// Posts retrieved for classification
    pub matched: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadResponse {
    pub message: String,
    pub indexed: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}
