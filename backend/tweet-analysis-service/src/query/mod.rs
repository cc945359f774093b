//! Request normalization: calendar-day ranges, result limits and the store query they produce.

pub mod builder;
pub mod date_range;

pub use builder::{LimitPolicy, PostQuery, ResultLimit, CREATED_AT_FIELD, ID_FIELD};
pub use date_range::{DateRange, DATE_FORMAT};

use thiserror::Error;

/// Input rejected before any store or model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}': expected a calendar date in YYYY-MM-DD format")]
    InvalidDate { field: &'static str, value: String },

    #[error("start_date '{start}' is after end_date '{end}'")]
    InvertedRange { start: String, end: String },

    #[error("limit must be between 1 and {max}, got {value}")]
    InvalidLimit { value: i64, max: u32 },

    #[error("text to classify is empty")]
    EmptyText,

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
