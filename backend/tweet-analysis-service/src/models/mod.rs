pub mod api;
pub mod post;

pub use api::{
    EmotionResponse, HealthResponse, LoadResponse, RangeApplied, RangeParams, TweetsResponse,
};
pub use post::{identifier_to_string, parse_timestamp, Author, Emotion, MappingError, Post, PostMetrics, EMOTION_FIELD};
