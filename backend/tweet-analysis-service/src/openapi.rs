/// OpenAPI documentation for the Tweet Analysis Service
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::models::{
    Author, Emotion, EmotionResponse, HealthResponse, LoadResponse, Post, PostMetrics,
    RangeApplied, RangeParams, TweetsResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tweet Analysis Service API",
        version = "0.1.0",
        description = "Date-range retrieval of stored posts and emotion classification written back to the index",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Development server"),
    ),
    paths(
        handlers::tweets::list_tweets,
        handlers::emotion::classify_emotions,
        handlers::ingest::load_tweets,
        handlers::health::health,
    ),
    components(schemas(
        Post,
        Author,
        PostMetrics,
        Emotion,
        RangeParams,
        RangeApplied,
        TweetsResponse,
        EmotionResponse,
        LoadResponse,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Tweets", description = "Date-range retrieval"),
        (name = "Emotion", description = "Emotion classification runs"),
        (name = "Ingestion", description = "Dataset loading"),
    )
)]
pub struct ApiDoc;
