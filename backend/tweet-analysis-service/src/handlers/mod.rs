//! HTTP surface: route table and shared state.
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

use crate::error::AppError;
use crate::openapi::ApiDoc;
use crate::query::{LimitPolicy, ValidationError};
use crate::services::{
    ClassificationPipeline, DatasetLoader, EmotionClassifier, PostStore, RetrievalService,
};

pub mod emotion;
pub mod health;
pub mod ingest;
pub mod tweets;

/// Long-lived resources shared by every request.
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub retrieval: RetrievalService,
    pub pipeline: ClassificationPipeline,
    pub loader: DatasetLoader,
    pub limits: LimitPolicy,
    pub dataset_path: PathBuf,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PostStore>,
        classifier: Arc<EmotionClassifier>,
        limits: LimitPolicy,
        concurrency: usize,
        dataset_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            retrieval: RetrievalService::new(store.clone()),
            pipeline: ClassificationPipeline::new(store.clone(), classifier, concurrency),
            loader: DatasetLoader::new(store.clone()),
            store,
            limits,
            dataset_path: dataset_path.into(),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::from(ValidationError::MalformedRequest(err.to_string())).into()
    }))
    .route("/health", web::get().to(health::health))
    .service(
        web::scope("/api/v1")
            .route("/tweets", web::get().to(tweets::list_tweets))
            .route("/emotion", web::post().to(emotion::classify_emotions))
            .route("/load-tweets", web::post().to(ingest::load_tweets))
            .route("/openapi.json", web::get().to(openapi_json)),
    );
}

async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
