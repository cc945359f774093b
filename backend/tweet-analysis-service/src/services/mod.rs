pub mod elasticsearch;
pub mod emotion_classifier;
pub mod ingest;
pub mod pipeline;
pub mod retrieval;
pub mod store;

pub use self::elasticsearch::ElasticsearchStore;
pub use emotion_classifier::{
    ClassifierError, EmotionClassifier, EmotionModel, EmotionScore, HttpEmotionModel, ModelError,
};
pub use ingest::{DatasetLoader, IngestError, BULK_CHUNK_SIZE};
pub use pipeline::{ClassificationPipeline, PipelineReport};
pub use retrieval::{PostFailure, RetrievalService, RetrievedPosts};
pub use store::{
    ensure_index, post_index_mapping, BulkIndexReport, PostStore, RawHit, SearchHits, StoreError,
};
