// ============================================
// Emotion Classifier
// ============================================
//
// `EmotionModel` is the external text-classification capability.
// `EmotionClassifier` guards it: empty input never reaches the model,
// transient failures are retried within a bounded budget, and the
// top-scoring class is normalized into the fixed `Emotion` label set.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use resilience::{with_retry, AttemptError, RetryConfig, RetryError};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::post::UnknownEmotion;
use crate::models::Emotion;
use crate::query::ValidationError;

/// One class and its confidence as reported by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Transport failures, 5xx and 429 are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Request(_) => true,
            ModelError::Status { status, .. } => *status >= 500 || *status == 429,
            ModelError::InvalidResponse(_) => false,
        }
    }
}

#[async_trait]
pub trait EmotionModel: Send + Sync {
    /// Scores for every class the model knows, in any order.
    async fn predict(&self, text: &str) -> Result<Vec<EmotionScore>, ModelError>;
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    EmptyInput(ValidationError),
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    UnknownLabel(#[from] UnknownEmotion),
    #[error("model call timed out after {0:?}")]
    TimedOut(Duration),
    #[error("model call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Request(msg) => ClassifierError::Request(msg),
            ModelError::Status { status, body } => ClassifierError::Status { status, body },
            ModelError::InvalidResponse(msg) => ClassifierError::InvalidResponse(msg),
        }
    }
}

impl From<RetryError<ModelError>> for ClassifierError {
    fn from(err: RetryError<ModelError>) -> Self {
        match err {
            RetryError::Permanent(e) => e.into(),
            RetryError::Exhausted {
                attempts: 1,
                last_error,
            } => match last_error {
                AttemptError::TimedOut(limit) => ClassifierError::TimedOut(limit),
                AttemptError::Failed(e) => e.into(),
            },
            RetryError::Exhausted {
                attempts,
                last_error,
            } => ClassifierError::RetriesExhausted {
                attempts,
                last_error: last_error.to_string(),
            },
        }
    }
}

// ============================================
// HTTP model client
// ============================================

/// Hugging Face compatible text-classification endpoint.
pub struct HttpEmotionModel {
    client: reqwest::Client,
    url: String,
    api_token: Option<String>,
}

impl HttpEmotionModel {
    pub fn new(url: impl Into<String>, api_token: Option<String>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ModelError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            api_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        Self::new(
            config.classifier_url.clone(),
            config.classifier_api_token.clone(),
        )
    }
}

#[async_trait]
impl EmotionModel for HttpEmotionModel {
    async fn predict(&self, text: &str) -> Result<Vec<EmotionScore>, ModelError> {
        let mut request = self.client.post(&self.url).json(&json!({ "inputs": text }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_scores(&body)
    }
}

/// Single-input responses come back either nested (`[[...]]`) or flat (`[...]`).
pub fn parse_scores(body: &str) -> Result<Vec<EmotionScore>, ModelError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Prediction {
        Nested(Vec<Vec<EmotionScore>>),
        Flat(Vec<EmotionScore>),
    }

    let scores = match serde_json::from_str::<Prediction>(body) {
        Ok(Prediction::Nested(mut batches)) if !batches.is_empty() => batches.swap_remove(0),
        Ok(Prediction::Nested(_)) => Vec::new(),
        Ok(Prediction::Flat(scores)) => scores,
        Err(e) => return Err(ModelError::InvalidResponse(e.to_string())),
    };

    if scores.is_empty() {
        return Err(ModelError::InvalidResponse("no scores returned".to_string()));
    }
    Ok(scores)
}

// ============================================
// Adapter
// ============================================

pub struct EmotionClassifier {
    model: Arc<dyn EmotionModel>,
    retry: RetryConfig,
}

impl EmotionClassifier {
    pub fn new(model: Arc<dyn EmotionModel>, retry: RetryConfig) -> Self {
        Self { model, retry }
    }

    /// Label `text` with the model's highest-confidence class.
    pub async fn classify(&self, text: &str) -> Result<Emotion, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput(ValidationError::EmptyText));
        }

        let scores = with_retry(&self.retry, ModelError::is_transient, || {
            self.model.predict(text)
        })
        .await?;

        let top = scores
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| ClassifierError::InvalidResponse("no scores returned".to_string()))?;

        debug!(label = %top.label, score = top.score, "classified text");
        Ok(top.label.parse::<Emotion>()?)
    }
}
