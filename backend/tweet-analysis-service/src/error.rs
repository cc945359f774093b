use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::ConfigError;
use crate::query::ValidationError;
use crate::services::{IngestError, StoreError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("search index unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::NotFound(_) => "not_found",
            AppError::Config(_) | AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NotFound(_) => AppError::NotFound(err.to_string()),
            IngestError::Malformed { .. } => {
                AppError::Validation(ValidationError::MalformedRequest(err.to_string()))
            }
            IngestError::Io { .. } => AppError::Internal(err.to_string()),
            IngestError::Store(e) => AppError::StoreUnavailable(e),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        if code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(code).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let validation = AppError::from(ValidationError::EmptyText);
        assert_eq!(validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let store = AppError::from(StoreError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(store.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let missing = AppError::from(IngestError::NotFound("tweets.json".into()));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let err = AppError::from(ValidationError::InvalidLimit { value: 0, max: 1000 });
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["code"], 422);
        assert!(json["message"].as_str().unwrap().contains("between 1 and 1000"));
    }
}
