use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::{ErrorResponse, Result};
use crate::models::LoadResponse;

/// Index the configured dataset file as-is.
#[utoipa::path(
    post,
    path = "/api/v1/load-tweets",
    tag = "Ingestion",
    responses(
        (status = 200, description = "Load summary", body = LoadResponse),
        (status = 404, description = "Dataset file missing", body = ErrorResponse),
        (status = 422, description = "Dataset is not a JSON array", body = ErrorResponse),
        (status = 503, description = "Search index unavailable", body = ErrorResponse)
    )
)]
pub async fn load_tweets(state: web::Data<AppState>) -> Result<HttpResponse> {
    let report = state.loader.load_file(&state.dataset_path).await?;

    Ok(HttpResponse::Ok().json(LoadResponse {
        message: format!(
            "Loaded {} tweets from {} ({} failed)",
            report.indexed,
            state.dataset_path.display(),
            report.failed
        ),
        indexed: report.indexed,
        failed: report.failed,
    }))
}
