use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::{ErrorResponse, Result};
use crate::models::{EmotionResponse, RangeParams};
use crate::query::{DateRange, ValidationError};

/// Classify Posts in a date window and store each label on its Post.
///
/// The JSON body is optional; an empty body classifies the most recent
/// Posts up to the default limit.
#[utoipa::path(
    post,
    path = "/api/v1/emotion",
    tag = "Emotion",
    request_body(content = RangeParams, description = "Optional date window and limit", content_type = "application/json"),
    responses(
        (status = 200, description = "Run summary", body = EmotionResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Search index unavailable", body = ErrorResponse)
    )
)]
pub async fn classify_emotions(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let params = parse_body(&body)?;
    let range = DateRange::from_days(params.start_date.as_deref(), params.end_date.as_deref())?;
    let limit = state.limits.resolve(params.limit)?;

    let report = state.pipeline.run(range, limit).await?;

    Ok(HttpResponse::Ok().json(EmotionResponse {
        message: report.message(),
        processed: report.processed,
        matched: report.matched,
        failed: report.failed(),
    }))
}

fn parse_body(body: &[u8]) -> std::result::Result<RangeParams, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RangeParams::default());
    }
    serde_json::from_slice::<Option<RangeParams>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ValidationError::MalformedRequest(e.to_string()))
}
