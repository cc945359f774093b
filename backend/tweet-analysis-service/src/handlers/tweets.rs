use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::{ErrorResponse, Result};
use crate::models::{RangeParams, TweetsResponse};
use crate::query::{DateRange, PostQuery};

/// List Posts created within a date window, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tweets",
    tag = "Tweets",
    params(RangeParams),
    responses(
        (status = 200, description = "Posts in range", body = TweetsResponse),
        (status = 422, description = "Invalid date or limit", body = ErrorResponse),
        (status = 503, description = "Search index unavailable", body = ErrorResponse)
    )
)]
pub async fn list_tweets(
    state: web::Data<AppState>,
    params: web::Query<RangeParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let range = DateRange::from_days(params.start_date.as_deref(), params.end_date.as_deref())?;
    let limit = state.limits.resolve(params.limit)?;

    let retrieved = state.retrieval.fetch(&PostQuery::new(range, limit)).await?;

    Ok(HttpResponse::Ok().json(TweetsResponse {
        count: retrieved.posts.len(),
        total: retrieved.total_matches,
        limit: limit.get(),
        range_applied: (&range).into(),
        tweets: retrieved.posts,
    }))
}
