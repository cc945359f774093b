use actix_web::{web, HttpResponse};
use tracing::warn;

use super::AppState;
use crate::models::HealthResponse;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Search index reachable", body = HealthResponse),
        (status = 503, description = "Search index unreachable", body = HealthResponse)
    )
)]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ok".to_string(),
            store: "up".to_string(),
        }),
        Err(e) => {
            warn!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded".to_string(),
                store: "down".to_string(),
            })
        }
    }
}
