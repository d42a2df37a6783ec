// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// GET / - liveness banner
pub async fn root_get() -> impl IntoResponse {
    Json(json!({ "message": "Server is running.." }))
}

/// GET /health - reports whether the backing store answers
pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": "unavailable",
                    "code": "SERVICE_UNAVAILABLE"
                })),
            )
        }
    }
}
