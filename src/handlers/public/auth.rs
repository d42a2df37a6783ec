// handlers/public/auth.rs - Account creation and token acquisition

use axum::extract::State;

use crate::database::models::UserSummary;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::LoginResponse;
use crate::state::AppState;

/// POST /api/users - register a new account
///
/// Body: `{ "name", "email", "password" }`. Responds 201 with `{ id, name, email }`.
pub async fn register_post(State(state): State<AppState>, JsonBody(payload): JsonBody) -> ApiResult<UserSummary> {
    let user = state.user_service().register(&payload).await?;
    Ok(ApiResponse::created(user))
}

/// POST /api/auth/login - exchange credentials for a bearer token
pub async fn login_post(State(state): State<AppState>, JsonBody(payload): JsonBody) -> ApiResult<LoginResponse> {
    let login = state.user_service().login(&payload).await?;
    Ok(ApiResponse::success(login))
}
