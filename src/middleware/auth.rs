use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user resolved from the bearer token
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// JWT authentication middleware that validates tokens and loads the acting user
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(request.headers()).map_err(ApiError::unauthorized)?;

    // Validate and decode JWT
    let claims = state.credentials.verify_token(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Not authorized, token failed")
    })?;

    // The subject must still exist
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authorized, user not found"))?;

    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Not authorized, no token")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Not authorized, invalid Authorization header")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Not authorized, no token"),
        None => Err("Not authorized, Authorization header must use Bearer token format"),
    }
}
