use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde_json::Value;

use crate::error::ApiError;

/// Raw JSON request body. An empty body reads as `null`, which the validators
/// treat like an empty object; malformed JSON is rejected with `INVALID_JSON`.
/// A body over the configured limit keeps its 413.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(rejection.body_text()),
                _ => ApiError::bad_request(rejection.body_text()),
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Null));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| ApiError::invalid_json(format!("Malformed JSON body: {}", e)))
    }
}
