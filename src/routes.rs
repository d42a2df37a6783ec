use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .merge(public_routes())
        // Protected API
        .merge(ticket_routes(state.clone()))
        .fallback(not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(public::register_post))
        .route("/api/auth/login", post(public::login_post))
}

fn ticket_routes(state: AppState) -> Router<AppState> {
    // The static analytics segment takes precedence over :ticketId
    Router::new()
        .route("/api/tickets", post(protected::ticket_post))
        .route("/api/tickets/analytics", get(protected::analytics_get))
        .route("/api/tickets/:ticketId", get(protected::ticket_get))
        .route("/api/tickets/:ticketId/assign", post(protected::assign_post))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    let security = &config.security;
    if !security.enable_cors {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    Some(layer.allow_origin(AllowOrigin::list(origins)))
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} {} not found", method, uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_reports_running() {
        let ctx = TestContext::new();
        let (status, body) = send(ctx.app(), Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Server is running.." }));
    }

    #[tokio::test]
    async fn health_is_ok_for_memory_store() {
        let ctx = TestContext::new();
        let (status, body) = send(ctx.app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let ctx = TestContext::new();
        let (status, body) = send(ctx.app(), Request::get("/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let ctx = TestContext::new();
        let (status, body) = send(ctx.app(), Request::get("/api/tickets/analytics").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let request = Request::get("/api/tickets/analytics")
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(ctx.app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_for_unknown_subject_is_rejected() {
        let ctx = TestContext::new();
        let token = ctx.state.credentials.issue_token(uuid::Uuid::new_v4()).unwrap();
        let request = Request::get("/api/tickets/analytics")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(ctx.app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn analytics_route_is_not_shadowed_by_ticket_id() {
        let ctx = TestContext::new();
        let user = ctx.create_user("ada@example.com").await;
        let token = ctx.token_for(user.id);

        let request = Request::get("/api/tickets/analytics")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(ctx.app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalTickets"], 0);
        assert_eq!(body["tickets"], json!([]));
    }

    #[tokio::test]
    async fn register_then_duplicate() {
        let ctx = TestContext::new();
        let payload = json!({ "name": "Ada Lovelace", "email": "ada@example.com", "password": "Engine#1843" });

        let (status, body) = send(ctx.app(), post_json("/api/users", payload.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("password").is_none());

        let (status, body) = send(ctx.app(), post_json("/api/users", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let ctx = TestContext::new();
        let request = Request::post("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\":"))
            .unwrap();
        let (status, body) = send(ctx.app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn empty_body_reports_first_missing_field() {
        let ctx = TestContext::new();
        let request = Request::post("/api/auth/login").body(Body::empty()).unwrap();
        let (status, body) = send(ctx.app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email is required");
    }
}
