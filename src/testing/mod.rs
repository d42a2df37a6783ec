use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Credentials;
use crate::config::AppConfig;
use crate::database::models::{Ticket, User};
use crate::routes;
use crate::services::{TicketService, UserService};
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "Engine#1843";

/// In-memory application state with cheap password hashing, plus fixtures.
pub struct TestContext {
    pub state: AppState,
    pub config: AppConfig,
}

impl TestContext {
    pub fn new() -> Self {
        let config = AppConfig::development();
        let credentials = Credentials::new("test-secret", Duration::days(30))
            .and_then(|c| c.with_hash_cost(64, 1))
            .expect("test credentials");

        Self {
            state: AppState::in_memory(credentials),
            config,
        }
    }

    pub fn app(&self) -> Router {
        routes::app(self.state.clone(), &self.config)
    }

    pub fn users(&self) -> UserService {
        self.state.user_service()
    }

    pub fn tickets(&self) -> TicketService {
        self.state.ticket_service()
    }

    /// Registers a user through the service and returns the stored record
    pub async fn create_user(&self, email: &str) -> User {
        let summary = self
            .users()
            .register(&json!({ "name": "Test User", "email": email, "password": TEST_PASSWORD }))
            .await
            .expect("register test user");

        self.state
            .users
            .find_by_id(summary.id)
            .await
            .expect("load test user")
            .expect("test user stored")
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state.credentials.issue_token(user_id).expect("issue test token")
    }

    pub fn ticket_payload(&self, created_by: Uuid, status: &str) -> Value {
        json!({
            "title": "Summer Fest",
            "description": "Outdoor concert in the park",
            "type": "concert",
            "venue": "Central Park",
            "status": status,
            "priority": "high",
            "dueDate": (Utc::now() + Duration::days(30)).to_rfc3339(),
            "createdBy": created_by.to_string()
        })
    }

    pub async fn create_ticket(&self, created_by: Uuid, status: &str) -> Ticket {
        self.tickets()
            .create_ticket(&self.ticket_payload(created_by, status), created_by)
            .await
            .expect("create test ticket")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
