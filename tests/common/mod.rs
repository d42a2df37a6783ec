#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use ticket_desk::auth::Credentials;
use ticket_desk::config::AppConfig;
use ticket_desk::AppState;

pub const PASSWORD: &str = "Engine#1843";

/// A server bound to a free port, backed by the in-memory stores
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let credentials = Credentials::new("integration-secret", chrono::Duration::days(30))?.with_hash_cost(64, 1)?;
        let app = ticket_desk::app(AppState::in_memory(credentials), &AppConfig::development());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Self::read(request.send().await?).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Self::read(request.send().await?).await
    }

    async fn read(response: reqwest::Response) -> Result<(StatusCode, Value)> {
        let status = response.status();
        let body = response.json::<Value>().await.context("response body is not JSON")?;
        Ok((status, body))
    }

    /// Registers a user and returns its id
    pub async fn register(&self, name: &str, email: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/users", &json!({ "name": name, "email": email, "password": PASSWORD }), None)
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        body["id"].as_str().map(str::to_string).context("missing id")
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/auth/login", &json!({ "email": email, "password": PASSWORD }), None)
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["token"].as_str().map(str::to_string).context("missing token")
    }

    /// Registers and logs in, returning `(user id, token)`
    pub async fn sign_up(&self, email: &str) -> Result<(String, String)> {
        let id = self.register("Test User", email).await?;
        let token = self.login(email).await?;
        Ok((id, token))
    }

    pub async fn create_ticket(&self, token: &str, created_by: &str, status: &str) -> Result<Value> {
        let (code, body) = self.post("/api/tickets", &ticket_payload(created_by, status), Some(token)).await?;
        anyhow::ensure!(code == StatusCode::CREATED, "create ticket failed: {} {}", code, body);
        Ok(body)
    }
}

pub fn ticket_payload(created_by: &str, status: &str) -> Value {
    json!({
        "title": "Summer Fest",
        "description": "Outdoor concert in the park",
        "type": "concert",
        "venue": "Central Park",
        "status": status,
        "priority": "high",
        "dueDate": (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339(),
        "createdBy": created_by
    })
}
