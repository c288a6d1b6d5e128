use std::sync::Arc;

use anyhow::{Context, Result};
use assistant_auth::auth::{ManualClock, MemoryTokenStore};
use assistant_auth::testing::{memory_state_with_clock, MemoryUserDirectory};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub struct TestServer {
    pub base_url: String,
    pub users: Arc<MemoryUserDirectory>,
    pub store: Arc<MemoryTokenStore>,
    pub clock: Arc<ManualClock>,
    pub client: reqwest::Client,
}

/// Serve the app on an unused port over in-memory backends.
///
/// The server task belongs to the calling test's runtime and stops with it.
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    // Whole seconds, matching the resolution of token timestamps
    let start = chrono::DateTime::from_timestamp(chrono::Utc::now().timestamp(), 0)
        .context("current time out of range")?;
    let clock = Arc::new(ManualClock::new(start));
    let backends = memory_state_with_clock(clock.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test port")?;
    let app = assistant_auth::app(backends.state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url,
        users: backends.users,
        store: backends.store,
        clock,
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }

    /// Log in and return the token, failing the test on anything but 200
    pub async fn token_for(&self, username: &str, password: &str) -> Result<String> {
        let (status, body) = self.login(username, password).await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response had no token")
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }

    pub async fn post_authed(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.post(self.url(path)).bearer_auth(token).send().await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }
}
