#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use eyesonasset_api::app::{self, AppState};
use eyesonasset_api::config::AppConfig;
use eyesonasset_api::database::DatabaseManager;

pub const TEST_SECRET: &str = "integration-test-secret";

/// A real router on its own port, backed by a private in-memory database.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub prefix: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}).await
    }

    /// Start with development defaults adjusted by `configure`
    pub async fn start_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let mut config = AppConfig::development();
        config.database.url = "sqlite::memory:".to_string();
        config.security.jwt_secret = TEST_SECRET.to_string();
        configure(&mut config);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let prefix = config.api.prefix.clone();

        let db = DatabaseManager::connect_in_memory().await?;
        let state = AppState::with_database(config, db)?;
        state.seed_default_user().await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let router = app::router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            prefix,
            client: reqwest::Client::new(),
            state,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Absolute URL for a path under the API prefix
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    pub async fn signup(&self, login: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/user"))
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await?)
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/auth"))
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await?)
    }

    /// Sign up a fresh account and return a bearer token for it
    pub async fn token(&self) -> Result<String> {
        let login = format!("tester-{}", uuid::Uuid::new_v4().simple());
        let res = self.signup(&login, "secret-pw").await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "signup failed: {}", res.status());

        let res = self.login(&login, "secret-pw").await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .context("login response had no access_token")
    }

    pub async fn create_owner(&self, token: &str, email: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/owner"))
            .bearer_auth(token)
            .json(&json!({ "name": "Owner", "email": email, "phone": "555-0100" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "owner create failed: {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn create_asset(&self, token: &str, owner_id: &str, name: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/asset"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "category": "Tool", "owner_id": owner_id }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "asset create failed: {}", res.status());
        Ok(res.json().await?)
    }
}
