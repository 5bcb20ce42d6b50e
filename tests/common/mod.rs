//! Shared harness: runs the real server on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use wellness_gate::auth::Role;
use wellness_gate::config::GateConfig;
use wellness_gate::http::HttpServer;
use wellness_gate::lifecycle::Shutdown;
use wellness_gate::mail::OutboxMailer;
use wellness_gate::store::{InMemoryTokenStore, InMemoryUserStore, User};

pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const PASSWORD: &str = "Str0ng!Secret";

pub struct TestGate {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub users: InMemoryUserStore,
    pub tokens: InMemoryTokenStore,
    pub outbox: Arc<OutboxMailer>,
    shutdown: Shutdown,
}

impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn add_user(&self, email: &str, role: Role) -> User {
        self.users.create_user(email, PASSWORD, role).unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("gate unreachable")
    }

    /// Log in and return the bearer token.
    pub async fn token_for(&self, email: &str) -> String {
        let res = self.login(email, PASSWORD).await;
        assert_eq!(res.status(), 200, "login failed for {}", email);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Reset token from the last mail sent to `email`.
    pub fn mailed_token(&self, email: &str) -> Option<String> {
        let mail = self.outbox.last_to(email)?;
        let start = mail.body.find("?token=")? + "?token=".len();
        mail.body[start..].split_whitespace().next().map(str::to_string)
    }
}

impl Drop for TestGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config
}

/// Start a gate with `configure` applied to the test config.
pub async fn start_gate(configure: impl FnOnce(&mut GateConfig)) -> TestGate {
    let mut config = test_config();
    configure(&mut config);

    let users = InMemoryUserStore::new(None);
    let tokens = InMemoryTokenStore::new();
    let outbox = Arc::new(OutboxMailer::new());

    let server = HttpServer::new(
        config,
        Arc::new(users.clone()),
        Arc::new(tokens.clone()),
        outbox.clone(),
    )
    .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    TestGate {
        addr,
        client,
        users,
        tokens,
        outbox,
        shutdown,
    }
}
