//! Rate limiting against the running server.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

async fn login_from(gate: &common::TestGate, ip: &str) -> reqwest::Response {
    gate.client
        .post(gate.url("/api/v1/auth/login"))
        .header("X-Forwarded-For", ip)
        .json(&json!({ "email": "nobody@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sixth_login_is_rate_limited() {
    let gate = common::start_gate(|c| {
        c.rate_limit.max_requests = 5;
        c.rate_limit.window_secs = 60;
    })
    .await;

    for attempt in 1..=5 {
        let res = login_from(&gate, "1.2.3.4").await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "attempt {}", attempt);
    }

    let res = login_from(&gate, "1.2.3.4").await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()["retry-after"], "60");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["retryAfterSeconds"], 60);
    assert!(body["error"].is_string());

    // Other clients keep their own budget.
    let res = login_from(&gate, "5.6.7.8").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_first_forwarded_entry_is_the_client() {
    let gate = common::start_gate(|c| c.rate_limit.max_requests = 1).await;

    assert_eq!(login_from(&gate, "9.9.9.9, 10.0.0.1").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        login_from(&gate, "9.9.9.9, 10.0.0.2").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_endpoints_have_separate_budgets() {
    let gate = common::start_gate(|c| c.rate_limit.max_requests = 1).await;

    assert_eq!(login_from(&gate, "1.2.3.4").await.status(), StatusCode::UNAUTHORIZED);

    let res = gate
        .client
        .post(gate.url("/api/v1/auth/forgot-password"))
        .header("X-Forwarded-For", "1.2.3.4")
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_preflight_and_unlimited_routes_bypass() {
    let gate = common::start_gate(|c| c.rate_limit.max_requests = 1).await;

    for _ in 0..3 {
        let res = gate
            .client
            .request(reqwest::Method::OPTIONS, gate.url("/api/v1/auth/login"))
            .header("X-Forwarded-For", "1.2.3.4")
            .send()
            .await
            .unwrap();
        assert_ne!(res.status(), StatusCode::TOO_MANY_REQUESTS);

        let res = gate.client.get(gate.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_disabled_limiter_never_rejects() {
    let gate = common::start_gate(|c| {
        c.rate_limit.enabled = false;
        c.rate_limit.max_requests = 1;
    })
    .await;

    for _ in 0..4 {
        assert_eq!(login_from(&gate, "1.2.3.4").await.status(), StatusCode::UNAUTHORIZED);
    }
}
