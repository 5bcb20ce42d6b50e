//! Password recovery end to end.

use reqwest::StatusCode;
use serde_json::{json, Value};

use wellness_gate::auth::Role;

mod common;

const NEW_PASSWORD: &str = "Fr3sh!Start99";

async fn forgot(gate: &common::TestGate, email: &str) -> reqwest::Response {
    gate.client
        .post(gate.url("/api/v1/auth/forgot-password"))
        .json(&json!({ "email": email }))
        .send()
        .await
        .unwrap()
}

async fn reset(gate: &common::TestGate, token: &str, password: &str) -> reqwest::Response {
    gate.client
        .post(gate.url("/api/v1/auth/reset-password"))
        .json(&json!({ "token": token, "newPassword": password }))
        .send()
        .await
        .unwrap()
}

async fn validate(gate: &common::TestGate, token: &str) -> (StatusCode, Value) {
    let res = gate
        .client
        .get(gate.url("/api/v1/auth/reset-password/validate"))
        .query(&[("token", token)])
        .send()
        .await
        .unwrap();
    (res.status(), res.json().await.unwrap())
}

#[tokio::test]
async fn test_full_reset_flow() {
    let gate = common::start_gate(|c| c.password_reset.frontend_url = "https://app.example.com/reset".into()).await;
    gate.add_user("dana@example.com", Role::User);

    assert_eq!(forgot(&gate, "dana@example.com").await.status(), StatusCode::OK);
    let mail = gate.outbox.last_to("dana@example.com").expect("reset mail");
    assert!(mail.body.contains("https://app.example.com/reset?token="));
    let token = gate.mailed_token("dana@example.com").unwrap();

    let (status, body) = validate(&gate, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    assert_eq!(reset(&gate, &token, NEW_PASSWORD).await.status(), StatusCode::OK);

    assert_eq!(gate.login("dana@example.com", NEW_PASSWORD).await.status(), StatusCode::OK);
    assert_eq!(
        gate.login("dana@example.com", common::PASSWORD).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // Single use.
    let res = reset(&gate, &token, "An0ther!Choice").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let (status, body) = validate(&gate, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_unknown_email_gets_same_answer() {
    let gate = common::start_gate(|_| {}).await;
    gate.add_user("eli@example.com", Role::User);

    let known = forgot(&gate, "eli@example.com").await;
    let unknown = forgot(&gate, "nobody@example.com").await;
    assert_eq!(known.status(), unknown.status());

    let known: Value = known.json().await.unwrap();
    let unknown: Value = unknown.json().await.unwrap();
    assert_eq!(known, unknown);

    assert!(gate.outbox.last_to("nobody@example.com").is_none());
    assert_eq!(gate.tokens.len(), 1);
}

#[tokio::test]
async fn test_new_request_supersedes_old_token() {
    let gate = common::start_gate(|_| {}).await;
    gate.add_user("fin@example.com", Role::User);

    forgot(&gate, "fin@example.com").await;
    let first = gate.mailed_token("fin@example.com").unwrap();
    forgot(&gate, "fin@example.com").await;
    let second = gate.mailed_token("fin@example.com").unwrap();

    assert_eq!(reset(&gate, &first, NEW_PASSWORD).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(reset(&gate, &second, NEW_PASSWORD).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_weak_password_rejected_without_burning_token() {
    let gate = common::start_gate(|_| {}).await;
    gate.add_user("gus@example.com", Role::User);

    forgot(&gate, "gus@example.com").await;
    let token = gate.mailed_token("gus@example.com").unwrap();

    let res = reset(&gate, &token, "short").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["details"].as_array().unwrap().len() > 1);
    assert!(body["requirements"].is_string());

    assert_eq!(reset(&gate, &token, NEW_PASSWORD).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let gate = common::start_gate(|_| {}).await;

    let res = gate
        .client
        .post(gate.url("/api/v1/auth/forgot-password"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = gate
        .client
        .post(gate.url("/api/v1/auth/reset-password"))
        .json(&json!({ "token": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
