//! `/api/v1/auth/*` handlers.
//!
//! Thin adapters: input checks and JSON shaping live here, the behavior
//! lives in the token codec, the user store and the reset ledger.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password::{hash_password, strength_violations, verify_password};
use crate::auth::Role;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub token: Option<String>,
}

pub(super) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{} is required", field))),
    }
}

fn credentials(req: CredentialsRequest) -> Result<(String, String), ApiError> {
    let email = required(req.email, "Email")?;
    let password = required(req.password, "Password")?;
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Email is not valid".to_string()));
    }
    Ok((email.trim().to_string(), password))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (email, password) = credentials(req)?;

    let violations = strength_violations(&password);
    if !violations.is_empty() {
        return Err(ApiError::WeakPassword(violations));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = state.users.create(&email, password_hash, Role::User).await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(json!({ "id": user.id, "email": user.email }))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<Value>, ApiError> {
    let (email, password) = credentials(req)?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(ApiError::InvalidCredentials);
    };

    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&stored_hash, &password)).await?;
    if !matches {
        tracing::info!(user_id = user.id, "Login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .codec
        .issue(user.id, &user.email, user.role, state.codec.session_ttl())?;

    Ok(Json(json!({
        "token": token,
        "userId": user.id,
        "email": user.email,
        "role": user.role.as_str(),
    })))
}

/// Always answers the same way whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = required(req.email, "Email")?;
    state.ledger.request_reset(email.trim()).await?;

    Ok(Json(json!({
        "message": "If the email exists, you will receive a link to reset your password",
    })))
}

pub async fn validate_reset_token(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Result<Response, ApiError> {
    let token = required(query.token, "Token")?;

    if state.ledger.validate(&token).await? {
        Ok(Json(json!({ "valid": true })).into_response())
    } else {
        let body = json!({ "valid": false, "error": ApiError::InvalidResetToken.to_string() });
        Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = required(req.token, "Token")?;
    let new_password = required(req.new_password, "New password")?;

    state.ledger.consume(&token, &new_password).await?;

    Ok(Json(json!({ "message": "Password updated successfully" })))
}
