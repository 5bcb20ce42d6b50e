//! Account handlers behind the gate.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::auth::required;
use crate::auth::password::{hash_password, strength_violations, verify_password};
use crate::auth::{resolve_user_id, Principal, Role, UserId};
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, ApiError> {
    let user_id = resolve_user_id(None, &principal).ok_or(ApiError::NotAuthenticated)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "id": user.id,
        "email": user.email,
        "role": user.role.as_str(),
        "createdAt": user.created_at,
    })))
}

/// Replace the caller's password after checking the current one.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = resolve_user_id(None, &principal).ok_or(ApiError::NotAuthenticated)?;
    let current = required(req.current_password, "Current password")?;
    let new_password = required(req.new_password, "New password")?;

    let violations = strength_violations(&new_password);
    if !violations.is_empty() {
        return Err(ApiError::WeakPassword(violations));
    }

    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&stored_hash, &current)).await?;
    if !matches {
        tracing::info!(user_id, "Password change rejected");
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    user.password_hash = tokio::task::spawn_blocking(move || hash_password(&new_password))
        .await?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    state.users.save(user).await?;

    tracing::info!(user_id, "Password changed");
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

/// Promote a user to ADMIN. The gate has already checked the caller's role.
pub async fn make_admin(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.role != Role::Admin {
        user.role = Role::Admin;
        state.users.save(user).await?;
    }

    tracing::info!(user_id = id, granted_by = ?principal.subject_id(), "Admin role granted");
    Ok(StatusCode::NO_CONTENT)
}
