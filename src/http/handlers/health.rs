use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "UP", "version": env!("CARGO_PKG_VERSION") }))
}
