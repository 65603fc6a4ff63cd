// src/handlers/mod.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

pub mod auth;
pub mod quiz;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
