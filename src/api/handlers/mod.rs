mod auth;
mod notes;
mod todos;

use axum::{response::IntoResponse, Json};

pub use auth::*;
pub use notes::*;
pub use todos::*;

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
