//! Health check endpoint.

use axum::Json;

/// GET /health — returns service health status.
pub async fn check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
