//! Liveness probe.

use axum::Json;
use serde_json::{json, Value};

/// Report that the process is up. Does not touch the store.
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
