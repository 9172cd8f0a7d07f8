//! Liveness probes

use axum::Json;
use serde_json::{Value, json};

pub async fn test() -> Json<Value> {
    Json(json!({ "message": "working" }))
}
