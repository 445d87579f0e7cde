use axum::Json;
use serde_json::{json, Value};

use super::now_rfc3339;

/// 进程可达即返回200
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "time": now_rfc3339(),
    }))
}
