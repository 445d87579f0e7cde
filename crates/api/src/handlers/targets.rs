use axum::{extract::State, Json};
use serde::Serialize;
use tracing::error;

use balancer_dispatcher::TargetStatus;

use super::now_rfc3339;
use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct TargetsStatusResponse {
    pub targets: Vec<TargetStatus>,
    pub time: String,
}

/// 列出所有目标节点的负载和实时健康状态
pub async fn targets_status(
    State(state): State<AppState>,
) -> ApiResult<Json<TargetsStatusResponse>> {
    let targets = state.orchestrator.targets_status().await.map_err(|e| {
        error!("获取目标节点列表失败: {}", e);
        ApiError::Internal("failed to get targets".to_string())
    })?;

    Ok(Json(TargetsStatusResponse {
        targets,
        time: now_rfc3339(),
    }))
}
