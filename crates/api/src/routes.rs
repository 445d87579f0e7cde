use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use balancer_dispatcher::DispatchOrchestrator;

use crate::handlers::{dispatch::scrape, health::health_check, targets::targets_status};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DispatchOrchestrator>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/scrape", post(scrape))
        .route("/targets/status", get(targets_status))
        .with_state(state)
}
