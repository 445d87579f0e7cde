//! # Balancer API
//!
//! 抓取负载均衡器的HTTP前端。
//!
//! - `POST /scrape`：派发任务，响应状态码与Worker一致
//! - `GET /targets/status`：目标节点负载与实时健康状态
//! - `GET /health`：进程存活检查
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use balancer_api::create_app;
//! # async fn run(orchestrator: Arc<balancer_dispatcher::DispatchOrchestrator>) -> std::io::Result<()> {
//! let app = create_app(orchestrator, &balancer_core::ApiConfig::default());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;

use balancer_core::ApiConfig;
use balancer_dispatcher::DispatchOrchestrator;
use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(orchestrator: Arc<DispatchOrchestrator>, api_config: &ApiConfig) -> Router {
    let app = create_routes(AppState { orchestrator });

    let app = if api_config.cors_enabled {
        app.layer(cors_layer(api_config))
    } else {
        app
    };

    app.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
