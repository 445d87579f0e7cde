use std::sync::Arc;

use anyhow::{Context, Result};
use balancer_api::create_app;
use balancer_core::{traits::TargetRegistry, AppConfig};
use balancer_dispatcher::DispatchOrchestrator;
use balancer_infrastructure::database::{DatabaseManager, PostgresTargetRegistry};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;

/// 主应用程序
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    orchestrator: Arc<DispatchOrchestrator>,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig, run_migrations: bool) -> Result<Self> {
        info!("初始化应用程序");

        let database = DatabaseManager::new(&config.database)
            .await
            .context("连接数据库失败")?;
        database
            .health_check()
            .await
            .context("数据库健康检查失败")?;
        info!("已连接数据库");

        if run_migrations {
            database.migrate().await.context("数据库迁移失败")?;
        }

        let registry: Arc<dyn TargetRegistry> =
            Arc::new(PostgresTargetRegistry::new(database.pool().clone()));
        let orchestrator = DispatchOrchestrator::from_config(registry, &config.dispatcher)
            .context("创建派发编排器失败")?;

        info!(
            "健康缓存TTL: {:?}, 转发超时: {:?}, 静态令牌: {}",
            config.dispatcher.health_cache_ttl(),
            config.dispatcher.request_timeout(),
            if config.dispatcher.static_bearer_token().is_some() {
                "已配置"
            } else {
                "未配置，使用实例身份令牌"
            }
        );

        Ok(Self {
            config,
            database,
            orchestrator: Arc::new(orchestrator),
        })
    }

    /// 运行HTTP服务直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let app = create_app(Arc::clone(&self.orchestrator), &self.config.api);

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        self.database.close().await;
        info!("API服务器已停止");
        Ok(())
    }
}
