use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use balancer_core::AppConfig;
use clap::{Arg, ArgAction, Command};
use tokio::{signal, task::JoinHandle};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod shutdown;

use app::Application;
use shutdown::ShutdownManager;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("scrape-balancer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("抓取任务负载均衡器")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，未指定时按默认路径查找"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("migrate")
                .long("migrate")
                .help("启动前运行数据库迁移")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);

    let config = AppConfig::load(config_path).with_context(|| match config_path {
        Some(path) => format!("加载配置文件失败: {path}"),
        None => "加载配置失败".to_string(),
    })?;

    let log_level = matches
        .get_one::<String>("log-level")
        .unwrap_or(&config.observability.log_level);
    let log_format = matches
        .get_one::<String>("log-format")
        .unwrap_or(&config.observability.log_format);
    init_logging(log_level, log_format)?;

    info!("启动抓取任务负载均衡器");
    if let Some(path) = config_path {
        info!("配置文件: {path}");
    }

    let app = Application::new(config, matches.get_flag("migrate")).await?;

    let shutdown_manager = ShutdownManager::new();

    let app_handle = {
        let app = Arc::new(app);
        let shutdown_rx = shutdown_manager.subscribe().await;

        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    run_until_shutdown(
        app_handle,
        wait_for_shutdown_signal(),
        &shutdown_manager,
        Duration::from_secs(30),
    )
    .await?;

    info!("抓取任务负载均衡器已退出");
    Ok(())
}

/// 等待关闭信号或服务提前退出
///
/// 服务提前退出（如端口被占用）时不再等待信号，直接返回错误，进程以非零状态退出。
async fn run_until_shutdown<F>(
    mut app_handle: JoinHandle<Result<()>>,
    shutdown_signal: F,
    shutdown_manager: &ShutdownManager,
    grace_period: Duration,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = shutdown_signal => {}
        result = &mut app_handle => {
            shutdown_manager.shutdown().await;
            return match result {
                Ok(Ok(())) => Err(anyhow::anyhow!("API服务器意外停止")),
                Ok(Err(e)) => {
                    error!("应用运行失败: {e:#}");
                    Err(e)
                }
                Err(e) => Err(anyhow::Error::new(e).context("应用任务异常退出")),
            };
        }
    }

    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(grace_period, app_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("应用已优雅关闭");
            Ok(())
        }
        Ok(Ok(Err(e))) => {
            error!("应用关闭时发生错误: {e:#}");
            Err(e)
        }
        Ok(Err(e)) => Err(anyhow::Error::new(e).context("应用任务异常退出")),
        Err(_) => {
            warn!("应用关闭超时，强制退出");
            Ok(())
        }
    }
}

/// 初始化日志系统
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
