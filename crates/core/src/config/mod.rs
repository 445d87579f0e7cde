//! 配置管理
//!
//! 加载顺序（后者覆盖前者）：
//! 1. 内置默认值
//! 2. TOML配置文件
//! 3. 环境变量（前缀 `BALANCER_`，层级分隔符 `__`），
//!    例如 `BALANCER_DISPATCHER__BEARER_TOKEN`

pub mod models;

pub use models::{ApiConfig, AppConfig, DatabaseConfig, DispatcherConfig, ObservabilityConfig};

#[cfg(test)]
mod tests;
