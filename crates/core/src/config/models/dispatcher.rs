use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 分派与健康检查配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// 健康缓存条目的有效期
    pub health_cache_ttl_seconds: u64,
    /// 健康探测超时，与转发超时相互独立
    pub health_probe_timeout_seconds: u64,
    /// 转发到目标节点的请求超时
    pub request_timeout_seconds: u64,
    /// 静态Bearer令牌；未配置时每次转发都会现签身份令牌
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            health_cache_ttl_seconds: 30,
            health_probe_timeout_seconds: 5,
            request_timeout_seconds: 55,
            bearer_token: None,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.health_probe_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("健康探测超时时间必须大于0"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        if let Some(token) = &self.bearer_token {
            if token.chars().any(char::is_whitespace) {
                return Err(anyhow::anyhow!("Bearer令牌不能包含空白字符"));
            }
        }

        Ok(())
    }

    pub fn health_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.health_cache_ttl_seconds)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.health_probe_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// 空字符串视为未配置
    pub fn static_bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref().filter(|t| !t.is_empty())
    }
}
