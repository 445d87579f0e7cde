use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use balancer_core::{
    models::{Target, TargetLoad},
    traits::TargetRegistry,
    BalancerError, BalancerResult, DispatcherConfig,
};

/// 单个目标节点的存活探测
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// 任何网络错误、超时或非200响应都视为不健康
    async fn probe(&self, target: &Target) -> bool;
}

/// 通过 `GET {url}/health` 探测，仅 200 OK 视为健康
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> BalancerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BalancerError::Internal(format!("构建健康探测HTTP客户端失败: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, target: &Target) -> bool {
        match self.client.get(target.endpoint("health")).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(target_id = target.id, "健康探测失败: {}", e);
                false
            }
        }
    }
}

/// 内存中的健康缓存条目，进程重启后清空
#[derive(Debug, Clone, Copy)]
pub struct HealthCacheEntry {
    pub healthy: bool,
    pub checked_at: Instant,
}

impl HealthCacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.checked_at.elapsed() < ttl
    }
}

pub struct HealthCache {
    registry: Arc<dyn TargetRegistry>,
    probe: Arc<dyn HealthProbe>,
    ttl: Duration,
    entries: RwLock<HashMap<i64, HealthCacheEntry>>,
}

impl HealthCache {
    pub fn new(
        registry: Arc<dyn TargetRegistry>,
        probe: Arc<dyn HealthProbe>,
        ttl: Duration,
    ) -> Self {
        Self {
            registry,
            probe,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(
        registry: Arc<dyn TargetRegistry>,
        config: &DispatcherConfig,
    ) -> BalancerResult<Self> {
        let probe = HttpHealthProbe::new(config.health_probe_timeout())?;
        Ok(Self::new(registry, Arc::new(probe), config.health_cache_ttl()))
    }

    /// 检查目标节点是否可用
    ///
    /// TTL内直接返回缓存结果；过期或未探测过时同步探测，写回缓存，
    /// 并在后台任务中持久化到注册表。持久化失败只记录日志。
    pub async fn check_health(&self, target: &Target) -> bool {
        let cached = self.entries.read().await.get(&target.id).copied();
        if let Some(entry) = cached.filter(|entry| entry.is_fresh(self.ttl)) {
            return entry.healthy;
        }

        let healthy = self.probe.probe(target).await;

        self.entries.write().await.insert(
            target.id,
            HealthCacheEntry {
                healthy,
                checked_at: Instant::now(),
            },
        );

        let registry = Arc::clone(&self.registry);
        let target_id = target.id;
        tokio::spawn(async move {
            if let Err(e) = registry.set_target_health(target_id, healthy).await {
                warn!(target_id, "持久化健康状态失败: {}", e);
            }
        });

        debug!(target_id = target.id, healthy, "目标节点健康探测完成");
        healthy
    }

    /// 并发检查所有给定目标，等待全部完成后返回完整映射
    pub async fn check_all_targets(&self, targets: &[TargetLoad]) -> HashMap<i64, bool> {
        let checks = targets.iter().map(|load| async move {
            let healthy = self.check_health(&load.target).await;
            (load.id(), healthy)
        });

        join_all(checks).await.into_iter().collect()
    }

    /// 只读查看缓存，不触发探测，也不考虑TTL
    pub async fn cached(&self, target_id: i64) -> Option<bool> {
        self.entries
            .read()
            .await
            .get(&target_id)
            .map(|entry| entry.healthy)
    }
}
