use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use balancer_core::{
    models::TargetLoad, traits::TargetRegistry, traits::TargetSelectionStrategy, BalancerError,
    BalancerResult,
};

/// 最少负载策略：在健康节点中选择运行中任务最少的节点，负载相同时取ID最小者
pub struct LeastLoadedStrategy;

impl LeastLoadedStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LeastLoadedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetSelectionStrategy for LeastLoadedStrategy {
    async fn select_target(&self, candidates: &[TargetLoad]) -> BalancerResult<Option<TargetLoad>> {
        let selected = candidates
            .iter()
            .filter(|candidate| candidate.is_healthy())
            .min_by_key(|candidate| (candidate.running_count, candidate.id()));

        match selected {
            Some(target) => {
                debug!(
                    "最少负载策略选择目标节点: {} (运行中任务: {})",
                    target.target.name, target.running_count
                );
                Ok(Some(target.clone()))
            }
            None => {
                debug!("没有健康的目标节点");
                Ok(None)
            }
        }
    }

    fn name(&self) -> &str {
        "LeastLoaded"
    }
}

/// 目标节点选择器，从注册表读取当前负载并交给策略决定
pub struct TargetSelector {
    registry: Arc<dyn TargetRegistry>,
    strategy: Arc<dyn TargetSelectionStrategy>,
}

impl TargetSelector {
    pub fn new(
        registry: Arc<dyn TargetRegistry>,
        strategy: Arc<dyn TargetSelectionStrategy>,
    ) -> Self {
        Self { registry, strategy }
    }

    pub fn least_loaded(registry: Arc<dyn TargetRegistry>) -> Self {
        Self::new(registry, Arc::new(LeastLoadedStrategy::new()))
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// 选择一个目标节点
    ///
    /// 读取结果不与后续派发构成原子操作，并发选择可能落在同一节点上。
    pub async fn select_target(&self) -> BalancerResult<TargetLoad> {
        let candidates = self.registry.list_healthy_targets_with_load().await?;

        match self.strategy.select_target(&candidates).await? {
            Some(target) => Ok(target),
            None => {
                warn!(
                    "{} 策略未能找到可用节点 (候选数: {})",
                    self.strategy.name(),
                    candidates.len()
                );
                Err(BalancerError::NoAvailableTargets)
            }
        }
    }
}

#[cfg(test)]
#[path = "strategies_test.rs"]
mod strategies_test;
