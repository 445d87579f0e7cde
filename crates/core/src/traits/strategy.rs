use async_trait::async_trait;

use crate::models::TargetLoad;
use crate::BalancerResult;

/// 目标节点选择策略接口
#[async_trait]
pub trait TargetSelectionStrategy: Send + Sync {
    /// 从候选节点中选出一个，没有合适节点时返回None
    async fn select_target(&self, candidates: &[TargetLoad]) -> BalancerResult<Option<TargetLoad>>;

    /// 获取策略名称
    fn name(&self) -> &str;
}
