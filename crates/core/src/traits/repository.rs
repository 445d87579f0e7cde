//! 数据仓储层接口定义
//!
//! 目标节点与任务记录都保存在共享存储中，存储是除健康缓存之外一切状态的唯一权威来源。
//! 每个操作各自独立一致，核心层不使用多语句事务。

use async_trait::async_trait;

use crate::models::{Job, JobStatus, Target, TargetLoad};
use crate::BalancerResult;

/// 目标节点注册表
#[async_trait]
pub trait TargetRegistry: Send + Sync {
    /// 列出所有目标节点及其运行中任务数，按ID升序，包含不健康节点
    async fn list_targets_with_load(&self) -> BalancerResult<Vec<TargetLoad>>;

    /// 仅列出健康的目标节点，按运行中任务数升序、ID升序
    async fn list_healthy_targets_with_load(&self) -> BalancerResult<Vec<TargetLoad>>;

    /// 根据ID获取目标节点
    async fn get_target(&self, id: i64) -> BalancerResult<Target>;

    /// 更新健康标记并将last_checked设为当前时间
    async fn set_target_health(&self, id: i64, healthy: bool) -> BalancerResult<()>;

    /// 更新任务状态
    ///
    /// - `Running`: 同时写入target_id与started_at
    /// - `Completed` / `Failed`: 写入completed_at，不修改target_id
    /// - 其他状态: 只修改status
    async fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
        target_id: Option<i64>,
    ) -> BalancerResult<()>;

    /// 写入任务结果
    ///
    /// `error_message` 为空表示成功：状态置为completed并保存result；
    /// 否则状态置为failed并保存错误信息。两种情况都会写入completed_at。
    async fn set_job_result(
        &self,
        id: i64,
        result: Option<Vec<u8>>,
        error_message: &str,
    ) -> BalancerResult<()>;

    /// 根据ID获取任务
    async fn get_job(&self, id: i64) -> BalancerResult<Job>;
}
