use thiserror::Error;

/// 负载均衡器错误类型定义
#[derive(Debug, Error)]
pub enum BalancerError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("目标节点未找到: {id}")]
    TargetNotFound { id: i64 },

    #[error("任务未找到: {id}")]
    JobNotFound { id: i64 },

    #[error("没有可用的目标节点")]
    NoAvailableTargets,

    #[error("远程节点不可达: {0}")]
    RemoteUnavailable(String),

    #[error("远程节点执行失败: {0}")]
    RemoteFailure(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl BalancerError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn target_not_found(id: i64) -> Self {
        Self::TargetNotFound { id }
    }
    pub fn job_not_found(id: i64) -> Self {
        Self::JobNotFound { id }
    }
    pub fn remote_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::RemoteUnavailable(msg.into())
    }
    pub fn remote_failure<S: Into<String>>(msg: S) -> Self {
        Self::RemoteFailure(msg.into())
    }

    /// 存储层故障（连接、查询失败）
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            BalancerError::Database(_) | BalancerError::DatabaseOperation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BalancerError::TargetNotFound { .. } | BalancerError::JobNotFound { .. }
        )
    }

    /// 核心层从不自动重试，此标记仅供外部策略参考
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BalancerError::Database(_)
                | BalancerError::DatabaseOperation(_)
                | BalancerError::NoAvailableTargets
                | BalancerError::RemoteUnavailable(_)
        )
    }
}

/// 统一的Result类型
pub type BalancerResult<T> = std::result::Result<T, BalancerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(BalancerError::target_not_found(1).is_not_found());
        assert!(BalancerError::job_not_found(7).is_not_found());
        assert!(!BalancerError::NoAvailableTargets.is_not_found());

        assert!(BalancerError::database_error("connection reset").is_store_error());
        assert!(!BalancerError::remote_unavailable("timeout").is_store_error());

        assert!(BalancerError::remote_unavailable("timeout").is_retryable());
        assert!(!BalancerError::remote_failure("bad selector").is_retryable());
        assert!(!BalancerError::Internal("client".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = BalancerError::target_not_found(42);
        assert_eq!(err.to_string(), "目标节点未找到: 42");

        let err = BalancerError::remote_failure("blocked");
        assert_eq!(err.to_string(), "远程节点执行失败: blocked");
    }
}
