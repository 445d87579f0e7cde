use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 目标节点（远程抓取Worker）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub healthy: bool,
    /// 仅在至少完成过一次探测后才会被设置
    pub last_checked: Option<DateTime<Utc>>,
}

impl Target {
    pub fn new(id: i64, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            healthy: true,
            last_checked: None,
        }
    }

    /// 拼接目标节点上的端点地址，容忍基础URL末尾的斜杠
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn has_been_probed(&self) -> bool {
        self.last_checked.is_some()
    }
}

/// 目标节点及其当前运行中的任务数（每次查询实时计算，不落库）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetLoad {
    #[serde(flatten)]
    pub target: Target,
    pub running_count: i64,
}

impl TargetLoad {
    pub fn new(target: Target, running_count: i64) -> Self {
        Self {
            target,
            running_count,
        }
    }

    pub fn id(&self) -> i64 {
        self.target.id
    }

    pub fn is_healthy(&self) -> bool {
        self.target.healthy
    }
}
