use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use balancer_core::{
    models::{JobStatus, TargetLoad},
    traits::TargetRegistry,
    BalancerError, BalancerResult, DispatcherConfig,
};

use crate::forwarder::{error_detail, WorkerClient, WorkerEnvelope, WorkerResponse};
use crate::health_cache::HealthCache;
use crate::strategies::TargetSelector;

pub const NO_AVAILABLE_TARGETS: &str = "no available targets";
pub const TARGET_UNHEALTHY: &str = "selected target is unhealthy";
pub const TARGET_SELECTION_FAILED: &str = "failed to load targets";

const STATUS_BAD_GATEWAY: u16 = 502;
const STATUS_SERVICE_UNAVAILABLE: u16 = 503;

/// 待派发的任务，任务行由外部以 pending 状态创建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub job_id: i64,
    pub job_type: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchBody {
    /// Worker返回的结构化响应，原样转交调用方
    Envelope(WorkerEnvelope),
    /// Worker返回的非结构化响应体
    Raw(Vec<u8>),
    /// 派发引擎自身的失败
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub status: u16,
    pub body: DispatchBody,
}

impl DispatchOutcome {
    fn engine_error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: DispatchBody::Error(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 单个目标节点的监控视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatus {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub healthy: bool,
    pub running_jobs: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    pub live_healthy: bool,
}

impl TargetStatus {
    fn from_load(load: TargetLoad, live_healthy: bool) -> Self {
        Self {
            id: load.target.id,
            name: load.target.name,
            url: load.target.url,
            healthy: load.target.healthy,
            running_jobs: load.running_count,
            last_checked: load.target.last_checked,
            live_healthy,
        }
    }
}

/// 任务派发编排器：选节点、健康闸门、标记运行、转发、记录结果
pub struct DispatchOrchestrator {
    registry: Arc<dyn TargetRegistry>,
    selector: TargetSelector,
    health: HealthCache,
    client: WorkerClient,
}

impl DispatchOrchestrator {
    pub fn new(
        registry: Arc<dyn TargetRegistry>,
        selector: TargetSelector,
        health: HealthCache,
        client: WorkerClient,
    ) -> Self {
        Self {
            registry,
            selector,
            health,
            client,
        }
    }

    /// 按配置组装默认组件：最少负载策略、HTTP健康探测、元数据身份令牌
    pub fn from_config(
        registry: Arc<dyn TargetRegistry>,
        config: &DispatcherConfig,
    ) -> BalancerResult<Self> {
        let selector = TargetSelector::least_loaded(Arc::clone(&registry));
        let health = HealthCache::from_config(Arc::clone(&registry), config)?;
        let client = WorkerClient::from_config(config)?;
        Ok(Self::new(registry, selector, health, client))
    }

    pub fn health_cache(&self) -> &HealthCache {
        &self.health
    }

    #[instrument(skip(self, request), fields(job_id = request.job_id, job_type = %request.job_type))]
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchOutcome {
        let job_id = request.job_id;

        let selected = match self.selector.select_target().await {
            Ok(selected) => selected,
            Err(BalancerError::NoAvailableTargets) => {
                warn!("没有可用的目标节点");
                return DispatchOutcome::engine_error(
                    STATUS_SERVICE_UNAVAILABLE,
                    NO_AVAILABLE_TARGETS,
                );
            }
            Err(e) => {
                error!("选择目标节点失败: {}", e);
                return DispatchOutcome::engine_error(
                    STATUS_SERVICE_UNAVAILABLE,
                    TARGET_SELECTION_FAILED,
                );
            }
        };
        let target = selected.target;

        if !self.health.check_health(&target).await {
            warn!(target_id = target.id, "目标节点 {} 不健康", target.name);
            return DispatchOutcome::engine_error(STATUS_SERVICE_UNAVAILABLE, TARGET_UNHEALTHY);
        }

        if let Err(e) = self
            .registry
            .set_job_status(job_id, JobStatus::Running, Some(target.id))
            .await
        {
            error!(target_id = target.id, "标记任务为运行中失败: {}", e);
        }

        let response = match self
            .client
            .forward(&target, &request.job_type, &request.payload)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = error_detail(&e);
                warn!(target_id = target.id, "转发任务失败: {}", message);
                self.record_result(job_id, None, &message).await;
                return DispatchOutcome::engine_error(STATUS_BAD_GATEWAY, message);
            }
        };

        let outcome = self.interpret(job_id, response).await;
        info!(
            target_id = target.id,
            status = outcome.status,
            "任务派发完成"
        );
        outcome
    }

    async fn interpret(&self, job_id: i64, response: WorkerResponse) -> DispatchOutcome {
        match response.job_result() {
            Ok(result) => self.record_result(job_id, Some(result), "").await,
            Err(e) => {
                warn!(status = response.status(), "{}", e);
                self.record_result(job_id, None, &error_detail(&e)).await;
            }
        }

        match response {
            WorkerResponse::Structured { status, envelope } => DispatchOutcome {
                status,
                body: DispatchBody::Envelope(envelope),
            },
            WorkerResponse::Opaque { status, body } => DispatchOutcome {
                status,
                body: DispatchBody::Raw(body),
            },
        }
    }

    /// 记录任务终态，写入失败只记录日志
    async fn record_result(&self, job_id: i64, result: Option<Vec<u8>>, error_message: &str) {
        if let Err(e) = self
            .registry
            .set_job_result(job_id, result, error_message)
            .await
        {
            error!(job_id, "记录任务结果失败: {}", e);
        }
    }

    /// 列出所有目标节点的负载与实时健康状态
    pub async fn targets_status(&self) -> BalancerResult<Vec<TargetStatus>> {
        let loads = self.registry.list_targets_with_load().await?;
        let live = self.health.check_all_targets(&loads).await;

        Ok(loads
            .into_iter()
            .map(|load| {
                let live_healthy = live.get(&load.id()).copied().unwrap_or(false);
                TargetStatus::from_load(load, live_healthy)
            })
            .collect())
    }
}
