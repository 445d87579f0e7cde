use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use balancer_core::{models::Target, BalancerError, BalancerResult, DispatcherConfig};

/// GCE/Cloud Run 实例元数据服务的身份令牌端点
pub const METADATA_IDENTITY_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/identity";

/// 为目标节点签发身份令牌，受众为目标节点URL
#[async_trait]
pub trait IdentityTokenProvider: Send + Sync {
    async fn identity_token(&self, audience: &str) -> BalancerResult<String>;
}

/// 从实例元数据服务获取签名的ID令牌，每次调用都重新获取
pub struct MetadataIdentityTokenProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl MetadataIdentityTokenProvider {
    pub fn new() -> BalancerResult<Self> {
        Self::with_endpoint(METADATA_IDENTITY_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> BalancerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| BalancerError::Internal(format!("构建元数据HTTP客户端失败: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl IdentityTokenProvider for MetadataIdentityTokenProvider {
    async fn identity_token(&self, audience: &str) -> BalancerResult<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("audience", audience), ("format", "full")])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BalancerError::remote_unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BalancerError::remote_unavailable(format!(
                "metadata server returned {status}"
            )));
        }

        let token = response
            .text()
            .await
            .map_err(|e| BalancerError::remote_unavailable(e.to_string()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(BalancerError::remote_unavailable(
                "metadata server returned an empty token",
            ));
        }
        Ok(token.to_string())
    }
}

/// 固定令牌，主要用于测试
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityTokenProvider for StaticTokenProvider {
    async fn identity_token(&self, _audience: &str) -> BalancerResult<String> {
        Ok(self.token.clone())
    }
}

/// Worker返回的结构化响应
///
/// 只有包含布尔型 `success` 字段的JSON对象才会被识别为结构化响应。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResponse {
    Structured { status: u16, envelope: WorkerEnvelope },
    Opaque { status: u16, body: Vec<u8> },
}

impl WorkerResponse {
    /// 先尝试结构化解码，失败则保留原始字节
    pub fn decode(status: u16, body: Vec<u8>) -> Self {
        match serde_json::from_slice::<WorkerEnvelope>(&body) {
            Ok(envelope) => WorkerResponse::Structured { status, envelope },
            Err(_) => WorkerResponse::Opaque { status, body },
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            WorkerResponse::Structured { status, .. } | WorkerResponse::Opaque { status, .. } => {
                *status
            }
        }
    }

    /// 解读为任务结果：成功时返回非空的结果字节，失败时返回带错误信息的 `RemoteFailure`
    ///
    /// 结构化成功但没有data时保存JSON `null`；非结构化响应体为空时无论状态码都视为失败，
    /// 保证完成的任务一定带有结果。
    pub fn job_result(&self) -> BalancerResult<Vec<u8>> {
        match self {
            WorkerResponse::Structured { envelope, .. } if envelope.success => {
                let data = envelope.data.as_ref().unwrap_or(&Value::Null);
                Ok(data.to_string().into_bytes())
            }
            WorkerResponse::Structured { envelope, .. } => {
                let message = envelope
                    .error
                    .clone()
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| "worker reported failure without error message".to_string());
                Err(BalancerError::remote_failure(message))
            }
            WorkerResponse::Opaque { status, body } if body.is_empty() => Err(
                BalancerError::remote_failure(format!(
                    "worker returned status {status} with empty body"
                )),
            ),
            WorkerResponse::Opaque { status, body } if *status == 200 => Ok(body.clone()),
            WorkerResponse::Opaque { body, .. } => Err(BalancerError::remote_failure(
                String::from_utf8_lossy(body).into_owned(),
            )),
        }
    }
}

#[derive(Serialize)]
struct ForwardBody<'a> {
    job_type: &'a str,
    payload: &'a Value,
}

/// 向目标节点转发抓取任务的HTTP客户端
pub struct WorkerClient {
    client: reqwest::Client,
    bearer_token: Option<String>,
    token_provider: Arc<dyn IdentityTokenProvider>,
}

impl WorkerClient {
    pub fn new(
        request_timeout: Duration,
        bearer_token: Option<String>,
        token_provider: Arc<dyn IdentityTokenProvider>,
    ) -> BalancerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BalancerError::Internal(format!("构建转发HTTP客户端失败: {e}")))?;
        Ok(Self {
            client,
            bearer_token,
            token_provider,
        })
    }

    pub fn from_config(config: &DispatcherConfig) -> BalancerResult<Self> {
        Self::new(
            config.request_timeout(),
            config.static_bearer_token().map(str::to_string),
            Arc::new(MetadataIdentityTokenProvider::new()?),
        )
    }

    /// 静态令牌优先，否则按目标节点URL现签身份令牌
    async fn bearer_for(&self, target: &Target) -> BalancerResult<String> {
        if let Some(token) = &self.bearer_token {
            return Ok(token.clone());
        }

        self.token_provider
            .identity_token(&target.url)
            .await
            .map_err(|e| {
                BalancerError::remote_unavailable(format!(
                    "failed to get identity token: {}",
                    error_detail(&e)
                ))
            })
    }

    /// 转发任务，任何传输层失败都返回 `RemoteUnavailable`
    pub async fn forward(
        &self,
        target: &Target,
        job_type: &str,
        payload: &Value,
    ) -> BalancerResult<WorkerResponse> {
        let token = self.bearer_for(target).await?;

        let response = self
            .client
            .post(target.endpoint("scrape"))
            .bearer_auth(token)
            .json(&ForwardBody { job_type, payload })
            .send()
            .await
            .map_err(|e| {
                BalancerError::remote_unavailable(format!("worker request failed: {e}"))
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            BalancerError::remote_unavailable(format!("failed to read worker response: {e}"))
        })?;

        debug!(target_id = target.id, status, bytes = body.len(), "收到Worker响应");
        Ok(WorkerResponse::decode(status, body.to_vec()))
    }
}

/// 取出错误携带的原始信息，不带分类前缀
pub fn error_detail(err: &BalancerError) -> String {
    match err {
        BalancerError::RemoteUnavailable(msg)
        | BalancerError::RemoteFailure(msg)
        | BalancerError::Internal(msg) => msg.clone(),
        other => other.to_string(),
    }
}
