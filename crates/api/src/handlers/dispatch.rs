use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use balancer_dispatcher::{DispatchBody, DispatchOutcome, DispatchRequest};

use crate::{
    error::{ApiError, ApiResult},
    routes::AppState,
};

/// 派发一个抓取任务
///
/// 不校验 Content-Type，请求体能解析为 `{job_id, job_type, payload}` 即可。
pub async fn scrape(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let request: DispatchRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!("无法解析派发请求: {}", e);
        ApiError::InvalidBody
    })?;

    let outcome = state.orchestrator.dispatch(request).await;
    Ok(outcome_response(outcome))
}

/// 状态码与Worker保持一致，响应体按结果类型编码
pub fn outcome_response(outcome: DispatchOutcome) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);

    match outcome.body {
        DispatchBody::Envelope(envelope) => (status, Json(envelope)).into_response(),
        DispatchBody::Raw(body) => {
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        DispatchBody::Error(message) => {
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}
