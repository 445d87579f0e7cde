use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use balancer_api::create_app;
use balancer_core::{models::JobStatus, traits::TargetRegistry, ApiConfig};
use balancer_dispatcher::{
    DispatchOrchestrator, HealthCache, HttpHealthProbe, StaticTokenProvider, TargetSelector,
    WorkerClient,
};
use balancer_testing_utils::{FakeWorkerNode, JobBuilder, MockTargetRegistry, TargetBuilder};
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_app(registry: Arc<MockTargetRegistry>, api_config: &ApiConfig) -> Router {
    let shared: Arc<dyn TargetRegistry> = registry;
    let selector = TargetSelector::least_loaded(Arc::clone(&shared));
    let health = HealthCache::new(
        Arc::clone(&shared),
        Arc::new(HttpHealthProbe::new(Duration::from_secs(5)).unwrap()),
        Duration::from_secs(30),
    );
    let client = WorkerClient::new(
        Duration::from_secs(5),
        Some("api-test-token".to_string()),
        Arc::new(StaticTokenProvider::new("unused")),
    )
    .unwrap();
    let orchestrator = DispatchOrchestrator::new(shared, selector, health, client);

    create_app(Arc::new(orchestrator), api_config)
}

fn scrape_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scrape")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_body(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn read_json(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).unwrap()
}

async fn registry_with_worker(worker: &FakeWorkerNode) -> Arc<MockTargetRegistry> {
    let registry = Arc::new(MockTargetRegistry::with_targets(vec![TargetBuilder::new()
        .with_id(1)
        .with_url(&worker.address)
        .build()]));
    registry.insert_job(JobBuilder::new().with_id(42).build());
    registry
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(MockTargetRegistry::new()), &ApiConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(chrono::DateTime::parse_from_rfc3339(body["time"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_scrape_rejects_invalid_body() {
    let app = create_test_app(Arc::new(MockTargetRegistry::new()), &ApiConfig::default());

    let response = app.oneshot(scrape_request("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({"error": "invalid request body"})
    );
}

#[tokio::test]
async fn test_scrape_without_targets_is_unavailable() {
    let registry = Arc::new(MockTargetRegistry::new());
    let app = create_test_app(registry.clone(), &ApiConfig::default());

    let response = app
        .oneshot(scrape_request(
            r#"{"job_id": 42, "job_type": "search", "payload": {}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        read_json(response).await,
        json!({"error": "no available targets"})
    );
    assert_eq!(registry.job_write_count(), 0);
}

#[tokio::test]
async fn test_scrape_relays_structured_envelope() {
    let worker = FakeWorkerNode::spawn().await;
    worker.respond_json(200, json!({"success": true, "data": {"x": 1}}));
    let registry = registry_with_worker(&worker).await;
    let app = create_test_app(registry.clone(), &ApiConfig::default());

    let response = app
        .oneshot(scrape_request(
            r#"{"job_id": 42, "job_type": "product_page", "payload": {"sku": "A1"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"success": true, "data": {"x": 1}})
    );

    let forwarded = worker.scrapes();
    assert_eq!(forwarded[0].body["payload"], json!({"sku": "A1"}));
    assert_eq!(
        forwarded[0].authorization.as_deref(),
        Some("Bearer api-test-token")
    );
    assert_eq!(registry.job(42).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_scrape_relays_raw_body_with_worker_status() {
    let worker = FakeWorkerNode::spawn().await;
    worker.respond_with(503, "maintenance");
    let registry = registry_with_worker(&worker).await;
    let app = create_test_app(registry.clone(), &ApiConfig::default());

    let response = app
        .oneshot(scrape_request(r#"{"job_id": 42, "job_type": "search"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(read_body(response).await, b"maintenance");

    let job = registry.job(42).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("maintenance"));
}

#[tokio::test]
async fn test_scrape_unreachable_worker_is_bad_gateway() {
    let worker = FakeWorkerNode::spawn().await;
    worker.set_scrape_delay(Duration::from_secs(30));
    let registry = registry_with_worker(&worker).await;

    let shared: Arc<dyn TargetRegistry> = registry.clone();
    let orchestrator = DispatchOrchestrator::new(
        Arc::clone(&shared),
        TargetSelector::least_loaded(Arc::clone(&shared)),
        HealthCache::new(
            Arc::clone(&shared),
            Arc::new(HttpHealthProbe::new(Duration::from_secs(5)).unwrap()),
            Duration::from_secs(30),
        ),
        WorkerClient::new(
            Duration::from_millis(100),
            Some("t".to_string()),
            Arc::new(StaticTokenProvider::new("unused")),
        )
        .unwrap(),
    );
    let app = create_app(Arc::new(orchestrator), &ApiConfig::default());

    let response = app
        .oneshot(scrape_request(r#"{"job_id": 42, "job_type": "search"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("worker request failed"));
    assert_eq!(registry.job(42).unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn test_targets_status_endpoint() {
    let worker = FakeWorkerNode::spawn().await;
    let registry = registry_with_worker(&worker).await;
    registry.insert_job(JobBuilder::new().with_id(7).running_on(1).build());
    let app = create_test_app(registry, &ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/targets/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let targets = body["targets"].as_array().unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0]["id"], 1);
    assert_eq!(targets[0]["name"], "vps-1");
    assert_eq!(targets[0]["running_jobs"], 1);
    assert_eq!(targets[0]["healthy"], true);
    assert_eq!(targets[0]["live_healthy"], true);
    assert!(targets[0].get("last_checked").is_none());
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn test_targets_status_store_failure() {
    let registry = Arc::new(MockTargetRegistry::new());
    registry.fail_reads(true);
    let app = create_test_app(registry, &ApiConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/targets/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await,
        json!({"error": "failed to get targets"})
    );
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let api_config = ApiConfig {
        cors_origins: vec!["https://dashboard.example.com".to_string()],
        ..ApiConfig::default()
    };
    let app = create_test_app(Arc::new(MockTargetRegistry::new()), &api_config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://dashboard.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://dashboard.example.com"
    );
}
