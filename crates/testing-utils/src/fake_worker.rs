//! A throwaway worker node served by axum on an ephemeral port
//!
//! Answers `GET /health` and `POST /scrape` with whatever the test configures
//! and records what it received.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A `/scrape` call as seen by the fake worker
#[derive(Debug, Clone)]
pub struct RecordedScrape {
    pub body: serde_json::Value,
    pub authorization: Option<String>,
}

#[derive(Debug)]
struct WorkerBehavior {
    health_status: StatusCode,
    scrape_status: StatusCode,
    scrape_body: Vec<u8>,
    scrape_delay: Duration,
}

#[derive(Debug, Clone)]
struct FakeWorkerState {
    behavior: Arc<Mutex<WorkerBehavior>>,
    probes: Arc<AtomicUsize>,
    scrapes: Arc<Mutex<Vec<RecordedScrape>>>,
}

pub struct FakeWorkerNode {
    pub address: String,
    state: FakeWorkerState,
}

impl FakeWorkerNode {
    /// Starts a worker that reports healthy and answers scrapes with
    /// `{"success":true,"data":null}`.
    pub async fn spawn() -> FakeWorkerNode {
        let state = FakeWorkerState {
            behavior: Arc::new(Mutex::new(WorkerBehavior {
                health_status: StatusCode::OK,
                scrape_status: StatusCode::OK,
                scrape_body: br#"{"success":true,"data":null}"#.to_vec(),
                scrape_delay: Duration::ZERO,
            })),
            probes: Arc::new(AtomicUsize::new(0)),
            scrapes: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/health", get(health))
            .route("/scrape", post(scrape))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start fake worker");
        });

        FakeWorkerNode { address, state }
    }

    pub fn set_health_status(&self, status: u16) {
        self.state.behavior.lock().unwrap().health_status =
            StatusCode::from_u16(status).expect("invalid status code");
    }

    pub fn respond_with(&self, status: u16, body: impl Into<Vec<u8>>) {
        let mut behavior = self.state.behavior.lock().unwrap();
        behavior.scrape_status = StatusCode::from_u16(status).expect("invalid status code");
        behavior.scrape_body = body.into();
    }

    pub fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond_with(status, serde_json::to_vec(&body).unwrap());
    }

    pub fn set_scrape_delay(&self, delay: Duration) {
        self.state.behavior.lock().unwrap().scrape_delay = delay;
    }

    pub fn probe_count(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn scrapes(&self) -> Vec<RecordedScrape> {
        self.state.scrapes.lock().unwrap().clone()
    }
}

async fn health(State(state): State<FakeWorkerState>) -> StatusCode {
    state.probes.fetch_add(1, Ordering::SeqCst);
    state.behavior.lock().unwrap().health_status
}

async fn scrape(State(state): State<FakeWorkerState>, headers: HeaderMap, body: Bytes) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.scrapes.lock().unwrap().push(RecordedScrape {
        body,
        authorization,
    });

    let (status, payload, delay) = {
        let behavior = state.behavior.lock().unwrap();
        (
            behavior.scrape_status,
            behavior.scrape_body.clone(),
            behavior.scrape_delay,
        )
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    (status, payload).into_response()
}
