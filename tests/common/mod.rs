//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use prompt_relay::config::RelayConfig;
use prompt_relay::notify::{Notification, Notifier, NotifyError};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";
pub const API_KEY: &str = "test-key";

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub body: Value,
}

type Responder = Arc<dyn Fn(usize) -> (u16, String) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    responder: Responder,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a programmable mock upstream. `responder` gets the 0-based call
/// index and returns `(status, json body)`.
pub async fn start_programmable_backend<F>(responder: F) -> MockUpstream
where
    F: Fn(usize) -> (u16, String) + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        responder: Arc::new(responder),
        requests: requests.clone(),
    };
    let app = Router::new().fallback(record).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, requests }
}

/// Start a mock upstream that always returns the same response.
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockUpstream {
    start_programmable_backend(move |_| (status, body.to_string())).await
}

async fn record(State(state): State<MockState>, uri: Uri, body: Bytes) -> Response {
    let index = {
        let mut requests = state.requests.lock().unwrap();
        requests.push(RecordedRequest {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });
        requests.len() - 1
    };
    let (status, body) = (state.responder)(index);
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Valid config pointing at `upstream_base`.
pub fn test_config(upstream_base: &str) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.token = TOKEN.into();
    config.upstream.api_key = API_KEY.into();
    config.upstream.base_url = upstream_base.into();
    config.upstream.timeout_secs = 5;
    // Credentials so tests can flip `notification.enabled` and still validate.
    config.notification.api_key = "resend-test-key".into();
    config.notification.recipient = "ops@example.com".into();
    config
}

/// Build a completion request as if it arrived from `peer`.
pub fn completion_request(token: Option<&str>, body: &str, peer: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/completions")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let mut request = builder.body(Body::from(body.to_string())).unwrap();
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
    .to_string()
}

/// Records every notification and succeeds.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Wait until at least `n` notifications arrived, or give up after a second.
    pub async fn wait_for(&self, n: usize) -> Vec<Notification> {
        for _ in 0..100 {
            if self.count() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Always fails.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("provider down".into()))
    }
}

/// Never completes.
pub struct HangingNotifier;

#[async_trait]
impl Notifier for HangingNotifier {
    async fn send(&self, _: Notification) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}
