//! Runs the relay on a real socket and talks to it with reqwest.

use prompt_relay::{RelayServer, Shutdown};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

mod common;

use common::*;

#[tokio::test]
async fn serves_completions_and_shuts_down() {
    let upstream = start_programmable_backend(|i| (200, gemini_reply(&format!("reply {i}")))).await;
    let mut config = test_config(&upstream.base_url());
    config.rate_limit.max_requests = 2;
    config.security.trust_proxy_headers = false;

    let server = RelayServer::with_notifier(config, Arc::new(RecordingNotifier::default())).unwrap();
    let limiter = server.limiter();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    let url = format!("http://{addr}/api/completions");

    let res = client
        .post(&url)
        .header("Authorization", TOKEN)
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .expect("relay unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"reply": "reply 0"}));

    // Spoofed forwarding headers are ignored when proxy trust is off, so the
    // peer address (127.0.0.1) is the key for every request.
    let res = client
        .post(&url)
        .header("Authorization", TOKEN)
        .header("X-Forwarded-For", "198.51.100.77")
        .json(&json!({"message": "again"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .post(&url)
        .header("Authorization", TOKEN)
        .header("X-Forwarded-For", "198.51.100.78")
        .json(&json!({"message": "one too many"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert_eq!(limiter.tracked(), 1);

    let res = client
        .post(&url)
        .json(&json!({"message": "no token"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    assert_eq!(res.text().await.unwrap(), "Unauthorized");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server should stop after shutdown")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn tls_with_missing_certificate_fails_to_start() {
    let mut config = test_config("http://127.0.0.1:9/v1beta");
    config.listener.tls = Some(prompt_relay::config::TlsConfig {
        cert_path: "/nonexistent/cert.pem".into(),
        key_path: "/nonexistent/key.pem".into(),
    });

    let server = RelayServer::with_notifier(config, Arc::new(RecordingNotifier::default())).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = Shutdown::new();

    let err = server.run(listener, shutdown.subscribe()).await.unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
}
