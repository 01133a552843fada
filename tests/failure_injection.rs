//! Failure injection: overload, missing configuration, dead and slow backends.

use axum::http::StatusCode;
use std::time::Duration;
use tokio::net::TcpListener;

mod common;

const CHAT_PATH: &str = "/openai/deployments/gpt4/chat/completions";

#[tokio::test]
async fn test_simulated_overload_never_reaches_backend() {
    let (backend_addr, recorder) = common::start_stub_backend(200, "{}").await;
    let mut config = common::gateway_config(backend_addr);
    config.overload.simulate = true;
    config.overload.retry_after_secs = Some(5);
    let gateway = common::start_gateway(config).await;

    let res = common::client()
        .post(gateway.url(CHAT_PATH))
        .header("api-key", "k")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()["retry-after"], "5");
    assert_eq!(
        res.text().await.unwrap(),
        "Too many requests (simulated overload)"
    );
    assert_eq!(recorder.count(), 0);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_overload_wins_over_missing_credential() {
    let (backend_addr, _recorder) = common::start_stub_backend(200, "{}").await;
    let mut config = common::gateway_config(backend_addr);
    config.overload.simulate = true;
    let gateway = common::start_gateway(config).await;

    let res = common::client()
        .post(gateway.url(CHAT_PATH))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().get("retry-after").is_none());

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_missing_api_version_is_500() {
    let (backend_addr, recorder) = common::start_stub_backend(200, "{}").await;
    let mut config = common::gateway_config(backend_addr);
    config.backend.api_version = None;
    let gateway = common::start_gateway(config).await;

    let res = common::client()
        .post(gateway.url(CHAT_PATH))
        .header("api-key", "k")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!res.text().await.unwrap().is_empty());
    assert_eq!(recorder.count(), 0);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_is_502() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = common::start_gateway(common::gateway_config(dead_addr)).await;

    let res = common::client()
        .post(gateway.url(CHAT_PATH))
        .header("api-key", "k")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_slow_backend_is_504() {
    let (backend_addr, recorder) = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, b"{}".to_vec())
    })
    .await;
    let mut config = common::gateway_config(backend_addr);
    config.timeouts.request_secs = 1;
    let gateway = common::start_gateway(config).await;

    let res = common::client()
        .post(gateway.url(CHAT_PATH))
        .header("api-key", "k")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(res.text().await.unwrap(), "Upstream request timed out");
    assert_eq!(recorder.count(), 1);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_backend_errors_are_not_retried() {
    let (backend_addr, recorder) =
        common::start_stub_backend(500, r#"{"error":{"code":"InternalServerError"}}"#).await;
    let gateway = common::start_gateway(common::gateway_config(backend_addr)).await;

    let res = common::client()
        .post(gateway.url(CHAT_PATH))
        .header("api-key", "k")
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"error":{"code":"InternalServerError"}}"#
    );
    assert_eq!(recorder.count(), 1);

    gateway.shutdown.trigger();
}
