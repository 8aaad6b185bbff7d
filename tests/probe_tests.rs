// HTTP probe tests against an in-process axum server

use axum::{Json, Router, http::StatusCode, routing::get};
use gateway_health::models::{HealthStatus, PollingStatus};
use gateway_health::probe::{HealthProbe, HttpProbe, ProbeError};
use gateway_health::store::{HealthStore, StoreConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Serves `router` on an ephemeral port and returns its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn health_router() -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async {
                Json(json!({
                    "success": true,
                    "data": {
                        "updatedAt": "2024-06-01T00:00:00Z",
                        "services": {
                            "transactions": { "state": "pass", "responseTime": 210 },
                            "proxy": { "state": "warn", "details": "slow upstream" },
                        }
                    }
                }))
            }),
        )
        .route(
            "/unavailable",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .route("/garbage", get(|| async { "<html>not json</html>" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        )
}

#[tokio::test]
async fn http_probe_returns_raw_json() {
    let base = serve(health_router()).await;
    let probe = HttpProbe::new(format!("{base}/health"), TIMEOUT).unwrap();
    let raw = probe.check_health().await.unwrap();
    assert_eq!(raw["success"], json!(true));
    assert_eq!(raw["data"]["services"]["proxy"]["state"], json!("warn"));
}

#[tokio::test]
async fn http_probe_maps_non_2xx_to_status_error() {
    let base = serve(health_router()).await;
    let probe = HttpProbe::new(format!("{base}/unavailable"), TIMEOUT).unwrap();
    let err = probe.check_health().await.unwrap_err();
    assert!(matches!(err, ProbeError::Status(503)), "got {err:?}");
}

#[tokio::test]
async fn http_probe_rejects_non_json_body() {
    let base = serve(health_router()).await;
    let probe = HttpProbe::new(format!("{base}/garbage"), TIMEOUT).unwrap();
    let err = probe.check_health().await.unwrap_err();
    assert!(matches!(err, ProbeError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn http_probe_reports_connection_failure() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::new(format!("http://{addr}/health"), TIMEOUT).unwrap();
    let err = probe.check_health().await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn http_probe_times_out() {
    let base = serve(health_router()).await;
    let probe = HttpProbe::new(format!("{base}/slow"), Duration::from_millis(100)).unwrap();
    let err = probe.check_health().await.unwrap_err();
    match err {
        ProbeError::Transport(e) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("expected transport timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn store_ingests_enveloped_live_payload() {
    let base = serve(health_router()).await;
    let probe = HttpProbe::new(format!("{base}/health"), TIMEOUT).unwrap();
    let store = HealthStore::new(Arc::new(probe), StoreConfig::default());

    let state = store.manual_refresh().await;
    assert_eq!(state.groups["transactions"].status, HealthStatus::Healthy);
    assert_eq!(state.groups["transactions"].latency_ms, Some(210));
    assert_eq!(state.groups["proxy"].status, HealthStatus::Degraded);
    assert_eq!(
        state.groups["proxy"].message.as_deref(),
        Some("slow upstream")
    );
    assert_eq!(state.overall_status, HealthStatus::Degraded);
    assert_eq!(
        state.last_successful_fetch.as_deref(),
        Some("2024-06-01T00:00:00Z")
    );
    assert_eq!(state.last_error, None);
    assert_eq!(state.polling_status, PollingStatus::Idle);
}

#[tokio::test]
async fn store_falls_back_when_http_probe_fails() {
    let base = serve(health_router()).await;
    let probe = HttpProbe::new(format!("{base}/unavailable"), TIMEOUT).unwrap();
    let store = HealthStore::new(Arc::new(probe), StoreConfig::default());

    let state = store.manual_refresh().await;
    assert_eq!(state.polling_status, PollingStatus::Error);
    assert_eq!(
        state.last_error.as_deref(),
        Some("health probe returned HTTP 503")
    );
    assert_eq!(state.last_successful_fetch, None);
    assert!(!state.groups.is_empty());
}
