//! HTTP contract tests for the tracker
//!
//! Each test runs a local `wiremock` server standing in for the AppsFlyer
//! endpoint and checks what `Tracker::send` puts on the wire.

use std::path::PathBuf;
use std::time::Duration;

use appsflyer_core::event::names;
use appsflyer_core::{Error, Event, Platform, Tracker, TransportConfig};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APPSFLYER_ID: &str = "1111111111111-1111111";
const ADVERTISING_ID: &str = "AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA";

const REGISTRY: &str = r#"[
    {"appId": "id123456789", "bundleId": "com.company.ios", "devKey": "ios-dev-key", "platform": "ios"},
    {"appId": "com.company.android", "bundleId": "com.company.android", "devKey": "android-dev-key", "platform": "android"}
]"#;

/// Tracker pointed at the mock server with the test registry loaded
fn tracker_for(server: &MockServer, dir: &TempDir) -> Tracker {
    appsflyer_core::logging::init_test();

    let tracker = Tracker::new(&TransportConfig {
        endpoint: server.uri(),
        ..Default::default()
    })
    .expect("tracker should build");

    tracker
        .set_config(registry_file(dir))
        .expect("registry should load");
    tracker
}

fn registry_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("apps.json");
    std::fs::write(&path, REGISTRY).expect("failed to write registry");
    path
}

fn android_event() -> Event {
    let mut event = Event::new(APPSFLYER_ID, Platform::Android);
    event
        .set_name(names::SUBSCRIBE)
        .set_advertising_id(ADVERTISING_ID)
        .set_revenue(59.99, "USD");
    event
}

#[tokio::test]
async fn test_send_posts_event_with_dev_key() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/inappevent/com.company.android"))
        .and(header("Content-Type", "application/json"))
        .and(header("Authentication", "android-dev-key"))
        .and(body_json(json!({
            "advertising_id": ADVERTISING_ID,
            "appsflyer_id": APPSFLYER_ID,
            "bundle_id": "com.company.android",
            "eventName": "af_subscribe",
            "eventValue": "{\"af_currency\":\"USD\",\"af_revenue\":\"59.99\"}",
            "af_events_api": "true"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &dir);
    let mut event = android_event();

    tracker.send(&mut event).await.expect("send should succeed");
    assert_eq!(event.bundle_id(), Some("com.company.android"));
}

#[tokio::test]
async fn test_send_routes_by_platform() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/inappevent/id123456789"))
        .and(header("Authentication", "ios-dev-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &dir);
    let mut event = Event::new(APPSFLYER_ID, Platform::Ios);
    event
        .set_name(names::START_TRIAL)
        .set_advertising_id(ADVERTISING_ID);

    tracker.send(&mut event).await.expect("send should succeed");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["idfa"], ADVERTISING_ID);
    assert!(body.get("advertising_id").is_none());
    assert_eq!(body["bundle_id"], "com.company.ios");
    assert_eq!(body["eventValue"], "");
}

#[tokio::test]
async fn test_bundle_id_comes_from_registry() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &dir);
    let mut event = android_event();

    tracker.send(&mut event).await.unwrap();
    tracker.set_apps([appsflyer_core::AppConfig {
        app_id: "com.company.android".to_string(),
        bundle_id: "com.company.renamed".to_string(),
        dev_key: "android-dev-key".to_string(),
        platform: Platform::Android,
    }]);
    tracker.send(&mut event).await.unwrap();

    assert_eq!(event.bundle_id(), Some("com.company.renamed"));
}

#[tokio::test]
async fn test_non_200_is_remote_error() {
    for code in [202u16, 400, 401, 500] {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(code))
            .expect(1)
            .mount(&server)
            .await;

        let tracker = tracker_for(&server, &dir);
        let err = tracker.send(&mut android_event()).await.unwrap_err();

        match &err {
            Error::Remote { status } => assert_eq!(status.as_u16(), code),
            other => panic!("expected remote error for {code}, got {other:?}"),
        }
        assert!(err.to_string().contains(&code.to_string()));
    }
}

#[tokio::test]
async fn test_unnamed_event_makes_no_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &dir);
    let mut event = Event::new(APPSFLYER_ID, Platform::Android);
    event.set_advertising_id(ADVERTISING_ID);

    let err = tracker.send(&mut event).await.unwrap_err();
    assert!(matches!(err, Error::InvalidEvent(_)));
}

#[tokio::test]
async fn test_unknown_platform_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tracker = Tracker::new(&TransportConfig {
        endpoint: server.uri(),
        ..Default::default()
    })
    .unwrap();

    let err = tracker.send(&mut android_event()).await.unwrap_err();
    assert!(matches!(err, Error::UnknownPlatform(Platform::Android)));
}

#[tokio::test]
async fn test_send_with_timeout_expires() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &dir);
    let deadline = Duration::from_millis(100);
    let err = tracker
        .send_with_timeout(&mut android_event(), deadline)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(d) if d == deadline));
}

#[tokio::test]
async fn test_send_with_timeout_succeeds_in_time() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, &dir);
    tracker
        .send_with_timeout(&mut android_event(), Duration::from_secs(5))
        .await
        .expect("send should finish before the deadline");
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let dir = TempDir::new().unwrap();
    let tracker = Tracker::new(&TransportConfig {
        endpoint: "http://127.0.0.1:1".to_string(),
        connect_timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();
    tracker.set_config(registry_file(&dir)).unwrap();

    let err = tracker.send(&mut android_event()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_malformed_registry_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apps.json");
    std::fs::write(&path, "{ not json").unwrap();

    let tracker = Tracker::with_defaults().unwrap();
    let err = tracker.set_config(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(tracker.apps().is_empty());
}
