//! Router-level tests for the demonstration endpoints.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sample_app_integration::{MailError, ProbeError, ProbeReport};
use sample_app_server::app::{self, AppState};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{Browser, FakeProbe, FakeRelay, body_string, config, state};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn hello_world_counts_requests() {
    let state = Arc::new(state(config(&[])));
    let app = app::router(state.clone());

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Hello, World!");
    assert_eq!(state.metrics.requests().get(), 1);
}

#[tokio::test]
async fn concurrent_requests_are_all_counted() {
    const REQUESTS: u64 = 50;

    let state = Arc::new(state(config(&[])));
    let app = app::router(state.clone());

    let tasks: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.oneshot(get("/")).await.unwrap().status() })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(state.metrics.requests().get(), REQUESTS);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let state = Arc::new(state(config(&[])));
    let app = app::router(state.clone());

    let response = app.oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.metrics.requests().get(), 0);
}

#[tokio::test]
async fn user_defined_config_is_null_when_unset() {
    let app = app::router(Arc::new(state(config(&[]))));

    let response = app.oneshot(get("/env/user-defined-config")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "null");
}

#[tokio::test]
async fn user_defined_config_is_echoed_as_json_string() {
    let state = Arc::new(state(config(&[("APP_USER_DEFINED_CONFIG", "hello")])));
    let app = app::router(state.clone());

    let response = app.oneshot(get("/env/user-defined-config")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert_eq!(body_string(response).await, "\"hello\"");
    assert_eq!(state.metrics.requests().get(), 1);
}

#[tokio::test]
async fn send_mail_hands_the_test_message_to_the_relay() {
    let relay = Arc::new(FakeRelay::default());
    let state = Arc::new(state(config(&[])).with_mail_relay(relay.clone()));
    let app = app::router(state.clone());

    let response = app.oneshot(get("/send_mail")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Sent");
    assert_eq!(relay.sent(), 1);
    assert_eq!(state.metrics.requests().get(), 1);
}

#[tokio::test]
async fn send_mail_failure_is_reported_as_json() {
    let relay = Arc::new(FakeRelay::failing(MailError::Transport {
        reason: "connection refused".to_string(),
    }));
    let app = app::router(Arc::new(state(config(&[])).with_mail_relay(relay)));

    let response = app.oneshot(get("/send_mail")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({ "message": "SMTP error: connection refused" }));
}

#[tokio::test]
async fn send_mail_without_smtp_host_fails() {
    let app = app::router(Arc::new(state(config(&[]))));

    let response = app.oneshot(get("/send_mail")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["message"].as_str().unwrap().contains("SMTP_HOST"));
}

#[tokio::test]
async fn migrate_status_reports_success() {
    let probe = FakeProbe(Ok(ProbeReport {
        version: "PostgreSQL 16.2".to_string(),
        user_count: 3,
    }));
    let state = Arc::new(state(config(&[])).with_database_probe(Arc::new(probe)));
    let app = app::router(state.clone());

    let response = app.oneshot(get("/postgresql/migratestatus")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "SUCCESS");
    assert_eq!(state.metrics.requests().get(), 0);
}

#[tokio::test]
async fn migrate_status_reports_failure_without_detail() {
    let probe = FakeProbe(Err(ProbeError::Connection {
        reason: "password authentication failed".to_string(),
    }));
    let app = app::router(Arc::new(
        state(config(&[])).with_database_probe(Arc::new(probe)),
    ));

    let response = app.oneshot(get("/postgresql/migratestatus")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "FAILURE");
}

#[tokio::test]
async fn migrate_status_without_connect_string_fails() {
    let app = app::router(Arc::new(state(config(&[]))));

    let response = app.oneshot(get("/postgresql/migratestatus")).await.unwrap();

    assert_eq!(body_string(response).await, "FAILURE");
}

#[tokio::test]
async fn list_authorization_models_succeeds() {
    let fga = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stores/store-1/authorization-models"))
        .and(header("authorization", "Bearer fga-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_models": [
                { "id": "model-1", "schema_version": "1.1", "type_definitions": [] }
            ]
        })))
        .expect(1)
        .mount(&fga)
        .await;

    let state = Arc::new(state(config(&[
        ("FGA_HTTP_API_URL", fga.uri().as_str()),
        ("FGA_STORE_ID", "store-1"),
        ("FGA_TOKEN", "fga-token"),
    ])));
    let app = app::router(state.clone());

    let response = app
        .oneshot(get("/openfga/list-authorization-models"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Listed authorization models");
    assert_eq!(state.metrics.requests().get(), 1);
}

#[tokio::test]
async fn list_authorization_models_error_is_the_only_body() {
    let fga = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stores/missing/authorization-models"))
        .respond_with(ResponseTemplate::new(404).set_body_string("store not found"))
        .mount(&fga)
        .await;

    let app = app::router(Arc::new(state(config(&[
        ("FGA_HTTP_API_URL", fga.uri().as_str()),
        ("FGA_STORE_ID", "missing"),
    ]))));

    let response = app
        .oneshot(get("/openfga/list-authorization-models"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(!body.contains("Listed authorization models"));

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        value,
        json!({ "message": "authorization request failed with status 404: store not found" })
    );
}

#[tokio::test]
async fn list_authorization_models_without_openfga_fails() {
    let app = app::router(Arc::new(state(config(&[]))));

    let response = app
        .oneshot(get("/openfga/list-authorization-models"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({ "message": "OpenFGA client is not configured" }));
}

#[tokio::test]
async fn metrics_are_mounted_on_the_main_router_when_ports_match() {
    let state = Arc::new(state(config(&[("APP_METRICS_PORT", "8080")])));
    let app = app::main_router(state.clone());

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("request_count 1"));
}

#[tokio::test]
async fn accepted_metrics_path_mounts_beside_provider_routes() {
    let state = Arc::new(state(config(&[
        ("APP_METRICS_PORT", "8080"),
        ("APP_METRICS_PATH", "/login/openid-connect/metrics"),
    ])));
    let app = app::main_router(state);

    let response = app
        .clone()
        .oneshot(get("/login/openid-connect/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("request_count"));

    let response = app.oneshot(get("/login/github")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_stay_off_the_main_router_on_a_separate_port() {
    let state = Arc::new(state(config(&[])));

    let response = app::main_router(state.clone())
        .oneshot(get("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app::metrics_router(state.metrics.clone(), "/metrics")
        .oneshot(get("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("request_count"));
}

#[tokio::test]
async fn profile_without_session_is_forbidden() {
    let app = app::router(Arc::new(state(config(&[]))));

    let response = app.oneshot(get("/profile")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "User not authenticated.");
}

#[tokio::test]
async fn profile_with_forged_session_is_an_error() {
    let app = app::router(Arc::new(state(config(&[]))));
    let mut browser = Browser::default();
    browser.set_raw("_user_session", "eyJlbWFpbCI6ImV2ZUBleGFtcGxlLmNvbSJ9");

    let response = app.oneshot(browser.get("/profile")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn login_with_unknown_provider_is_a_bad_request() {
    let app = app::router(Arc::new(state(config(&[]))));

    let response = app.oneshot(get("/login/github")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "no provider for github exists");
}

#[test]
fn openfga_is_disabled_without_api_url() {
    let state: AppState = state(config(&[("FGA_STORE_ID", "store-1")]));
    assert!(state.authz.is_none());
}
