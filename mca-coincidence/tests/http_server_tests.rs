//! HTTP Server & Routing Integration Tests
//!
//! Drives the router with `oneshot` against the in-memory backend.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mca_coincidence::services::Coordinator;
use mca_coincidence::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

use helpers::{coordinator, wire_request, FakeBackend, EVEN, EVEN_TEXT, SECRET};

fn app(coordinator: Arc<Coordinator>, sync_deadline: Option<Duration>) -> Router {
    build_router(AppState::new(coordinator, sync_deadline))
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request_body(join_record_id: i64, secret: &str) -> String {
    serde_json::to_string(&wire_request(join_record_id, secret)).unwrap()
}

#[tokio::test]
async fn test_async_endpoint_accepts() {
    let backend = FakeBackend::new().with_pair(1, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend.clone(), Duration::ZERO);
    let app = app(coordinator.clone(), None);

    let response = app
        .oneshot(post_json("/api/calculate-coincidence", request_body(1, SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        body_json(response).await,
        json!({"status": "accepted", "message": "Coincidence calculation started"})
    );

    coordinator.shutdown().await;
    assert_eq!(backend.delivered().len(), 1);
}

#[tokio::test]
async fn test_async_duplicate_is_conflict() {
    let backend = FakeBackend::new().with_pair(2, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend, Duration::from_secs(60));
    let app = app(coordinator.clone(), None);

    let first = app
        .clone()
        .oneshot(post_json("/api/calculate-coincidence", request_body(2, SECRET)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app
        .oneshot(post_json("/api/calculate-coincidence", request_body(2, SECRET)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"]["code"], "CONFLICT");

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let backend = FakeBackend::new().with_pair(3, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend.clone(), Duration::ZERO);
    let app = app(coordinator, None);

    for uri in ["/api/calculate-coincidence", "/api/calculate-coincidence-sync"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, request_body(3, "wrong")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
    }

    assert_eq!(backend.fetch_count(), 0);
}

#[tokio::test]
async fn test_malformed_payloads_are_bad_request() {
    let backend = FakeBackend::new();
    let coordinator = coordinator(backend.clone(), Duration::ZERO);
    let app = app(coordinator, None);

    let bodies = [
        "not json".to_string(),
        json!({"composer_id": 1, "analysis_id": 2, "secret_key": SECRET}).to_string(),
        json!({"composer_analysis_id": "x", "composer_id": 1, "analysis_id": 2, "secret_key": SECRET})
            .to_string(),
        // Validation runs before the secret check
        request_body(0, "wrong"),
    ];

    for body in bodies {
        let response = app
            .clone()
            .oneshot(post_json("/api/calculate-coincidence", body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_REQUEST");
    }

    assert_eq!(backend.fetch_count(), 0);
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let coordinator = coordinator(FakeBackend::new(), Duration::ZERO);
    let app = app(coordinator, None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/calculate-coincidence-sync")
                .body(Body::from(request_body(1, SECRET)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sync_endpoint_returns_score() {
    let backend = FakeBackend::new().with_pair(4, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend.clone(), Duration::ZERO);
    let app = app(coordinator, None);

    let response = app
        .oneshot(post_json("/api/calculate-coincidence-sync", request_body(4, SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "composer_analysis_id": 4,
            "potential_coincidence": 100.0,
            "secret_key": SECRET,
            "status": "completed"
        })
    );
    assert!(backend.delivered().is_empty());
}

#[tokio::test]
async fn test_sync_remote_errors_are_bad_gateway() {
    // Join record 5 was never seeded → backend answers 404
    let coordinator = coordinator(FakeBackend::new(), Duration::ZERO);
    let app = app(coordinator, None);

    let response = app
        .oneshot(post_json("/api/calculate-coincidence-sync", request_body(5, SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"]["code"], "REMOTE_REJECTED");
}

#[tokio::test]
async fn test_sync_deadline_is_gateway_timeout() {
    let backend = FakeBackend::new().with_pair(6, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend, Duration::from_secs(60));
    let app = app(coordinator, Some(Duration::from_millis(50)));

    let response = app
        .oneshot(post_json("/api/calculate-coincidence-sync", request_body(6, SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["error"]["code"], "TIMEOUT");
}

#[tokio::test]
async fn test_after_shutdown_is_service_unavailable() {
    let backend = FakeBackend::new().with_pair(7, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend, Duration::ZERO);
    coordinator.shutdown().await;
    let app = app(coordinator, None);

    let response = app
        .oneshot(post_json("/api/calculate-coincidence", request_body(7, SECRET)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"]["code"], "SHUTTING_DOWN");
}

#[tokio::test]
async fn test_health_reports_in_flight() {
    let backend = FakeBackend::new().with_pair(8, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend, Duration::from_secs(60));
    let app = app(coordinator.clone(), None);

    coordinator
        .submit_async(helpers::request(8, SECRET))
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "mca-coincidence");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["in_flight"], 1);
    assert!(body["uptime_seconds"].is_u64());

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_wrong_method_and_unknown_route() {
    let app = app(coordinator(FakeBackend::new(), Duration::ZERO), None);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/calculate-coincidence")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pending_sync_answers_503_on_shutdown_signal() {
    let backend = FakeBackend::new().with_pair(9, EVEN, EVEN_TEXT);
    let coordinator = coordinator(backend, Duration::from_secs(60));
    let app = app(coordinator.clone(), None);

    let pending = tokio::spawn(
        app.oneshot(post_json("/api/calculate-coincidence-sync", request_body(9, SECRET))),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    coordinator.begin_shutdown();

    let response = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("sync request should not wait out the delay")
        .unwrap()
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"]["code"], "SHUTTING_DOWN");
}
