//! HTTP contract tests for `/health` and `/predict`.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use regress_serve_api::create_router;
use regress_serve_core::fixtures;
use regress_serve_core::{ServiceState, SharedServiceState};

// =========================================================================
// Helpers
// =========================================================================

fn state_from(dir: &Path, doc: &Value) -> SharedServiceState {
    let path = fixtures::write_artifact(dir, "model.json", doc).unwrap();
    ServiceState::initialize(path).into_shared()
}

fn ready_router(dir: &TempDir) -> Router {
    create_router(state_from(dir.path(), &fixtures::ev_linear_predictor()))
}

fn degraded_router(dir: &TempDir) -> Router {
    create_router(ServiceState::initialize(dir.path().join("missing.json")).into_shared())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get_health(router: Router) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

async fn post_predict(router: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    send(router, request).await
}

fn ev_body() -> String {
    Value::Object(fixtures::ev_request()).to_string()
}

// =========================================================================
// /health
// =========================================================================

#[tokio::test]
async fn test_health_ok_when_model_loaded() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get_health(ready_router(&dir)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], true);
    assert!(body["error"].is_null());
    assert!(body["model_path"].as_str().unwrap().ends_with("model.json"));
}

#[tokio::test]
async fn test_health_degraded_when_artifact_missing() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get_health(degraded_router(&dir)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_loaded"], false);
    assert!(body["error"].as_str().unwrap().starts_with("ArtifactMissing"));
}

#[tokio::test]
async fn test_health_degraded_when_artifact_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, "not json").unwrap();
    let router = create_router(ServiceState::initialize(&path).into_shared());

    let (_, body) = get_health(router).await;
    assert_eq!(body["status"], "degraded");
    assert!(body["error"].as_str().unwrap().starts_with("DeserializationFailed"));
}

// =========================================================================
// /predict
// =========================================================================

#[tokio::test]
async fn test_predict_returns_finite_value() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_predict(ready_router(&dir), ev_body()).await;

    assert_eq!(status, StatusCode::OK);
    let prediction = body["prediction"].as_f64().unwrap();
    assert!(prediction.is_finite());
    assert!((prediction - fixtures::EV_LINEAR_PREDICTION).abs() < 1e-9);
    assert!(body.get("metadata").is_none());
}

#[tokio::test]
async fn test_predict_echoes_bundle_metadata() {
    let dir = TempDir::new().unwrap();
    let doc = fixtures::bundle(
        "model",
        fixtures::ev_forest_predictor(),
        json!(fixtures::ev_feature_names()),
        Some(json!({"trained_on": "ev-2024"})),
    );
    let (status, body) = post_predict(create_router(state_from(dir.path(), &doc)), ev_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], fixtures::EV_FOREST_PREDICTION);
    assert_eq!(body["metadata"], json!({"trained_on": "ev-2024"}));
}

#[tokio::test]
async fn test_predict_missing_feature_is_422() {
    let dir = TempDir::new().unwrap();
    let mut payload = fixtures::ev_request();
    payload.remove("PowerTrain");

    let (status, body) =
        post_predict(ready_router(&dir), Value::Object(payload).to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Missing required features"), "{}", detail);
    assert!(detail.contains("PowerTrain"));
}

#[tokio::test]
async fn test_predict_wrong_type_is_422() {
    let dir = TempDir::new().unwrap();
    let mut payload = fixtures::ev_request();
    payload.insert("Seats".into(), json!("five"));

    let (status, body) =
        post_predict(ready_router(&dir), Value::Object(payload).to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        "Invalid feature types: Seats (expected numeric, got string)"
    );
}

#[tokio::test]
async fn test_predict_unknown_category_is_500() {
    let dir = TempDir::new().unwrap();
    let mut payload = fixtures::ev_request();
    payload.insert("PowerTrain".into(), json!("XYZ"));
    let router = ready_router(&dir);

    let (status, body) = post_predict(router.clone(), Value::Object(payload).to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Inference error: "));

    let (_, health) = get_health(router).await;
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_predict_malformed_json_uses_detail_shape() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_predict(ready_router(&dir), "{\"Seats\": ").await;

    assert!(status.is_client_error());
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_predict_non_object_body_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (status, body) = post_predict(ready_router(&dir), "[1, 2, 3]").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_degraded_predict_is_503_for_any_body() {
    let dir = TempDir::new().unwrap();
    for body in [ev_body(), "{}".to_string(), "garbage".to_string()] {
        let (status, response) = post_predict(degraded_router(&dir), body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response, json!({"detail": "Model not loaded"}));
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = TempDir::new().unwrap();
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = ready_router(&dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_match_sequential() {
    let dir = TempDir::new().unwrap();
    let router = ready_router(&dir);

    let bodies: Vec<String> = (0..50)
        .map(|i| {
            let mut payload = fixtures::ev_request();
            payload.insert("Range_Km".into(), json!(300 + i * 5));
            payload.insert(
                "PowerTrain".into(),
                json!(["AWD", "RWD", "FWD"][i % 3]),
            );
            Value::Object(payload).to_string()
        })
        .collect();

    let mut sequential = Vec::with_capacity(bodies.len());
    for body in &bodies {
        let (status, response) = post_predict(router.clone(), body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        sequential.push(response["prediction"].as_f64().unwrap());
    }

    let handles: Vec<_> = bodies
        .into_iter()
        .map(|body| {
            let router = router.clone();
            tokio::spawn(async move { post_predict(router, body).await })
        })
        .collect();

    let mut concurrent = Vec::with_capacity(handles.len());
    for handle in handles {
        let (status, response) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        concurrent.push(response["prediction"].as_f64().unwrap());
    }

    assert_eq!(sequential, concurrent);
}
