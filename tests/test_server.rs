//! Integration test: HTTP surface over a loaded artifact
//! Tests: health → options → predict (200 / 422 / 400) → explain (200 / 409) → 404

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use car_price_engine::inference::InferenceConfig;
use car_price_engine::pipeline::ModelArtifact;
use car_price_engine::server::{create_router, AppState, ServerConfig};
use car_price_engine::service::PricingService;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(artifact: &ModelArtifact) -> (tempfile::TempDir, axum::Router) {
    let (dir, path, digest) = common::write_artifact(artifact);
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        artifact_path: path,
        artifact_sha256: Some(digest),
    };
    let service =
        PricingService::load(&config.artifact_path, &config.loader(), InferenceConfig::default())
            .unwrap();
    let state = Arc::new(AppState::new(config, service));
    (dir, create_router(state))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

// ============================================================================
// Metadata
// ============================================================================

#[tokio::test]
async fn test_health_reports_artifact() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["artifact"], "car-forest-fixture");
    assert_eq!(json["schema_version"], "car-price/v1");
    assert_eq!(json["artifact_digest"].as_str().unwrap().len(), 64);
    assert_eq!(json["digest_pinned"], true);
}

#[tokio::test]
async fn test_options_lists_dropdown_levels() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app.oneshot(get("/api/options")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["Brand"].as_array().unwrap().iter().any(|b| b == "Toyota"));
    assert!(json.get("Mileage").is_none());
}

#[tokio::test]
async fn test_schema_endpoint() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app.oneshot(get("/api/schema")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["fields"].as_array().unwrap().len(), 13);
}

// ============================================================================
// Prediction
// ============================================================================

#[tokio::test]
async fn test_predict_success() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app
        .oneshot(post_json("/api/predict", common::corolla_json().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["price"], 675_000);
    assert_eq!(json["currency"], "INR");
}

#[tokio::test]
async fn test_predict_unknown_brand_is_422() {
    let (_dir, app) = test_app(&common::car_artifact());
    let mut input = common::corolla_json();
    input["Brand"] = "Lamborghini".into();

    let response = app.oneshot(post_json("/api/predict", input.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "validation");
    assert!(json["error"].as_str().unwrap().contains("Lamborghini"));
}

#[tokio::test]
async fn test_predict_with_invalid_json() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app
        .oneshot(post_json("/api/predict", "not valid json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "request");
}

// ============================================================================
// Explanation
// ============================================================================

#[tokio::test]
async fn test_explain_returns_two_lists() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app.oneshot(get("/api/explain")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["categorical_top_k"][0]["name"], "Brand_BMW");
    assert_eq!(json["core_features"][0]["name"], "Mileage");
}

#[tokio::test]
async fn test_explain_name_mismatch_is_409() {
    let mut artifact = common::car_artifact();
    artifact.feature_names.truncate(artifact.feature_names.len() - 2);
    let (_dir, app) = test_app(&artifact);

    let response = app.oneshot(get("/api/explain")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["kind"], "schema_mismatch");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (_dir, app) = test_app(&common::car_artifact());
    let response = app.oneshot(get("/api/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
