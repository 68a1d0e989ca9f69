//! Shared fixtures for the integration tests

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use churn_predictor::{
    api::{build_router, AppState},
    config::ScalingMode,
    ml::{
        ModelArtifact, ModelMetadata, ModelParams, PredictionService, RiskThresholds,
        EXPECTED_FEATURES,
    },
};
use serde_json::Value;
use tower::ServiceExt;

pub fn feature_names() -> Vec<String> {
    EXPECTED_FEATURES.iter().map(|s| s.to_string()).collect()
}

/// Logistic regression artifact with uniform coefficients
pub fn logistic_artifact(coefficient: f64, intercept: f64) -> ModelArtifact {
    ModelArtifact {
        metadata: ModelMetadata::new("fixture-logreg", "0.1.0"),
        feature_names: feature_names(),
        params: ModelParams::LogisticRegression {
            coefficients: vec![coefficient; EXPECTED_FEATURES.len()],
            intercept,
        },
        threshold: 0.5,
        scaler: None,
    }
}

/// Router backed by a logistic regression with the given intercept.
///
/// A single record standardizes to all zeros, so the churn probability is
/// `sigmoid(intercept)`.
pub fn app_with_intercept(intercept: f64) -> Router {
    let model = logistic_artifact(0.5, intercept)
        .into_model()
        .expect("fixture artifact is valid");
    let service = PredictionService::new(
        Some(model),
        ScalingMode::PerRequest,
        RiskThresholds::default(),
    );
    build_router(AppState::new(service))
}

pub fn app_without_model() -> Router {
    build_router(AppState::new(PredictionService::without_model(
        RiskThresholds::default(),
    )))
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post(app: Router, uri: &str, body: impl Into<String>) -> (StatusCode, Vec<u8>) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.into()))
            .unwrap(),
    )
    .await
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = get(app, uri).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn post_json(app: Router, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
    let (status, bytes) = post(app, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

/// Example customer as sent by clients, with the dataset's double-spaced keys
pub fn example_payload() -> Value {
    serde_json::json!({
        "Call  Failure": 8,
        "Complains": 0,
        "Subscription  Length": 38,
        "Charge  Amount": 0,
        "Seconds of Use": 4370,
        "Frequency of use": 71,
        "Frequency of SMS": 5,
        "Distinct Called Numbers": 17,
        "Age Group": 3,
        "Tariff Plan": 1,
        "Status": 1,
        "Age": 30,
        "Customer Value": 197.64
    })
}
