use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::PREDICTION_ERRORS_TOTAL;
use crate::ml::ChurnPrediction;
use crate::models::{CustomerRecord, FieldKind, FieldSpec, RAW_FIELDS};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Routes served by this API, as listed by `/health`
pub const ENDPOINTS: [EndpointInfo; 5] = [
    EndpointInfo {
        method: "GET",
        path: "/",
        description: "Service status and version",
    },
    EndpointInfo {
        method: "GET",
        path: "/health",
        description: "Detailed health status",
    },
    EndpointInfo {
        method: "GET",
        path: "/features",
        description: "Expected input fields and an example payload",
    },
    EndpointInfo {
        method: "POST",
        path: "/predict",
        description: "Predict churn for one customer",
    },
    EndpointInfo {
        method: "GET",
        path: "/metrics",
        description: "Prometheus metrics",
    },
];

/// Service status
pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Customer Churn Prediction API".to_string(),
        status: "running".to_string(),
        model_loaded: state.predictor.is_model_loaded(),
        version: API_VERSION.to_string(),
        description: "Predicts whether a telecom customer will churn from usage and account data"
            .to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
    pub description: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let loaded = state.predictor.is_model_loaded();

    Json(HealthResponse {
        status: if loaded { "healthy" } else { "degraded" }.to_string(),
        model_status: if loaded { "loaded" } else { "not loaded" }.to_string(),
        api_version: API_VERSION.to_string(),
        endpoints: ENDPOINTS.to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_status: String,
    pub api_version: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// Static documentation of the input schema
pub async fn features() -> Json<FeaturesResponse> {
    let names_of = |kind: FieldKind| {
        RAW_FIELDS
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.key)
            .collect::<Vec<_>>()
    };

    Json(FeaturesResponse {
        required_features: RAW_FIELDS.to_vec(),
        numerical_features: names_of(FieldKind::Numerical),
        categorical_features: names_of(FieldKind::Categorical),
        example_payload: CustomerRecord::example(),
    })
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub required_features: Vec<FieldSpec>,
    pub numerical_features: Vec<&'static str>,
    pub categorical_features: Vec<&'static str>,
    pub example_payload: CustomerRecord,
}

/// Predict churn for one customer
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<ChurnPrediction>> {
    let result = score(&state, &body);

    if let Err(e) = &result {
        PREDICTION_ERRORS_TOTAL
            .with_label_values(&[e.error_code()])
            .inc();
    }

    let prediction = result?;
    tracing::info!(
        churn_prediction = prediction.churn_prediction,
        churn_probability = prediction.churn_probability,
        risk_level = %prediction.risk_level,
        "Prediction served"
    );

    Ok(Json(prediction))
}

fn score(state: &AppState, body: &[u8]) -> Result<ChurnPrediction> {
    // checked first so every call reports the missing model
    if !state.predictor.is_model_loaded() {
        return Err(AppError::ModelNotLoaded);
    }

    let record = parse_record(body)?;
    state.predictor.predict(&record)
}

/// Parse a request body into a customer record.
///
/// Empty bodies, `null` and `{}` count as no input.
pub fn parse_record(body: &[u8]) -> Result<CustomerRecord> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyPayload);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON payload: {}", e)))?;

    match value {
        Value::Null => Err(AppError::EmptyPayload),
        Value::Object(ref fields) if fields.is_empty() => Err(AppError::EmptyPayload),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Invalid input record: {}", e))),
        _ => Err(AppError::Validation(
            "Expected a JSON object mapping field names to values".to_string(),
        )),
    }
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_empty_inputs() {
        assert!(matches!(parse_record(b""), Err(AppError::EmptyPayload)));
        assert!(matches!(parse_record(b"  \n"), Err(AppError::EmptyPayload)));
        assert!(matches!(parse_record(b"{}"), Err(AppError::EmptyPayload)));
        assert!(matches!(parse_record(b"null"), Err(AppError::EmptyPayload)));
    }

    #[test]
    fn test_parse_record_malformed() {
        assert!(matches!(parse_record(b"{not json"), Err(AppError::Validation(_))));
        assert!(matches!(parse_record(b"[1, 2]"), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_record(br#"{"Age": "thirty"}"#),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_record_partial() {
        let record = parse_record(br#"{"Age": 30, "Status": 2}"#).unwrap();
        assert_eq!(record.age, Some(30.0));
        assert_eq!(record.status, Some(2.0));
        assert_eq!(record.tariff_plan, None);
    }

    #[test]
    fn test_endpoints_cover_routes() {
        let paths: Vec<&str> = ENDPOINTS.iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/", "/health", "/features", "/predict", "/metrics"]);
    }
}
