use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No model artifact was loaded at startup
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// Request body was empty or an empty JSON object
    #[error("No input data provided")]
    EmptyPayload,

    /// Request body could not be parsed into a customer record
    #[error("{0}")]
    Validation(String),

    /// Normalization or inference failed
    #[error("{0}")]
    Processing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Model artifact could not be read or decoded
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ModelNotLoaded => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::EmptyPayload => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Processing(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ModelLoad(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string, used as the metrics label
    pub fn error_code(&self) -> &str {
        match self {
            AppError::ModelNotLoaded => "MODEL_NOT_LOADED",
            AppError::EmptyPayload => "EMPTY_PAYLOAD",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Processing(_) => "PROCESSING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request rejected"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::ModelNotLoaded.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::EmptyPayload.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Validation("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Processing("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AppError::ModelNotLoaded.to_string(), "Model not loaded");
        assert_eq!(AppError::EmptyPayload.to_string(), "No input data provided");
        assert_eq!(
            AppError::Processing("shape mismatch".to_string()).to_string(),
            "shape mismatch"
        );
    }

    #[tokio::test]
    async fn test_error_body_is_flat() {
        let response = AppError::ModelNotLoaded.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Model not loaded" }));
    }
}
