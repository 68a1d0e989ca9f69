use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Risk bucketing configuration
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CHURN__)
            .add_source(
                config::Environment::with_prefix("CHURN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints the serde layer cannot express
    pub fn validate(&self) -> Result<()> {
        self.prediction.validate()?;

        if self.prediction.low_risk_max >= self.prediction.medium_risk_max {
            return Err(AppError::Configuration(format!(
                "low_risk_max ({}) must be below medium_risk_max ({})",
                self.prediction.low_risk_max, self.prediction.medium_risk_max
            )));
        }

        Ok(())
    }

    /// Socket address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the model artifact, relative to the working directory
    #[serde(default = "default_model_path")]
    pub path: PathBuf,

    /// Where the numerical standardization statistics come from
    #[serde(default)]
    pub scaling: ScalingMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            scaling: ScalingMode::default(),
        }
    }
}

/// Source of the mean/scale used to standardize numerical features
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Fit on the records of the request being processed
    #[default]
    PerRequest,
    /// Use the scaler statistics stored in the model artifact
    Persisted,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictionConfig {
    /// Churn probabilities up to and including this value are Low risk
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_low_risk_max")]
    pub low_risk_max: f64,

    /// Churn probabilities up to and including this value are Medium risk
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_medium_risk_max")]
    pub medium_risk_max: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            low_risk_max: default_low_risk_max(),
            medium_risk_max: default_medium_risk_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/churn_model.json")
}

fn default_low_risk_max() -> f64 {
    0.3
}

fn default_medium_risk_max() -> f64 {
    0.7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "churn-predictor".to_string()
}

fn default_true() -> bool {
    true
}
