use crate::config::PredictionConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Training timestamp, when the artifact records one
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,

    /// Hyperparameters, informational only
    #[serde(default)]
    pub hyperparameters: HashMap<String, String>,
}

impl ModelMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            trained_at: None,
            hyperparameters: HashMap::new(),
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Logistic regression
    LogisticRegression,

    /// Random forest
    RandomForest,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::LogisticRegression => write!(f, "Logistic Regression"),
            ModelType::RandomForest => write!(f, "Random Forest"),
        }
    }
}

/// Mean and scale per numerical feature, as fit at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Churn risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a churn probability. Upper bounds are inclusive.
    pub fn from_probability(probability: f64, thresholds: &RiskThresholds) -> Self {
        if probability > thresholds.medium_max {
            RiskLevel::High
        } else if probability > thresholds.low_max {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive upper bounds of the Low and Medium buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max: 0.3,
            medium_max: 0.7,
        }
    }
}

impl From<&PredictionConfig> for RiskThresholds {
    fn from(config: &PredictionConfig) -> Self {
        Self {
            low_max: config.low_risk_max,
            medium_max: config.medium_risk_max,
        }
    }
}

/// Outcome of scoring one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    /// Predicted class: 1 if the customer is expected to churn
    pub churn_prediction: u8,

    /// Probability of class 1
    pub churn_probability: f64,

    /// Probability of class 0
    pub no_churn_probability: f64,

    /// Bucketed churn probability
    pub risk_level: RiskLevel,

    /// Length of the feature vector fed to the model
    pub input_features_processed: usize,
}
