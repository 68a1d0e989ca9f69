/// Machine learning module for churn prediction
///
/// This module provides:
/// - Normalization of raw customer records into the training feature layout
/// - Model artifact loading (logistic regression, random forest)
/// - The prediction service combining both with risk bucketing

pub mod classifier;
pub mod features;
pub mod models;
pub mod service;

pub use classifier::{
    load_model, ChurnClassifier, DecisionTree, LoadedModel, LogisticRegressionClassifier,
    ModelArtifact, ModelParams, RandomForestClassifier, TreeNode,
};
pub use features::{
    normalize_column_name, FeatureNormalizer, NormalizedBatch, EXPECTED_FEATURES,
    INDICATOR_FEATURES, NUMERICAL_FEATURES,
};
pub use models::{
    ChurnPrediction, ModelMetadata, ModelType, RiskLevel, RiskThresholds, ScalerStats,
};
pub use service::PredictionService;
