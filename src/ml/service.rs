use crate::config::ScalingMode;
use crate::error::{AppError, Result};
use crate::metrics::{PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS};
use crate::ml::classifier::{ChurnClassifier, LoadedModel};
use crate::ml::features::FeatureNormalizer;
use crate::ml::models::{ChurnPrediction, ModelMetadata, ModelType, RiskLevel, RiskThresholds};
use crate::models::CustomerRecord;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Scores customers with the model loaded at startup.
///
/// Immutable after construction; shared across request handlers.
pub struct PredictionService {
    /// Classifier, absent when no artifact could be loaded
    model: Option<Arc<dyn ChurnClassifier>>,

    /// Feature normalizer
    normalizer: FeatureNormalizer,

    /// Risk bucket bounds
    thresholds: RiskThresholds,
}

impl PredictionService {
    /// Create a prediction service
    pub fn new(model: Option<LoadedModel>, scaling: ScalingMode, thresholds: RiskThresholds) -> Self {
        let (model, scaler) = match model {
            Some(loaded) => (Some(loaded.classifier), loaded.scaler),
            None => (None, None),
        };

        let normalizer = match (scaling, scaler) {
            (ScalingMode::Persisted, Some(stats)) => match FeatureNormalizer::with_scaler(stats) {
                Ok(normalizer) => normalizer,
                Err(e) => {
                    warn!(error = %e, "Unusable persisted scaler, fitting per request");
                    FeatureNormalizer::new()
                }
            },
            (ScalingMode::Persisted, None) => {
                if model.is_some() {
                    warn!("Persisted scaling requested but the artifact has no scaler statistics, fitting per request");
                }
                FeatureNormalizer::new()
            }
            (ScalingMode::PerRequest, _) => FeatureNormalizer::new(),
        };

        Self {
            model,
            normalizer,
            thresholds,
        }
    }

    /// Service with no model; every prediction fails with `ModelNotLoaded`
    pub fn without_model(thresholds: RiskThresholds) -> Self {
        Self::new(None, ScalingMode::PerRequest, thresholds)
    }

    /// Check if a model is loaded
    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Get model metadata
    pub fn model_metadata(&self) -> Option<&ModelMetadata> {
        self.model.as_ref().map(|m| m.metadata())
    }

    /// Get model type
    pub fn model_type(&self) -> Option<ModelType> {
        self.model.as_ref().map(|m| m.model_type())
    }

    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Predict churn for a single customer
    pub fn predict(&self, record: &CustomerRecord) -> Result<ChurnPrediction> {
        self.predict_batch(std::slice::from_ref(record))?
            .pop()
            .ok_or_else(|| AppError::Internal("Model returned no prediction".to_string()))
    }

    /// Predict churn for several customers normalized together
    pub fn predict_batch(&self, records: &[CustomerRecord]) -> Result<Vec<ChurnPrediction>> {
        let model = self.model.as_ref().ok_or(AppError::ModelNotLoaded)?;
        let start = Instant::now();

        let batch = self.normalizer.normalize(records)?;
        let labels = model.predict(&batch.features)?;
        let proba = model.predict_proba(&batch.features)?;

        if labels.len() != batch.n_rows() || proba.shape() != [batch.n_rows(), 2] {
            return Err(AppError::Processing(format!(
                "Model output shape {:?} does not match {} input rows",
                proba.shape(),
                batch.n_rows()
            )));
        }

        let predictions: Vec<ChurnPrediction> = labels
            .iter()
            .zip(proba.rows())
            .map(|(&label, row)| {
                let churn_probability = row[1];
                let risk_level = RiskLevel::from_probability(churn_probability, &self.thresholds);
                PREDICTIONS_TOTAL
                    .with_label_values(&[risk_level.as_str()])
                    .inc();

                ChurnPrediction {
                    churn_prediction: u8::from(label == 1),
                    churn_probability,
                    no_churn_probability: row[0],
                    risk_level,
                    input_features_processed: batch.n_features(),
                }
            })
            .collect();

        PREDICTION_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());

        debug!(
            rows = predictions.len(),
            present_fields = records.iter().map(CustomerRecord::present_fields).sum::<usize>(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Batch scored"
        );

        Ok(predictions)
    }
}
