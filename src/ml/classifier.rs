use crate::error::{AppError, Result};
use crate::ml::features::{EXPECTED_FEATURES, NUMERICAL_FEATURES};
use crate::ml::models::{ModelMetadata, ModelType, ScalerStats};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Trait for binary churn classifiers
pub trait ChurnClassifier: Send + Sync {
    /// Predict class labels (0: stays, 1: churns)
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>>;

    /// Predict class probabilities, one `[p_no_churn, p_churn]` row per sample
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Number of input features the model expects
    fn n_features(&self) -> usize;
}

fn check_width(features: &Array2<f64>, expected: usize) -> Result<()> {
    if features.ncols() != expected {
        return Err(AppError::Processing(format!(
            "X has {} features, but the model is expecting {} features as input",
            features.ncols(),
            expected
        )));
    }
    Ok(())
}

fn two_class_proba(churn: &Array1<f64>) -> Array2<f64> {
    let mut proba = Array2::zeros((churn.len(), 2));
    for (i, &p) in churn.iter().enumerate() {
        proba[[i, 0]] = 1.0 - p;
        proba[[i, 1]] = p;
    }
    proba
}

fn labels_from_proba(proba: &Array2<f64>, threshold: f64) -> Vec<usize> {
    proba
        .column(1)
        .iter()
        .map(|&p| usize::from(p > threshold))
        .collect()
}

/// Logistic Regression Classifier
pub struct LogisticRegressionClassifier {
    metadata: ModelMetadata,
    coefficients: Array1<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticRegressionClassifier {
    pub fn new(
        metadata: ModelMetadata,
        coefficients: Vec<f64>,
        intercept: f64,
        threshold: f64,
    ) -> Self {
        Self {
            metadata,
            coefficients: Array1::from_vec(coefficients),
            intercept,
            threshold,
        }
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }
}

impl ChurnClassifier for LogisticRegressionClassifier {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(features)?;
        Ok(labels_from_proba(&proba, self.threshold))
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.coefficients.len())?;

        let churn = features
            .dot(&self.coefficients)
            .mapv(|z| Self::sigmoid(z + self.intercept));

        Ok(two_class_proba(&churn))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::LogisticRegression
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

/// Node of a flattened decision tree. Children always come after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go left when `x[feature] <= threshold`, right otherwise
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Fraction of churned training samples in the leaf
    Leaf { probability: f64 },
}

/// Flattened decision tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check that traversal always terminates on a leaf
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(AppError::ModelLoad("decision tree has no nodes".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(AppError::ModelLoad(format!(
                            "node {} splits on feature {} but only {} exist",
                            idx, feature, n_features
                        )));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(AppError::ModelLoad(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(probability) {
                        return Err(AppError::ModelLoad(format!(
                            "leaf {} has probability {} outside [0, 1]",
                            idx, probability
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn evaluate(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { probability } => return *probability,
            }
        }
    }
}

/// Random forest: churn probability is the mean over trees
pub struct RandomForestClassifier {
    metadata: ModelMetadata,
    trees: Vec<DecisionTree>,
    n_features: usize,
    threshold: f64,
}

impl RandomForestClassifier {
    pub fn new(
        metadata: ModelMetadata,
        trees: Vec<DecisionTree>,
        n_features: usize,
        threshold: f64,
    ) -> Result<Self> {
        if trees.is_empty() {
            return Err(AppError::ModelLoad("random forest has no trees".to_string()));
        }
        for tree in &trees {
            tree.validate(n_features)?;
        }

        Ok(Self {
            metadata,
            trees,
            n_features,
            threshold,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl ChurnClassifier for RandomForestClassifier {
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(features)?;
        Ok(labels_from_proba(&proba, self.threshold))
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        check_width(features, self.n_features)?;

        let n_trees = self.trees.len() as f64;
        let churn: Array1<f64> = features
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.evaluate(row)).sum::<f64>() / n_trees)
            .collect();

        Ok(two_class_proba(&churn))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::RandomForest
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Learned parameters, tagged by model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelParams {
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
    RandomForest { trees: Vec<DecisionTree> },
}

/// On-disk model artifact.
///
/// Stored as JSON (`.json`) or bincode (`.bin`). Only externally tagged
/// enums are used so both formats round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,

    /// Feature names in the order the model consumes them
    pub feature_names: Vec<String>,

    pub params: ModelParams,

    /// Class 1 is predicted when the churn probability exceeds this value
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Training-time standardization statistics for the numerical features
    #[serde(default)]
    pub scaler: Option<ScalerStats>,
}

fn default_threshold() -> f64 {
    0.5
}

/// A validated, ready-to-serve model
#[derive(Clone)]
pub struct LoadedModel {
    pub classifier: Arc<dyn ChurnClassifier>,
    pub scaler: Option<ScalerStats>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_type", &self.classifier.model_type())
            .field("metadata", self.classifier.metadata())
            .field("scaler", &self.scaler.is_some())
            .finish()
    }
}

enum ArtifactFormat {
    Json,
    Bincode,
}

impl ArtifactFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => ArtifactFormat::Bincode,
            _ => ArtifactFormat::Json,
        }
    }
}

impl ModelArtifact {
    /// Read an artifact, picking the format from the file extension
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::ModelLoad(format!("cannot read {}: {}", path.display(), e))
        })?;

        let artifact = match ArtifactFormat::from_path(path) {
            ArtifactFormat::Json => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::ModelLoad(format!("invalid JSON artifact {}: {}", path.display(), e))
            })?,
            ArtifactFormat::Bincode => bincode::deserialize(&bytes).map_err(|e| {
                AppError::ModelLoad(format!("invalid bincode artifact {}: {}", path.display(), e))
            })?,
        };

        Ok(artifact)
    }

    /// Write the artifact, picking the format from the file extension
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = match ArtifactFormat::from_path(path) {
            ArtifactFormat::Json => serde_json::to_vec_pretty(self)?,
            ArtifactFormat::Bincode => bincode::serialize(self)?,
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Validate the artifact against the serving schema and build the classifier
    pub fn into_model(self) -> Result<LoadedModel> {
        if self.feature_names.len() != EXPECTED_FEATURES.len()
            || self
                .feature_names
                .iter()
                .zip(EXPECTED_FEATURES.iter())
                .any(|(a, b)| a != b)
        {
            return Err(AppError::ModelLoad(format!(
                "artifact features {:?} do not match the serving schema {:?}",
                self.feature_names, EXPECTED_FEATURES
            )));
        }

        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(AppError::ModelLoad(format!(
                "decision threshold {} must lie strictly between 0 and 1",
                self.threshold
            )));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != NUMERICAL_FEATURES.len()
                || scaler.scale.len() != NUMERICAL_FEATURES.len()
            {
                return Err(AppError::ModelLoad(format!(
                    "scaler statistics must cover {} numerical features",
                    NUMERICAL_FEATURES.len()
                )));
            }
        }

        let n_features = self.feature_names.len();
        let classifier: Arc<dyn ChurnClassifier> = match self.params {
            ModelParams::LogisticRegression {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != n_features {
                    return Err(AppError::ModelLoad(format!(
                        "logistic regression has {} coefficients for {} features",
                        coefficients.len(),
                        n_features
                    )));
                }
                Arc::new(LogisticRegressionClassifier::new(
                    self.metadata,
                    coefficients,
                    intercept,
                    self.threshold,
                ))
            }
            ModelParams::RandomForest { trees } => Arc::new(RandomForestClassifier::new(
                self.metadata,
                trees,
                n_features,
                self.threshold,
            )?),
        };

        Ok(LoadedModel {
            classifier,
            scaler: self.scaler,
        })
    }
}

/// Load and validate the model artifact at `path`
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LoadedModel> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading model artifact");

    let model = ModelArtifact::read(path)?.into_model()?;

    info!(
        model = %model.classifier.metadata().name,
        version = %model.classifier.metadata().version,
        model_type = %model.classifier.model_type(),
        n_features = model.classifier.n_features(),
        persisted_scaler = model.scaler.is_some(),
        "Model loaded successfully"
    );

    Ok(model)
}
