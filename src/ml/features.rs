use crate::error::{AppError, Result};
use crate::ml::models::ScalerStats;
use crate::models::{CustomerRecord, FieldKind, RAW_FIELDS};
use ndarray::{Array2, ArrayView1, Axis};

/// Numerical features, in model order
pub const NUMERICAL_FEATURES: [&str; 10] = [
    "call_failure",
    "subscription_length",
    "charge_amount",
    "seconds_of_use",
    "frequency_of_use",
    "frequency_of_sms",
    "distinct_called_numbers",
    "age_group",
    "age",
    "customer_value",
];

/// Indicator features produced by drop-first one-hot encoding
pub const INDICATOR_FEATURES: [&str; 3] = ["complains_1", "tariff_plan_2", "status_2"];

/// Full model input, in model order
pub const EXPECTED_FEATURES: [&str; 13] = [
    "call_failure",
    "subscription_length",
    "charge_amount",
    "seconds_of_use",
    "frequency_of_use",
    "frequency_of_sms",
    "distinct_called_numbers",
    "age_group",
    "age",
    "customer_value",
    "complains_1",
    "tariff_plan_2",
    "status_2",
];

/// Lowercase, collapse whitespace runs, then join words with underscores
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace(' ', "_")
}

/// Label used in an indicator column name; integral values drop the fraction
pub fn category_label(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Feature matrix ready for the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    /// One row per input record, columns in `EXPECTED_FEATURES` order
    pub features: Array2<f64>,
}

impl NormalizedBatch {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &EXPECTED_FEATURES
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.features.row(index)
    }

    /// Look up a single value by row and feature name
    pub fn value(&self, row: usize, feature: &str) -> Option<f64> {
        let col = EXPECTED_FEATURES.iter().position(|f| *f == feature)?;
        self.features.get((row, col)).copied()
    }
}

/// Turns raw customer records into the fixed training-time feature layout
#[derive(Debug, Clone, Default)]
pub struct FeatureNormalizer {
    /// Training-time scaler; when absent the scaler is fit on each batch
    scaler: Option<ScalerStats>,
}

impl FeatureNormalizer {
    /// Normalizer that standardizes with statistics of the batch itself
    pub fn new() -> Self {
        Self { scaler: None }
    }

    /// Normalizer that standardizes with persisted training statistics
    pub fn with_scaler(scaler: ScalerStats) -> Result<Self> {
        if scaler.mean.len() != NUMERICAL_FEATURES.len()
            || scaler.scale.len() != NUMERICAL_FEATURES.len()
        {
            return Err(AppError::ModelLoad(format!(
                "scaler statistics must cover {} numerical features, got mean={} scale={}",
                NUMERICAL_FEATURES.len(),
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        Ok(Self {
            scaler: Some(scaler),
        })
    }

    /// Whether persisted training statistics are used
    pub fn uses_persisted_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn n_features(&self) -> usize {
        EXPECTED_FEATURES.len()
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &EXPECTED_FEATURES
    }

    /// Normalize a single record
    pub fn normalize_one(&self, record: &CustomerRecord) -> Result<NormalizedBatch> {
        self.normalize(std::slice::from_ref(record))
    }

    /// Encode, complete, reorder and scale a batch of records
    pub fn normalize(&self, records: &[CustomerRecord]) -> Result<NormalizedBatch> {
        if records.is_empty() {
            return Err(AppError::Processing(
                "Cannot normalize an empty batch of records".to_string(),
            ));
        }

        let encoded = Self::encode(records);
        let mut features = Self::complete_and_reorder(&encoded, records.len());
        self.standardize(&mut features);

        Ok(NormalizedBatch { features })
    }

    /// One-hot encode categorical fields (dropping the first observed
    /// category) and normalize every column name.
    fn encode(records: &[CustomerRecord]) -> Vec<(String, Vec<f64>)> {
        let rows: Vec<[Option<f64>; 13]> = records.iter().map(CustomerRecord::values).collect();
        let mut columns = Vec::new();
        let mut indicators = Vec::new();

        for (idx, field) in RAW_FIELDS.iter().enumerate() {
            match field.kind {
                FieldKind::Numerical => {
                    let values = rows.iter().map(|r| r[idx].unwrap_or(0.0)).collect();
                    columns.push((normalize_column_name(field.key), values));
                }
                FieldKind::Categorical => {
                    let mut categories: Vec<f64> = rows.iter().filter_map(|r| r[idx]).collect();
                    categories.sort_by(|a, b| a.total_cmp(b));
                    categories.dedup();

                    for category in categories.into_iter().skip(1) {
                        let name = normalize_column_name(&format!(
                            "{}_{}",
                            field.key,
                            category_label(category)
                        ));
                        let values = rows
                            .iter()
                            .map(|r| if r[idx] == Some(category) { 1.0 } else { 0.0 })
                            .collect();
                        indicators.push((name, values));
                    }
                }
            }
        }

        columns.extend(indicators);
        columns
    }

    /// Select the expected columns in model order, zero-filling absent ones
    /// and discarding anything else.
    fn complete_and_reorder(columns: &[(String, Vec<f64>)], n_rows: usize) -> Array2<f64> {
        let mut features = Array2::zeros((n_rows, EXPECTED_FEATURES.len()));

        for (col, name) in EXPECTED_FEATURES.iter().enumerate() {
            if let Some((_, values)) = columns.iter().find(|(n, _)| n == name) {
                for (row, value) in values.iter().enumerate() {
                    features[[row, col]] = *value;
                }
            }
        }

        features
    }

    /// Zero-mean, unit-variance scaling of the numerical columns
    fn standardize(&self, features: &mut Array2<f64>) {
        for (col, mut column) in features
            .axis_iter_mut(Axis(1))
            .take(NUMERICAL_FEATURES.len())
            .enumerate()
        {
            let (mean, scale) = match &self.scaler {
                Some(stats) => (stats.mean[col], stats.scale[col]),
                None => {
                    let mean = column.mean().unwrap_or(0.0);
                    let variance = column.mapv(|x| (x - mean).powi(2)).mean().unwrap_or(0.0);
                    (mean, variance.sqrt())
                }
            };
            // constant columns are only centered
            let scale = if scale.abs() > f64::EPSILON { scale } else { 1.0 };

            column.mapv_inplace(|x| (x - mean) / scale);
        }
    }
}
