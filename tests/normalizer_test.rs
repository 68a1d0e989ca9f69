/// Integration tests for feature normalization
///
/// These tests verify the normalizer through its public API:
/// - Fixed output layout regardless of input
/// - Drop-first one-hot encoding over the batch
/// - Per-batch and persisted standardization

use churn_predictor::{
    ml::{FeatureNormalizer, ScalerStats, EXPECTED_FEATURES, NUMERICAL_FEATURES},
    models::CustomerRecord,
    AppError,
};

fn customer(seconds: f64, tariff: f64, status: f64) -> CustomerRecord {
    CustomerRecord {
        seconds_of_use: Some(seconds),
        tariff_plan: Some(tariff),
        status: Some(status),
        ..CustomerRecord::example()
    }
}

#[test]
fn test_single_record_layout() {
    let batch = FeatureNormalizer::new()
        .normalize_one(&CustomerRecord::example())
        .unwrap();

    assert_eq!(batch.n_rows(), 1);
    assert_eq!(batch.n_features(), 13);
    assert_eq!(batch.feature_names(), &EXPECTED_FEATURES[..]);

    // one observation: every numerical column is constant and every
    // categorical field has a single category, which is dropped
    assert!(batch.row(0).iter().all(|&v| v == 0.0));
}

#[test]
fn test_empty_record_still_produces_full_vector() {
    let batch = FeatureNormalizer::new()
        .normalize_one(&CustomerRecord::default())
        .unwrap();

    assert_eq!(batch.n_features(), EXPECTED_FEATURES.len());
    assert!(batch.row(0).iter().all(|&v| v == 0.0));
}

#[test]
fn test_batch_one_hot_encoding() {
    let batch = FeatureNormalizer::new()
        .normalize(&[customer(100.0, 1.0, 1.0), customer(300.0, 2.0, 2.0)])
        .unwrap();

    assert_eq!(batch.value(0, "tariff_plan_2"), Some(0.0));
    assert_eq!(batch.value(1, "tariff_plan_2"), Some(1.0));
    assert_eq!(batch.value(0, "status_2"), Some(0.0));
    assert_eq!(batch.value(1, "status_2"), Some(1.0));

    // complains is 0 for both rows, so no indicator is produced
    assert_eq!(batch.value(0, "complains_1"), Some(0.0));
    assert_eq!(batch.value(1, "complains_1"), Some(0.0));
}

#[test]
fn test_drop_first_uses_lowest_observed_category() {
    // with only categories 2 and 3 present, 2 is dropped and status_3 is
    // not part of the model input
    let batch = FeatureNormalizer::new()
        .normalize(&[customer(10.0, 1.0, 2.0), customer(10.0, 1.0, 3.0)])
        .unwrap();

    assert_eq!(batch.value(0, "status_2"), Some(0.0));
    assert_eq!(batch.value(1, "status_2"), Some(0.0));
    assert_eq!(batch.value(0, "status_3"), None);
}

#[test]
fn test_batch_standardization() {
    let batch = FeatureNormalizer::new()
        .normalize(&[customer(100.0, 1.0, 1.0), customer(300.0, 1.0, 1.0)])
        .unwrap();

    // population standard deviation of {100, 300} is 100
    assert!((batch.value(0, "seconds_of_use").unwrap() + 1.0).abs() < 1e-12);
    assert!((batch.value(1, "seconds_of_use").unwrap() - 1.0).abs() < 1e-12);

    // identical columns are centered only
    assert_eq!(batch.value(0, "age"), Some(0.0));
    assert_eq!(batch.value(1, "age"), Some(0.0));
}

#[test]
fn test_indicators_are_not_scaled() {
    let batch = FeatureNormalizer::new()
        .normalize(&[
            customer(1.0, 2.0, 1.0),
            customer(2.0, 1.0, 1.0),
            customer(3.0, 1.0, 1.0),
        ])
        .unwrap();

    let column: Vec<f64> = (0..3)
        .map(|row| batch.value(row, "tariff_plan_2").unwrap())
        .collect();
    assert_eq!(column, vec![1.0, 0.0, 0.0]);
}

#[test]
fn test_persisted_scaler() {
    let mut mean = vec![0.0; NUMERICAL_FEATURES.len()];
    let mut scale = vec![1.0; NUMERICAL_FEATURES.len()];
    mean[3] = 4000.0;
    scale[3] = 185.0;

    let normalizer = FeatureNormalizer::with_scaler(ScalerStats { mean, scale }).unwrap();
    assert!(normalizer.uses_persisted_scaler());

    let batch = normalizer.normalize_one(&CustomerRecord::example()).unwrap();

    assert!((batch.value(0, "seconds_of_use").unwrap() - 2.0).abs() < 1e-12);
    assert_eq!(batch.value(0, "age"), Some(30.0));
}

#[test]
fn test_persisted_scaler_wrong_length() {
    let stats = ScalerStats {
        mean: vec![0.0; 3],
        scale: vec![1.0; 3],
    };
    assert!(FeatureNormalizer::with_scaler(stats).is_err());
}

#[test]
fn test_empty_batch_rejected() {
    assert!(matches!(
        FeatureNormalizer::new().normalize(&[]),
        Err(AppError::Processing(_))
    ));
}
