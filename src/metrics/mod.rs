/// Prometheus metrics for the prediction service.
///
/// Metrics are process-wide and exposed in text format at `GET /metrics`.
///
/// # Example
/// ```no_run
/// use churn_predictor::metrics::PREDICTIONS_TOTAL;
///
/// PREDICTIONS_TOTAL.with_label_values(&["High"]).inc();
/// ```
use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of customers scored
    ///
    /// Labels: risk_level
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of churn predictions served")
            .namespace("churn_predictor"),
        &["risk_level"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Total number of failed prediction requests
    ///
    /// Labels: kind
    pub static ref PREDICTION_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("prediction_errors_total", "Total number of failed prediction requests")
            .namespace("churn_predictor"),
        &["kind"]
    ).expect("Failed to create PREDICTION_ERRORS_TOTAL metric");

    /// Time spent normalizing and scoring a batch
    pub static ref PREDICTION_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "prediction_duration_seconds",
            "Normalization and inference duration in seconds"
        )
        .namespace("churn_predictor")
        .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
    ).expect("Failed to create PREDICTION_DURATION_SECONDS metric");

    /// 1 when a model artifact is loaded, 0 otherwise
    pub static ref MODEL_LOADED: Gauge = Gauge::with_opts(
        Opts::new("model_loaded", "Whether a model artifact is loaded")
            .namespace("churn_predictor")
    ).expect("Failed to create MODEL_LOADED metric");
}

/// Register all metrics with the global registry.
///
/// Call once at startup; a second call returns an `AlreadyReg` error.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_ERRORS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(MODEL_LOADED.clone()))?;
    Ok(())
}

/// Encode the registry in Prometheus text exposition format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
