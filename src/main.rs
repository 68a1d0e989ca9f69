use churn_predictor::{
    api::{build_router, AppState},
    config::Config,
    metrics::MODEL_LOADED,
    ml::{load_model, LoadedModel, PredictionService, RiskThresholds},
};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config);

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = churn_predictor::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    let model = try_load_model(&config.model.path);
    MODEL_LOADED.set(if model.is_some() { 1.0 } else { 0.0 });

    let predictor = PredictionService::new(
        model,
        config.model.scaling,
        RiskThresholds::from(&config.prediction),
    );
    tracing::info!(
        scaling = ?config.model.scaling,
        low_risk_max = config.prediction.low_risk_max,
        medium_risk_max = config.prediction.medium_risk_max,
        "✅ Prediction service initialized"
    );

    let app = build_router(AppState::new(predictor));

    // Start HTTP server
    let http_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Predict: http://{}/predict", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "churn_predictor={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// A missing or unreadable artifact leaves the service up without a model
fn try_load_model(path: &Path) -> Option<LoadedModel> {
    if !path.exists() {
        tracing::warn!(
            "⚠️  Model file {} not found, predictions are disabled",
            path.display()
        );
        return None;
    }

    match load_model(path) {
        Ok(model) => {
            tracing::info!("✅ Model loaded from {}", path.display());
            Some(model)
        }
        Err(e) => {
            tracing::error!("Failed to load model from {}: {}", path.display(), e);
            tracing::warn!("   Continuing without a model");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
