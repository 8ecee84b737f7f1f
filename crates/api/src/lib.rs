//! Flight Delay API Server
//!
//! REST front end for the delay classifier: validates incoming flight
//! batches, encodes them and returns one 0/1 prediction per flight.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use data_validator::Validator;
use delay_scorer::DelayScorer;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
pub mod routes;
mod settings;
mod training;

pub use error::ApiError;
pub use settings::ServiceConfig;
pub use training::train;

/// Application state shared across handlers
pub struct AppState {
    /// Delay scorer (read-mostly; training happens out of band)
    pub scorer: DelayScorer,
    /// Boundary validator for incoming records
    pub validator: Validator,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from config, loading the persisted model if present
    pub fn new(config: &ServiceConfig) -> Self {
        let scorer = DelayScorer::with_params(config.booster.clone(), &config.model_path)
            .with_threshold(config.threshold);
        Self::with_scorer(scorer)
    }

    /// Build state around an existing scorer
    pub fn with_scorer(scorer: DelayScorer) -> Self {
        Self {
            scorer,
            validator: Validator::default(),
            metrics: None,
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(routes::predict::post_predict))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging at the given max level
pub fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level: Level = level.parse()?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Run the server
pub async fn run_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = AppState::new(&config);
    state.metrics = Some(PrometheusBuilder::new().install_recorder()?);
    info!(
        "Model state: {:?}, threshold {}",
        state.scorer.state()?,
        state.scorer.threshold()
    );

    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
