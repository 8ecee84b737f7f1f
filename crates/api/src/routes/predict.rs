//! Prediction Route

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use flight_features::{preprocess, RawFlightRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::{ApiError, AppState};

/// Request body for the predict endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub flights: Vec<RawFlightRecord>,
}

/// Response for the predict endpoint, aligned with the request flights
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predict: Vec<u8>,
}

/// Validate, encode and score a batch of flights
pub async fn post_predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();
    metrics::counter!("delay_predict_requests_total").increment(1);

    let Json(request) = payload.map_err(|e| ApiError::Payload(e.body_text()))?;
    state
        .validator
        .validate_batch(&request.flights)
        .into_result()
        .map_err(ApiError::Validation)?;

    let features = preprocess(&request.flights)?;
    let predict = state.scorer.predict(&features)?;

    let delayed = predict.iter().filter(|&&y| y == 1).count();
    metrics::counter!("delay_flights_scored_total").increment(predict.len() as u64);
    metrics::counter!("delay_predictions_delayed_total").increment(delayed as u64);
    metrics::histogram!("delay_predict_latency_seconds").record(start.elapsed().as_secs_f64());
    debug!("Scored {} flights ({} delayed)", predict.len(), delayed);

    Ok(Json(PredictResponse { predict }))
}
