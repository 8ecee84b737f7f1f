//! API Error Mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use delay_scorer::ScorerError;
use flight_features::EncodeError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Payload(String),
    #[error("{} invalid field(s) in flight records", .0.len())]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Scorer(#[from] ScorerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Payload(_) | ApiError::Validation(_) | ApiError::Encode(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Scorer(ScorerError::NotFitted) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Scorer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Prediction failed: {}", self);
        } else {
            warn!("Rejected prediction request: {}", self);
        }

        let detail = match &self {
            ApiError::Validation(errors) => json!(errors
                .iter()
                .map(|e| json!({ "message": e.to_string(), "error": e }))
                .collect::<Vec<_>>()),
            other => json!(other.to_string()),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
