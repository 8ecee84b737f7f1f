//! Flight Delay Scorer
//!
//! Owns the trainable classifier behind the delay predictions: training with
//! class-balanced sample weights, best-effort persistence of the trained
//! model, and thresholded 0/1 prediction.

mod artifact;
mod booster;
mod classifier;
mod evaluation;
mod scorer;

pub use booster::{BoosterParams, GradientBoostedTrees};
pub use classifier::Classifier;
pub use evaluation::EvaluationReport;
pub use scorer::{
    sample_weights, DelayScorer, ScorerState, DEFAULT_MODEL_PATH, DEFAULT_THRESHOLD,
    POSITIVE_CLASS_WEIGHT,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors during training or prediction
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Model is not fitted: train or load a model before predicting")]
    NotFitted,
    #[error("Shape mismatch: {features} feature rows, {labels} labels")]
    ShapeMismatch { features: usize, labels: usize },
    #[error("Invalid training input: {0}")]
    InvalidInput(String),
    #[error("Lock error: {0}")]
    Lock(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors loading or saving a model artifact
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Model artifact not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Artifact codec error: {0}")]
    Codec(String),
    #[error("Artifact schema mismatch: {0}")]
    SchemaMismatch(String),
}
