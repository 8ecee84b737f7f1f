//! Delay Scorer

use crate::booster::{BoosterParams, GradientBoostedTrees};
use crate::classifier::Classifier;
use crate::{PersistenceError, ScorerError};
use flight_features::FeatureTable;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Probability above which a flight is predicted delayed
pub const DEFAULT_THRESHOLD: f64 = 0.718;

/// Artifact name used when none is configured
pub const DEFAULT_MODEL_PATH: &str = "trained_model.gbt";

/// Sample weight of delayed rows during training (on-time rows weigh 1)
pub const POSITIVE_CLASS_WEIGHT: f64 = 3.0;

/// Lifecycle state of the wrapped classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerState {
    Untrained,
    Trained,
}

/// Per-row training weights: delayed rows count three times
pub fn sample_weights(labels: &[u8]) -> Vec<f64> {
    labels
        .iter()
        .map(|&y| if y == 1 { POSITIVE_CLASS_WEIGHT } else { 1.0 })
        .collect()
}

fn lock_error<E: std::fmt::Display>(e: E) -> ScorerError {
    ScorerError::Lock(e.to_string())
}

/// Trains, persists and serves a delay classifier.
///
/// Prediction takes a read lock and never mutates the model. Training is
/// serialized and builds the replacement model off to the side, so
/// concurrent predictions see either the old or the new model.
///
/// Every fit starts from the classifier given at construction, so its
/// hyperparameters win over whatever a previously saved artifact holds.
pub struct DelayScorer<C: Classifier = GradientBoostedTrees> {
    classifier: RwLock<C>,
    template: C,
    fit_lock: Mutex<()>,
    model_path: PathBuf,
    threshold: f64,
}

impl DelayScorer<GradientBoostedTrees> {
    /// Booster-backed scorer, loading `model_path` if it exists
    pub fn with_params(params: BoosterParams, model_path: impl Into<PathBuf>) -> Self {
        Self::new(GradientBoostedTrees::new(params), model_path)
    }
}

impl<C: Classifier> DelayScorer<C> {
    /// Wrap a fresh classifier. If an artifact exists at `model_path` it is
    /// loaded; a failed load is logged and the fresh classifier is kept.
    pub fn new(classifier: C, model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();
        let template = classifier;
        let classifier = match Self::load_existing(&template, &model_path) {
            Ok(Some(loaded)) => {
                info!("Loaded trained model from {}", model_path.display());
                loaded
            }
            Ok(None) => {
                info!("No model at {}, starting untrained", model_path.display());
                template.clone()
            }
            Err(e) => {
                error!("Error loading model from {}: {}", model_path.display(), e);
                template.clone()
            }
        };

        Self {
            classifier: RwLock::new(classifier),
            template,
            fit_lock: Mutex::new(()),
            model_path,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    fn load_existing(fresh: &C, path: &Path) -> Result<Option<C>, PersistenceError> {
        if !path.exists() {
            return Ok(None);
        }
        let mut candidate = fresh.clone();
        candidate.load(path)?;
        Ok(Some(candidate))
    }

    /// Override the decision threshold used by [`DelayScorer::predict`]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Current lifecycle state
    pub fn state(&self) -> Result<ScorerState, ScorerError> {
        let classifier = self.classifier.read().map_err(lock_error)?;
        Ok(if classifier.is_fitted() {
            ScorerState::Trained
        } else {
            ScorerState::Untrained
        })
    }

    /// Train on a labelled table, then persist the model.
    ///
    /// A failed save is logged and does not undo the training: the new
    /// model serves in-process either way.
    pub fn fit(&self, features: &FeatureTable, labels: &[u8]) -> Result<(), ScorerError> {
        if features.len() != labels.len() {
            return Err(ScorerError::ShapeMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        let _guard = self.fit_lock.lock().map_err(lock_error)?;

        let weights = sample_weights(labels);
        let delayed = labels.iter().filter(|&&y| y == 1).count();
        info!(
            "Starting training on {} rows ({} delayed, {} on time)",
            labels.len(),
            delayed,
            labels.len() - delayed
        );

        let mut candidate = self.template.clone();
        candidate.fit(features, labels, &weights)?;
        let saved = candidate.save(&self.model_path);

        *self.classifier.write().map_err(lock_error)? = candidate;

        match saved {
            Ok(()) => info!("Model saved to {}", self.model_path.display()),
            Err(e) => error!("Error saving the model to {}: {}", self.model_path.display(), e),
        }
        Ok(())
    }

    /// Positive-class probability per row
    pub fn predict_probability(&self, features: &FeatureTable) -> Result<Vec<f64>, ScorerError> {
        let classifier = self.classifier.read().map_err(lock_error)?;
        if !classifier.is_fitted() {
            return Err(ScorerError::NotFitted);
        }
        classifier.predict_probability(features)
    }

    /// 0/1 delay prediction per row at the configured threshold
    pub fn predict(&self, features: &FeatureTable) -> Result<Vec<u8>, ScorerError> {
        self.predict_with_threshold(features, self.threshold)
    }

    /// 0/1 delay prediction per row: 1 iff probability > `threshold`
    pub fn predict_with_threshold(
        &self,
        features: &FeatureTable,
        threshold: f64,
    ) -> Result<Vec<u8>, ScorerError> {
        let probabilities = self.predict_probability(features)?;
        let predictions: Vec<u8> = probabilities
            .iter()
            .map(|&p| u8::from(p > threshold))
            .collect();
        debug!(
            "Predicted {} rows at threshold {}: {} delayed",
            predictions.len(),
            threshold,
            predictions.iter().filter(|&&y| y == 1).count()
        );
        Ok(predictions)
    }
}
