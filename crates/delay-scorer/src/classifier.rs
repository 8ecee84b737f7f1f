//! Classifier Capability

use crate::{PersistenceError, ScorerError};
use flight_features::FeatureTable;
use std::path::Path;

/// A trainable binary classifier over the fixed feature schema.
///
/// Implementations are cloned to train a replacement model while the
/// current one keeps serving, so `Clone` should copy hyperparameters along
/// with any fitted state.
pub trait Classifier: Clone + Send + Sync {
    /// Fit in place against 0/1 labels with per-row sample weights
    fn fit(
        &mut self,
        features: &FeatureTable,
        labels: &[u8],
        sample_weights: &[f64],
    ) -> Result<(), ScorerError>;

    /// Probability of the positive (delayed) class for each row
    fn predict_probability(&self, features: &FeatureTable) -> Result<Vec<f64>, ScorerError>;

    /// Whether the model has been fitted or loaded
    fn is_fitted(&self) -> bool;

    /// Persist the fitted state as a single artifact
    fn save(&self, path: &Path) -> Result<(), PersistenceError>;

    /// Replace the current state with a persisted artifact
    fn load(&mut self, path: &Path) -> Result<(), PersistenceError>;
}
