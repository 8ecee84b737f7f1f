//! Gradient Boosted Decision Trees
//!
//! Second-order boosting with logistic loss. Each round fits a regression
//! tree to the gradient/hessian of the current margins using exact greedy
//! splits, and adds its shrunken leaf values to the margin.

use crate::artifact::{self, ARTIFACT_VERSION};
use crate::classifier::Classifier;
use crate::{PersistenceError, ScorerError};
use flight_features::{FeatureTable, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Hessians are floored to keep leaf values finite near saturated margins
const MIN_HESSIAN: f64 = 1e-16;

/// Booster hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,
    /// Maximum tree depth (0 = single leaf)
    pub max_depth: usize,
    /// Minimum hessian sum in each child of a split
    pub min_child_weight: f64,
    /// L2 regularization on leaf values
    pub reg_lambda: f64,
    /// Minimum gain required to split
    pub gamma: f64,
    /// Extra weight multiplier for positive rows
    pub scale_pos_weight: f64,
    /// Initial probability before any tree
    pub base_score: f64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.01,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            scale_pos_weight: 5.407,
            base_score: 0.5,
        }
    }
}

impl BoosterParams {
    fn validate(&self) -> Result<(), ScorerError> {
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return Err(ScorerError::InvalidInput(format!(
                "base_score {} must be in (0, 1)",
                self.base_score
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ScorerError::InvalidInput(format!(
                "learning_rate {} must be positive",
                self.learning_rate
            )));
        }
        if self.reg_lambda < 0.0 || self.min_child_weight < 0.0 || self.scale_pos_weight <= 0.0 {
            return Err(ScorerError::InvalidInput(
                "reg_lambda and min_child_weight must be >= 0, scale_pos_weight > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn base_margin(&self) -> f64 {
        (self.base_score / (1.0 - self.base_score)).ln()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree stored as a flat node list, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if row[feature] < threshold { left } else { right },
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [[f64; FEATURE_COUNT]],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoosterParams,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, indices: Vec<usize>) -> Tree {
        self.grow(indices, 0);
        Tree { nodes: self.nodes }
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.reg_lambda)
    }

    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        if depth < self.params.max_depth {
            if let Some(split) = self.best_split(&indices, g, h) {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
                    .into_iter()
                    .partition(|&i| self.rows[i][split.feature] < split.threshold);
                let left = self.grow(left_rows, depth + 1);
                let right = self.grow(right_rows, depth + 1);
                self.nodes[node_id] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
                return node_id;
            }
        }

        let value = -g / (h + self.params.reg_lambda) * self.params.learning_rate;
        self.nodes[node_id] = Node::Leaf { value };
        node_id
    }

    fn best_split(&self, indices: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let parent = self.score(g, h);
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..FEATURE_COUNT {
            sorted.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let (mut gl, mut hl) = (0.0, 0.0);
            for pair in sorted.windows(2) {
                let (i, next) = (pair[0], pair[1]);
                gl += self.grad[i];
                hl += self.hess[i];

                let (value, next_value) = (self.rows[i][feature], self.rows[next][feature]);
                if value == next_value {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }

                let gain =
                    0.5 * (self.score(gl, hl) + self.score(gr, hr) - parent) - self.params.gamma;
                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

/// On-disk layout of a trained booster
#[derive(Debug, Serialize, Deserialize)]
struct BoosterArtifact {
    version: u32,
    feature_columns: Vec<String>,
    params: BoosterParams,
    trees: Vec<Tree>,
}

/// Binary classifier built from boosted regression trees
#[derive(Debug, Clone, Default)]
pub struct GradientBoostedTrees {
    params: BoosterParams,
    trees: Vec<Tree>,
    fitted: bool,
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

impl GradientBoostedTrees {
    /// Create an unfitted booster
    pub fn new(params: BoosterParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            fitted: false,
        }
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    /// Number of trees in the ensemble
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn margin(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        self.params.base_margin() + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    fn check_inputs(
        features: &FeatureTable,
        labels: &[u8],
        sample_weights: &[f64],
    ) -> Result<(), ScorerError> {
        if features.len() != labels.len() || sample_weights.len() != labels.len() {
            return Err(ScorerError::ShapeMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(ScorerError::InvalidInput("empty training set".to_string()));
        }
        if let Some(bad) = labels.iter().find(|&&y| y > 1) {
            return Err(ScorerError::InvalidInput(format!("label {bad} is not 0 or 1")));
        }
        if let Some(bad) = sample_weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ScorerError::InvalidInput(format!(
                "sample weight {bad} is not a finite non-negative number"
            )));
        }
        Ok(())
    }
}

impl Classifier for GradientBoostedTrees {
    fn fit(
        &mut self,
        features: &FeatureTable,
        labels: &[u8],
        sample_weights: &[f64],
    ) -> Result<(), ScorerError> {
        Self::check_inputs(features, labels, sample_weights)?;
        self.params.validate()?;

        let rows = features.rows();
        let targets: Vec<f64> = labels.iter().map(|&y| f64::from(y)).collect();
        let weights: Vec<f64> = sample_weights
            .iter()
            .zip(labels)
            .map(|(w, &y)| if y == 1 { w * self.params.scale_pos_weight } else { *w })
            .collect();

        let mut margins = vec![self.params.base_margin(); rows.len()];
        let mut grad = vec![0.0; rows.len()];
        let mut hess = vec![0.0; rows.len()];
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for round in 0..self.params.n_estimators {
            for i in 0..rows.len() {
                let p = sigmoid(margins[i]);
                grad[i] = weights[i] * (p - targets[i]);
                hess[i] = weights[i] * (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let tree = TreeBuilder {
                rows,
                grad: &grad,
                hess: &hess,
                params: &self.params,
                nodes: Vec::new(),
            }
            .build((0..rows.len()).collect());

            for (margin, row) in margins.iter_mut().zip(rows) {
                *margin += tree.predict(row);
            }
            trees.push(tree);

            if (round + 1) % 25 == 0 {
                let loss: f64 = margins
                    .iter()
                    .zip(&targets)
                    .zip(&weights)
                    .map(|((m, y), w)| {
                        let p = sigmoid(*m).clamp(1e-15, 1.0 - 1e-15);
                        -w * (y * p.ln() + (1.0 - y) * (1.0 - p).ln())
                    })
                    .sum::<f64>()
                    / weights.iter().sum::<f64>().max(f64::MIN_POSITIVE);
                debug!("Round {}: weighted logloss {:.5}", round + 1, loss);
            }
        }

        info!(
            "Fitted {} trees on {} rows (max_depth={}, learning_rate={})",
            trees.len(),
            rows.len(),
            self.params.max_depth,
            self.params.learning_rate
        );
        self.trees = trees;
        self.fitted = true;
        Ok(())
    }

    fn predict_probability(&self, features: &FeatureTable) -> Result<Vec<f64>, ScorerError> {
        if !self.fitted {
            return Err(ScorerError::NotFitted);
        }
        Ok(features.rows().iter().map(|row| sigmoid(self.margin(row))).collect())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        artifact::save(
            path,
            &BoosterArtifact {
                version: ARTIFACT_VERSION,
                feature_columns: artifact::current_columns(),
                params: self.params.clone(),
                trees: self.trees.clone(),
            },
        )
    }

    fn load(&mut self, path: &Path) -> Result<(), PersistenceError> {
        let stored: BoosterArtifact = artifact::load(path)?;
        artifact::check_schema(stored.version, &stored.feature_columns)?;
        self.params = stored.params;
        self.trees = stored.trees;
        self.fitted = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::tests::temp_model_path;

    const LATAM: usize = 3;

    fn row_with(feature: Option<usize>) -> [f64; FEATURE_COUNT] {
        let mut row = [0.0; FEATURE_COUNT];
        if let Some(f) = feature {
            row[f] = 1.0;
        }
        row
    }

    /// LATAM rows delayed, everything else on time
    fn separable(n: usize) -> (FeatureTable, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n {
            let latam = i % 3 == 0;
            rows.push(row_with(latam.then_some(LATAM)));
            labels.push(u8::from(latam));
        }
        (FeatureTable::from_rows(rows), labels)
    }

    fn fast_params() -> BoosterParams {
        BoosterParams {
            n_estimators: 50,
            learning_rate: 0.3,
            max_depth: 3,
            min_child_weight: 0.0,
            scale_pos_weight: 1.0,
            ..BoosterParams::default()
        }
    }

    #[test]
    fn test_learns_separable_feature() {
        let (features, labels) = separable(60);
        let mut model = GradientBoostedTrees::new(fast_params());
        model.fit(&features, &labels, &vec![1.0; labels.len()]).unwrap();

        let rows = FeatureTable::from_rows(vec![row_with(Some(LATAM)), row_with(None)]);
        let probs = model.predict_probability(&rows).unwrap();
        assert!(probs[0] > 0.9, "latam probability {}", probs[0]);
        assert!(probs[1] < 0.1, "other probability {}", probs[1]);
        assert_eq!(model.tree_count(), 50);
    }

    #[test]
    fn test_default_params_rank_positive_rows_higher() {
        let (features, labels) = separable(30);
        let mut model = GradientBoostedTrees::default();
        model.fit(&features, &labels, &vec![1.0; labels.len()]).unwrap();

        let rows = FeatureTable::from_rows(vec![row_with(Some(LATAM)), row_with(None)]);
        let probs = model.predict_probability(&rows).unwrap();
        assert!(probs[0] > probs[1]);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_sample_weights_decide_conflicting_rows() {
        let rows = vec![row_with(None); 4];
        let labels = vec![1, 1, 0, 0];
        let features = FeatureTable::from_rows(rows);

        let mut favour_delay = GradientBoostedTrees::new(fast_params());
        favour_delay.fit(&features, &labels, &[5.0, 5.0, 1.0, 1.0]).unwrap();
        let mut favour_on_time = GradientBoostedTrees::new(fast_params());
        favour_on_time.fit(&features, &labels, &[1.0, 1.0, 5.0, 5.0]).unwrap();

        let rows = FeatureTable::from_rows(vec![row_with(None)]);
        assert!(favour_delay.predict_probability(&rows).unwrap()[0] > 0.5);
        assert!(favour_on_time.predict_probability(&rows).unwrap()[0] < 0.5);
    }

    #[test]
    fn test_depth_zero_is_constant() {
        let (features, labels) = separable(30);
        let mut model = GradientBoostedTrees::new(BoosterParams {
            max_depth: 0,
            ..fast_params()
        });
        model.fit(&features, &labels, &vec![1.0; labels.len()]).unwrap();
        let probs = model.predict_probability(&features).unwrap();
        assert!(probs.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-12));
    }

    #[test]
    fn test_unfitted_prediction_fails() {
        let model = GradientBoostedTrees::default();
        assert!(!model.is_fitted());
        let err = model.predict_probability(&FeatureTable::new()).unwrap_err();
        assert!(matches!(err, ScorerError::NotFitted));
    }

    #[test]
    fn test_rejects_bad_training_input() {
        let (features, labels) = separable(6);
        let mut model = GradientBoostedTrees::default();

        let err = model.fit(&features, &labels[..5], &[1.0; 5]).unwrap_err();
        assert!(matches!(err, ScorerError::ShapeMismatch { features: 6, labels: 5 }));

        let err = model.fit(&FeatureTable::new(), &[], &[]).unwrap_err();
        assert!(matches!(err, ScorerError::InvalidInput(_)));

        let err = model.fit(&features, &[0, 1, 2, 0, 0, 0], &[1.0; 6]).unwrap_err();
        assert!(matches!(err, ScorerError::InvalidInput(_)));

        let err = model
            .fit(&features, &labels, &[1.0, f64::NAN, 1.0, 1.0, 1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, ScorerError::InvalidInput(_)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_saved_model_predicts_identically() {
        let (features, labels) = separable(45);
        let mut model = GradientBoostedTrees::new(fast_params());
        model.fit(&features, &labels, &vec![1.0; labels.len()]).unwrap();

        let (_dir, path) = temp_model_path("model.gbt");
        model.save(&path).unwrap();

        let mut restored = GradientBoostedTrees::default();
        restored.load(&path).unwrap();
        assert!(restored.is_fitted());
        assert_eq!(restored.params(), model.params());
        assert_eq!(
            restored.predict_probability(&features).unwrap(),
            model.predict_probability(&features).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_foreign_schema() {
        let (_dir, path) = temp_model_path("foreign.gbt");
        let mut columns = artifact::current_columns();
        columns[0] = "OPERA_JetSMART SPA".to_string();
        artifact::save(
            &path,
            &BoosterArtifact {
                version: ARTIFACT_VERSION,
                feature_columns: columns,
                params: BoosterParams::default(),
                trees: Vec::new(),
            },
        )
        .unwrap();

        let mut model = GradientBoostedTrees::default();
        let err = model.load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::SchemaMismatch(_)));
        assert!(!model.is_fitted());
    }
}
