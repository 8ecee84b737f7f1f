//! Offline Training

use crate::{ApiError, ServiceConfig};
use data_validator::{ValidationConfig, Validator};
use delay_scorer::{DelayScorer, EvaluationReport};
use flight_features::{preprocess_with_labels, RawFlightRecord};
use tracing::{error, info};

/// Validate a labelled dataset, fit the configured booster, persist it at
/// `config.model_path` and report training-set accuracy.
pub fn train(
    config: &ServiceConfig,
    records: &[RawFlightRecord],
) -> Result<EvaluationReport, ApiError> {
    let validator = Validator::new(ValidationConfig::training());
    if let Err(errors) = validator.validate_batch(records).into_result() {
        for e in errors.iter().take(20) {
            error!("{}", e);
        }
        return Err(ApiError::Validation(errors));
    }

    let (features, labels) = preprocess_with_labels(records)?;
    let delayed = labels.iter().filter(|&&y| y == 1).count();
    info!(
        "Class balance: {} delayed / {} total ({:.1}%)",
        delayed,
        labels.len(),
        100.0 * delayed as f64 / labels.len().max(1) as f64
    );

    let scorer = DelayScorer::with_params(config.booster.clone(), &config.model_path)
        .with_threshold(config.threshold);
    scorer.fit(&features, &labels)?;

    let predictions = scorer.predict(&features)?;
    let report = EvaluationReport::from_predictions(&labels, &predictions)?;
    info!("Training-set report: {}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delay_scorer::{BoosterParams, Classifier, GradientBoostedTrees};
    use tempfile::TempDir;

    fn dataset() -> Vec<RawFlightRecord> {
        (0..30)
            .map(|i| {
                let (airline, actual) = if i % 3 == 0 {
                    ("Grupo LATAM", "2023-03-01 09:00:00")
                } else {
                    ("Sky Airline", "2023-03-01 08:05:00")
                };
                RawFlightRecord::new(airline, "N", 3, "2023-03-01 08:00:00", actual)
            })
            .collect()
    }

    fn config_in(dir: &TempDir, booster: BoosterParams) -> ServiceConfig {
        ServiceConfig {
            model_path: dir.path().join("model.gbt").to_string_lossy().into_owned(),
            booster,
            ..ServiceConfig::default()
        }
    }

    fn small_params(n_estimators: usize, max_depth: usize) -> BoosterParams {
        BoosterParams {
            n_estimators,
            max_depth,
            learning_rate: 0.3,
            min_child_weight: 0.0,
            scale_pos_weight: 1.0,
            ..BoosterParams::default()
        }
    }

    #[test]
    fn test_train_persists_model_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir, small_params(50, 3));

        let report = train(&config, &dataset()).unwrap();
        assert_eq!(report.total(), 30);
        assert_eq!(report.false_negatives, 0);
        assert!(std::path::Path::new(&config.model_path).exists());
    }

    #[test]
    fn test_train_rejects_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir, small_params(5, 2));
        let mut records = dataset();
        records.push(RawFlightRecord::new(
            "Sky Airline",
            "O",
            13,
            "2023-03-01 08:00:00",
            "2023-03-01 08:05:00",
        ));

        match train(&config, &records) {
            Err(ApiError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(!std::path::Path::new(&config.model_path).exists());
    }

    #[test]
    fn test_retrain_stores_latest_configured_params() {
        let dir = tempfile::tempdir().unwrap();
        train(&config_in(&dir, small_params(10, 6)), &dataset()).unwrap();

        let config = config_in(&dir, small_params(3, 1));
        train(&config, &dataset()).unwrap();

        let mut stored = GradientBoostedTrees::default();
        stored.load(std::path::Path::new(&config.model_path)).unwrap();
        assert_eq!(stored.params(), &config.booster);
        assert_eq!(stored.tree_count(), 3);
    }
}
