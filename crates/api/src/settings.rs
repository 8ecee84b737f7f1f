//! Service Configuration

use config::{Config, ConfigError, Environment, File};
use delay_scorer::{BoosterParams, DEFAULT_MODEL_PATH, DEFAULT_THRESHOLD};
use serde::Deserialize;

/// Default config file stem (`delay.toml`, `delay.yaml`, ...)
pub const DEFAULT_CONFIG_FILE: &str = "delay";

/// Settings shared by the server and the training binary
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address for the API server
    pub bind_addr: String,
    /// Location of the persisted model artifact
    pub model_path: String,
    /// Decision threshold for a delayed prediction
    pub threshold: f64,
    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Booster hyperparameters used when training
    pub booster: BoosterParams,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            model_path: DEFAULT_MODEL_PATH.to_string(),
            threshold: DEFAULT_THRESHOLD,
            log_level: "info".to_string(),
            booster: BoosterParams::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from the file named by `DELAY_CONFIG` (or `delay.*`), then
    /// `DELAY_*` environment variables, e.g. `DELAY_BOOSTER__MAX_DEPTH=4`.
    pub fn load() -> Result<Self, ConfigError> {
        let file =
            std::env::var("DELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(&file)
    }

    /// Load from an optional config file plus the environment
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("DELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Message(format!(
                "threshold {} must be within [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.threshold, 0.718);
        assert_eq!(config.model_path, "trained_model.gbt");
        assert_eq!(config.booster.learning_rate, 0.01);
        assert_eq!(config.booster.scale_pos_weight, 5.407);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            "threshold = 0.6\nmodel_path = \"/srv/model.gbt\"\n[booster]\nmax_depth = 3\n",
        )
        .unwrap();

        let config = ServiceConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.threshold, 0.6);
        assert_eq!(config.model_path, "/srv/model.gbt");
        assert_eq!(config.booster.max_depth, 3);
        assert_eq!(config.booster.n_estimators, 100);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "threshold = 1.5\n").unwrap();
        assert!(ServiceConfig::from_file(path.to_str().unwrap()).is_err());
    }
}
