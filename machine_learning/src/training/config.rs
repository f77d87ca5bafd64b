use std::{fs, num::NonZeroUsize, path::{Path, PathBuf}};

use serde::Deserialize;

use crate::{MlErr, Result};

const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(500).unwrap();
const DEFAULT_N_EPOCHS: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// The hyperparameters of a training run.
///
/// Every field is optional when deserializing, missing ones take their default value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub batch_size: NonZeroUsize,
    pub n_epochs: NonZeroUsize,
    /// Minimum amount of minibatch iterations to run regardless of progress.
    pub patience: usize,
    /// Factor applied to the current iteration to extend the patience on a significant
    /// improvement.
    pub patience_increase: usize,
    /// Relative decrease of the validation error that counts as significant.
    pub improvement_threshold: f32,
    pub learning_rate: f32,
    /// Whether to reshuffle the train split at the start of each epoch.
    pub shuffle: bool,
    pub seed: Option<u64>,
    /// Where the best parameters are written.
    pub checkpoint: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            n_epochs: DEFAULT_N_EPOCHS,
            patience: 5000,
            patience_increase: 2,
            improvement_threshold: 0.995,
            learning_rate: 0.13,
            shuffle: false,
            seed: None,
            checkpoint: PathBuf::from("best_model.safetensors"),
        }
    }
}

impl TrainingConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| MlErr::InvalidConfig(format!("{}: {e}", path.display())))?;

        Self::from_json_str(&raw)
            .map_err(|e| MlErr::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| MlErr::InvalidConfig(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde can't rule out by type alone.
    pub fn validate(&self) -> Result<()> {
        if self.patience == 0 {
            return Err(MlErr::InvalidConfig("patience must be positive".into()));
        }

        if self.patience_increase == 0 {
            return Err(MlErr::InvalidConfig(
                "patience_increase must be at least 1".into(),
            ));
        }

        if !(self.improvement_threshold > 0.0 && self.improvement_threshold <= 1.0) {
            return Err(MlErr::InvalidConfig(format!(
                "improvement_threshold must lie in (0, 1], got {}",
                self.improvement_threshold
            )));
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(MlErr::InvalidConfig(format!(
                "learning_rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = TrainingConfig::default();

        assert_eq!(config.batch_size.get(), 500);
        assert_eq!(config.n_epochs.get(), 1000);
        assert_eq!(config.patience, 5000);
        assert_eq!(config.patience_increase, 2);
        assert_eq!(config.improvement_threshold, 0.995);
        assert_eq!(config.learning_rate, 0.13);
        assert!(!config.shuffle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_overrides_only_the_given_fields() {
        let config =
            TrainingConfig::from_json_str(r#"{ "batch_size": 20, "seed": 7, "shuffle": true }"#)
                .unwrap();

        assert_eq!(config.batch_size.get(), 20);
        assert_eq!(config.seed, Some(7));
        assert!(config.shuffle);
        assert_eq!(config.patience, 5000);
        assert_eq!(config.checkpoint, PathBuf::from("best_model.safetensors"));
    }

    #[test]
    fn rejects_bad_values() {
        for raw in [
            r#"{ "batch_size": 0 }"#,
            r#"{ "patience": 0 }"#,
            r#"{ "patience_increase": 0 }"#,
            r#"{ "improvement_threshold": 1.5 }"#,
            r#"{ "improvement_threshold": 0.0 }"#,
            r#"{ "learning_rate": -0.1 }"#,
            r#"{ "learing_rate": 0.1 }"#,
        ] {
            assert!(
                matches!(TrainingConfig::from_json_str(raw), Err(MlErr::InvalidConfig(_))),
                "{raw} was accepted"
            );
        }
    }

    #[test]
    fn reads_a_file() {
        let path = env::temp_dir().join(format!("training-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "n_epochs": 3, "learning_rate": 0.5 }"#).unwrap();

        let config = TrainingConfig::from_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.n_epochs.get(), 3);
        assert_eq!(config.learning_rate, 0.5);
        assert!(TrainingConfig::from_json_file(&path).is_err());
    }
}
