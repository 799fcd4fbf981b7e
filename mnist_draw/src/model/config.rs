//! Training hyperparameter configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of training epochs
    pub epochs: usize,

    /// Batch size
    pub batch_size: usize,

    /// Adam learning rate
    pub learning_rate: f64,

    /// Stop after this many epochs without validation-loss improvement
    pub early_stopping_patience: usize,

    /// Random seed for shuffling and augmentation
    pub seed: u64,

    /// Directory for the model record and evaluation artifacts
    pub output_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 64,
            learning_rate: 1e-3,
            early_stopping_patience: 3,
            seed: 42,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl TrainingConfig {
    /// Quick configuration for smoke-testing the pipeline
    pub fn debug() -> Self {
        Self {
            epochs: 1,
            batch_size: 32,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be greater than 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.learning_rate <= 0.0 {
            return Err("learning_rate must be positive".to_string());
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.early_stopping_patience, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = TrainingConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.learning_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let config = TrainingConfig {
            epochs: 3,
            seed: 7,
            ..Default::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.json");
        config.save(&path).unwrap();

        let loaded = TrainingConfig::load(&path).unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.seed, 7);
    }
}
