//! Training Module
//!
//! - `supervised`: Fixed-epoch supervised training loop with per-epoch
//!   evaluation on the test split

pub mod supervised;

// Re-export main types for convenience
pub use supervised::{evaluate, train, EpochRecord, TrainingSummary};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{DermScanError, Result};

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of epochs to train
    pub epochs: usize,

    /// Batch size
    pub batch_size: usize,

    /// Adam learning rate
    pub learning_rate: f64,

    /// L2 weight decay penalty
    pub weight_decay: f32,

    /// RNG seed for shuffling
    pub seed: u64,

    /// Image side length after resizing
    pub image_size: usize,

    /// Directory for checkpoints and summaries
    pub output_dir: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 1e-4,
            weight_decay: 1e-4,
            seed: 42,
            image_size: crate::IMAGE_SIZE,
            output_dir: "output".to_string(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate hyperparameters before training starts
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if self.learning_rate <= 0.0 {
            return Err("learning_rate must be positive".to_string());
        }
        // Four pooling stages each halve the resolution
        if self.image_size < 16 {
            return Err("image_size must be at least 16".to_string());
        }
        Ok(())
    }

    /// Save the config as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DermScanError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| DermScanError::Config(format!("Invalid training config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_epochs_is_invalid() {
        let config = TrainingConfig {
            epochs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiny_image_size_is_invalid() {
        let config = TrainingConfig {
            image_size: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = TrainingConfig {
            epochs: 3,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = TrainingConfig::load(&path).unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.batch_size, config.batch_size);
    }

    #[test]
    fn test_load_malformed_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = TrainingConfig::load(&path).unwrap_err();
        assert!(matches!(err, DermScanError::Config(_)));
    }
}
