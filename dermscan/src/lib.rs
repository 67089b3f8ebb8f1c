//! # DermScan
//!
//! Skin lesion classification with the Burn deep learning framework.
//!
//! ## Features
//!
//! - Supervised training of a convolutional classifier on a five-class
//!   skin lesion dataset (eczema, acne, pigment disorders, benign and
//!   malignant lesions)
//! - Per-epoch evaluation with loss and macro F1 on both splits
//! - Dataset preparation (canonical bulk renaming of raw images)
//! - Single-image inference from files or raw bytes
//!
//! ## Modules
//!
//! - `backend`: Compile-time backend selection (ndarray or wgpu)
//! - `dataset`: Loading, batching, and preparing the image dataset
//! - `model`: The convolutional classifier
//! - `training`: The supervised training loop
//! - `inference`: Single-image prediction
//! - `utils`: Errors, logging, and evaluation metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dermscan::backend::{default_device, TrainingBackend};
//! use dermscan::dataset::{SkinDataset, TEST_DIR, TRAIN_DIR};
//! use dermscan::training::{supervised, TrainingConfig};
//!
//! let config = TrainingConfig::default();
//! let device = default_device();
//!
//! let train_data = SkinDataset::from_dir("data/skin/train")?;
//! let test_data = SkinDataset::from_dir("data/skin/test")?;
//!
//! let summary = supervised::train::<TrainingBackend>(
//!     &config, &train_data, &test_data, None, &device,
//! )?;
//! println!("Final test F1: {:.4}", summary.final_test_f1);
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

// Re-export main types for convenience
pub use dataset::{
    SkinBatch, SkinBatcher, SkinDataset, SkinItem, CLASS_NAMES, NUM_CLASSES,
};
pub use inference::{PredictionResult, Predictor};
pub use model::{SkinClassifier, SkinClassifierConfig};
pub use training::TrainingConfig;
pub use utils::error::{DermScanError, Result};
pub use utils::metrics::{ConfusionMatrix, Metrics};

/// Image side length used for training and inference
pub const IMAGE_SIZE: usize = 224;

/// Version of the dermscan crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
