//! Neural Network Models
//!
//! - `cnn`: Convolutional classifier for skin lesion images

pub mod cnn;

// Re-export main types for convenience
pub use cnn::{ConvBlock, SkinClassifier, SkinClassifierConfig};
