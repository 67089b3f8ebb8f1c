//! Inference Module
//!
//! - `predictor`: Single-image prediction with a trained classifier

pub mod predictor;

// Re-export main types for convenience
pub use predictor::{PredictionResult, Predictor};
