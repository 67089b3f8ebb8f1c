//! Single-image prediction
//!
//! Wraps a trained [`SkinClassifier`] together with its device and the
//! preprocessing pipeline: resize to the model resolution, scale to
//! `[0, 1]`, and normalize with ImageNet statistics.

use std::cmp::Ordering;
use std::path::Path;

use burn::prelude::*;
use burn::record::CompactRecorder;
use burn::tensor::activation::softmax;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::batcher::{IMAGENET_MEAN, IMAGENET_STD};
use crate::dataset::{class_name, NUM_CLASSES};
use crate::model::{SkinClassifier, SkinClassifierConfig};
use crate::utils::error::{DermScanError, Result, ResultExt};

/// Classification result for a single image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Index of the predicted class
    pub class_index: usize,
    /// Name of the predicted class
    pub class_name: String,
    /// Probability of the predicted class
    pub confidence: f32,
    /// Softmax probabilities for all classes
    pub probabilities: Vec<f32>,
}

impl PredictionResult {
    /// Build a result from softmax probabilities
    pub fn from_probabilities(probabilities: Vec<f32>) -> Self {
        let (class_index, &confidence) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .unwrap_or((0, &0.0));

        Self {
            class_index,
            class_name: class_name(class_index).unwrap_or("Unknown").to_string(),
            confidence,
            probabilities,
        }
    }

    /// Class indices with probabilities, sorted descending
    pub fn ranked(&self) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> =
            self.probabilities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }
}

/// Runs single-image predictions with a trained classifier
#[derive(Debug, Clone)]
pub struct Predictor<B: Backend> {
    model: SkinClassifier<B>,
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> Predictor<B> {
    /// Wrap an already-loaded model
    pub fn new(model: SkinClassifier<B>, device: B::Device) -> Self {
        Self {
            model,
            device,
            image_size: crate::IMAGE_SIZE,
        }
    }

    /// Load a model checkpoint from disk
    pub fn from_file<P: AsRef<Path>>(path: P, device: B::Device) -> Result<Self> {
        let path = path.as_ref();
        let model = SkinClassifierConfig::new()
            .init::<B>(&device)
            .load_file(path, &CompactRecorder::new(), &device)
            .map_err(|e| {
                DermScanError::Model(format!(
                    "Failed to load model from {}: {:?}",
                    path.display(),
                    e
                ))
            })?;

        debug!("Loaded model from {}", path.display());
        Ok(Self::new(model, device))
    }

    /// Set the resolution images are resized to before inference
    pub fn with_image_size(mut self, image_size: usize) -> Self {
        self.image_size = image_size;
        self
    }

    /// Classify a decoded image
    pub fn predict_image(&self, image: &DynamicImage) -> Result<PredictionResult> {
        let size = self.image_size;
        let data = self.preprocess(image);

        let input =
            Tensor::<B, 1>::from_floats(&data[..], &self.device).reshape([1, 3, size, size]);
        let logits = self.model.forward(input);
        let probabilities = softmax(logits, 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| DermScanError::Inference(format!("{:?}", e)))?;

        debug_assert_eq!(probabilities.len(), NUM_CLASSES);
        Ok(PredictionResult::from_probabilities(probabilities))
    }

    /// Decode raw image bytes and classify them.
    ///
    /// Returns [`DermScanError::InvalidInput`] when the bytes are not a
    /// decodable image, so callers can map it to a client error.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<PredictionResult> {
        let image = image::load_from_memory(bytes).context("Could not decode image")?;
        self.predict_image(&image)
    }

    /// Classify an image file
    pub fn predict_path<P: AsRef<Path>>(&self, path: P) -> Result<PredictionResult> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .map_err(|e| DermScanError::image_load(path, e))?
            .decode()
            .map_err(|e| DermScanError::image_load(path, e))?;
        self.predict_image(&image)
    }

    /// Resize, scale to `[0, 1]`, and normalize with ImageNet statistics.
    /// Uses the same triangle filter as the training loader so serving
    /// sees the distribution the model was trained on.
    fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        let size = self.image_size;
        let resized = image.resize_exact(size as u32, size as u32, FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let mut data = vec![0.0f32; 3 * size * size];
        for (x, y, px) in rgb.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                let value = px[c] as f32 / 255.0;
                data[c * size * size + y * size + x] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::CLASS_NAMES;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    type B = DefaultBackend;

    fn test_predictor(image_size: usize) -> Predictor<B> {
        let device = Default::default();
        let model = SkinClassifierConfig::new()
            .with_base_channels(4)
            .with_hidden_size(16)
            .init::<B>(&device);
        Predictor::new(model, device).with_image_size(image_size)
    }

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(24, 24, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 100])
        }))
    }

    #[test]
    fn test_from_probabilities_picks_max() {
        let result = PredictionResult::from_probabilities(vec![0.1, 0.2, 0.4, 0.2, 0.1]);

        assert_eq!(result.class_index, 2);
        assert_eq!(result.class_name, "Pigment");
        assert!((result.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_ranked_sorts_descending() {
        let result = PredictionResult::from_probabilities(vec![0.1, 0.5, 0.4]);
        let ranked = result.ranked();

        assert_eq!(ranked[0].0, 1);
        assert_eq!(ranked[1].0, 2);
        assert_eq!(ranked[2].0, 0);
    }

    #[test]
    fn test_predict_image() {
        let predictor = test_predictor(16);
        let result = predictor.predict_image(&test_image()).unwrap();

        assert!(CLASS_NAMES.contains(&result.class_name.as_str()));
        assert_eq!(result.probabilities.len(), NUM_CLASSES);

        let sum: f32 = result.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);

        let max = result.probabilities.iter().cloned().fold(0.0f32, f32::max);
        assert!((result.confidence - max).abs() < 1e-6);
    }

    #[test]
    fn test_predict_bytes_decodes_png() {
        let mut bytes = Vec::new();
        test_image()
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let predictor = test_predictor(16);
        let result = predictor.predict_bytes(&bytes).unwrap();
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn test_predict_bytes_rejects_garbage() {
        let predictor = test_predictor(16);
        let err = predictor.predict_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, DermScanError::InvalidInput(_)));
    }

    #[test]
    fn test_from_file_missing_checkpoint() {
        let err = Predictor::<B>::from_file("/no/such/model.mpk", Default::default()).unwrap_err();
        assert!(matches!(err, DermScanError::Model(_)));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let device = Default::default();

        // from_file initializes with the default architecture, so the
        // checkpoint has to come from a default-config model.
        let model = SkinClassifierConfig::new().init::<B>(&device);
        model
            .clone()
            .save_file(dir.path().join("model"), &CompactRecorder::new())
            .unwrap();

        let original = Predictor::new(model, device).with_image_size(16);
        let loaded = Predictor::<B>::from_file(dir.path().join("model.mpk"), Default::default())
            .unwrap()
            .with_image_size(16);

        let image = test_image();
        let before = original.predict_image(&image).unwrap();
        let after = loaded.predict_image(&image).unwrap();

        assert_eq!(before.class_index, after.class_index);
        for (a, b) in before.probabilities.iter().zip(after.probabilities.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
