//! Batching of decoded images into normalized tensors
//!
//! The batcher is backend-agnostic, so the same instance can build
//! autodiff batches for training and plain batches for evaluation.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

/// ImageNet channel means, matching the statistics the encoder was
/// pretrained with
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// One decoded image ready for batching
#[derive(Debug, Clone)]
pub struct SkinItem {
    /// CHW pixel data in `[0, 1]`
    pub pixels: Vec<f32>,
    /// Class label index
    pub label: usize,
}

/// A batch of normalized images and their targets
#[derive(Debug, Clone)]
pub struct SkinBatch<B: Backend> {
    /// Images of shape `[batch_size, 3, height, width]`
    pub images: Tensor<B, 4>,
    /// Targets of shape `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

/// Per-channel normalization with ImageNet statistics
#[derive(Debug, Clone)]
pub struct Normalizer<B: Backend> {
    pub mean: Tensor<B, 4>,
    pub std: Tensor<B, 4>,
}

impl<B: Backend> Normalizer<B> {
    pub fn new(device: &Device<B>) -> Self {
        let mean = Tensor::<B, 1>::from_floats(IMAGENET_MEAN, device).reshape([1, 3, 1, 1]);
        let std = Tensor::<B, 1>::from_floats(IMAGENET_STD, device).reshape([1, 3, 1, 1]);
        Self { mean, std }
    }

    /// Normalize `[N, 3, H, W]` input to zero mean and unit variance per channel
    pub fn normalize(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        (input - self.mean.clone()) / self.std.clone()
    }
}

/// Collates [`SkinItem`]s into [`SkinBatch`]es
#[derive(Debug, Clone)]
pub struct SkinBatcher {
    image_size: usize,
}

impl SkinBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }
}

impl<B: Backend> Batcher<B, SkinItem, SkinBatch<B>> for SkinBatcher {
    fn batch(&self, items: Vec<SkinItem>, device: &B::Device) -> SkinBatch<B> {
        let batch_size = items.len();
        let pixels_per_image = 3 * self.image_size * self.image_size;

        let mut pixels = Vec::with_capacity(batch_size * pixels_per_image);
        let mut labels = Vec::with_capacity(batch_size);

        for item in items {
            debug_assert_eq!(item.pixels.len(), pixels_per_image);
            pixels.extend_from_slice(&item.pixels);
            labels.push(item.label as i64);
        }

        let images = Tensor::<B, 1>::from_floats(&pixels[..], device).reshape([
            batch_size,
            3,
            self.image_size,
            self.image_size,
        ]);
        let targets = Tensor::<B, 1, Int>::from_ints(&labels[..], device);

        let images = Normalizer::<B>::new(device).normalize(images);

        SkinBatch { images, targets }
    }
}
