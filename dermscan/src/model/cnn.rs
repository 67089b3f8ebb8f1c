//! Convolutional classifier for skin lesion images
//!
//! Four convolutional blocks (conv -> batch norm -> ReLU -> max pool)
//! followed by global average pooling and a two-layer classifier head.
//! Global pooling makes the head independent of the input resolution,
//! so the same architecture works at any size the pools can halve four
//! times.

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    Relu,
};
use burn::prelude::*;
use burn::tensor::activation::softmax;

/// Configuration for [`SkinClassifier`]
#[derive(Config, Debug)]
pub struct SkinClassifierConfig {
    /// Number of output classes
    #[config(default = "crate::dataset::NUM_CLASSES")]
    pub num_classes: usize,

    /// Channels of the first block; later blocks double it
    #[config(default = 32)]
    pub base_channels: usize,

    /// Width of the hidden classifier layer
    #[config(default = 256)]
    pub hidden_size: usize,

    /// Dropout probability in the classifier head
    #[config(default = 0.3)]
    pub dropout: f64,
}

impl SkinClassifierConfig {
    /// Initialize the model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> SkinClassifier<B> {
        let c = self.base_channels;

        SkinClassifier {
            block1: ConvBlock::new(3, c, device),
            block2: ConvBlock::new(c, 2 * c, device),
            block3: ConvBlock::new(2 * c, 4 * c, device),
            block4: ConvBlock::new(4 * c, 8 * c, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(8 * c, self.hidden_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// Conv -> batch norm -> ReLU -> 2x2 max pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    pool: MaxPool2d,
    activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            norm: BatchNormConfig::new(out_channels).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = self.norm.forward(x);
        let x = self.activation.forward(x);
        self.pool.forward(x)
    }
}

/// Skin lesion classifier
#[derive(Module, Debug)]
pub struct SkinClassifier<B: Backend> {
    block1: ConvBlock<B>,
    block2: ConvBlock<B>,
    block3: ConvBlock<B>,
    block4: ConvBlock<B>,
    global_pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,
    activation: Relu,
}

impl<B: Backend> SkinClassifier<B> {
    /// Forward pass returning raw logits of shape `[batch_size, num_classes]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block1.forward(images);
        let x = self.block2.forward(x);
        let x = self.block3.forward(x);
        let x = self.block4.forward(x);

        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass returning class probabilities
    pub fn forward_softmax(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.fc2.weight.val().dims()[1]
    }

    /// Replace the classification head, keeping the feature extractor.
    ///
    /// Used after loading a checkpoint trained on a different label set.
    pub fn replace_head(self, num_classes: usize, device: &B::Device) -> Self {
        let hidden = self.fc2.weight.val().dims()[0];
        Self {
            fc2: LinearConfig::new(hidden, num_classes).init(device),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    type B = DefaultBackend;

    fn small_config() -> SkinClassifierConfig {
        SkinClassifierConfig::new()
            .with_base_channels(4)
            .with_hidden_size(16)
    }

    #[test]
    fn test_config_defaults() {
        let config = SkinClassifierConfig::new();
        assert_eq!(config.num_classes, crate::dataset::NUM_CLASSES);
        assert_eq!(config.base_channels, 32);
        assert_eq!(config.hidden_size, 256);
    }

    #[test]
    fn test_forward_output_shape() {
        let device = Default::default();
        let model = small_config().init::<B>(&device);

        let input = Tensor::<B, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, crate::dataset::NUM_CLASSES]);
    }

    #[test]
    fn test_forward_softmax_sums_to_one() {
        let device = Default::default();
        let model = small_config().init::<B>(&device);

        let input = Tensor::<B, 4>::zeros([1, 3, 32, 32], &device);
        let probs = model.forward_softmax(input);

        let values = probs.into_data().to_vec::<f32>().unwrap();
        let sum: f32 = values.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(values.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_replace_head() {
        let device = Default::default();
        let model = small_config().with_num_classes(3).init::<B>(&device);
        assert_eq!(model.num_classes(), 3);

        let model = model.replace_head(5, &device);
        assert_eq!(model.num_classes(), 5);

        let output = model.forward(Tensor::zeros([1, 3, 32, 32], &device));
        assert_eq!(output.dims(), [1, 5]);
    }
}
