//! CNN architecture for digit classification.
//!
//! Two double-convolution blocks followed by a dense head. BatchNorm sits
//! after every convolution and after the dense layer, with dropout rates
//! increasing toward the head. The network takes `[N, 1, 28, 28]` inputs
//! in [0,1] and produces 10 logits.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use crate::IMAGE_SIZE;

/// Configuration for the digit classifier
#[derive(Config, Debug)]
pub struct DigitClassifierConfig {
    /// Number of output classes
    #[config(default = "10")]
    pub num_classes: usize,

    /// Number of input channels (1 for grayscale)
    #[config(default = "1")]
    pub in_channels: usize,

    /// Filters in the first convolutional block (doubled in the second)
    #[config(default = "32")]
    pub base_filters: usize,

    /// Dropout after the first block
    #[config(default = "0.2")]
    pub dropout_block1: f64,

    /// Dropout after the second block
    #[config(default = "0.3")]
    pub dropout_block2: f64,

    /// Dropout in the dense head
    #[config(default = "0.4")]
    pub dropout_dense: f64,

    /// Units in the dense hidden layer
    #[config(default = "256")]
    pub dense_units: usize,
}

/// Two same-padded 3×3 convolutions with BatchNorm, then pool and dropout
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B>,
    pool: MaxPool2d,
    dropout: Dropout,
    relu: Relu,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a block mapping `in_channels` to `out_channels`, halving the
    /// spatial resolution.
    pub fn new(in_channels: usize, out_channels: usize, dropout: f64, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn1 = BatchNormConfig::new(out_channels).init(device);

        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn2 = BatchNormConfig::new(out_channels).init(device);

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let dropout = DropoutConfig::new(dropout).init();

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            pool,
            dropout,
            relu: Relu::new(),
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv1.forward(x);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);

        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);
        let x = self.relu.forward(x);

        let x = self.pool.forward(x);
        self.dropout.forward(x)
    }
}

/// Digit classifier CNN
///
/// Architecture:
/// - block 1: 1 → 32 filters, 28×28 → 14×14
/// - block 2: 32 → 64 filters, 14×14 → 7×7
/// - flatten → dense 256 with BatchNorm → dense 10
#[derive(Module, Debug)]
pub struct DigitClassifier<B: Backend> {
    block1: ConvBlock<B>,
    block2: ConvBlock<B>,
    fc1: Linear<B>,
    bn_fc: BatchNorm<B>,
    dropout: Dropout,
    fc2: Linear<B>,
    relu: Relu,
    num_classes: usize,
}

impl<B: Backend> DigitClassifier<B> {
    /// Create a classifier from configuration
    pub fn new(config: &DigitClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let block1 = ConvBlock::new(config.in_channels, base, config.dropout_block1, device);
        let block2 = ConvBlock::new(base, base * 2, config.dropout_block2, device);

        // Two 2×2 pools: 28 -> 14 -> 7
        let feature_side = IMAGE_SIZE / 4;
        let flat_features = base * 2 * feature_side * feature_side;

        let fc1 = LinearConfig::new(flat_features, config.dense_units).init(device);
        let bn_fc = BatchNormConfig::new(config.dense_units).init(device);
        let dropout = DropoutConfig::new(config.dropout_dense).init();
        let fc2 = LinearConfig::new(config.dense_units, config.num_classes).init(device);

        Self {
            block1,
            block2,
            fc1,
            bn_fc,
            dropout,
            fc2,
            relu: Relu::new(),
            num_classes: config.num_classes,
        }
    }

    /// Forward pass returning logits of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.block1.forward(x);
        let x = self.block2.forward(x);

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.fc1.forward(x);
        let x = self.bn_fc.forward(x);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

impl DigitClassifierConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.num_classes == 0 {
            return Err("num_classes must be greater than 0".to_string());
        }
        for (name, rate) in [
            ("dropout_block1", self.dropout_block1),
            ("dropout_block2", self.dropout_block2),
            ("dropout_dense", self.dropout_dense),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(format!("{} must be in [0.0, 1.0)", name));
            }
        }
        if self.base_filters == 0 || self.dense_units == 0 {
            return Err("layer sizes must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend;
    use crate::NUM_CLASSES;

    #[test]
    fn test_config_defaults() {
        let config = DigitClassifierConfig::new();
        assert_eq!(config.num_classes, NUM_CLASSES);
        assert_eq!(config.base_filters, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DigitClassifierConfig::new();
        config.dropout_dense = 1.5;
        assert!(config.validate().is_err());

        let mut config = DigitClassifierConfig::new();
        config.num_classes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let config = DigitClassifierConfig::new();
        let model = DigitClassifier::<InferenceBackend>::new(&config, &device);

        let input =
            Tensor::<InferenceBackend, 4>::zeros([2, 1, IMAGE_SIZE, IMAGE_SIZE], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, NUM_CLASSES]);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let device = Default::default();
        let config = DigitClassifierConfig::new();
        let model = DigitClassifier::<InferenceBackend>::new(&config, &device);

        let input =
            Tensor::<InferenceBackend, 4>::zeros([1, 1, IMAGE_SIZE, IMAGE_SIZE], &device);
        let probs: Vec<f32> = model
            .forward_softmax(input)
            .into_data()
            .to_vec()
            .unwrap();

        assert_eq!(probs.len(), NUM_CLASSES);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "softmax sum {}", sum);
    }
}
