//! MNIST data handling: items, batching, and runtime augmentation.

pub mod augmentation;
pub mod mnist;

pub use augmentation::{AugmentationConfig, Augmentor};
pub use mnist::{DigitBatch, DigitBatcher, DigitDataset, DigitItem};
