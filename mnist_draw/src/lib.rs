//! # MNIST Draw
//!
//! A handwritten-digit recognizer built with the Burn framework: a small
//! CNN trained on MNIST with runtime augmentation, plus the preprocessing
//! pipeline that turns an arbitrary canvas drawing into the 28×28 tensor
//! the model expects.
//!
//! ## Modules
//!
//! - `dataset`: MNIST items, batching, and runtime augmentation
//! - `model`: CNN architecture and training configuration
//! - `training`: training loop with early stopping and evaluation artifacts
//! - `inference`: loading a persisted model and running predictions
//! - `preprocess`: canvas-drawing normalization to MNIST conventions
//! - `utils`: errors, metrics, logging, and chart output

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod preprocess;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use dataset::augmentation::{AugmentationConfig, Augmentor};
pub use dataset::{DigitBatch, DigitBatcher, DigitDataset, DigitItem};
pub use inference::predictor::{Prediction, Predictor};
pub use model::cnn::{DigitClassifier, DigitClassifierConfig};
pub use model::config::TrainingConfig;
pub use preprocess::normalize_drawing;
pub use training::trainer::{run_training, TrainingReport, TrainingState};
pub use utils::error::{MnistDrawError, Result};
pub use utils::metrics::{ConfusionMatrix, Metrics};

/// Digit classes (0-9)
pub const NUM_CLASSES: usize = 10;

/// Side length of the model input in pixels
pub const IMAGE_SIZE: usize = 28;

/// Side length of the box the digit itself occupies inside the input
pub const DIGIT_BOX: usize = 20;

/// Margin around the digit box ((28 - 20) / 2)
pub const DIGIT_MARGIN: usize = 4;

/// Minimum intensity (exclusive) for a pixel to count as part of a drawing
pub const FOREGROUND_THRESHOLD: u8 = 30;

/// Filename of the persisted model record
pub const MODEL_FILENAME: &str = "mnist_model.mpk";

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
