//! Inference on trained digit classifiers.
//!
//! The [`Predictor`] owns a model on the CPU inference backend. It is
//! loaded from a persisted record once and then shared read-only: running
//! a prediction never mutates the model, so a single instance can serve
//! any number of requests.

use std::path::Path;

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::backend::{default_device, InferenceBackend};
use crate::dataset::{DigitBatcher, DigitDataset};
use crate::model::cnn::{DigitClassifier, DigitClassifierConfig};
use crate::preprocess::normalize_drawing;
use crate::training::trainer::evaluate_model;
use crate::utils::error::{MnistDrawError, Result};
use crate::utils::metrics::Metrics;
use crate::{IMAGE_SIZE, NUM_CLASSES};

/// Result of classifying a single drawing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted digit (0-9)
    pub digit: usize,
    /// Softmax probability of the predicted digit
    pub confidence: f32,
    /// Full probability distribution over all digits
    pub probabilities: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from a probability distribution (argmax digit,
    /// max probability as confidence).
    pub fn from_probabilities(probabilities: Vec<f32>) -> Self {
        let (digit, &confidence) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, &0.0));

        Self {
            digit,
            confidence,
            probabilities,
        }
    }

    /// The `k` most probable digits with their probabilities
    pub fn top_k(&self, k: usize) -> Vec<(usize, f32)> {
        let mut indexed: Vec<(usize, f32)> = self
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| (i, p))
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed.truncate(k);
        indexed
    }
}

/// Digit predictor backed by a trained classifier
pub struct Predictor {
    model: DigitClassifier<InferenceBackend>,
    device: <InferenceBackend as Backend>::Device,
}

impl Predictor {
    /// Load a predictor from a persisted model record.
    ///
    /// Returns [`MnistDrawError::ModelNotReady`] when the file does not
    /// exist, so callers can distinguish "train first" from a corrupt
    /// record.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MnistDrawError::ModelNotReady(path.to_path_buf()));
        }

        let device = default_device();
        let model = DigitClassifier::new(&DigitClassifierConfig::new(), &device)
            .load_file(path, &CompactRecorder::new(), &device)
            .map_err(|e| MnistDrawError::Model(format!("failed to load model record: {:?}", e)))?;

        Ok(Self { model, device })
    }

    /// Wrap an already-constructed model (used by tests and tooling)
    pub fn from_model(model: DigitClassifier<InferenceBackend>) -> Self {
        Self {
            model,
            device: default_device(),
        }
    }

    /// Classify a normalized drawing: 784 row-major values in [0,1].
    pub fn predict_pixels(&self, pixels: &[f32]) -> Prediction {
        debug_assert_eq!(pixels.len(), IMAGE_SIZE * IMAGE_SIZE);

        let input = Tensor::<InferenceBackend, 4>::from_floats(
            TensorData::new(pixels.to_vec(), [1, 1, IMAGE_SIZE, IMAGE_SIZE]),
            &self.device,
        );

        let probabilities: Vec<f32> = self
            .model
            .forward_softmax(input)
            .into_data()
            .to_vec()
            .unwrap_or_else(|_| vec![0.0; NUM_CLASSES]);

        Prediction::from_probabilities(probabilities)
    }

    /// Classify a raw grayscale drawing, running the full normalization
    /// pipeline first.
    pub fn predict_image(&self, image: &GrayImage) -> Result<Prediction> {
        let pixels = normalize_drawing(image)?;
        Ok(self.predict_pixels(&pixels))
    }

    /// Evaluate the model over a dataset, returning full metrics.
    pub fn evaluate(&self, dataset: &DigitDataset, batch_size: usize) -> Metrics {
        let (loss, _, predictions, targets) =
            evaluate_model(&self.model, dataset, &DigitBatcher::new(), batch_size);

        let mut metrics = Metrics::from_predictions(&predictions, &targets, NUM_CLASSES);
        metrics.loss = Some(loss);
        metrics
    }
}
