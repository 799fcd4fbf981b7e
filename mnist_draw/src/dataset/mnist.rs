//! Burn dataset integration for MNIST digits.
//!
//! Wraps Burn's bundled MNIST vision dataset into an in-memory item list
//! and provides the batcher that turns items into normalized `[N, 1, 28, 28]`
//! tensors for the classifier.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::vision::{MnistDataset, MnistItem};
use burn::data::dataset::Dataset;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{IMAGE_SIZE, NUM_CLASSES};

/// A single digit sample: raw pixel intensities (0-255) in row-major
/// order plus the ground-truth label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DigitItem {
    /// Flattened 28×28 image, values in 0.0..=255.0
    pub pixels: Vec<f32>,
    /// Digit label (0-9)
    pub label: u8,
}

impl DigitItem {
    /// Create an item from raw pixels
    pub fn new(pixels: Vec<f32>, label: u8) -> Self {
        debug_assert_eq!(pixels.len(), IMAGE_SIZE * IMAGE_SIZE);
        Self { pixels, label }
    }
}

impl From<MnistItem> for DigitItem {
    fn from(item: MnistItem) -> Self {
        let pixels = item
            .image
            .iter()
            .flat_map(|row| row.iter().copied())
            .collect();
        Self {
            pixels,
            label: item.label,
        }
    }
}

/// In-memory MNIST dataset
#[derive(Debug, Clone)]
pub struct DigitDataset {
    items: Vec<DigitItem>,
}

impl DigitDataset {
    /// Load the 60k-image training split
    pub fn train() -> Self {
        Self::from_source(MnistDataset::train())
    }

    /// Load the 10k-image test split
    pub fn test() -> Self {
        Self::from_source(MnistDataset::test())
    }

    /// Build a dataset from pre-made items
    pub fn from_items(items: Vec<DigitItem>) -> Self {
        Self { items }
    }

    fn from_source(source: MnistDataset) -> Self {
        let items = (0..source.len())
            .filter_map(|i| source.get(i))
            .map(DigitItem::from)
            .collect();
        Self { items }
    }

    /// Borrow the underlying items
    pub fn items(&self) -> &[DigitItem] {
        &self.items
    }

    /// Samples per digit
    pub fn class_distribution(&self) -> Vec<usize> {
        let mut counts = vec![0usize; NUM_CLASSES];
        for item in &self.items {
            if (item.label as usize) < NUM_CLASSES {
                counts[item.label as usize] += 1;
            }
        }
        counts
    }
}

impl Dataset<DigitItem> for DigitDataset {
    fn get(&self, index: usize) -> Option<DigitItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of digit images ready for the model
#[derive(Clone, Debug)]
pub struct DigitBatch<B: Backend> {
    /// Images with shape [batch_size, 1, 28, 28], values scaled to [0,1]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher turning [`DigitItem`]s into [`DigitBatch`]es
#[derive(Clone, Debug, Default)]
pub struct DigitBatcher;

impl DigitBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, DigitItem, DigitBatch<B>> for DigitBatcher {
    fn batch(&self, items: Vec<DigitItem>, device: &B::Device) -> DigitBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        // Scale raw intensities to [0,1]; this must match the inference
        // preprocessing exactly.
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(pixels, [batch_size, 1, IMAGE_SIZE, IMAGE_SIZE]),
            device,
        ) / 255.0;

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        DigitBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend;

    fn item_with_value(value: f32, label: u8) -> DigitItem {
        DigitItem::new(vec![value; IMAGE_SIZE * IMAGE_SIZE], label)
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = DigitBatcher::new();

        let batch: DigitBatch<InferenceBackend> = batcher.batch(
            vec![item_with_value(0.0, 3), item_with_value(255.0, 7)],
            &device,
        );

        assert_eq!(batch.images.dims(), [2, 1, IMAGE_SIZE, IMAGE_SIZE]);
        assert_eq!(batch.targets.dims(), [2]);
    }

    #[test]
    fn test_batch_scales_to_unit_range() {
        let device = Default::default();
        let batcher = DigitBatcher::new();

        let batch: DigitBatch<InferenceBackend> =
            batcher.batch(vec![item_with_value(255.0, 0)], &device);

        let values: Vec<f32> = batch.images.into_data().to_vec().unwrap();
        assert!(values.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_batch_targets() {
        let device = Default::default();
        let batcher = DigitBatcher::new();

        let batch: DigitBatch<InferenceBackend> = batcher.batch(
            vec![item_with_value(10.0, 4), item_with_value(20.0, 9)],
            &device,
        );

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![4, 9]);
    }

    #[test]
    fn test_dataset_from_items() {
        let dataset = DigitDataset::from_items(vec![
            item_with_value(0.0, 1),
            item_with_value(0.0, 1),
            item_with_value(0.0, 8),
        ]);

        assert_eq!(dataset.len(), 3);
        let distribution = dataset.class_distribution();
        assert_eq!(distribution[1], 2);
        assert_eq!(distribution[8], 1);
        assert_eq!(distribution.iter().sum::<usize>(), 3);
    }
}
