//! Training pipeline for the digit classifier.
//!
//! A custom epoch loop on Burn's lower-level API: seeded shuffling,
//! per-epoch augmentation, cross-entropy loss with an Adam optimizer,
//! validation after every epoch, and early stopping on validation loss
//! with best-weight restoration. After training the model record, the
//! confusion matrix (CSV + SVG heatmap), and the run configuration are
//! written to the output directory.

use std::path::PathBuf;

use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::backend::{AutodiffBackend, Backend},
    tensor::ElementConversion,
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::dataset::augmentation::{AugmentationConfig, Augmentor};
use crate::dataset::{DigitBatcher, DigitDataset, DigitItem};
use crate::model::cnn::{DigitClassifier, DigitClassifierConfig};
use crate::model::config::TrainingConfig;
use crate::utils::charts::generate_confusion_heatmap;
use crate::utils::error::{MnistDrawError, Result};
use crate::utils::metrics::Metrics;
use crate::{MODEL_FILENAME, NUM_CLASSES};

/// Per-run bookkeeping for early stopping and reporting
#[derive(Debug, Clone)]
pub struct TrainingState {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Lowest validation loss seen so far
    pub best_val_loss: f64,
    /// Epoch that produced the best validation loss
    pub best_epoch: usize,
    /// Consecutive epochs without improvement
    pub epochs_without_improvement: usize,
    /// Training loss per epoch
    pub train_losses: Vec<f64>,
    /// Validation loss per epoch
    pub val_losses: Vec<f64>,
    /// Validation accuracy per epoch
    pub val_accuracies: Vec<f64>,
}

impl Default for TrainingState {
    fn default() -> Self {
        Self {
            epoch: 0,
            best_val_loss: f64::INFINITY,
            best_epoch: 0,
            epochs_without_improvement: 0,
            train_losses: Vec::new(),
            val_losses: Vec::new(),
            val_accuracies: Vec::new(),
        }
    }
}

impl TrainingState {
    /// Record the epoch's metrics and report whether validation loss
    /// improved.
    pub fn record_epoch(&mut self, train_loss: f64, val_loss: f64, val_accuracy: f64) -> bool {
        self.train_losses.push(train_loss);
        self.val_losses.push(val_loss);
        self.val_accuracies.push(val_accuracy);

        if val_loss < self.best_val_loss {
            self.best_val_loss = val_loss;
            self.best_epoch = self.epoch;
            self.epochs_without_improvement = 0;
            true
        } else {
            self.epochs_without_improvement += 1;
            false
        }
    }

    /// Whether the early-stopping patience is exhausted
    pub fn should_stop(&self, patience: usize) -> bool {
        self.epochs_without_improvement >= patience
    }
}

/// Summary of a completed training run
#[derive(Debug)]
pub struct TrainingReport {
    /// Epochs actually run (early stopping may cut the schedule short)
    pub epochs_run: usize,
    /// Epoch with the lowest validation loss
    pub best_epoch: usize,
    /// Lowest validation loss
    pub best_val_loss: f64,
    /// Held-out test metrics of the restored best model
    pub test_metrics: Metrics,
    /// Where the model record was written
    pub model_path: PathBuf,
    /// Where the confusion-matrix heatmap was written
    pub heatmap_path: PathBuf,
}

/// Train the digit classifier on MNIST and persist the artifacts.
///
/// The MNIST test split doubles as the validation set; augmentation is
/// re-rolled for every epoch so the model never sees the same perturbed
/// image twice.
pub fn run_training<B: AutodiffBackend>(
    model_config: &DigitClassifierConfig,
    config: &TrainingConfig,
    augmentation: &AugmentationConfig,
    device: &B::Device,
) -> Result<TrainingReport> {
    model_config
        .validate()
        .map_err(MnistDrawError::Config)?;
    config.validate().map_err(MnistDrawError::Config)?;

    std::fs::create_dir_all(&config.output_dir)?;
    let model_path = config.output_dir.join(MODEL_FILENAME);

    println!("{}", "Loading MNIST...".cyan().bold());
    let train_dataset = DigitDataset::train();
    let val_dataset = DigitDataset::test();
    println!(
        "  Training samples:   {}\n  Validation samples: {}",
        train_dataset.len(),
        val_dataset.len()
    );

    let batcher = DigitBatcher::new();
    let mut model = DigitClassifier::<B>::new(model_config, device);
    let mut optimizer = AdamConfig::new().init();

    let mut augmentor = Augmentor::new(augmentation.clone(), config.seed);
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut state = TrainingState::default();
    let recorder = CompactRecorder::new();

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Epochs:        {}", config.epochs);
    println!("  Batch size:    {}", config.batch_size);
    println!("  Learning rate: {}", config.learning_rate);
    println!("  Patience:      {}", config.early_stopping_patience);
    println!("  Augmentation:  {}", !augmentation.is_identity());
    println!();

    for epoch in 0..config.epochs {
        state.epoch = epoch;
        println!(
            "{}",
            format!("Epoch {}/{}", epoch + 1, config.epochs).yellow().bold()
        );

        let mut epoch_loss = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        let mut indices: Vec<usize> = (0..train_dataset.len()).collect();
        indices.shuffle(&mut epoch_rng);
        let num_batches = (indices.len() + config.batch_size - 1) / config.batch_size;

        for (batch_idx, chunk) in indices.chunks(config.batch_size).enumerate() {
            // Fresh perturbation of every image, re-rolled each epoch
            let items: Vec<DigitItem> = chunk
                .iter()
                .filter_map(|&i| train_dataset.get(i))
                .map(|item| DigitItem::new(augmentor.apply(&item.pixels), item.label))
                .collect();

            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items, device);
            let output = model.forward(batch.images.clone());

            let loss = CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;

            let predictions = output.argmax(1).squeeze::<1>();
            let batch_correct: i64 = predictions
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;
            seen += batch.targets.dims()[0];

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            if (batch_idx + 1) % 100 == 0 || batch_idx == num_batches - 1 {
                println!(
                    "  Batch {:>4}/{}: loss = {:.4}, acc = {:.2}%",
                    batch_idx + 1,
                    num_batches,
                    loss_value,
                    100.0 * correct as f64 / seen as f64
                );
            }
        }

        let train_loss = epoch_loss / num_batches.max(1) as f64;

        let (val_loss, val_accuracy, _, _) =
            evaluate_model(&model.valid(), &val_dataset, &batcher, config.batch_size);

        let improved = state.record_epoch(train_loss, val_loss, val_accuracy);
        if improved {
            model
                .clone()
                .save_file(&model_path, &recorder)
                .map_err(|e| MnistDrawError::Model(format!("failed to save model: {:?}", e)))?;
            info!(
                "validation loss improved to {:.4}, checkpoint saved",
                val_loss
            );
        }

        println!(
            "  {} Loss: {:.4} | Val Loss: {:.4} | Val Acc: {:.2}%{}",
            "→".cyan(),
            train_loss,
            val_loss,
            val_accuracy * 100.0,
            if improved {
                " (best)".green().to_string()
            } else {
                String::new()
            }
        );
        println!();

        if state.should_stop(config.early_stopping_patience) {
            println!(
                "{}",
                format!(
                    "Early stopping: no improvement for {} epochs",
                    config.early_stopping_patience
                )
                .yellow()
            );
            break;
        }
    }

    // Restore the best weights before final evaluation; the checkpoint on
    // disk is exactly the best epoch's model.
    let model = model
        .load_file(&model_path, &recorder, device)
        .map_err(|e| MnistDrawError::Model(format!("failed to restore best model: {:?}", e)))?;

    println!("{}", "Evaluating on the test set...".cyan().bold());
    let (test_loss, test_accuracy, predictions, targets) =
        evaluate_model(&model.valid(), &val_dataset, &batcher, config.batch_size);

    let mut test_metrics = Metrics::from_predictions(&predictions, &targets, NUM_CLASSES);
    test_metrics.loss = Some(test_loss);

    let heatmap_path = config.output_dir.join("confusion_matrix.svg");
    generate_confusion_heatmap(
        &test_metrics.confusion_matrix,
        "Confusion Matrix",
        &heatmap_path,
    )?;
    test_metrics
        .confusion_matrix
        .save_csv(&config.output_dir.join("confusion_matrix.csv"))?;
    config.save(&config.output_dir.join("training_config.json"))?;

    info!(
        "training finished: best epoch {}, test accuracy {:.2}%",
        state.best_epoch + 1,
        test_accuracy * 100.0
    );

    println!(
        "  Test accuracy: {}",
        format!("{:.2}%", test_accuracy * 100.0).green().bold()
    );
    println!("  Model:   {:?}", model_path);
    println!("  Heatmap: {:?}", heatmap_path);

    Ok(TrainingReport {
        epochs_run: state.train_losses.len(),
        best_epoch: state.best_epoch,
        best_val_loss: state.best_val_loss,
        test_metrics,
        model_path,
        heatmap_path,
    })
}

/// Evaluate a model over a dataset.
///
/// Returns (average loss, accuracy, predictions, targets).
pub fn evaluate_model<B: Backend>(
    model: &DigitClassifier<B>,
    dataset: &DigitDataset,
    batcher: &DigitBatcher,
    batch_size: usize,
) -> (f64, f64, Vec<usize>, Vec<usize>) {
    let device = B::Device::default();

    let mut total_loss = 0.0f64;
    let mut num_batches = 0usize;
    let mut predictions = Vec::with_capacity(dataset.len());
    let mut targets = Vec::with_capacity(dataset.len());

    for start in (0..dataset.len()).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(dataset.len());
        let items: Vec<DigitItem> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let batch = batcher.batch(items, &device);
        let output = model.forward(batch.images);

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), batch.targets.clone());
        let loss_value: f64 = loss.into_scalar().elem();
        total_loss += loss_value;
        num_batches += 1;

        let batch_predictions = output.argmax(1).squeeze::<1>();
        let pred_vec: Vec<i64> = batch_predictions.into_data().to_vec().unwrap_or_default();
        let target_vec: Vec<i64> = batch.targets.into_data().to_vec().unwrap_or_default();

        predictions.extend(pred_vec.iter().map(|&p| p as usize));
        targets.extend(target_vec.iter().map(|&t| t as usize));
    }

    let avg_loss = total_loss / num_batches.max(1) as f64;
    let correct = predictions
        .iter()
        .zip(targets.iter())
        .filter(|(p, t)| p == t)
        .count();
    let accuracy = if targets.is_empty() {
        0.0
    } else {
        correct as f64 / targets.len() as f64
    };

    (avg_loss, accuracy, predictions, targets)
}
