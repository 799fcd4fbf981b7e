//! Digit recognizer CLI
//!
//! Entry point for training the MNIST classifier, running one-off
//! predictions on image files, and evaluating a persisted model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use mnist_draw::backend::{backend_name, default_device, TrainingBackend};
use mnist_draw::utils::logging::init_from_verbosity;
use mnist_draw::{
    run_training, AugmentationConfig, DigitClassifierConfig, DigitDataset, Predictor,
    TrainingConfig,
};

/// Handwritten digit recognition with a Burn CNN
#[derive(Parser, Debug)]
#[command(name = "mnist_draw")]
#[command(version)]
#[command(about = "Train and run an MNIST digit classifier", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier on MNIST and persist the model
    Train {
        /// Output directory for the model and evaluation artifacts
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Maximum number of epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Early-stopping patience (epochs without val-loss improvement)
        #[arg(long, default_value = "3")]
        patience: usize,

        /// Random seed for shuffling and augmentation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Disable runtime data augmentation
        #[arg(long, default_value = "false")]
        no_augmentation: bool,
    },

    /// Classify a single image file
    Infer {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the trained model record
        #[arg(short, long, default_value = "output/mnist_model.mpk")]
        model: PathBuf,
    },

    /// Evaluate a trained model on the MNIST test set
    Evaluate {
        /// Path to the trained model record
        #[arg(short, long, default_value = "output/mnist_model.mpk")]
        model: PathBuf,

        /// Batch size for evaluation
        #[arg(short, long, default_value = "256")]
        batch_size: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_from_verbosity(cli.verbose) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Commands::Train {
            output_dir,
            epochs,
            batch_size,
            learning_rate,
            patience,
            seed,
            no_augmentation,
        } => {
            println!("{} ({})", "Training digit classifier".green().bold(), backend_name());

            let config = TrainingConfig {
                epochs,
                batch_size,
                learning_rate,
                early_stopping_patience: patience,
                seed,
                output_dir,
            };
            let augmentation = if no_augmentation {
                AugmentationConfig::none()
            } else {
                AugmentationConfig::default()
            };

            let device = default_device();
            let report = run_training::<TrainingBackend>(
                &DigitClassifierConfig::new(),
                &config,
                &augmentation,
                &device,
            )
            .context("training failed")?;

            println!();
            println!("{}", "Training Complete!".green().bold());
            println!(
                "  Best epoch: {} (val loss {:.4})",
                report.best_epoch + 1,
                report.best_val_loss
            );
            println!("{}", report.test_metrics.confusion_matrix);
        }

        Commands::Infer { input, model } => {
            let predictor = Predictor::load(&model)
                .with_context(|| format!("could not load model from {:?}", model))?;

            let image = image::open(&input)
                .with_context(|| format!("could not open image {:?}", input))?
                .to_luma8();

            let prediction = predictor.predict_image(&image)?;

            println!(
                "Prediction: {} ({:.2}% confidence)",
                prediction.digit.to_string().green().bold(),
                prediction.confidence * 100.0
            );
            println!("\nTop digits:");
            for (digit, probability) in prediction.top_k(3) {
                println!("  {} - {:.2}%", digit, probability * 100.0);
            }
        }

        Commands::Evaluate { model, batch_size } => {
            let predictor = Predictor::load(&model)
                .with_context(|| format!("could not load model from {:?}", model))?;

            println!("{}", "Loading MNIST test set...".cyan());
            let dataset = DigitDataset::test();

            let metrics = predictor.evaluate(&dataset, batch_size);
            println!("{}", metrics);
            println!("{}", metrics.confusion_matrix);
        }
    }

    Ok(())
}
