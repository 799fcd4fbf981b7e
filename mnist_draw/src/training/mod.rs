//! Training loop and bookkeeping.

pub mod trainer;

pub use trainer::{run_training, TrainingReport, TrainingState};
