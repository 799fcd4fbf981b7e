//! Model loading and prediction.

pub mod predictor;

pub use predictor::{Prediction, Predictor};
