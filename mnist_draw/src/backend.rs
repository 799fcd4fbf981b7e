//! Backend selection
//!
//! A 28×28 grayscale classifier is comfortably CPU-sized, so everything
//! runs on the NdArray backend: plain for inference, wrapped in `Autodiff`
//! for training.

use burn::backend::{Autodiff, NdArray};

/// Backend used for inference and evaluation
pub type InferenceBackend = NdArray;

/// Autodiff backend used for training
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Get the default device
pub fn default_device() -> <InferenceBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Human-readable name for the active backend
pub fn backend_name() -> &'static str {
    "NdArray (CPU)"
}
