//! Error types for the digit recognizer.
//!
//! Uses thiserror for ergonomic error definitions. The serving layer maps
//! these onto HTTP statuses, so user-recoverable conditions (bad upload,
//! empty drawing) are distinct variants from operational ones (missing
//! model artifact).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for digit recognition operations
#[derive(Error, Debug)]
pub enum MnistDrawError {
    /// The submitted image contains no pixel above the foreground threshold
    #[error("no drawing found")]
    EmptyCanvas,

    /// The request payload could not be decoded into an image
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    /// The persisted model artifact does not exist yet
    #[error("model not ready: {0} is missing, train one first")]
    ModelNotReady(PathBuf),

    /// Error loading or saving a model record
    #[error("model error: {0}")]
    Model(String),

    /// Error with dataset operations
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Error during training
    #[error("training error: {0}")]
    Training(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for digit recognition operations
pub type Result<T> = std::result::Result<T, MnistDrawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MnistDrawError::EmptyCanvas;
        assert_eq!(format!("{}", err), "no drawing found");
    }

    #[test]
    fn test_model_not_ready_names_path() {
        let err = MnistDrawError::ModelNotReady(PathBuf::from("output/mnist_model.mpk"));
        assert!(format!("{}", err).contains("mnist_model.mpk"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MnistDrawError = io.into();
        assert!(matches!(err, MnistDrawError::Io(_)));
    }
}
