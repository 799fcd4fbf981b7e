//! Application state for the prediction server.
//!
//! The trained model is a read-only resource loaded lazily on the first
//! prediction request. The load is guarded by a `OnceCell`, so concurrent
//! first requests trigger exactly one disk read; a failed load (model not
//! trained yet) is not cached and is retried on the next request.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::info;

use mnist_draw::{MnistDrawError, Predictor};

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the persisted model record
    pub model_path: PathBuf,
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("output").join(mnist_draw::MODEL_FILENAME),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Source of the model used to answer predictions.
///
/// A trait seam so tests can substitute in-memory models and count how
/// often a load actually happens.
pub trait ModelProvider: Send + Sync + 'static {
    fn load(&self) -> Result<Predictor, MnistDrawError>;
}

/// Loads the model record from disk
pub struct FileModelProvider {
    path: PathBuf,
}

impl FileModelProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ModelProvider for FileModelProvider {
    fn load(&self) -> Result<Predictor, MnistDrawError> {
        info!("loading model from {:?}", self.path);
        Predictor::load(&self.path)
    }
}

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Lazily initialized model cache
    model: OnceCell<Arc<Predictor>>,
    /// Where the model comes from
    provider: Box<dyn ModelProvider>,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    /// Create state backed by the model file from the configuration
    pub fn new(config: ServerConfig) -> Self {
        let provider = Box::new(FileModelProvider::new(config.model_path.clone()));
        Self::with_provider(config, provider)
    }

    /// Create state with a custom model provider
    pub fn with_provider(config: ServerConfig, provider: Box<dyn ModelProvider>) -> Self {
        Self {
            config,
            model: OnceCell::new(),
            provider,
            started_at: Instant::now(),
        }
    }

    /// Get the shared model, loading it on first use.
    pub async fn model(&self) -> Result<Arc<Predictor>, MnistDrawError> {
        self.model
            .get_or_try_init(|| async { self.provider.load().map(Arc::new) })
            .await
            .cloned()
    }

    /// Uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

/// Test double that counts how many times the model was loaded
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use mnist_draw::backend::default_device;
    use mnist_draw::{DigitClassifier, DigitClassifierConfig, MnistDrawError, Predictor};

    use super::ModelProvider;

    #[derive(Clone, Default)]
    pub(crate) struct CountingProvider {
        loads: Arc<AtomicUsize>,
    }

    impl CountingProvider {
        pub(crate) fn load_count(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl ModelProvider for CountingProvider {
        fn load(&self) -> Result<Predictor, MnistDrawError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let device = default_device();
            Ok(Predictor::from_model(DigitClassifier::new(
                &DigitClassifierConfig::new(),
                &device,
            )))
        }
    }
}
