//! Logging setup built on `tracing`.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level to display
    pub level: Level,
    /// Whether to include the module path
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Verbose configuration for debugging
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            ansi_colors: true,
        }
    }
}

/// Initialize the global subscriber with the given configuration.
///
/// Returns an error if a subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level)
        .with_target(config.include_target)
        .with_ansi(config.ansi_colors)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to initialize logging: {}", e))
}

/// Initialize logging from a simple verbosity flag
pub fn init_from_verbosity(verbose: bool) -> Result<(), String> {
    if verbose {
        init_logging(&LogConfig::verbose())
    } else {
        init_logging(&LogConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.include_target);
    }

    #[test]
    fn test_verbose_level() {
        let config = LogConfig::verbose();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.include_target);
    }
}
