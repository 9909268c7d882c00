//! Logging Module
//!
//! Structured logging setup on the `tracing` crate. The detector logs request
//! outcomes at info, pipeline internals at debug, and internal failures at
//! error with full detail; callers pick the verbosity through [`LogConfig`].

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to include target (module path)
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
    /// Verbose configuration for debugging pipeline internals
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            ansi_colors: true,
        }
    }

    /// Quiet configuration (errors only)
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Production configuration (no colors, for log aggregation)
    pub fn production() -> Self {
        Self {
            ansi_colors: false,
            ..Self::default()
        }
    }

    /// Override the level from a string such as "debug" or "warn"; unknown
    /// values keep the current level.
    pub fn with_level(mut self, level: &str) -> Self {
        if let Ok(parsed) = level.parse::<Level>() {
            self.level = parsed;
        }
        self
    }
}

/// Install the global subscriber for the given configuration.
///
/// Fails if a subscriber was already installed, which in practice means
/// logging was initialized twice.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Initialize logging with default settings
pub fn init_default_logging() -> Result<(), String> {
    init_logging(&LogConfig::default())
}
