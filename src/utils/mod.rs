//! Utility modules: error types and logging setup

pub mod error;
pub mod logging;

pub use error::{LeafsightError, Result};
pub use logging::{init_default_logging, init_logging, LogConfig};
