//! Error types for engine construction.

use stylus_config::ConfigError;

/// Errors that can occur while starting an [`InkEngine`](crate::InkEngine).
///
/// Once running, the engine has no fatal errors: bad input is ignored and
/// listener faults are isolated.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start background workers: {0}")]
    Runtime(#[from] std::io::Error),
}
