//! Error types for the Istio mesh client registry

use thiserror::Error;

/// Result type for the registry
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the registry
#[derive(Debug, Error)]
pub enum Error {
    /// Connection configuration was invalid or the client could not be built
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A lifecycle participant failed to sync or start
    #[error("Lifecycle error: {0}")]
    LifecycleError(String),
}
