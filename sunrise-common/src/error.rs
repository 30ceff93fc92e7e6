//! Common error types for Sunrise

use thiserror::Error;

/// Common result type for Sunrise operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Sunrise services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
