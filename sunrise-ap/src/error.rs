//! Error types for sunrise-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for sunrise-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] sunrise_common::Error),

    /// Audio source cannot be loaded or played
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Step, delay or bound outside the documented range
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Background fade thread could not be started
    #[error("Failed to spawn fade thread: {0}")]
    Spawn(std::io::Error),

    /// Fade session ended abnormally
    #[error("Fade session aborted: {0}")]
    Session(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),
}

/// Convenience Result type using sunrise-ap Error
pub type Result<T> = std::result::Result<T, Error>;
