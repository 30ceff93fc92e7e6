//! # Sunrise Common Library
//!
//! Shared code for the Sunrise audio services:
//! - Error types
//! - Bootstrap configuration loading (TOML + config file discovery)
//! - Fade event types broadcast over SSE

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{FadeDirection, FadeEvent};
