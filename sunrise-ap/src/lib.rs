//! # Sunrise Audio Player Library (sunrise-ap)
//!
//! Remote-triggered volume fades for a single local audio source.
//!
//! **Purpose:** Play one configured audio file, ramp its volume up on
//! `/fadein` and down to silence on `/fadeout`, with every ramp serialized
//! behind a single guard.
//!
//! **Architecture:** symphonia + rubato + cpal output device, driven by a
//! blocking fade controller on per-trigger background threads, behind an axum
//! HTTP/SSE control surface.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod fade;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
