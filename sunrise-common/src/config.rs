//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, handled by the binary)
//! 2. Environment variable (handled by the binary through clap `env`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: a warning is logged and defaults apply.
//! A config file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for the fader service
pub const DEFAULT_PORT: u16 = 5000;

/// Default bind address (all interfaces)
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Address to bind the HTTP server to
    pub bind: Option<String>,

    /// HTTP server port
    pub port: Option<u16>,

    /// Audio source file played by fade-in
    pub source: Option<PathBuf>,

    /// Output device name (None = system default)
    pub device: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Fade-in defaults
    pub fade_in: FadeInSettings,

    /// Fade-out defaults
    pub fade_out: FadeOutSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error, or a full EnvFilter directive)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Fade-in ramp defaults
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FadeInSettings {
    /// Volume increment per step, in percent
    pub step_percent: u8,
    /// Delay after each step
    pub delay_ms: u64,
    /// Final volume, in percent
    pub max_percent: u8,
    /// Wait between starting playback and the first step
    pub settle_ms: u64,
}

impl Default for FadeInSettings {
    fn default() -> Self {
        Self {
            step_percent: 5,
            delay_ms: 1000,
            max_percent: 100,
            settle_ms: 1000,
        }
    }
}

/// Fade-out ramp defaults
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FadeOutSettings {
    /// Volume decrement per step, in percent
    pub step_percent: u8,
    /// Delay after each step
    pub delay_ms: u64,
}

impl Default for FadeOutSettings {
    fn default() -> Self {
        Self {
            step_percent: 5,
            delay_ms: 500,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Locate and load the config file.
    ///
    /// An explicitly requested file must exist. Without one, the per-user and
    /// system locations are searched; if neither exists, defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading config from {}", path.display());
            return Self::from_file(path);
        }

        match find_config_file() {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Search the standard config file locations.
///
/// Order: `$XDG_CONFIG_HOME/sunrise/config.toml` (or the platform equivalent),
/// then `/etc/sunrise/config.toml` on Unix.
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("sunrise").join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/sunrise/config.toml"));
    }

    candidates.into_iter().find(|p| p.exists())
}

/// Default audio source: `birds.mp3` in the user's home directory
pub fn default_source() -> PathBuf {
    dirs::home_dir()
        .map(|d| d.join("birds.mp3"))
        .unwrap_or_else(|| PathBuf::from("birds.mp3"))
}
