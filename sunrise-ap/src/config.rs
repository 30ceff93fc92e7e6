//! Runtime configuration for sunrise-ap
//!
//! Merges command-line/environment overrides onto the TOML bootstrap file and
//! compiled defaults. Fade defaults are validated here so a bad config file
//! fails at startup instead of on the first trigger.

use crate::error::Result;
use crate::fade::{FadeInParams, FadeOutParams};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use sunrise_common::config::{default_source, TomlConfig, DEFAULT_BIND, DEFAULT_PORT};
use sunrise_common::Error as CommonError;

/// Values given on the command line or through `SUNRISE_*` variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub source: Option<PathBuf>,
    pub device: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub source: PathBuf,
    /// Output device name (None = system default)
    pub device: Option<String>,
    pub log_level: String,
    pub fade_in: FadeInParams,
    pub fade_out: FadeOutParams,
}

impl AppConfig {
    /// Resolve: CLI/env first, then TOML, then defaults.
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Result<Self> {
        let bind_str = cli
            .bind
            .or(toml.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str.parse::<IpAddr>().map_err(|e| {
            CommonError::Config(format!("Invalid bind address '{}': {}", bind_str, e))
        })?;

        let fade_in = FadeInParams::from(toml.fade_in);
        fade_in.validate()?;
        let fade_out = FadeOutParams::from(toml.fade_out);
        fade_out.validate()?;

        Ok(Self {
            bind,
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            source: cli.source.or(toml.source).unwrap_or_else(default_source),
            device: cli.device.or(toml.device),
            log_level: toml.logging.level,
            fade_in,
            fade_out,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = AppConfig::resolve(CliOverrides::default(), TomlConfig::default()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
        assert!(config.source.ends_with("birds.mp3"));
        assert!(config.device.is_none());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.fade_in, FadeInParams::default());
        assert_eq!(config.fade_out, FadeOutParams::default());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml = TomlConfig::from_toml_str(
            r#"
            bind = "127.0.0.1"
            port = 6000
            source = "/srv/rain.mp3"
            device = "USB Audio"

            [fade_out]
            delay_ms = 250
            "#,
        )
        .unwrap();

        let cli = CliOverrides {
            port: Some(7000),
            source: Some(PathBuf::from("/tmp/waves.flac")),
            ..Default::default()
        };

        let config = AppConfig::resolve(cli, toml).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:7000");
        assert_eq!(config.source, PathBuf::from("/tmp/waves.flac"));
        assert_eq!(config.device.as_deref(), Some("USB Audio"));
        assert_eq!(config.fade_out.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_bind_is_error() {
        let cli = CliOverrides {
            bind: Some("not-an-ip".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(cli, TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_fade_settings_rejected_at_startup() {
        let toml = TomlConfig::from_toml_str(
            r#"
            [fade_in]
            max_percent = 120
            "#,
        )
        .unwrap();
        let result = AppConfig::resolve(CliOverrides::default(), toml);
        assert!(matches!(result, Err(Error::InvalidParameters(_))));
    }
}
