//! Config file loading tests
//!
//! Uses serial_test where the process environment is touched, so tests that
//! redirect the config directory do not race each other.

use serial_test::serial;
use std::io::Write;
use sunrise_common::config::{find_config_file, TomlConfig};
use sunrise_common::Error;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
bind = "127.0.0.1"
port = 5050
source = "/srv/audio/birds.mp3"
device = "USB Audio"

[logging]
level = "debug"

[fade_in]
step_percent = 10
delay_ms = 250
max_percent = 80
settle_ms = 0

[fade_out]
step_percent = 20
delay_ms = 100
"#
    )
    .unwrap();

    let config = TomlConfig::load(Some(file.path())).unwrap();

    assert_eq!(config.bind.as_deref(), Some("127.0.0.1"));
    assert_eq!(config.port, Some(5050));
    assert_eq!(
        config.source.as_deref(),
        Some(std::path::Path::new("/srv/audio/birds.mp3"))
    );
    assert_eq!(config.device.as_deref(), Some("USB Audio"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.fade_in.step_percent, 10);
    assert_eq!(config.fade_in.delay_ms, 250);
    assert_eq!(config.fade_in.max_percent, 80);
    assert_eq!(config.fade_in.settle_ms, 0);
    assert_eq!(config.fade_out.step_percent, 20);
    assert_eq!(config.fade_out.delay_ms, 100);
}

#[test]
fn test_malformed_file_is_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[fade_in\nstep_percent = ").unwrap();

    assert!(matches!(
        TomlConfig::load(Some(file.path())),
        Err(Error::Toml(_))
    ));
}

#[test]
fn test_unreadable_file_is_io_error() {
    // A directory exists but cannot be read as a file
    let dir = TempDir::new().unwrap();

    let result = TomlConfig::load(Some(dir.path()));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_user_config_dir_is_searched() {
    let dir = TempDir::new().unwrap();
    let sunrise_dir = dir.path().join("sunrise");
    std::fs::create_dir_all(&sunrise_dir).unwrap();
    std::fs::write(sunrise_dir.join("config.toml"), "port = 6001\n").unwrap();

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let found = find_config_file();
    let config = TomlConfig::load(None);

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(found, Some(sunrise_dir.join("config.toml")));
    assert_eq!(config.unwrap().port, Some(6001));
}
