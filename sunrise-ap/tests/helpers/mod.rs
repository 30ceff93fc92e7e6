//! Shared helpers for sunrise-ap integration tests

#![allow(dead_code)]

pub mod recording_device;

#[allow(unused_imports)]
pub use recording_device::{parse_sessions, CallLog, DeviceCall, RecordingDevice, Session};
