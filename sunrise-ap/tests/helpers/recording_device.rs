//! In-memory `AudioDevice` that records every call
//!
//! The log is shared so tests can inspect it after the device has been moved
//! into a controller. Faults can be injected on `play()` or on the Nth
//! `set_volume()`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use sunrise_ap::audio::AudioDevice;
use sunrise_ap::{Error, Result};

/// A recorded device call; volumes in integer percent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Load(PathBuf),
    Play,
    Stop,
    Volume(u8),
}

pub type CallLog = Arc<Mutex<Vec<DeviceCall>>>;

pub struct RecordingDevice {
    log: CallLog,
    volume: f32,
    fail_play: bool,
    fail_volume_call: Option<usize>,
    volume_calls: usize,
}

impl RecordingDevice {
    /// Device reporting `volume` until the first `set_volume`
    pub fn new(volume: f32) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            volume,
            fail_play: false,
            fail_volume_call: None,
            volume_calls: 0,
        }
    }

    /// Every `play()` fails with `DeviceUnavailable`
    pub fn failing_play(mut self) -> Self {
        self.fail_play = true;
        self
    }

    /// The `n`th `set_volume()` (1-based) fails once
    pub fn failing_volume_call(mut self, n: usize) -> Self {
        self.fail_volume_call = Some(n);
        self
    }

    pub fn log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    fn record(&self, call: DeviceCall) {
        self.log.lock().unwrap().push(call);
    }
}

impl AudioDevice for RecordingDevice {
    fn load(&mut self, source: &Path) -> Result<()> {
        self.record(DeviceCall::Load(source.to_path_buf()));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.fail_play {
            return Err(Error::DeviceUnavailable("injected play failure".to_string()));
        }
        self.record(DeviceCall::Play);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(DeviceCall::Stop);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.volume_calls += 1;
        if self.fail_volume_call == Some(self.volume_calls) {
            return Err(Error::DeviceUnavailable(format!(
                "injected failure on volume call {}",
                self.volume_calls
            )));
        }
        self.volume = volume;
        self.record(DeviceCall::Volume((volume * 100.0).round() as u8));
        Ok(())
    }

    fn get_volume(&self) -> f32 {
        self.volume
    }
}

/// One complete session recovered from a call log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Volume steps after the leading mute and `Play`
    FadeIn(Vec<u8>),
    /// Volume steps before `Stop`
    FadeOut(Vec<u8>),
}

/// Parse a call log into whole sessions.
///
/// A fade-in is `Volume(0), Play` followed by strictly increasing volumes
/// starting at 0. A fade-out is strictly decreasing volumes ending at 0,
/// followed by `Stop`. Calls from two sessions mixed together fail to parse.
pub fn parse_sessions(log: &[DeviceCall]) -> std::result::Result<Vec<Session>, String> {
    let mut sessions = Vec::new();
    let mut i = 0;

    while i < log.len() {
        if log[i] == DeviceCall::Volume(0) && log.get(i + 1) == Some(&DeviceCall::Play) {
            i += 2;
            let steps = take_run(log, &mut i, |prev, next| next > prev);
            if steps.first() != Some(&0) {
                return Err(format!("fade-in at call {} does not start at 0", i));
            }
            sessions.push(Session::FadeIn(steps));
        } else {
            let steps = take_run(log, &mut i, |prev, next| next < prev);
            if steps.last() != Some(&0) {
                return Err(format!("fade-out before call {} does not reach 0", i));
            }
            if log.get(i) != Some(&DeviceCall::Stop) {
                return Err(format!("expected Stop at call {}, got {:?}", i, log.get(i)));
            }
            i += 1;
            sessions.push(Session::FadeOut(steps));
        }
    }

    Ok(sessions)
}

fn take_run(log: &[DeviceCall], i: &mut usize, continues: impl Fn(u8, u8) -> bool) -> Vec<u8> {
    let mut steps: Vec<u8> = Vec::new();
    while let Some(DeviceCall::Volume(v)) = log.get(*i) {
        if let Some(&prev) = steps.last() {
            if !continues(prev, *v) {
                break;
            }
        }
        steps.push(*v);
        *i += 1;
    }
    steps
}
