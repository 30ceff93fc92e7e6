//! Blocking, time-stepped volume ramps
//!
//! Each ramp is a sequential sleep-then-set loop run on the session's own
//! background thread, so steps are evenly spaced. Callers hold the fade guard
//! for the whole ramp.

use crate::audio::AudioDevice;
use crate::error::Result;
use crate::fade::params::{start_percent, FadeInParams, FadeOutParams};
use std::thread;
use tracing::debug;

/// Progress reported by a ramp while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampProgress {
    /// Ramp planned: first and last volume step
    Started { from_percent: u8, to_percent: u8 },
    /// Volume set to this percent
    Step(u8),
    /// Playback started (true) or stopped (false)
    Playing(bool),
}

/// Start playback from the beginning and ramp up to `max_percent`.
///
/// The device is muted before playback restarts, then left at
/// `max_percent / 100` and playing. Returns the final volume percent.
pub fn ramp_in(
    device: &mut dyn AudioDevice,
    params: &FadeInParams,
    on_progress: &mut dyn FnMut(RampProgress),
) -> Result<u8> {
    params.validate()?;
    let steps = params.steps();

    device.set_volume(0.0)?;
    device.play()?;
    on_progress(RampProgress::Playing(true));

    // Let the decoder and output settle before the first audible step
    thread::sleep(params.settle);

    on_progress(RampProgress::Started {
        from_percent: 0,
        to_percent: params.max_percent,
    });

    for &percent in &steps {
        device.set_volume(f32::from(percent) / 100.0)?;
        debug!("Volume {}%", percent);
        on_progress(RampProgress::Step(percent));
        thread::sleep(params.delay);
    }

    Ok(params.max_percent)
}

/// Ramp from the current device volume down to silence, then stop playback.
///
/// Returns the final volume percent (always 0).
pub fn ramp_out(
    device: &mut dyn AudioDevice,
    params: &FadeOutParams,
    on_progress: &mut dyn FnMut(RampProgress),
) -> Result<u8> {
    params.validate()?;

    let sampled = device.get_volume();
    let start = start_percent(sampled);
    debug!("Current volume {:.3} -> starting fade-out at {}%", sampled, start);

    on_progress(RampProgress::Started {
        from_percent: start,
        to_percent: 0,
    });

    for percent in params.steps_from(start) {
        device.set_volume(f32::from(percent) / 100.0)?;
        debug!("Volume {}%", percent);
        on_progress(RampProgress::Step(percent));
        thread::sleep(params.delay);
    }

    device.stop()?;
    on_progress(RampProgress::Playing(false));

    Ok(0)
}
