//! Fade parameters, validation and step plans
//!
//! Volumes are integer percent (0-100) of the device's native volume range.
//! Ramps are linear in those units.

use crate::error::{Error, Result};
use std::time::Duration;
use sunrise_common::config::{FadeInSettings, FadeOutSettings};

/// Fade-in ramp parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeInParams {
    /// Volume increment per step, in percent
    pub step_percent: u8,
    /// Sleep after each step
    pub delay: Duration,
    /// Final volume, in percent
    pub max_percent: u8,
    /// Wait between starting playback and the first step
    pub settle: Duration,
}

impl Default for FadeInParams {
    fn default() -> Self {
        FadeInSettings::default().into()
    }
}

impl From<FadeInSettings> for FadeInParams {
    fn from(settings: FadeInSettings) -> Self {
        Self {
            step_percent: settings.step_percent,
            delay: Duration::from_millis(settings.delay_ms),
            max_percent: settings.max_percent,
            settle: Duration::from_millis(settings.settle_ms),
        }
    }
}

impl FadeInParams {
    /// Check `0 < step <= max <= 100`.
    pub fn validate(&self) -> Result<()> {
        if self.step_percent == 0 {
            return Err(Error::InvalidParameters(
                "step_percent must be greater than 0".to_string(),
            ));
        }
        if self.max_percent > 100 {
            return Err(Error::InvalidParameters(format!(
                "max_percent must be at most 100 (got {})",
                self.max_percent
            )));
        }
        if self.step_percent > self.max_percent {
            return Err(Error::InvalidParameters(format!(
                "step_percent ({}) must not exceed max_percent ({})",
                self.step_percent, self.max_percent
            )));
        }
        Ok(())
    }

    /// Apply per-request overrides and validate the result.
    pub fn with_overrides(
        mut self,
        step: Option<u32>,
        delay_ms: Option<u64>,
        max: Option<u32>,
    ) -> Result<Self> {
        if let Some(step) = step {
            self.step_percent = percent("step", step)?;
        }
        if let Some(delay_ms) = delay_ms {
            self.delay = Duration::from_millis(delay_ms);
        }
        if let Some(max) = max {
            self.max_percent = percent("max", max)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Volume steps: 0, s, 2s, ... while below max, then exactly max.
    pub fn steps(&self) -> Vec<u8> {
        let mut steps: Vec<u8> = (0..self.max_percent)
            .step_by(usize::from(self.step_percent.max(1)))
            .collect();
        steps.push(self.max_percent);
        steps
    }
}

/// Fade-out ramp parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeOutParams {
    /// Volume decrement per step, in percent
    pub step_percent: u8,
    /// Sleep after each step
    pub delay: Duration,
}

impl Default for FadeOutParams {
    fn default() -> Self {
        FadeOutSettings::default().into()
    }
}

impl From<FadeOutSettings> for FadeOutParams {
    fn from(settings: FadeOutSettings) -> Self {
        Self {
            step_percent: settings.step_percent,
            delay: Duration::from_millis(settings.delay_ms),
        }
    }
}

impl FadeOutParams {
    /// Check `step > 0`.
    pub fn validate(&self) -> Result<()> {
        if self.step_percent == 0 {
            return Err(Error::InvalidParameters(
                "step_percent must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply per-request overrides and validate the result.
    pub fn with_overrides(mut self, step: Option<u32>, delay_ms: Option<u64>) -> Result<Self> {
        if let Some(step) = step {
            self.step_percent = percent("step", step)?;
        }
        if let Some(delay_ms) = delay_ms {
            self.delay = Duration::from_millis(delay_ms);
        }
        self.validate()?;
        Ok(self)
    }

    /// Volume steps: start, start - s, ... with the last overshoot clamped to 0.
    ///
    /// Always ends with a 0 step, so the ramp reaches silence before stop.
    pub fn steps_from(&self, start_percent: u8) -> Vec<u8> {
        let step = i16::from(self.step_percent.max(1));
        let mut volume = i16::from(start_percent);
        let mut steps = Vec::new();

        loop {
            steps.push(volume.max(0) as u8);
            if volume <= 0 {
                break;
            }
            volume -= step;
        }

        steps
    }
}

/// Convert a sampled device volume to the fade-out start percent.
///
/// Rounds to nearest. A negative or NaN reading means the device volume is
/// unknown; the ramp then starts from 100.
pub fn start_percent(volume: f32) -> u8 {
    let percent = (volume * 100.0).round();
    if percent.is_nan() || percent < 0.0 {
        100
    } else {
        percent.min(100.0) as u8
    }
}

fn percent(name: &str, value: u32) -> Result<u8> {
    if value > 100 {
        return Err(Error::InvalidParameters(format!(
            "{} must be between 0 and 100 (got {})",
            name, value
        )));
    }
    Ok(value as u8)
}
