//! Audio device contract consumed by the fade controller

use crate::error::Result;
use std::path::Path;

/// A single playback source with a volume control.
///
/// Volume is a fraction in `[0.0, 1.0]`. Implementations report an unset or
/// unknown volume as a negative value.
pub trait AudioDevice: Send {
    /// Load (or reload) the audio source. Playback position resets to the start.
    fn load(&mut self, source: &Path) -> Result<()>;

    /// Start playback from the beginning of the source.
    ///
    /// Restarts playback if already playing.
    fn play(&mut self) -> Result<()>;

    /// Stop playback.
    fn stop(&mut self) -> Result<()>;

    /// Set output volume (0.0 = silent, 1.0 = full volume).
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Current output volume.
    fn get_volume(&self) -> f32;
}

impl<D: AudioDevice + ?Sized> AudioDevice for Box<D> {
    fn load(&mut self, source: &Path) -> Result<()> {
        (**self).load(source)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        (**self).set_volume(volume)
    }

    fn get_volume(&self) -> f32 {
        (**self).get_volume()
    }
}
