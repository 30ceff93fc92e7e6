//! Audio device abstraction and the cpal/symphonia implementation behind it

pub mod decoder;
pub mod device;
pub mod output;
pub mod resampler;

pub use device::AudioDevice;
pub use output::OutputDevice;
