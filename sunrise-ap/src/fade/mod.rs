//! Volume fades
//!
//! Parameter validation and step plans, the FIFO session guard, the blocking
//! ramps, and the controller that ties them to one audio device.

pub mod controller;
pub mod params;
pub mod queue;
pub mod ramp;

pub use controller::{FadeController, FadeHandle};
pub use params::{start_percent, FadeInParams, FadeOutParams};
pub use ramp::RampProgress;
