//! Fade controller
//!
//! Owns the audio device behind a single FIFO guard shared by both fade
//! directions. At most one session touches the device at a time; later
//! triggers queue behind it and run to completion in dispatch order. There is
//! no timeout or cancellation: a hung session blocks every later one.
//!
//! `fade_in`/`fade_out_and_stop` block the calling thread for the whole
//! session. `spawn_fade_in`/`spawn_fade_out` validate, reserve the session's
//! place in line, and hand the ramp to a new background thread.

use crate::audio::AudioDevice;
use crate::error::{Error, Result};
use crate::fade::params::{FadeInParams, FadeOutParams};
use crate::fade::queue::{SessionQueue, Ticket};
use crate::fade::ramp::{ramp_in, ramp_out, RampProgress};
use crate::state::{ActiveFade, SharedState};
use chrono::Utc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use sunrise_common::{FadeDirection, FadeEvent};
use tracing::{error, info, info_span};
use uuid::Uuid;

type Device = Box<dyn AudioDevice>;

/// Serializes and executes volume ramps on one audio device.
pub struct FadeController {
    queue: Arc<SessionQueue<Device>>,
    state: Arc<SharedState>,
    fade_in_defaults: FadeInParams,
    fade_out_defaults: FadeOutParams,
}

impl FadeController {
    /// Take ownership of `device`. Fade defaults start at the built-in values.
    pub fn new(device: Device, state: Arc<SharedState>) -> Self {
        Self {
            queue: Arc::new(SessionQueue::new(device)),
            state,
            fade_in_defaults: FadeInParams::default(),
            fade_out_defaults: FadeOutParams::default(),
        }
    }

    /// Replace the defaults used when a trigger carries no overrides.
    pub fn with_defaults(mut self, fade_in: FadeInParams, fade_out: FadeOutParams) -> Result<Self> {
        fade_in.validate()?;
        fade_out.validate()?;
        self.fade_in_defaults = fade_in;
        self.fade_out_defaults = fade_out;
        Ok(self)
    }

    pub fn fade_in_defaults(&self) -> FadeInParams {
        self.fade_in_defaults
    }

    pub fn fade_out_defaults(&self) -> FadeOutParams {
        self.fade_out_defaults
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Sessions dispatched and not yet finished, including the running one
    pub fn pending(&self) -> usize {
        self.queue.outstanding()
    }

    /// Run a fade-in on the calling thread, waiting for the guard first.
    pub fn fade_in(&self, params: FadeInParams) -> Result<()> {
        params.validate()?;
        self.enqueue(FadeDirection::In)
            .run(move |device, progress| ramp_in(device, &params, progress))
    }

    /// Run a fade-out on the calling thread, waiting for the guard first.
    pub fn fade_out_and_stop(&self, params: FadeOutParams) -> Result<()> {
        params.validate()?;
        self.enqueue(FadeDirection::Out)
            .run(move |device, progress| ramp_out(device, &params, progress))
    }

    /// Validate, queue and start a fade-in in the background.
    ///
    /// Returns as soon as the thread is spawned. Dropping the handle detaches
    /// the session; its failures are only logged and broadcast.
    pub fn spawn_fade_in(&self, params: FadeInParams) -> Result<FadeHandle> {
        params.validate()?;
        let session = self.enqueue(FadeDirection::In);
        self.spawn(session, move |device, progress| ramp_in(device, &params, progress))
    }

    /// Validate, queue and start a fade-out in the background.
    pub fn spawn_fade_out(&self, params: FadeOutParams) -> Result<FadeHandle> {
        params.validate()?;
        let session = self.enqueue(FadeDirection::Out);
        self.spawn(session, move |device, progress| ramp_out(device, &params, progress))
    }

    fn enqueue(&self, direction: FadeDirection) -> PendingSession {
        let ticket = self.queue.ticket();
        let session_id = Uuid::new_v4();
        let ahead = ticket.ahead();

        if ahead > 0 {
            info!(
                session = %session_id,
                "Fade-{} queued behind {} session(s)",
                direction, ahead
            );
        }

        self.state.broadcast_event(FadeEvent::FadeQueued {
            session_id,
            direction,
            ahead,
            timestamp: Utc::now(),
        });

        PendingSession {
            session_id,
            direction,
            ticket,
            state: Arc::clone(&self.state),
        }
    }

    fn spawn<F>(&self, session: PendingSession, ramp: F) -> Result<FadeHandle>
    where
        F: FnOnce(&mut dyn AudioDevice, &mut dyn FnMut(RampProgress)) -> Result<u8> + Send + 'static,
    {
        let session_id = session.session_id;
        let direction = session.direction;

        // On spawn failure the closure, and the ticket in it, is dropped and
        // the turn is forfeited.
        let handle = thread::Builder::new()
            .name(format!("fade-{}", direction))
            .spawn(move || session.run(ramp))
            .map_err(|e| {
                error!(session = %session_id, "Failed to spawn fade-{} thread: {}", direction, e);
                self.state.broadcast_event(FadeEvent::FadeFailed {
                    session_id,
                    direction,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                Error::Spawn(e)
            })?;

        Ok(FadeHandle {
            session_id,
            direction,
            handle,
        })
    }
}

/// Handle to a background fade session.
pub struct FadeHandle {
    session_id: Uuid,
    direction: FadeDirection,
    handle: JoinHandle<Result<()>>,
}

impl FadeHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    /// Wait for the session to finish.
    pub fn join(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|_| Error::Session(format!("fade-{} thread panicked", self.direction)))?
    }
}

/// A session holding a place in line but not yet running
struct PendingSession {
    session_id: Uuid,
    direction: FadeDirection,
    ticket: Ticket<Device>,
    state: Arc<SharedState>,
}

impl PendingSession {
    fn run<F>(self, ramp: F) -> Result<()>
    where
        F: FnOnce(&mut dyn AudioDevice, &mut dyn FnMut(RampProgress)) -> Result<u8>,
    {
        let PendingSession {
            session_id,
            direction,
            ticket,
            state,
        } = self;

        let span = info_span!("fade", session = %session_id, direction = %direction);
        let _enter = span.enter();

        ticket.run(|device| {
            let _active = ActiveGuard::enter(
                &state,
                ActiveFade {
                    session_id,
                    direction,
                },
            );
            info!("Fade-{} started", direction);

            let mut on_progress = |progress: RampProgress| match progress {
                RampProgress::Started {
                    from_percent,
                    to_percent,
                } => state.broadcast_event(FadeEvent::FadeStarted {
                    session_id,
                    direction,
                    from_percent,
                    to_percent,
                    timestamp: Utc::now(),
                }),
                RampProgress::Step(percent) => {
                    state.set_volume_percent(percent);
                    state.broadcast_event(FadeEvent::FadeStep {
                        session_id,
                        direction,
                        volume_percent: percent,
                        timestamp: Utc::now(),
                    });
                }
                RampProgress::Playing(playing) => state.set_playing(playing),
            };

            match ramp(device.as_mut(), &mut on_progress) {
                Ok(volume_percent) => {
                    info!("Fade-{} complete at {}%", direction, volume_percent);
                    state.broadcast_event(FadeEvent::FadeCompleted {
                        session_id,
                        direction,
                        volume_percent,
                        timestamp: Utc::now(),
                    });
                    Ok(())
                }
                Err(e) => {
                    error!("Fade-{} failed: {}", direction, e);
                    state.broadcast_event(FadeEvent::FadeFailed {
                        session_id,
                        direction,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    Err(e)
                }
            }
        })
    }
}

/// Marks a session active in shared state until dropped
struct ActiveGuard<'a> {
    state: &'a SharedState,
}

impl<'a> ActiveGuard<'a> {
    fn enter(state: &'a SharedState, active: ActiveFade) -> Self {
        state.set_active(Some(active));
        Self { state }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.state.set_active(None);
    }
}
