//! Shared fade state
//!
//! Read by the HTTP handlers, written by fade sessions. Sessions run on
//! blocking threads, so everything here is synchronous and never held across
//! a volume step.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock};
use sunrise_common::{FadeDirection, FadeEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

/// The session currently holding the fade guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveFade {
    pub session_id: Uuid,
    pub direction: FadeDirection,
}

/// Shared state accessible by all components
pub struct SharedState {
    /// Session holding the guard (None when idle)
    active: RwLock<Option<ActiveFade>>,

    /// Last volume step applied, in percent
    volume_percent: AtomicU8,

    /// Last commanded playback state
    playing: AtomicBool,

    /// Event broadcaster for SSE listeners
    event_tx: broadcast::Sender<FadeEvent>,
}

impl SharedState {
    /// Create new shared state; `volume_percent` seeds the reported volume
    pub fn new(volume_percent: u8) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            active: RwLock::new(None),
            volume_percent: AtomicU8::new(volume_percent),
            playing: AtomicBool::new(false),
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: FadeEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<FadeEvent> {
        self.event_tx.subscribe()
    }

    pub fn active(&self) -> Option<ActiveFade> {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_active(&self, active: Option<ActiveFade>) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = active;
    }

    pub fn volume_percent(&self) -> u8 {
        self.volume_percent.load(Ordering::Relaxed)
    }

    pub fn set_volume_percent(&self, percent: u8) {
        self.volume_percent.store(percent.min(100), Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(0)
    }
}
