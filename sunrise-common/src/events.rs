//! Fade event types
//!
//! Events are broadcast from fade sessions to SSE listeners. Serialized with a
//! `type` tag so clients can dispatch on the event name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a fade session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FadeDirection {
    /// Ramp up from silence, playback left running
    In,
    /// Ramp down from the current volume, playback stopped
    Out,
}

impl std::fmt::Display for FadeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FadeDirection::In => write!(f, "in"),
            FadeDirection::Out => write!(f, "out"),
        }
    }
}

/// Events emitted over the lifetime of a fade session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FadeEvent {
    /// Trigger accepted and waiting for the fade guard
    FadeQueued {
        session_id: Uuid,
        direction: FadeDirection,
        /// Sessions ahead of this one (including the active one)
        ahead: usize,
        timestamp: DateTime<Utc>,
    },

    /// Guard acquired, ramp starting
    FadeStarted {
        session_id: Uuid,
        direction: FadeDirection,
        /// First volume step, in percent
        from_percent: u8,
        /// Final volume step, in percent
        to_percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// One volume step applied
    FadeStep {
        session_id: Uuid,
        direction: FadeDirection,
        volume_percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// Ramp finished, guard released
    FadeCompleted {
        session_id: Uuid,
        direction: FadeDirection,
        volume_percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// Ramp aborted by a device or parameter error, guard released
    FadeFailed {
        session_id: Uuid,
        direction: FadeDirection,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl FadeEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            FadeEvent::FadeQueued { .. } => "FadeQueued",
            FadeEvent::FadeStarted { .. } => "FadeStarted",
            FadeEvent::FadeStep { .. } => "FadeStep",
            FadeEvent::FadeCompleted { .. } => "FadeCompleted",
            FadeEvent::FadeFailed { .. } => "FadeFailed",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            FadeEvent::FadeQueued { session_id, .. }
            | FadeEvent::FadeStarted { session_id, .. }
            | FadeEvent::FadeStep { session_id, .. }
            | FadeEvent::FadeCompleted { session_id, .. }
            | FadeEvent::FadeFailed { session_id, .. } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = FadeEvent::FadeStep {
            session_id: Uuid::nil(),
            direction: FadeDirection::Out,
            volume_percent: 40,
            timestamp: Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FadeStep");
        assert_eq!(json["direction"], "out");
        assert_eq!(json["volume_percent"], 40);
        assert_eq!(event.event_type(), "FadeStep");
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(FadeDirection::In.to_string(), "in");
        assert_eq!(FadeDirection::Out.to_string(), "out");
    }
}
