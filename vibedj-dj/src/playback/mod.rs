//! Playback sessions
//!
//! A [`controller::PlaybackController`] is a pure state machine. Each session
//! wraps one in a [`driver::PlaybackDriver`] task that serializes commands and
//! forwards transitions to a [`surface::PlaybackSurface`].

use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use vibedj_common::PlaybackState;

pub mod controller;
pub mod driver;
pub mod session;
pub mod surface;

pub use controller::{Advance, CurrentTrack, PlaybackController, PlaybackSnapshot};
pub use driver::{PlaybackDriver, PlaybackHandle, StepOutcome};
pub use session::{SessionRegistry, DEFAULT_MAX_SESSIONS};
pub use surface::{EventSurface, PlaybackSurface};

/// Controller events that can be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    Toggle,
    TrackEnded,
    Skip,
    TrackFailed,
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::Toggle => write!(f, "toggle"),
            ControllerEvent::TrackEnded => write!(f, "track_ended"),
            ControllerEvent::Skip => write!(f, "skip"),
            ControllerEvent::TrackFailed => write!(f, "track_failed"),
        }
    }
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        event: ControllerEvent,
        state: PlaybackState,
    },

    #[error("Session limit reached ({max} open sessions)")]
    SessionLimitReached { max: usize },

    #[error("Playback driver is no longer running")]
    DriverClosed,
}
