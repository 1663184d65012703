//! Event types for the Vibe DJ event system
//!
//! Events are broadcast via [`EventBus`] and serialized for SSE transmission.
//! All events use the central [`VibeEvent`] enum for exhaustive matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Playback controller state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No playlist installed (or the installed playlist is empty)
    Idle,
    /// Current track is playing
    Playing,
    /// Current track is paused
    Paused,
    /// Read position has moved past the last track
    Exhausted,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Command relayed to a remote playback surface (e.g. an embedded web player)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Load a track and make it current
    Load { track_id: String, watch_url: String },
    Play,
    Pause,
    /// Stop output entirely (playlist exhausted or replaced by an empty one)
    Stop,
}

/// Which failure ended a recommendation request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationFailure {
    Validation,
    Resolution,
    Timeout,
}

/// Vibe DJ event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VibeEvent {
    /// Recommendation pipeline produced a playlist
    RecommendationCompleted {
        /// Query actually sent to the search backend
        query: String,
        /// True when the generation service was bypassed or failed
        query_fallback: bool,
        track_count: usize,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Recommendation pipeline failed
    RecommendationFailed {
        failure: RecommendationFailure,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A playback session was created
    SessionCreated {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A playback session was removed
    SessionClosed {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// New playlist installed into a session (read position reset to 0)
    PlaylistInstalled {
        session_id: Uuid,
        track_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Controller state changed (e.g. Playing ↔ Paused)
    PlaybackStateChanged {
        session_id: Uuid,
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// A track became current
    TrackStarted {
        session_id: Uuid,
        index: usize,
        track_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The surface could not load or play a track; the session moved past it
    TrackFailed {
        session_id: Uuid,
        index: usize,
        track_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Last track ended; the caller must supply more tracks or stop
    PlaylistExhausted {
        session_id: Uuid,
        track_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Command for the remote playback surface of a session
    PlayerCommandIssued {
        session_id: Uuid,
        command: PlayerCommand,
        timestamp: DateTime<Utc>,
    },
}

impl VibeEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            VibeEvent::RecommendationCompleted { .. } => "RecommendationCompleted",
            VibeEvent::RecommendationFailed { .. } => "RecommendationFailed",
            VibeEvent::SessionCreated { .. } => "SessionCreated",
            VibeEvent::SessionClosed { .. } => "SessionClosed",
            VibeEvent::PlaylistInstalled { .. } => "PlaylistInstalled",
            VibeEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            VibeEvent::TrackStarted { .. } => "TrackStarted",
            VibeEvent::TrackFailed { .. } => "TrackFailed",
            VibeEvent::PlaylistExhausted { .. } => "PlaylistExhausted",
            VibeEvent::PlayerCommandIssued { .. } => "PlayerCommandIssued",
        }
    }

    /// Session the event belongs to, if any
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            VibeEvent::RecommendationCompleted { .. } | VibeEvent::RecommendationFailed { .. } => {
                None
            }
            VibeEvent::SessionCreated { session_id, .. }
            | VibeEvent::SessionClosed { session_id, .. }
            | VibeEvent::PlaylistInstalled { session_id, .. }
            | VibeEvent::PlaybackStateChanged { session_id, .. }
            | VibeEvent::TrackStarted { session_id, .. }
            | VibeEvent::TrackFailed { session_id, .. }
            | VibeEvent::PlaylistExhausted { session_id, .. }
            | VibeEvent::PlayerCommandIssued { session_id, .. } => Some(*session_id),
        }
    }
}

/// Broadcast bus for [`VibeEvent`]s
///
/// Slow subscribers lose the oldest events rather than blocking emitters.
///
/// ```
/// use vibedj_common::events::{EventBus, VibeEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy(VibeEvent::SessionCreated {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VibeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<VibeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: VibeEvent) -> Result<usize, broadcast::error::SendError<VibeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: VibeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
