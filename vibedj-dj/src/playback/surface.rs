//! Playback surfaces
//!
//! A surface is whatever actually renders a track: an embedded web player, a
//! local audio sink, a test double. Commands only flow into the surface; it
//! reports back through the session handle, `track_ended` when a track
//! finishes and `track_failed` when one cannot be loaded or played.

use async_trait::async_trait;
use uuid::Uuid;
use vibedj_common::events::{EventBus, PlayerCommand, VibeEvent};

use crate::models::TrackId;

/// Something that can render the current track
#[async_trait]
pub trait PlaybackSurface: Send + Sync {
    /// Make `track` current (does not start it)
    async fn load(&self, track: &TrackId);

    async fn play(&self);

    async fn pause(&self);

    /// Stop output; nothing is current afterwards
    async fn stop(&self);
}

/// Surface for remote players: every command is published on the event bus
pub struct EventSurface {
    session_id: Uuid,
    event_bus: EventBus,
}

impl EventSurface {
    pub fn new(session_id: Uuid, event_bus: EventBus) -> Self {
        Self {
            session_id,
            event_bus,
        }
    }

    fn issue(&self, command: PlayerCommand) {
        tracing::debug!(session_id = %self.session_id, ?command, "Player command");
        self.event_bus.emit_lossy(VibeEvent::PlayerCommandIssued {
            session_id: self.session_id,
            command,
            timestamp: vibedj_common::time::now(),
        });
    }
}

#[async_trait]
impl PlaybackSurface for EventSurface {
    async fn load(&self, track: &TrackId) {
        self.issue(PlayerCommand::Load {
            track_id: track.as_str().to_string(),
            watch_url: track.watch_url(),
        });
    }

    async fn play(&self) {
        self.issue(PlayerCommand::Play);
    }

    async fn pause(&self) {
        self.issue(PlayerCommand::Pause);
    }

    async fn stop(&self) {
        self.issue(PlayerCommand::Stop);
    }
}
