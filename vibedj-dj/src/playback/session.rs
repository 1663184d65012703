//! Playback session registry

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;
use vibedj_common::events::{EventBus, VibeEvent};

use super::driver::{PlaybackDriver, PlaybackHandle};
use super::surface::{EventSurface, PlaybackSurface};
use super::PlaybackError;

/// Open sessions allowed when no cap is configured
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Live sessions keyed by id
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, PlaybackHandle>>,
    event_bus: EventBus,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(event_bus: EventBus) -> Self {
        Self::with_max_sessions(event_bus, DEFAULT_MAX_SESSIONS)
    }

    /// Registry that refuses to open more than `max_sessions` at once
    pub fn with_max_sessions(event_bus: EventBus, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_bus,
            max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Create a session whose player commands go out on the event bus
    pub async fn create(&self) -> Result<PlaybackHandle, PlaybackError> {
        let event_bus = self.event_bus.clone();
        self.create_with(move |session_id| {
            Arc::new(EventSurface::new(session_id, event_bus)) as Arc<dyn PlaybackSurface>
        })
        .await
    }

    /// Create a session driving a caller-supplied surface
    ///
    /// Fails with `SessionLimitReached` once `max_sessions` are open; no
    /// driver is spawned in that case.
    pub async fn create_with<F>(&self, make_surface: F) -> Result<PlaybackHandle, PlaybackError>
    where
        F: FnOnce(Uuid) -> Arc<dyn PlaybackSurface>,
    {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            warn!(max_sessions = self.max_sessions, "Session limit reached");
            return Err(PlaybackError::SessionLimitReached {
                max: self.max_sessions,
            });
        }

        let session_id = Uuid::new_v4();
        let handle = PlaybackDriver::spawn(
            session_id,
            make_surface(session_id),
            self.event_bus.clone(),
        );
        sessions.insert(session_id, handle.clone());
        drop(sessions);

        info!(%session_id, "Playback session created");
        self.event_bus.emit_lossy(VibeEvent::SessionCreated {
            session_id,
            timestamp: vibedj_common::time::now(),
        });

        Ok(handle)
    }

    pub async fn get(&self, session_id: Uuid) -> Result<PlaybackHandle, PlaybackError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(PlaybackError::SessionNotFound(session_id))
    }

    /// Remove a session and stop its driver
    pub async fn remove(&self, session_id: Uuid) -> Result<(), PlaybackError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&session_id)
            .ok_or(PlaybackError::SessionNotFound(session_id))?;

        // A driver that already exited has nothing left to stop
        if let Err(e) = handle.shutdown().await {
            tracing::debug!(%session_id, error = %e, "Driver already stopped");
        }

        info!(%session_id, "Playback session closed");
        self.event_bus.emit_lossy(VibeEvent::SessionClosed {
            session_id,
            timestamp: vibedj_common::time::now(),
        });

        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Stop every driver (service shutdown)
    pub async fn close_all(&self) {
        let ids: Vec<Uuid> = self.sessions.read().await.keys().copied().collect();
        for session_id in ids {
            let _ = self.remove(session_id).await;
        }
    }
}
