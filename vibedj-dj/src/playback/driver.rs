//! Playback driver task
//!
//! One tokio task per session owns the controller and the surface. Commands
//! arrive over an mpsc channel and are applied one at a time, so transitions
//! for a session are strictly ordered. Each handle call awaits its reply on a
//! oneshot channel.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;
use vibedj_common::events::{EventBus, VibeEvent};
use vibedj_common::PlaybackState;

use super::controller::{Advance, PlaybackController, PlaybackSnapshot};
use super::surface::PlaybackSurface;
use super::{ControllerEvent, PlaybackError};
use crate::models::Playlist;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Outcome of a `skip` / `track_ended` / `track_failed` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub snapshot: PlaybackSnapshot,
    /// Last track has ended; the caller should fetch a new playlist or stop
    pub need_more_tracks: bool,
}

type Reply<T> = oneshot::Sender<Result<T, PlaybackError>>;

enum DriverCommand {
    Install {
        playlist: Playlist,
        reply: Reply<PlaybackSnapshot>,
    },
    Toggle {
        reply: Reply<PlaybackSnapshot>,
    },
    Skip {
        reply: Reply<StepOutcome>,
    },
    TrackEnded {
        reply: Reply<StepOutcome>,
    },
    TrackFailed {
        reason: Option<String>,
        reply: Reply<StepOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<PlaybackSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running driver
#[derive(Clone)]
pub struct PlaybackHandle {
    session_id: Uuid,
    command_tx: mpsc::Sender<DriverCommand>,
}

impl PlaybackHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> DriverCommand,
    ) -> Result<T, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| PlaybackError::DriverClosed)?;
        rx.await.map_err(|_| PlaybackError::DriverClosed)?
    }

    /// Replace the playlist and start its first track
    pub async fn install(&self, playlist: Playlist) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|reply| DriverCommand::Install { playlist, reply })
            .await
    }

    pub async fn toggle(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.request(|reply| DriverCommand::Toggle { reply }).await
    }

    pub async fn skip(&self) -> Result<StepOutcome, PlaybackError> {
        self.request(|reply| DriverCommand::Skip { reply }).await
    }

    /// Report that the surface finished the current track
    pub async fn track_ended(&self) -> Result<StepOutcome, PlaybackError> {
        self.request(|reply| DriverCommand::TrackEnded { reply })
            .await
    }

    /// Report that the surface could not load or play the current track
    pub async fn track_failed(
        &self,
        reason: Option<String>,
    ) -> Result<StepOutcome, PlaybackError> {
        self.request(|reply| DriverCommand::TrackFailed { reason, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(DriverCommand::Snapshot { reply })
            .await
            .map_err(|_| PlaybackError::DriverClosed)?;
        rx.await.map_err(|_| PlaybackError::DriverClosed)
    }

    /// Stop the surface and end the driver task
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(DriverCommand::Shutdown { reply })
            .await
            .map_err(|_| PlaybackError::DriverClosed)?;
        rx.await.map_err(|_| PlaybackError::DriverClosed)
    }
}

/// Session driver: controller + surface + event publication
pub struct PlaybackDriver {
    session_id: Uuid,
    controller: PlaybackController,
    surface: Arc<dyn PlaybackSurface>,
    event_bus: EventBus,
}

impl PlaybackDriver {
    /// Spawn a driver task for `session_id`
    pub fn spawn(
        session_id: Uuid,
        surface: Arc<dyn PlaybackSurface>,
        event_bus: EventBus,
    ) -> PlaybackHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let driver = Self {
            session_id,
            controller: PlaybackController::new(),
            surface,
            event_bus,
        };
        tokio::spawn(driver.run(command_rx));
        PlaybackHandle {
            session_id,
            command_tx,
        }
    }

    async fn run(mut self, mut command_rx: mpsc::Receiver<DriverCommand>) {
        debug!(session_id = %self.session_id, "Playback driver started");

        while let Some(command) = command_rx.recv().await {
            match command {
                DriverCommand::Install { playlist, reply } => {
                    let _ = reply.send(Ok(self.install(playlist).await));
                }
                DriverCommand::Toggle { reply } => {
                    let _ = reply.send(self.toggle().await);
                }
                DriverCommand::Skip { reply } => {
                    let _ = reply.send(self.advance(ControllerEvent::Skip).await);
                }
                DriverCommand::TrackEnded { reply } => {
                    let _ = reply.send(self.advance(ControllerEvent::TrackEnded).await);
                }
                DriverCommand::TrackFailed { reason, reply } => {
                    let _ = reply.send(self.track_failed(reason).await);
                }
                DriverCommand::Snapshot { reply } => {
                    let _ = reply.send(self.controller.snapshot());
                }
                DriverCommand::Shutdown { reply } => {
                    self.surface.stop().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        debug!(session_id = %self.session_id, "Playback driver stopped");
    }

    async fn install(&mut self, playlist: Playlist) -> PlaybackSnapshot {
        let old_state = self.controller.state();
        let new_state = self.controller.install(playlist);

        info!(
            session_id = %self.session_id,
            track_count = self.controller.playlist().len(),
            "Playlist installed"
        );
        self.event_bus.emit_lossy(VibeEvent::PlaylistInstalled {
            session_id: self.session_id,
            track_count: self.controller.playlist().len(),
            timestamp: vibedj_common::time::now(),
        });

        if new_state == PlaybackState::Playing {
            self.start_current().await;
        } else {
            self.surface.stop().await;
        }
        self.state_changed(old_state, new_state);

        self.controller.snapshot()
    }

    async fn toggle(&mut self) -> Result<PlaybackSnapshot, PlaybackError> {
        let old_state = self.controller.state();
        let new_state = self.controller.toggle()?;

        match new_state {
            PlaybackState::Paused => self.surface.pause().await,
            _ => self.surface.play().await,
        }
        self.state_changed(old_state, new_state);

        Ok(self.controller.snapshot())
    }

    async fn track_failed(&mut self, reason: Option<String>) -> Result<StepOutcome, PlaybackError> {
        // Rejected in Idle / Exhausted before anything is reported
        if let Some(index) = self.controller.current_index() {
            let track_id = self.controller.playlist()[index].as_str().to_string();
            warn!(
                session_id = %self.session_id,
                index,
                track_id = %track_id,
                reason = reason.as_deref().unwrap_or("unspecified"),
                "Track failed, skipping"
            );
            self.event_bus.emit_lossy(VibeEvent::TrackFailed {
                session_id: self.session_id,
                index,
                track_id,
                reason,
                timestamp: vibedj_common::time::now(),
            });
        }
        self.advance(ControllerEvent::TrackFailed).await
    }

    async fn advance(&mut self, event: ControllerEvent) -> Result<StepOutcome, PlaybackError> {
        let old_state = self.controller.state();
        let advance = match event {
            ControllerEvent::Skip => self.controller.skip()?,
            ControllerEvent::TrackFailed => self.controller.track_failed()?,
            _ => self.controller.track_ended()?,
        };
        let new_state = self.controller.state();

        let need_more_tracks = match advance {
            Advance::Next { .. } => {
                self.start_current().await;
                false
            }
            Advance::NeedMoreTracks => {
                self.surface.stop().await;
                info!(
                    session_id = %self.session_id,
                    track_count = self.controller.playlist().len(),
                    "Playlist exhausted"
                );
                self.event_bus.emit_lossy(VibeEvent::PlaylistExhausted {
                    session_id: self.session_id,
                    track_count: self.controller.playlist().len(),
                    timestamp: vibedj_common::time::now(),
                });
                true
            }
        };
        self.state_changed(old_state, new_state);

        Ok(StepOutcome {
            snapshot: self.controller.snapshot(),
            need_more_tracks,
        })
    }

    /// Load and play the controller's current track
    async fn start_current(&self) {
        let Some(index) = self.controller.current_index() else {
            return;
        };
        let track = &self.controller.playlist()[index];

        self.surface.load(track).await;
        self.surface.play().await;

        debug!(session_id = %self.session_id, index, track_id = %track, "Track started");
        self.event_bus.emit_lossy(VibeEvent::TrackStarted {
            session_id: self.session_id,
            index,
            track_id: track.as_str().to_string(),
            timestamp: vibedj_common::time::now(),
        });
    }

    fn state_changed(&self, old_state: PlaybackState, new_state: PlaybackState) {
        if old_state == new_state {
            return;
        }
        self.event_bus.emit_lossy(VibeEvent::PlaybackStateChanged {
            session_id: self.session_id,
            old_state,
            new_state,
            timestamp: vibedj_common::time::now(),
        });
    }
}
