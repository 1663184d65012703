//! Playback Controller
//!
//! Pure state machine over `(Playlist, read position, playing flag)`. It owns
//! no I/O; the driver translates its transitions into surface commands.
//!
//! | Event         | From                  | To                        |
//! |---------------|-----------------------|---------------------------|
//! | install       | any                   | Playing, or Idle if empty |
//! | toggle        | Playing / Paused      | Paused / Playing          |
//! | track_ended   | Playing/Paused, !last | Playing (next index)      |
//! | track_ended   | Playing/Paused, last  | Exhausted                 |
//! | skip          | Playing/Paused        | same as track_ended       |
//! | track_failed  | Playing/Paused        | same as track_ended       |
//!
//! Anything else is rejected and leaves the controller untouched.

use serde::Serialize;
use vibedj_common::PlaybackState;

use super::{ControllerEvent, PlaybackError};
use crate::models::{Playlist, TrackId};

/// Result of `track_ended` / `skip` / `track_failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the track at `index`, which is now playing
    Next { index: usize },
    /// Moved past the last track; the caller must supply more tracks
    NeedMoreTracks,
}

/// Current track with its presentation URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentTrack {
    pub track_id: TrackId,
    pub watch_url: String,
    pub thumbnail_url: String,
}

/// Serializable view of a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub index: usize,
    pub playing: bool,
    pub track_count: usize,
    pub current: Option<CurrentTrack>,
}

/// Playlist state machine
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    playlist: Playlist,
    index: usize,
    playing: bool,
}

impl PlaybackController {
    /// Idle controller with no playlist
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        if self.playlist.is_empty() {
            PlaybackState::Idle
        } else if self.index >= self.playlist.len() {
            PlaybackState::Exhausted
        } else if self.playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    /// Read position, only while a track is current
    pub fn current_index(&self) -> Option<usize> {
        match self.state() {
            PlaybackState::Playing | PlaybackState::Paused => Some(self.index),
            PlaybackState::Idle | PlaybackState::Exhausted => None,
        }
    }

    pub fn current_track(&self) -> Option<&TrackId> {
        self.current_index().map(|index| &self.playlist[index])
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Replace the playlist and restart from the first track
    ///
    /// Valid in every state. An empty playlist leaves the controller Idle.
    pub fn install(&mut self, playlist: Playlist) -> PlaybackState {
        self.playing = !playlist.is_empty();
        self.playlist = playlist;
        self.index = 0;
        self.state()
    }

    /// Flip between Playing and Paused
    pub fn toggle(&mut self) -> Result<PlaybackState, PlaybackError> {
        match self.state() {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.playing = !self.playing;
                Ok(self.state())
            }
            state => Err(PlaybackError::InvalidTransition {
                event: ControllerEvent::Toggle,
                state,
            }),
        }
    }

    /// The surface finished the current track
    pub fn track_ended(&mut self) -> Result<Advance, PlaybackError> {
        self.advance(ControllerEvent::TrackEnded)
    }

    /// Manual advance; behaves exactly like [`track_ended`](Self::track_ended)
    pub fn skip(&mut self) -> Result<Advance, PlaybackError> {
        self.advance(ControllerEvent::Skip)
    }

    /// The current track could not be loaded or played; move past it
    pub fn track_failed(&mut self) -> Result<Advance, PlaybackError> {
        self.advance(ControllerEvent::TrackFailed)
    }

    fn advance(&mut self, event: ControllerEvent) -> Result<Advance, PlaybackError> {
        let state = self.state();
        if !matches!(state, PlaybackState::Playing | PlaybackState::Paused) {
            return Err(PlaybackError::InvalidTransition { event, state });
        }

        self.index += 1;
        if self.index < self.playlist.len() {
            self.playing = true;
            Ok(Advance::Next { index: self.index })
        } else {
            self.index = self.playlist.len();
            self.playing = false;
            Ok(Advance::NeedMoreTracks)
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state(),
            index: self.index,
            playing: self.playing,
            track_count: self.playlist.len(),
            current: self.current_track().map(|track_id| CurrentTrack {
                watch_url: track_id.watch_url(),
                thumbnail_url: track_id.thumbnail_url(),
                track_id: track_id.clone(),
            }),
        }
    }
}
