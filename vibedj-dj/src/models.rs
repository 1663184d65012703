//! Domain values flowing through the recommendation pipeline
//!
//! Vibe → SearchQuery → TrackId* → Playlist. Each type enforces its
//! invariant at construction so later stages never re-check it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::ValidationError;

/// Identifiers of this many characters or fewer are treated as noise
pub const MAX_REJECTED_ID_LEN: usize = 5;

/// Free-text mood description supplied by the caller
///
/// Never empty or whitespace-only. The original text is kept verbatim so the
/// translator can fall back to it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vibe(String);

impl Vibe {
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::new("Vibe is required"));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vibe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text sent to the media search backend
///
/// Either a generated phrase or the original vibe; never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Accept generated text, or `None` if it is blank
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    /// The vibe itself, verbatim
    pub fn from_vibe(vibe: &Vibe) -> Self {
        Self(vibe.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one resolvable media item
///
/// Longer than [`MAX_REJECTED_ID_LEN`] characters. Duplicates are legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackId(String);

impl TrackId {
    /// Normalize one raw token; `None` for blank or too-short tokens
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.chars().count() > MAX_REJECTED_ID_LEN {
            Some(Self(token.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/mqdefault.jpg", self.0)
    }
}

impl TryFrom<String> for TrackId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TrackId::parse(&value).ok_or_else(|| {
            ValidationError::new(format!(
                "Invalid track id '{}': must be longer than {} characters",
                value, MAX_REJECTED_ID_LEN
            ))
        })
    }
}

impl From<TrackId> for String {
    fn from(id: TrackId) -> Self {
        id.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, immutable track sequence
///
/// Cloning shares the underlying sequence; nothing can reorder or edit it
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TrackId>", into = "Vec<TrackId>")]
pub struct Playlist(Arc<[TrackId]>);

impl Playlist {
    pub fn new(tracks: Vec<TrackId>) -> Self {
        Self(tracks.into())
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Playlist {
    type Target = [TrackId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<TrackId>> for Playlist {
    fn from(tracks: Vec<TrackId>) -> Self {
        Self::new(tracks)
    }
}

impl From<Playlist> for Vec<TrackId> {
    fn from(playlist: Playlist) -> Self {
        playlist.0.to_vec()
    }
}
