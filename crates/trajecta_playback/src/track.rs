// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tracks: the sound-source objects animations move.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use trajecta_motion::Position;

/// Identifier of a track (owned by the editor)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub String);

impl TrackId {
    /// Create a track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positioned sound source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Rest position; relative and formation modes are built around it
    #[serde(default)]
    pub anchor: Option<Position>,
    /// Last position written by a playback
    #[serde(default, skip_deserializing)]
    pub position: Position,
}

impl Track {
    /// Create a track without an anchor
    pub fn new(id: impl Into<String>) -> Self {
        let id = TrackId::new(id);
        Self {
            name: id.0.clone(),
            id,
            anchor: None,
            position: Position::ORIGIN,
        }
    }

    /// Set the anchor, also moving the track there
    pub fn with_anchor(mut self, anchor: Position) -> Self {
        self.anchor = Some(anchor);
        self.position = anchor;
        self
    }

    /// Where the track rests when nothing drives it
    pub fn rest_position(&self) -> Position {
        self.anchor.unwrap_or(Position::ORIGIN)
    }
}

/// Known tracks, in registration order
#[derive(Debug, Clone, Default)]
pub struct TrackRegistry {
    tracks: IndexMap<TrackId, Track>,
}

impl TrackRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a track
    pub fn insert(&mut self, mut track: Track) {
        if let Some(anchor) = track.anchor {
            if track.position == Position::ORIGIN {
                track.position = anchor;
            }
        }
        self.tracks.insert(track.id.clone(), track);
    }

    /// Look up a track
    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Anchor of a track; unknown tracks have none
    pub fn anchor(&self, id: &TrackId) -> Option<Position> {
        self.tracks.get(id).and_then(|t| t.anchor)
    }

    /// Rest position of a track; unknown tracks rest at the origin
    pub fn rest_position(&self, id: &TrackId) -> Position {
        self.tracks.get(id).map_or(Position::ORIGIN, Track::rest_position)
    }

    /// Record the latest position of a known track
    pub fn set_position(&mut self, id: &TrackId, position: Position) {
        if let Some(track) = self.tracks.get_mut(id) {
            track.position = position;
        }
    }

    /// Iterate tracks in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
