// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-tick output published to readers on other threads.

use crate::playback::{PlaybackId, PlaybackInfo};
use crate::track::TrackId;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trajecta_motion::{AedPosition, CoordinateSystem, Position};

/// One track's position for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFrame {
    /// Track being moved
    pub track_id: TrackId,
    /// Playback that produced the frame
    pub playback_id: PlaybackId,
    /// Cartesian position
    pub position: Position,
    /// Coordinate system the animation reports in
    pub coordinate_system: CoordinateSystem,
    /// Orchestrator time of the tick, in seconds
    pub timestamp: f64,
}

impl TrackFrame {
    /// Position as azimuth/elevation/distance
    pub fn aed(&self) -> AedPosition {
        AedPosition::from(self.position)
    }
}

/// Everything produced by a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// Tick counter, starting at 1
    pub tick: u64,
    /// Orchestrator time of the tick, in seconds
    pub timestamp: f64,
    /// At most one frame per track
    pub frames: Vec<TrackFrame>,
    /// Track ownership after the tick
    pub owners: IndexMap<TrackId, PlaybackId>,
    /// Live playbacks in creation order
    pub playbacks: Vec<PlaybackInfo>,
}

impl TickSnapshot {
    /// Frame for a track, if one was produced
    pub fn frame(&self, track: &TrackId) -> Option<&TrackFrame> {
        self.frames.iter().find(|f| &f.track_id == track)
    }
}

/// Read side of the published snapshot; cheap to clone
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    current: Arc<RwLock<Arc<TickSnapshot>>>,
}

impl SnapshotHandle {
    /// Latest snapshot. Readers never observe a tick half-written.
    pub fn load(&self) -> Arc<TickSnapshot> {
        Arc::clone(&self.current.read())
    }
}

/// Write side owned by the orchestrator
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    handle: SnapshotHandle,
}

impl SnapshotPublisher {
    /// Create a publisher holding an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot
    pub fn publish(&self, snapshot: TickSnapshot) -> Arc<TickSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.handle.current.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// Handle for readers
    pub fn handle(&self) -> SnapshotHandle {
        self.handle.clone()
    }
}
