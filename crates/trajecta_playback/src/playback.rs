// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live playback instances.

use crate::animation::{AnimationDefinition, AnimationId};
use crate::coordinator::Coordinator;
use crate::request::{PlaybackRequest, Priority};
use crate::snapshot::TrackFrame;
use crate::timing::{Direction, LoopMode, PlaybackClock, TimingPhase};
use crate::track::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackId(pub Uuid);

impl PlaybackId {
    /// Create a new unique playback ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaybackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Accepted, waiting for its start time
    Scheduled,
    /// Starting this instant
    Starting,
    /// Producing frames
    Playing,
    /// Holding its tracks without producing frames
    Paused,
    /// Being torn down
    Stopping,
    /// Stopped on request or preempted
    Stopped,
    /// Reached the end of a non-looping cycle
    Completed,
    /// Stopped after a runtime error
    Failed,
}

impl PlaybackState {
    /// Whether the playback has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }

    /// Whether the playback owns its tracks
    pub fn holds_tracks(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Why a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// Stopped by `stop`
    Requested,
    /// Stopped by `stop_all`
    StopAll,
    /// Replaced by a conflicting playback
    Preempted(PlaybackId),
    /// Finished its cycle
    Completed,
    /// Runtime error
    Failed,
    /// Delayed start was cancelled before it began
    Cancelled,
}

/// Read-only view of a playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    /// Playback ID
    pub id: PlaybackId,
    /// Animation being played
    pub animation_id: AnimationId,
    /// Tracks moved, in ordinal order
    pub track_ids: Vec<TrackId>,
    /// Conflict priority
    pub priority: Priority,
    /// Lifecycle state
    pub state: PlaybackState,
    /// Effective loop mode
    pub loop_mode: LoopMode,
    /// Cycle length in seconds
    pub duration: f64,
    /// Seconds into the current cycle of track 0
    pub elapsed: f64,
    /// Progress of track 0 through its cycle
    pub progress: f64,
    /// Completed cycles
    pub loop_count: u64,
    /// Direction of travel
    pub direction: Direction,
    /// Clock phase
    pub phase: TimingPhase,
    /// Orchestrator time the playback started
    pub started_at: Option<f64>,
    /// Orchestrator time a delayed playback will start
    pub start_at: Option<f64>,
}

/// A running (or scheduled) instance of an animation on a set of tracks
#[derive(Debug, Clone)]
pub struct Playback {
    /// Playback ID
    pub id: PlaybackId,
    /// Originating request
    pub request: PlaybackRequest,
    /// Tracks actually claimed, after conflict trimming
    pub track_ids: Vec<TrackId>,
    /// Lifecycle state
    pub state: PlaybackState,
    /// Delayed start time
    pub start_at: Option<f64>,
    animation: Arc<AnimationDefinition>,
    clock: PlaybackClock,
    coordinator: Coordinator,
}

impl Playback {
    /// Assemble a playback in the `Scheduled` state
    pub fn new(
        id: PlaybackId,
        request: PlaybackRequest,
        track_ids: Vec<TrackId>,
        animation: Arc<AnimationDefinition>,
        coordinator: Coordinator,
    ) -> Self {
        let loop_mode = request.overrides.loop_mode.unwrap_or(animation.loop_mode);
        let clock = PlaybackClock::new(animation.clamped_duration(), loop_mode)
            .with_speed(request.overrides.speed.unwrap_or(1.0))
            .with_reverse(request.overrides.reverse);
        Self {
            id,
            request,
            track_ids,
            state: PlaybackState::Scheduled,
            start_at: None,
            animation,
            clock,
            coordinator,
        }
    }

    /// The animation this playback was created from
    pub fn animation(&self) -> &AnimationDefinition {
        &self.animation
    }

    /// Timing clock
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Mutable timing clock
    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// Multi-track coordinator
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Replace the claimed tracks and the coordinator built for them
    pub fn retarget(&mut self, track_ids: Vec<TrackId>, coordinator: Coordinator) {
        self.track_ids = track_ids;
        self.coordinator = coordinator;
    }

    /// Whether the playback moves a track
    pub fn uses_track(&self, track: &TrackId) -> bool {
        self.track_ids.contains(track)
    }

    /// Append this playback's frames for `now`
    pub fn evaluate(&self, now: f64, out: &mut Vec<TrackFrame>) {
        self.coordinator
            .positions(&self.clock, now, self.id, self.animation.coordinate_system, out);
    }

    /// Whether every track has reached the end of a non-looping cycle
    pub fn is_complete(&self, now: f64) -> bool {
        self.coordinator.is_complete(&self.clock, now)
    }

    /// Snapshot of the playback at `now`
    pub fn info(&self, now: f64) -> PlaybackInfo {
        let timing = self.clock.sample(now);
        PlaybackInfo {
            id: self.id,
            animation_id: self.animation.id.clone(),
            track_ids: self.track_ids.clone(),
            priority: self.request.priority,
            state: self.state,
            loop_mode: self.clock.loop_mode(),
            duration: self.clock.duration(),
            elapsed: timing.elapsed_in_cycle,
            progress: timing.progress,
            loop_count: timing.loop_count,
            direction: timing.direction,
            phase: self.clock.phase(now),
            started_at: self.clock.started_at(),
            start_at: self.start_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinationConfig;
    use crate::request::PlaybackOverrides;

    fn playback(overrides: PlaybackOverrides) -> Playback {
        let animation = Arc::new(AnimationDefinition::new("line", "linear", 10.0));
        let request = PlaybackRequest::new("line", ["t1"]).with_overrides(overrides);
        let tracks = vec![(TrackId::new("t1"), None)];
        let coordinator = Coordinator::new(animation.compile().unwrap(), &CoordinationConfig::default(), &tracks);
        Playback::new(PlaybackId::new(), request, vec![TrackId::new("t1")], animation, coordinator)
    }

    #[test]
    fn test_overrides_reach_the_clock() {
        let p = playback(PlaybackOverrides {
            speed: Some(2.0),
            loop_mode: Some(LoopMode::PingPong),
            reverse: false,
        });
        assert_eq!(p.clock().speed(), 2.0);
        assert_eq!(p.clock().loop_mode(), LoopMode::PingPong);
        assert_eq!(p.state, PlaybackState::Scheduled);
    }

    #[test]
    fn test_info_reports_progress() {
        let mut p = playback(PlaybackOverrides::default());
        p.clock_mut().start(0.0);
        p.state = PlaybackState::Playing;
        let info = p.info(2.5);
        assert_eq!(info.elapsed, 2.5);
        assert_eq!(info.progress, 0.25);
        assert_eq!(info.started_at, Some(0.0));

        let mut frames = Vec::new();
        p.evaluate(2.5, &mut frames);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].playback_id, p.id);
    }

    #[test]
    fn test_state_classification() {
        assert!(PlaybackState::Paused.holds_tracks());
        assert!(!PlaybackState::Scheduled.holds_tracks());
        assert!(PlaybackState::Failed.is_terminal());
        assert!(!PlaybackState::Stopping.is_terminal());
    }
}
