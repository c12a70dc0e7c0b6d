// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback requests.

use crate::animation::AnimationId;
use crate::coordinator::CoordinationConfig;
use crate::timing::LoopMode;
use crate::track::TrackId;
use serde::{Deserialize, Serialize};

/// Conflict priority; higher priorities preempt lower ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Background motion
    Low,
    /// Default
    #[default]
    Normal,
    /// Foreground cues
    High,
    /// Safety or operator overrides
    Critical,
}

/// Per-request adjustments to the animation definition
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOverrides {
    /// Time scale; 1.0 when unset
    pub speed: Option<f64>,
    /// Replaces the definition's loop mode
    pub loop_mode: Option<LoopMode>,
    /// Play the cycle end to start
    pub reverse: bool,
}

/// Ask the orchestrator to play an animation on some tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    /// Animation to play
    pub animation_id: AnimationId,
    /// Tracks to move, in ordinal order
    pub track_ids: Vec<TrackId>,
    /// Conflict priority
    #[serde(default)]
    pub priority: Priority,
    /// Seconds to wait before starting
    #[serde(default)]
    pub delay: Option<f64>,
    /// Speed, loop and direction overrides
    #[serde(default)]
    pub overrides: PlaybackOverrides,
    /// Multi-track coordination
    #[serde(default)]
    pub coordination: CoordinationConfig,
}

impl PlaybackRequest {
    /// Request with default priority and no delay
    pub fn new(animation_id: impl Into<String>, track_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            animation_id: AnimationId::new(animation_id),
            track_ids: track_ids.into_iter().map(TrackId::new).collect(),
            priority: Priority::Normal,
            delay: None,
            overrides: PlaybackOverrides::default(),
            coordination: CoordinationConfig::default(),
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Start after `seconds`
    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay = Some(seconds);
        self
    }

    /// Set the overrides
    pub fn with_overrides(mut self, overrides: PlaybackOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set multi-track coordination
    pub fn with_coordination(mut self, coordination: CoordinationConfig) -> Self {
        self.coordination = coordination;
        self
    }

    /// Delay in seconds, treating non-finite or negative values as none
    pub fn effective_delay(&self) -> f64 {
        self.delay.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0)
    }

    /// Track IDs with duplicates removed, first occurrence kept
    pub fn unique_tracks(&self) -> Vec<TrackId> {
        let mut seen = Vec::with_capacity(self.track_ids.len());
        for track in &self.track_ids {
            if !seen.contains(track) {
                seen.push(track.clone());
            }
        }
        seen
    }
}
