// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fan one motion model out to several tracks.
//!
//! Every mode reduces to "model output plus a fixed per-track translation",
//! sampled at a per-track time lag:
//!
//! | Mode | Translation for track `i` |
//! |------|---------------------------|
//! | Shared | none |
//! | Relative | `anchor_i - reference` |
//! | Barycentric, shared | `center - reference` |
//! | Barycentric, isobarycentric | `mean - reference + (anchor_i - mean)` |
//! | Barycentric, centered | `center - reference + (anchor_i - mean)` |
//! | Barycentric, custom | `center - reference + radius * ring_i` |
//!
//! `reference` is the model's own reference point, `mean` the barycenter of
//! the participating anchors and `center` the configured center (the mean
//! when none is configured). Tracks without an anchor sit at the origin.

use crate::playback::PlaybackId;
use crate::snapshot::TrackFrame;
use crate::timing::{LoopMode, PlaybackClock, TimingState};
use crate::track::TrackId;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use trajecta_motion::{CoordinateSystem, MotionModel, Position};

/// How a formation is arranged around its barycenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BarycentricVariant {
    /// Every track follows the path around the configured center
    #[default]
    Shared,
    /// The formation keeps its shape around the anchors' own barycenter
    Isobarycentric,
    /// The formation keeps its shape around the configured center
    Centered,
    /// Tracks are spread on a horizontal ring of the configured radius
    Custom,
}

/// How a playback's tracks relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoordinationMode {
    /// Every track follows the same absolute path
    #[default]
    Shared,
    /// Each track follows the path translated onto its own anchor
    Relative,
    /// Tracks move as a rigid formation
    Barycentric(BarycentricVariant),
}

/// Coordination settings for one playback
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// Coordination mode
    pub mode: CoordinationMode,
    /// Track `i` starts `i * phase_offset_seconds` after track 0
    pub phase_offset_seconds: f64,
    /// Formation center; defaults to the anchors' barycenter
    pub center: Option<Position>,
    /// Ring radius for the custom formation
    pub radius: f64,
}

impl CoordinationConfig {
    /// Config with the given mode and no offsets
    pub fn new(mode: CoordinationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Stagger tracks by `seconds` each
    pub fn with_phase_offset(mut self, seconds: f64) -> Self {
        self.phase_offset_seconds = seconds;
        self
    }

    /// Set the formation center
    pub fn with_center(mut self, center: Position) -> Self {
        self.center = Some(center);
        self
    }

    /// Set the custom ring radius
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    track_id: TrackId,
    translation: Position,
    lag: f64,
}

/// Evaluates one model for an ordered list of tracks
#[derive(Debug, Clone)]
pub struct Coordinator {
    model: MotionModel,
    slots: Vec<Slot>,
}

impl Coordinator {
    /// Precompute per-track translations and lags
    ///
    /// `tracks` lists each participating track with its anchor, in ordinal order.
    pub fn new(model: MotionModel, config: &CoordinationConfig, tracks: &[(TrackId, Option<Position>)]) -> Self {
        let anchors: Vec<Position> = tracks.iter().map(|(_, a)| a.unwrap_or(Position::ORIGIN)).collect();
        let mean = Position::mean(anchors.iter().copied()).unwrap_or(Position::ORIGIN);
        let reference = model.reference_point();
        let n = tracks.len();

        // A lone track's formation collapses onto its own anchor.
        let center = if n == 1 && matches!(config.mode, CoordinationMode::Barycentric(v) if v != BarycentricVariant::Shared) {
            anchors[0]
        } else {
            config.center.unwrap_or(mean)
        };
        let lag_step = if config.phase_offset_seconds.is_finite() {
            config.phase_offset_seconds.max(0.0)
        } else {
            0.0
        };

        let slots = tracks
            .iter()
            .zip(&anchors)
            .enumerate()
            .map(|(i, ((track_id, _), &anchor))| {
                let translation = match config.mode {
                    CoordinationMode::Shared => Position::ORIGIN,
                    CoordinationMode::Relative => anchor - reference,
                    CoordinationMode::Barycentric(BarycentricVariant::Shared) => {
                        config.center.map_or(Position::ORIGIN, |c| c - reference)
                    }
                    CoordinationMode::Barycentric(BarycentricVariant::Isobarycentric) => {
                        let center = if n == 1 { anchor } else { mean };
                        center - reference + (anchor - mean)
                    }
                    CoordinationMode::Barycentric(BarycentricVariant::Centered) => {
                        center - reference + (anchor - mean)
                    }
                    CoordinationMode::Barycentric(BarycentricVariant::Custom) => {
                        let angle = TAU * i as f64 / n as f64;
                        center - reference + Position::new(angle.cos(), angle.sin(), 0.0) * config.radius
                    }
                };
                Slot {
                    track_id: track_id.clone(),
                    translation,
                    lag: lag_step * i as f64,
                }
            })
            .collect();

        Self { model, slots }
    }

    /// The compiled model
    pub fn model(&self) -> &MotionModel {
        &self.model
    }

    /// Position of the track at `index` for a given timing sample
    fn position_at(&self, index: usize, state: &TimingState, duration: f64) -> Position {
        self.model.position(state.elapsed_in_cycle, duration) + self.slots[index].translation
    }

    /// Append one frame per track, in ordinal order
    pub fn positions(
        &self,
        clock: &PlaybackClock,
        now: f64,
        playback_id: PlaybackId,
        coordinate_system: CoordinateSystem,
        out: &mut Vec<TrackFrame>,
    ) {
        let duration = clock.duration();
        for (index, slot) in self.slots.iter().enumerate() {
            let state = clock.sample_lagged(now, slot.lag);
            out.push(TrackFrame {
                track_id: slot.track_id.clone(),
                playback_id,
                position: self.position_at(index, &state, duration),
                coordinate_system,
                timestamp: now,
            });
        }
    }

    /// Whether every track, including the most delayed, has finished
    pub fn is_complete(&self, clock: &PlaybackClock, now: f64) -> bool {
        if clock.loop_mode() != LoopMode::None {
            return false;
        }
        let max_lag = self.slots.iter().map(|s| s.lag).fold(0.0, f64::max);
        clock.raw_elapsed(now) - max_lag >= clock.duration()
    }
}
