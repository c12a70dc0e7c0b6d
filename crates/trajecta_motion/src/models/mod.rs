// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion model evaluators, grouped by algorithmic family.

pub mod parametric;
pub mod physics;
pub mod procedural;
pub mod spline;

use crate::error::Result;
use crate::params::{ParamReader, ParamSpec};
use crate::position::Position;

/// Time at which a model is sampled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleTime {
    /// Seconds into the current cycle
    pub elapsed: f64,
    /// Cycle length in seconds
    pub duration: f64,
}

impl SampleTime {
    /// Create a sample time; negative elapsed time is treated as zero
    pub fn new(elapsed: f64, duration: f64) -> Self {
        Self {
            elapsed: elapsed.max(0.0),
            duration,
        }
    }

    /// Normalized time `elapsed / duration` in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Evaluation side of a motion model
pub trait MotionPath {
    /// Position at the given time. Must be pure.
    fn position(&self, time: SampleTime) -> Position;

    /// Point the path is drawn around
    fn reference_point(&self) -> Position;
}

/// Construction side of a motion model
pub trait ModelParams: MotionPath + Sized {
    /// Numeric parameter metadata
    const PARAMS: &'static [ParamSpec];

    /// Build from a parameter reader
    fn compile(reader: &ParamReader<'_>) -> Result<Self>;
}

/// Point on a circle of `radius` at `angle_deg` degrees in `plane`
pub(crate) fn polar_offset(plane: crate::position::Plane, radius: f64, angle_deg: f64) -> Position {
    let angle = angle_deg.to_radians();
    plane.offset(radius * angle.cos(), radius * angle.sin())
}
