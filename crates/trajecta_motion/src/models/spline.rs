// SPDX-License-Identifier: MIT OR Apache-2.0
//! Control-point curves. Easing is applied to normalized time before sampling.

use super::{ModelParams, MotionPath, SampleTime};
use crate::error::Result;
use crate::interpolation::{Easing, Interpolation};
use crate::params::{ParamReader, ParamSpec};
use crate::position::{Plane, Position};

/// Cubic bezier from `start` to `end`
#[derive(Debug, Clone, PartialEq)]
pub struct Bezier {
    /// First point
    pub start: Position,
    /// First control point
    pub control1: Position,
    /// Second control point
    pub control2: Position,
    /// Last point
    pub end: Position,
    /// Easing applied to normalized time
    pub easing: Easing,
}

impl ModelParams for Bezier {
    const PARAMS: &'static [ParamSpec] = &[];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            start: reader.vector("start", Position::ORIGIN)?,
            control1: reader.vector("control1", Position::new(2.0, 4.0, 0.0))?,
            control2: reader.vector("control2", Position::new(6.0, 4.0, 0.0))?,
            end: reader.vector("end", Position::new(8.0, 0.0, 0.0))?,
            easing: reader.easing()?,
        })
    }
}

impl MotionPath for Bezier {
    fn position(&self, time: SampleTime) -> Position {
        let t = self.easing.apply(time.progress());
        Interpolation::bezier(self.start, self.control1, self.control2, self.end, t)
    }

    fn reference_point(&self) -> Position {
        self.start
    }
}

/// Catmull-Rom spline through every control point
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRom {
    /// Control points, at least two
    pub points: Vec<Position>,
    /// 0 is a standard Catmull-Rom spline, 1 collapses tangents to zero
    pub tension: f64,
    /// Join the last point back to the first
    pub closed: bool,
    /// Easing applied to normalized time
    pub easing: Easing,
}

impl CatmullRom {
    fn segment_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    fn point(&self, index: isize) -> Position {
        let n = self.points.len() as isize;
        let i = if self.closed {
            index.rem_euclid(n)
        } else {
            index.clamp(0, n - 1)
        };
        self.points[i as usize]
    }
}

impl ModelParams for CatmullRom {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("tension", 0.0, 1.0, 0.0),
        ParamSpec::new("closed", 0.0, 1.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            points: reader.points("points", 2)?,
            tension: reader.number("tension")?,
            closed: reader.flag("closed")?,
            easing: reader.easing()?,
        })
    }
}

impl MotionPath for CatmullRom {
    fn position(&self, time: SampleTime) -> Position {
        let segments = self.segment_count();
        let s = self.easing.apply(time.progress()) * segments as f64;
        let index = (s.floor() as usize).min(segments - 1);
        let local = s - index as f64;

        let i = index as isize;
        let (p0, p1, p2, p3) = (self.point(i - 1), self.point(i), self.point(i + 1), self.point(i + 2));
        let scale = (1.0 - self.tension) * 0.5;
        let m1 = (p2 - p0) * scale;
        let m2 = (p3 - p1) * scale;
        Interpolation::hermite(p1, m1, p2, m2, local)
    }

    fn reference_point(&self) -> Position {
        self.points[0]
    }
}

/// Straight segments alternating either side of the line from `start` to `end`
#[derive(Debug, Clone, PartialEq)]
pub struct Zigzag {
    /// Baseline start
    pub start: Position,
    /// Baseline end
    pub end: Position,
    /// Full zigs (out, across, back) along the baseline
    pub zigzags: f64,
    /// Peak lateral offset
    pub amplitude: f64,
    /// Unit lateral direction
    pub lateral: Position,
    /// Easing applied to normalized time
    pub easing: Easing,
}

impl Zigzag {
    /// Piecewise-linear triangle wave through 0, 1, 0, -1, 0 per unit of `s`
    fn triangle(s: f64) -> f64 {
        let f = s.rem_euclid(1.0);
        if f < 0.25 {
            4.0 * f
        } else if f < 0.75 {
            2.0 - 4.0 * f
        } else {
            4.0 * f - 4.0
        }
    }
}

impl ModelParams for Zigzag {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("zigzags", 0.0, 100.0, 4.0),
        ParamSpec::new("amplitude", 0.0, 1000.0, 1.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        let start = reader.vector("start", Position::new(-5.0, 0.0, 0.0))?;
        let end = reader.vector("end", Position::new(5.0, 0.0, 0.0))?;
        let plane: Plane = reader.plane()?;
        let lateral = (end - start)
            .cross(plane.normal())
            .normalized()
            .unwrap_or_else(|| plane.offset(0.0, 1.0));
        Ok(Self {
            start,
            end,
            zigzags: reader.number("zigzags")?,
            amplitude: reader.number("amplitude")?,
            lateral,
            easing: reader.easing()?,
        })
    }
}

impl MotionPath for Zigzag {
    fn position(&self, time: SampleTime) -> Position {
        let t = self.easing.apply(time.progress());
        let base = self.start.lerp(self.end, t);
        base + self.lateral * (self.amplitude * Self::triangle(t * self.zigzags))
    }

    fn reference_point(&self) -> Position {
        self.start
    }
}
