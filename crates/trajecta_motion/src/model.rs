// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model kinds and the compiled motion model.
//!
//! [`ModelKind`] is the closed set of motion models an animation can name.
//! [`MotionModel`] is the compiled, typed form: one variant per kind, each
//! holding validated parameters, evaluated by an exhaustive match.

use crate::error::{MotionError, Result};
use crate::models::parametric::{
    AttractRepel, CircularScan, Circular, Doppler, Elliptical, Epicycloid, Formation, Helix,
    Hypocycloid, Linear, Lissajous, Orbit, RoseCurve, Spiral, Wave, Zoom,
};
use crate::models::physics::{Bounce, Pendulum, Spring};
use crate::models::procedural::{PerlinNoise, RandomWalk};
use crate::models::spline::{Bezier, CatmullRom, Zigzag};
use crate::models::{ModelParams, MotionPath, SampleTime};
use crate::params::{ParamReader, ParamSpec, ParameterBag};
use crate::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every motion model an animation can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Straight line between two points
    Linear,
    /// Arc or full circle in a plane
    Circular,
    /// Ellipse in a plane
    Elliptical,
    /// Planar spiral with changing radius
    Spiral,
    /// Periodic oscillation around a center
    Wave,
    /// Lissajous figure
    Lissajous,
    /// Rising circle
    Helix,
    /// Rhodonea curve
    RoseCurve,
    /// Circle rolling outside a circle
    Epicycloid,
    /// Circle rolling inside a circle
    Hypocycloid,
    /// Inclined circular orbit
    Orbit,
    /// Horizontal sweep at fixed height
    CircularScan,
    /// Radial approach or retreat
    Zoom,
    /// Straight fly-by past a listener
    Doppler,
    /// Circling point on a moving center
    Formation,
    /// Oscillating distance from an attractor
    AttractRepel,
    /// Damped pendulum
    Pendulum,
    /// Bouncing ball
    Bounce,
    /// Damped spring
    Spring,
    /// Cubic bezier curve
    Bezier,
    /// Catmull-Rom spline through control points
    CatmullRom,
    /// Straight zigzag segments
    Zigzag,
    /// Multi-octave Perlin noise
    PerlinNoise,
    /// Seeded random walk
    RandomWalk,
}

impl ModelKind {
    /// All kinds, in declaration order
    pub const ALL: [ModelKind; 24] = [
        ModelKind::Linear,
        ModelKind::Circular,
        ModelKind::Elliptical,
        ModelKind::Spiral,
        ModelKind::Wave,
        ModelKind::Lissajous,
        ModelKind::Helix,
        ModelKind::RoseCurve,
        ModelKind::Epicycloid,
        ModelKind::Hypocycloid,
        ModelKind::Orbit,
        ModelKind::CircularScan,
        ModelKind::Zoom,
        ModelKind::Doppler,
        ModelKind::Formation,
        ModelKind::AttractRepel,
        ModelKind::Pendulum,
        ModelKind::Bounce,
        ModelKind::Spring,
        ModelKind::Bezier,
        ModelKind::CatmullRom,
        ModelKind::Zigzag,
        ModelKind::PerlinNoise,
        ModelKind::RandomWalk,
    ];

    /// Kebab-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Circular => "circular",
            Self::Elliptical => "elliptical",
            Self::Spiral => "spiral",
            Self::Wave => "wave",
            Self::Lissajous => "lissajous",
            Self::Helix => "helix",
            Self::RoseCurve => "rose-curve",
            Self::Epicycloid => "epicycloid",
            Self::Hypocycloid => "hypocycloid",
            Self::Orbit => "orbit",
            Self::CircularScan => "circular-scan",
            Self::Zoom => "zoom",
            Self::Doppler => "doppler",
            Self::Formation => "formation",
            Self::AttractRepel => "attract-repel",
            Self::Pendulum => "pendulum",
            Self::Bounce => "bounce",
            Self::Spring => "spring",
            Self::Bezier => "bezier",
            Self::CatmullRom => "catmull-rom",
            Self::Zigzag => "zigzag",
            Self::PerlinNoise => "perlin-noise",
            Self::RandomWalk => "random-walk",
        }
    }

    /// Numeric parameter metadata (range and default) for this kind
    pub fn numeric_params(&self) -> &'static [ParamSpec] {
        match self {
            Self::Linear => Linear::PARAMS,
            Self::Circular => Circular::PARAMS,
            Self::Elliptical => Elliptical::PARAMS,
            Self::Spiral => Spiral::PARAMS,
            Self::Wave => Wave::PARAMS,
            Self::Lissajous => Lissajous::PARAMS,
            Self::Helix => Helix::PARAMS,
            Self::RoseCurve => RoseCurve::PARAMS,
            Self::Epicycloid => Epicycloid::PARAMS,
            Self::Hypocycloid => Hypocycloid::PARAMS,
            Self::Orbit => Orbit::PARAMS,
            Self::CircularScan => CircularScan::PARAMS,
            Self::Zoom => Zoom::PARAMS,
            Self::Doppler => Doppler::PARAMS,
            Self::Formation => Formation::PARAMS,
            Self::AttractRepel => AttractRepel::PARAMS,
            Self::Pendulum => Pendulum::PARAMS,
            Self::Bounce => Bounce::PARAMS,
            Self::Spring => Spring::PARAMS,
            Self::Bezier => Bezier::PARAMS,
            Self::CatmullRom => CatmullRom::PARAMS,
            Self::Zigzag => Zigzag::PARAMS,
            Self::PerlinNoise => PerlinNoise::PARAMS,
            Self::RandomWalk => RandomWalk::PARAMS,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name().replace('-', "") == wanted)
            .ok_or_else(|| MotionError::UnknownModel(s.to_string()))
    }
}

/// A compiled motion model with validated parameters
#[derive(Debug, Clone)]
pub enum MotionModel {
    /// See [`ModelKind::Linear`]
    Linear(Linear),
    /// See [`ModelKind::Circular`]
    Circular(Circular),
    /// See [`ModelKind::Elliptical`]
    Elliptical(Elliptical),
    /// See [`ModelKind::Spiral`]
    Spiral(Spiral),
    /// See [`ModelKind::Wave`]
    Wave(Wave),
    /// See [`ModelKind::Lissajous`]
    Lissajous(Lissajous),
    /// See [`ModelKind::Helix`]
    Helix(Helix),
    /// See [`ModelKind::RoseCurve`]
    RoseCurve(RoseCurve),
    /// See [`ModelKind::Epicycloid`]
    Epicycloid(Epicycloid),
    /// See [`ModelKind::Hypocycloid`]
    Hypocycloid(Hypocycloid),
    /// See [`ModelKind::Orbit`]
    Orbit(Orbit),
    /// See [`ModelKind::CircularScan`]
    CircularScan(CircularScan),
    /// See [`ModelKind::Zoom`]
    Zoom(Zoom),
    /// See [`ModelKind::Doppler`]
    Doppler(Doppler),
    /// See [`ModelKind::Formation`]
    Formation(Formation),
    /// See [`ModelKind::AttractRepel`]
    AttractRepel(AttractRepel),
    /// See [`ModelKind::Pendulum`]
    Pendulum(Pendulum),
    /// See [`ModelKind::Bounce`]
    Bounce(Bounce),
    /// See [`ModelKind::Spring`]
    Spring(Spring),
    /// See [`ModelKind::Bezier`]
    Bezier(Bezier),
    /// See [`ModelKind::CatmullRom`]
    CatmullRom(CatmullRom),
    /// See [`ModelKind::Zigzag`]
    Zigzag(Zigzag),
    /// See [`ModelKind::PerlinNoise`]
    PerlinNoise(PerlinNoise),
    /// See [`ModelKind::RandomWalk`]
    RandomWalk(RandomWalk),
}

impl MotionModel {
    /// Build a model from an editor parameter bag
    ///
    /// Out-of-range numbers are clamped and unknown names ignored; only
    /// missing required data or badly shaped values are errors.
    pub fn compile(kind: ModelKind, bag: &ParameterBag) -> Result<Self> {
        let reader = ParamReader::new(kind, bag);
        Ok(match kind {
            ModelKind::Linear => Self::Linear(Linear::compile(&reader)?),
            ModelKind::Circular => Self::Circular(Circular::compile(&reader)?),
            ModelKind::Elliptical => Self::Elliptical(Elliptical::compile(&reader)?),
            ModelKind::Spiral => Self::Spiral(Spiral::compile(&reader)?),
            ModelKind::Wave => Self::Wave(Wave::compile(&reader)?),
            ModelKind::Lissajous => Self::Lissajous(Lissajous::compile(&reader)?),
            ModelKind::Helix => Self::Helix(Helix::compile(&reader)?),
            ModelKind::RoseCurve => Self::RoseCurve(RoseCurve::compile(&reader)?),
            ModelKind::Epicycloid => Self::Epicycloid(Epicycloid::compile(&reader)?),
            ModelKind::Hypocycloid => Self::Hypocycloid(Hypocycloid::compile(&reader)?),
            ModelKind::Orbit => Self::Orbit(Orbit::compile(&reader)?),
            ModelKind::CircularScan => Self::CircularScan(CircularScan::compile(&reader)?),
            ModelKind::Zoom => Self::Zoom(Zoom::compile(&reader)?),
            ModelKind::Doppler => Self::Doppler(Doppler::compile(&reader)?),
            ModelKind::Formation => Self::Formation(Formation::compile(&reader)?),
            ModelKind::AttractRepel => Self::AttractRepel(AttractRepel::compile(&reader)?),
            ModelKind::Pendulum => Self::Pendulum(Pendulum::compile(&reader)?),
            ModelKind::Bounce => Self::Bounce(Bounce::compile(&reader)?),
            ModelKind::Spring => Self::Spring(Spring::compile(&reader)?),
            ModelKind::Bezier => Self::Bezier(Bezier::compile(&reader)?),
            ModelKind::CatmullRom => Self::CatmullRom(CatmullRom::compile(&reader)?),
            ModelKind::Zigzag => Self::Zigzag(Zigzag::compile(&reader)?),
            ModelKind::PerlinNoise => Self::PerlinNoise(PerlinNoise::compile(&reader)?),
            ModelKind::RandomWalk => Self::RandomWalk(RandomWalk::compile(&reader)?),
        })
    }

    /// Kind of this model
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Linear(_) => ModelKind::Linear,
            Self::Circular(_) => ModelKind::Circular,
            Self::Elliptical(_) => ModelKind::Elliptical,
            Self::Spiral(_) => ModelKind::Spiral,
            Self::Wave(_) => ModelKind::Wave,
            Self::Lissajous(_) => ModelKind::Lissajous,
            Self::Helix(_) => ModelKind::Helix,
            Self::RoseCurve(_) => ModelKind::RoseCurve,
            Self::Epicycloid(_) => ModelKind::Epicycloid,
            Self::Hypocycloid(_) => ModelKind::Hypocycloid,
            Self::Orbit(_) => ModelKind::Orbit,
            Self::CircularScan(_) => ModelKind::CircularScan,
            Self::Zoom(_) => ModelKind::Zoom,
            Self::Doppler(_) => ModelKind::Doppler,
            Self::Formation(_) => ModelKind::Formation,
            Self::AttractRepel(_) => ModelKind::AttractRepel,
            Self::Pendulum(_) => ModelKind::Pendulum,
            Self::Bounce(_) => ModelKind::Bounce,
            Self::Spring(_) => ModelKind::Spring,
            Self::Bezier(_) => ModelKind::Bezier,
            Self::CatmullRom(_) => ModelKind::CatmullRom,
            Self::Zigzag(_) => ModelKind::Zigzag,
            Self::PerlinNoise(_) => ModelKind::PerlinNoise,
            Self::RandomWalk(_) => ModelKind::RandomWalk,
        }
    }

    fn path(&self) -> &dyn MotionPath {
        match self {
            Self::Linear(m) => m,
            Self::Circular(m) => m,
            Self::Elliptical(m) => m,
            Self::Spiral(m) => m,
            Self::Wave(m) => m,
            Self::Lissajous(m) => m,
            Self::Helix(m) => m,
            Self::RoseCurve(m) => m,
            Self::Epicycloid(m) => m,
            Self::Hypocycloid(m) => m,
            Self::Orbit(m) => m,
            Self::CircularScan(m) => m,
            Self::Zoom(m) => m,
            Self::Doppler(m) => m,
            Self::Formation(m) => m,
            Self::AttractRepel(m) => m,
            Self::Pendulum(m) => m,
            Self::Bounce(m) => m,
            Self::Spring(m) => m,
            Self::Bezier(m) => m,
            Self::CatmullRom(m) => m,
            Self::Zigzag(m) => m,
            Self::PerlinNoise(m) => m,
            Self::RandomWalk(m) => m,
        }
    }

    /// Position at `elapsed` seconds into a cycle of `duration` seconds
    pub fn position(&self, elapsed: f64, duration: f64) -> Position {
        self.path().position(SampleTime::new(elapsed, duration))
    }

    /// Point the path is drawn around
    ///
    /// Relative and formation playback move this point onto each track's
    /// anchor (or the formation center).
    pub fn reference_point(&self) -> Position {
        self.path().reference_point()
    }
}
