// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion model library for Trajecta.
//!
//! This crate turns an animation's model kind and parameter bag into a pure
//! function of time:
//! - Closed-form parametric paths (circles, spirals, lissajous, fly-bys, ...)
//! - Physical systems solved analytically (pendulum, bounce, spring)
//! - Control-point curves (bezier, Catmull-Rom, zigzag)
//! - Seeded procedural motion (Perlin noise, random walk)
//!
//! ## Architecture
//!
//! Editors describe models as a loose [`ParameterBag`]. [`MotionModel::compile`]
//! validates it once, clamping numbers through per-kind [`ParamSpec`]
//! metadata, and produces a closed enum whose [`MotionModel::position`] is
//! an exhaustive match over typed evaluators. Evaluation never fails and
//! never reads clocks or ambient entropy.

pub mod error;
pub mod interpolation;
pub mod model;
pub mod models;
pub mod params;
pub mod position;

pub use error::{MotionError, Result};
pub use interpolation::{Easing, Interpolation};
pub use model::{ModelKind, MotionModel};
pub use models::{ModelParams, MotionPath, SampleTime};
pub use params::{ParamReader, ParamSpec, ParamValue, ParameterBag};
pub use position::{direction, AedPosition, CoordinateSystem, Plane, Position};

/// Compile and sample a model in one call
///
/// Prefer compiling once with [`MotionModel::compile`] when sampling repeatedly.
pub fn position(kind: ModelKind, params: &ParameterBag, elapsed: f64, duration: f64) -> Result<Position> {
    Ok(MotionModel::compile(kind, params)?.position(elapsed, duration))
}
