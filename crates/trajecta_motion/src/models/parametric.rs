// SPDX-License-Identifier: MIT OR Apache-2.0
//! Closed-form parametric paths.
//!
//! Every path here is an explicit function of normalized time
//! `u = elapsed / duration`, except [`Wave`], whose frequency is in hertz
//! and therefore reads elapsed seconds directly. Angles are authored in
//! degrees.

use super::{polar_offset, ModelParams, MotionPath, SampleTime};
use crate::error::Result;
use crate::interpolation::Easing;
use crate::params::{ParamReader, ParamSpec};
use crate::position::{direction, Plane, Position};
use std::f64::consts::TAU;

const ANGLE_MIN: f64 = -36_000.0;
const ANGLE_MAX: f64 = 36_000.0;

/// Straight line from `start` to `end`
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    /// Start point
    pub start: Position,
    /// End point
    pub end: Position,
    /// Easing applied to normalized time
    pub easing: Easing,
}

impl ModelParams for Linear {
    const PARAMS: &'static [ParamSpec] = &[];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            start: reader.vector("start", Position::ORIGIN)?,
            end: reader.vector("end", Position::new(10.0, 0.0, 0.0))?,
            easing: reader.easing()?,
        })
    }
}

impl MotionPath for Linear {
    fn position(&self, time: SampleTime) -> Position {
        self.start.lerp(self.end, self.easing.apply(time.progress()))
    }

    fn reference_point(&self) -> Position {
        self.start
    }
}

/// Arc from `start_angle` to `end_angle` around `center`
#[derive(Debug, Clone, PartialEq)]
pub struct Circular {
    /// Circle center
    pub center: Position,
    /// Radius in meters
    pub radius: f64,
    /// Angle at the start of the cycle, degrees
    pub start_angle: f64,
    /// Angle at the end of the cycle, degrees
    pub end_angle: f64,
    /// Drawing plane
    pub plane: Plane,
}

impl ModelParams for Circular {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("radius", 0.0, 1000.0, 5.0),
        ParamSpec::new("start_angle", ANGLE_MIN, ANGLE_MAX, 0.0),
        ParamSpec::new("end_angle", ANGLE_MIN, ANGLE_MAX, 360.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            radius: reader.number("radius")?,
            start_angle: reader.number("start_angle")?,
            end_angle: reader.number("end_angle")?,
            plane: reader.plane()?,
        })
    }
}

impl MotionPath for Circular {
    fn position(&self, time: SampleTime) -> Position {
        let angle = self.start_angle + (self.end_angle - self.start_angle) * time.progress();
        self.center + polar_offset(self.plane, self.radius, angle)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Ellipse with independent radii along the plane's two axes
#[derive(Debug, Clone, PartialEq)]
pub struct Elliptical {
    /// Ellipse center
    pub center: Position,
    /// Radius along the plane's first axis
    pub radius_a: f64,
    /// Radius along the plane's second axis
    pub radius_b: f64,
    /// Start angle, degrees
    pub start_angle: f64,
    /// End angle, degrees
    pub end_angle: f64,
    /// Drawing plane
    pub plane: Plane,
}

impl ModelParams for Elliptical {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("radius_a", 0.0, 1000.0, 6.0),
        ParamSpec::new("radius_b", 0.0, 1000.0, 3.0),
        ParamSpec::new("start_angle", ANGLE_MIN, ANGLE_MAX, 0.0),
        ParamSpec::new("end_angle", ANGLE_MIN, ANGLE_MAX, 360.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            radius_a: reader.number("radius_a")?,
            radius_b: reader.number("radius_b")?,
            start_angle: reader.number("start_angle")?,
            end_angle: reader.number("end_angle")?,
            plane: reader.plane()?,
        })
    }
}

impl MotionPath for Elliptical {
    fn position(&self, time: SampleTime) -> Position {
        let angle = (self.start_angle + (self.end_angle - self.start_angle) * time.progress()).to_radians();
        self.center + self.plane.offset(self.radius_a * angle.cos(), self.radius_b * angle.sin())
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Planar spiral whose radius moves from `start_radius` to `end_radius`
#[derive(Debug, Clone, PartialEq)]
pub struct Spiral {
    /// Spiral center
    pub center: Position,
    /// Radius at the start of the cycle
    pub start_radius: f64,
    /// Radius at the end of the cycle
    pub end_radius: f64,
    /// Full turns per cycle
    pub rotations: f64,
    /// Initial angle, degrees
    pub start_angle: f64,
    /// Turn clockwise instead of counter-clockwise
    pub clockwise: bool,
    /// Drawing plane
    pub plane: Plane,
}

impl ModelParams for Spiral {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("start_radius", 0.0, 1000.0, 1.0),
        ParamSpec::new("end_radius", 0.0, 1000.0, 8.0),
        ParamSpec::new("rotations", 0.0, 100.0, 3.0),
        ParamSpec::new("start_angle", ANGLE_MIN, ANGLE_MAX, 0.0),
        ParamSpec::new("clockwise", 0.0, 1.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            start_radius: reader.number("start_radius")?,
            end_radius: reader.number("end_radius")?,
            rotations: reader.number("rotations")?,
            start_angle: reader.number("start_angle")?,
            clockwise: reader.flag("clockwise")?,
            plane: reader.plane()?,
        })
    }
}

impl MotionPath for Spiral {
    fn position(&self, time: SampleTime) -> Position {
        let u = time.progress();
        let radius = self.start_radius + (self.end_radius - self.start_radius) * u;
        let sign = if self.clockwise { -1.0 } else { 1.0 };
        let angle = self.start_angle + sign * self.rotations * 360.0 * u;
        self.center + polar_offset(self.plane, radius, angle)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Periodic waveform shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveShape {
    /// Sine
    #[default]
    Sine,
    /// Square
    Square,
    /// Triangle
    Triangle,
    /// Rising sawtooth
    Sawtooth,
}

impl WaveShape {
    /// Parse a shape name
    pub fn from_name(name: &str) -> Option<WaveShape> {
        match name.to_ascii_lowercase().as_str() {
            "sine" => Some(WaveShape::Sine),
            "square" => Some(WaveShape::Square),
            "triangle" => Some(WaveShape::Triangle),
            "sawtooth" | "saw" => Some(WaveShape::Sawtooth),
            _ => None,
        }
    }

    /// Value in `[-1, 1]` at phase `x` radians
    pub fn sample(self, x: f64) -> f64 {
        match self {
            WaveShape::Sine => x.sin(),
            WaveShape::Square => {
                if x.rem_euclid(TAU) < TAU / 2.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Triangle => {
                let f = (x / TAU + 0.25).rem_euclid(1.0);
                1.0 - 4.0 * (f - 0.5).abs()
            }
            WaveShape::Sawtooth => 2.0 * (x / TAU).rem_euclid(1.0) - 1.0,
        }
    }
}

/// Oscillation around `center` with a per-axis amplitude
#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    /// Rest point
    pub center: Position,
    /// Peak displacement per axis
    pub amplitude: Position,
    /// Oscillation frequency, Hz
    pub frequency: f64,
    /// Phase offset, degrees
    pub phase: f64,
    /// Waveform
    pub shape: WaveShape,
}

impl ModelParams for Wave {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("frequency", 0.0, 50.0, 0.5),
        ParamSpec::new("phase", -360.0, 360.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            amplitude: reader.vector("amplitude", Position::new(0.0, 0.0, 1.0))?,
            frequency: reader.number("frequency")?,
            phase: reader.number("phase")?,
            shape: reader.option("wave_type", WaveShape::Sine, WaveShape::from_name)?,
        })
    }
}

impl MotionPath for Wave {
    fn position(&self, time: SampleTime) -> Position {
        let x = TAU * self.frequency * time.elapsed + self.phase.to_radians();
        self.center + self.amplitude * self.shape.sample(x)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Lissajous figure; z completes one oscillation per cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Lissajous {
    /// Figure center
    pub center: Position,
    /// X frequency ratio
    pub frequency_a: f64,
    /// Y frequency ratio
    pub frequency_b: f64,
    /// Phase difference of X against Y, degrees
    pub phase_difference: f64,
    /// Per-axis amplitude
    pub amplitude: Position,
}

impl ModelParams for Lissajous {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("frequency_a", 0.1, 20.0, 3.0),
        ParamSpec::new("frequency_b", 0.1, 20.0, 2.0),
        ParamSpec::new("phase_difference", -360.0, 360.0, 90.0),
        ParamSpec::new("amplitude_x", 0.0, 1000.0, 4.0),
        ParamSpec::new("amplitude_y", 0.0, 1000.0, 4.0),
        ParamSpec::new("amplitude_z", 0.0, 1000.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            frequency_a: reader.number("frequency_a")?,
            frequency_b: reader.number("frequency_b")?,
            phase_difference: reader.number("phase_difference")?,
            amplitude: Position::new(
                reader.number("amplitude_x")?,
                reader.number("amplitude_y")?,
                reader.number("amplitude_z")?,
            ),
        })
    }
}

impl MotionPath for Lissajous {
    fn position(&self, time: SampleTime) -> Position {
        let theta = TAU * time.progress();
        self.center
            + Position::new(
                self.amplitude.x * (self.frequency_a * theta + self.phase_difference.to_radians()).sin(),
                self.amplitude.y * (self.frequency_b * theta).sin(),
                self.amplitude.z * theta.sin(),
            )
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Horizontal circle rising by `height` over a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Helix {
    /// Center of the base circle
    pub center: Position,
    /// Radius in meters
    pub radius: f64,
    /// Vertical rise per cycle
    pub height: f64,
    /// Turns per cycle
    pub rotations: f64,
    /// Initial angle, degrees
    pub start_angle: f64,
    /// Turn clockwise
    pub clockwise: bool,
}

impl ModelParams for Helix {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("radius", 0.0, 1000.0, 3.0),
        ParamSpec::new("height", -1000.0, 1000.0, 5.0),
        ParamSpec::new("rotations", 0.0, 100.0, 4.0),
        ParamSpec::new("start_angle", ANGLE_MIN, ANGLE_MAX, 0.0),
        ParamSpec::new("clockwise", 0.0, 1.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            radius: reader.number("radius")?,
            height: reader.number("height")?,
            rotations: reader.number("rotations")?,
            start_angle: reader.number("start_angle")?,
            clockwise: reader.flag("clockwise")?,
        })
    }
}

impl MotionPath for Helix {
    fn position(&self, time: SampleTime) -> Position {
        let u = time.progress();
        let sign = if self.clockwise { -1.0 } else { 1.0 };
        let angle = self.start_angle + sign * self.rotations * 360.0 * u;
        self.center + polar_offset(Plane::Xy, self.radius, angle) + Position::new(0.0, 0.0, self.height * u)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Rhodonea curve `r = R·cos(k·θ)`
#[derive(Debug, Clone, PartialEq)]
pub struct RoseCurve {
    /// Curve center
    pub center: Position,
    /// Petal length
    pub radius: f64,
    /// Angular frequency derived from the petal count
    pub k: f64,
    /// Rotation of the whole figure, degrees
    pub rotation: f64,
    /// Drawing plane
    pub plane: Plane,
}

impl ModelParams for RoseCurve {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("radius", 0.0, 1000.0, 4.0),
        ParamSpec::new("petal_count", 1.0, 24.0, 4.0),
        ParamSpec::new("rotation", -360.0, 360.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        // An odd k draws k petals, an even k draws 2k.
        let petals = reader.count("petal_count")?.max(1);
        let k = if petals % 2 == 0 { petals / 2 } else { petals };
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            radius: reader.number("radius")?,
            k: f64::from(k),
            rotation: reader.number("rotation")?,
            plane: reader.plane()?,
        })
    }
}

impl MotionPath for RoseCurve {
    fn position(&self, time: SampleTime) -> Position {
        let theta = TAU * time.progress();
        let r = self.radius * (self.k * theta).cos();
        let angle = theta + self.rotation.to_radians();
        self.center + self.plane.offset(r * angle.cos(), r * angle.sin())
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Which side of the fixed circle the rolling circle travels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rolling {
    /// Epicycloid
    Outside,
    /// Hypocycloid
    Inside,
}

/// Path of a point on a circle rolling around a fixed circle
#[derive(Debug, Clone, PartialEq)]
pub struct Cycloid {
    /// Fixed circle center
    pub center: Position,
    /// Fixed circle radius
    pub fixed_radius: f64,
    /// Rolling circle radius
    pub rolling_radius: f64,
    /// Laps of the fixed circle per cycle
    pub speed: f64,
    /// Drawing plane
    pub plane: Plane,
    /// Outside or inside
    pub rolling: Rolling,
}

const CYCLOID_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("fixed_radius", 0.1, 1000.0, 4.0),
    ParamSpec::new("rolling_radius", 0.1, 1000.0, 1.0),
    ParamSpec::new("speed", 0.0, 50.0, 1.0),
];

impl Cycloid {
    fn compile(reader: &ParamReader<'_>, rolling: Rolling) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            fixed_radius: reader.number("fixed_radius")?,
            rolling_radius: reader.number("rolling_radius")?,
            speed: reader.number("speed")?,
            plane: reader.plane()?,
            rolling,
        })
    }

    fn position(&self, time: SampleTime) -> Position {
        let theta = TAU * self.speed * time.progress();
        let (big, small) = (self.fixed_radius, self.rolling_radius);
        let (a, b) = match self.rolling {
            Rolling::Outside => {
                let ratio = (big + small) / small;
                (
                    (big + small) * theta.cos() - small * (ratio * theta).cos(),
                    (big + small) * theta.sin() - small * (ratio * theta).sin(),
                )
            }
            Rolling::Inside => {
                let ratio = (big - small) / small;
                (
                    (big - small) * theta.cos() + small * (ratio * theta).cos(),
                    (big - small) * theta.sin() - small * (ratio * theta).sin(),
                )
            }
        };
        self.center + self.plane.offset(a, b)
    }
}

/// Epicycloid
#[derive(Debug, Clone, PartialEq)]
pub struct Epicycloid(pub Cycloid);

impl ModelParams for Epicycloid {
    const PARAMS: &'static [ParamSpec] = CYCLOID_PARAMS;

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Cycloid::compile(reader, Rolling::Outside).map(Self)
    }
}

impl MotionPath for Epicycloid {
    fn position(&self, time: SampleTime) -> Position {
        self.0.position(time)
    }

    fn reference_point(&self) -> Position {
        self.0.center
    }
}

/// Hypocycloid
#[derive(Debug, Clone, PartialEq)]
pub struct Hypocycloid(pub Cycloid);

impl ModelParams for Hypocycloid {
    const PARAMS: &'static [ParamSpec] = CYCLOID_PARAMS;

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Cycloid::compile(reader, Rolling::Inside).map(Self)
    }
}

impl MotionPath for Hypocycloid {
    fn position(&self, time: SampleTime) -> Position {
        self.0.position(time)
    }

    fn reference_point(&self) -> Position {
        self.0.center
    }
}

/// Circular orbit tilted out of the horizontal plane
#[derive(Debug, Clone, PartialEq)]
pub struct Orbit {
    /// Orbit center
    pub center: Position,
    /// Orbit radius
    pub radius: f64,
    /// Revolutions per cycle
    pub speed: f64,
    /// Starting angle, degrees
    pub phase: f64,
    /// Tilt about the X axis, degrees
    pub inclination: f64,
}

impl ModelParams for Orbit {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("radius", 0.0, 1000.0, 5.0),
        ParamSpec::new("speed", 0.0, 100.0, 1.0),
        ParamSpec::new("phase", -360.0, 360.0, 0.0),
        ParamSpec::new("inclination", -90.0, 90.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            radius: reader.number("radius")?,
            speed: reader.number("speed")?,
            phase: reader.number("phase")?,
            inclination: reader.number("inclination")?,
        })
    }
}

impl MotionPath for Orbit {
    fn position(&self, time: SampleTime) -> Position {
        let angle = self.phase.to_radians() + TAU * self.speed * time.progress();
        let tilt = self.inclination.to_radians();
        let (sin_a, cos_a) = angle.sin_cos();
        self.center
            + Position::new(
                self.radius * cos_a,
                self.radius * sin_a * tilt.cos(),
                self.radius * sin_a * tilt.sin(),
            )
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Horizontal sweeps around the listener at a fixed height
#[derive(Debug, Clone, PartialEq)]
pub struct CircularScan {
    /// Listener position
    pub center: Position,
    /// Sweep radius
    pub radius: f64,
    /// Height above the center
    pub height: f64,
    /// Full sweeps per cycle
    pub sweeps: f64,
    /// Initial angle, degrees
    pub start_angle: f64,
}

impl ModelParams for CircularScan {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("radius", 0.0, 1000.0, 5.0),
        ParamSpec::new("height", -1000.0, 1000.0, 0.0),
        ParamSpec::new("sweeps", 0.0, 100.0, 1.0),
        ParamSpec::new("start_angle", ANGLE_MIN, ANGLE_MAX, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            radius: reader.number("radius")?,
            height: reader.number("height")?,
            sweeps: reader.number("sweeps")?,
            start_angle: reader.number("start_angle")?,
        })
    }
}

impl MotionPath for CircularScan {
    fn position(&self, time: SampleTime) -> Position {
        let angle = self.start_angle + self.sweeps * 360.0 * time.progress();
        self.center + polar_offset(Plane::Xy, self.radius, angle) + Position::new(0.0, 0.0, self.height)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Radial move along a fixed azimuth/elevation from `center`
#[derive(Debug, Clone, PartialEq)]
pub struct Zoom {
    /// Zoom target
    pub center: Position,
    /// Azimuth of the ray, degrees
    pub azimuth: f64,
    /// Elevation of the ray, degrees
    pub elevation: f64,
    /// Distance at the start of the cycle
    pub start_distance: f64,
    /// Distance at the end of the cycle
    pub end_distance: f64,
    /// Easing applied to normalized time
    pub easing: Easing,
}

impl ModelParams for Zoom {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("azimuth", -360.0, 360.0, 0.0),
        ParamSpec::new("elevation", -90.0, 90.0, 0.0),
        ParamSpec::new("start_distance", 0.0, 1000.0, 10.0),
        ParamSpec::new("end_distance", 0.0, 1000.0, 1.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            azimuth: reader.number("azimuth")?,
            elevation: reader.number("elevation")?,
            start_distance: reader.number("start_distance")?,
            end_distance: reader.number("end_distance")?,
            easing: reader.easing()?,
        })
    }
}

impl MotionPath for Zoom {
    fn position(&self, time: SampleTime) -> Position {
        let t = self.easing.apply(time.progress());
        let distance = self.start_distance + (self.end_distance - self.start_distance) * t;
        self.center + direction(self.azimuth, self.elevation) * distance
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Constant-speed fly-by passing the listener at `closest_distance`
#[derive(Debug, Clone, PartialEq)]
pub struct Doppler {
    /// Listener position
    pub center: Position,
    /// Travel direction azimuth, degrees
    pub azimuth: f64,
    /// Lateral distance at the closest point
    pub closest_distance: f64,
    /// Total path length
    pub pass_length: f64,
    /// Height of the path above the listener
    pub height: f64,
}

impl ModelParams for Doppler {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("azimuth", -360.0, 360.0, 0.0),
        ParamSpec::new("closest_distance", 0.0, 1000.0, 3.0),
        ParamSpec::new("pass_length", 0.1, 10_000.0, 40.0),
        ParamSpec::new("height", -1000.0, 1000.0, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            azimuth: reader.number("azimuth")?,
            closest_distance: reader.number("closest_distance")?,
            pass_length: reader.number("pass_length")?,
            height: reader.number("height")?,
        })
    }
}

impl MotionPath for Doppler {
    fn position(&self, time: SampleTime) -> Position {
        let along = direction(self.azimuth, 0.0);
        let lateral = direction(self.azimuth + 90.0, 0.0);
        let travel = self.pass_length * (time.progress() - 0.5);
        self.center + along * travel + lateral * self.closest_distance + Position::new(0.0, 0.0, self.height)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Point circling a center that travels from `start` to `end`
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    /// Where the moving center starts
    pub start: Position,
    /// Where the moving center ends
    pub end: Position,
    /// Circling radius around the moving center
    pub spread: f64,
    /// Turns per cycle
    pub rotations: f64,
    /// Easing of the center's travel
    pub easing: Easing,
}

impl ModelParams for Formation {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("spread", 0.0, 1000.0, 2.0),
        ParamSpec::new("rotations", 0.0, 100.0, 1.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            start: reader.vector("start", Position::new(-5.0, 0.0, 0.0))?,
            end: reader.vector("end", Position::new(5.0, 0.0, 0.0))?,
            spread: reader.number("spread")?,
            rotations: reader.number("rotations")?,
            easing: reader.easing()?,
        })
    }
}

impl MotionPath for Formation {
    fn position(&self, time: SampleTime) -> Position {
        let u = time.progress();
        let center = self.start.lerp(self.end, self.easing.apply(u));
        center + polar_offset(Plane::Xy, self.spread, self.rotations * 360.0 * u)
    }

    fn reference_point(&self) -> Position {
        self.start
    }
}

/// Distance from an attractor swinging between `max_distance` and `min_distance`
#[derive(Debug, Clone, PartialEq)]
pub struct AttractRepel {
    /// Attractor
    pub center: Position,
    /// Unit direction of travel from the attractor
    pub axis: Position,
    /// Closest distance (fully attracted)
    pub min_distance: f64,
    /// Farthest distance (fully repelled)
    pub max_distance: f64,
    /// Attract/repel cycles per duration
    pub cycles: f64,
}

impl ModelParams for AttractRepel {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("min_distance", 0.0, 1000.0, 1.0),
        ParamSpec::new("max_distance", 0.0, 1000.0, 8.0),
        ParamSpec::new("cycles", 0.0, 100.0, 1.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        let center = reader.vector("center", Position::ORIGIN)?;
        let reference = reader.vector("reference", center + Position::new(1.0, 0.0, 0.0))?;
        Ok(Self {
            center,
            axis: (reference - center).normalized().unwrap_or(Position::new(1.0, 0.0, 0.0)),
            min_distance: reader.number("min_distance")?,
            max_distance: reader.number("max_distance")?,
            cycles: reader.number("cycles")?,
        })
    }
}

impl MotionPath for AttractRepel {
    fn position(&self, time: SampleTime) -> Position {
        let swing = 0.5 + 0.5 * (TAU * self.cycles * time.progress()).cos();
        let distance = self.min_distance + (self.max_distance - self.min_distance) * swing;
        self.center + self.axis * distance
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}
