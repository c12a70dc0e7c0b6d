// SPDX-License-Identifier: MIT OR Apache-2.0
//! Positions and coordinate conversion.
//!
//! Every model evaluates in cartesian meters. Polar (AED) output is a
//! conversion applied at the edge, for transports that speak azimuth,
//! elevation and distance.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Cartesian position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X axis (right)
    pub x: f64,
    /// Y axis (front)
    pub y: f64,
    /// Z axis (up)
    pub z: f64,
}

impl Position {
    /// The origin
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new position
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Position, t: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Euclidean length of the vector from the origin
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance between two positions
    pub fn distance(self, other: Position) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `None` for a zero vector
    pub fn normalized(self) -> Option<Position> {
        let len = self.length();
        if len > f64::EPSILON {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// Cross product
    pub fn cross(self, other: Position) -> Position {
        Position {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Component-wise product
    pub fn scale(self, other: Position) -> Position {
        Position::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Component-wise clamp into the box `[min, max]`
    pub fn clamp(self, min: Position, max: Position) -> Position {
        Position {
            x: self.x.clamp(min.x.min(max.x), max.x.max(min.x)),
            y: self.y.clamp(min.y.min(max.y), max.y.max(min.y)),
            z: self.z.clamp(min.z.min(max.z), max.z.max(min.z)),
        }
    }

    /// Whether every component is finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Mean of a set of positions, or `None` when empty
    pub fn mean(positions: impl IntoIterator<Item = Position>) -> Option<Position> {
        let mut sum = Position::ORIGIN;
        let mut count = 0usize;
        for p in positions {
            sum += p;
            count += 1;
        }
        (count > 0).then(|| sum * (1.0 / count as f64))
    }

    /// As an `[x, y, z]` array
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Position {
    fn from(v: [f64; 3]) -> Self {
        Position::new(v[0], v[1], v[2])
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y, -self.z)
    }
}

/// Azimuth / elevation / distance polar position
///
/// Azimuth is measured in degrees from +X towards +Y, elevation in degrees
/// from the XY plane towards +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AedPosition {
    /// Azimuth in degrees
    pub azimuth: f64,
    /// Elevation in degrees
    pub elevation: f64,
    /// Distance in meters
    pub distance: f64,
}

impl AedPosition {
    /// Create a new polar position
    pub const fn new(azimuth: f64, elevation: f64, distance: f64) -> Self {
        Self {
            azimuth,
            elevation,
            distance,
        }
    }
}

impl From<Position> for AedPosition {
    fn from(p: Position) -> Self {
        let distance = p.length();
        if distance <= f64::EPSILON {
            return AedPosition::default();
        }
        let horizontal = (p.x * p.x + p.y * p.y).sqrt();
        AedPosition {
            azimuth: p.y.atan2(p.x).to_degrees(),
            elevation: p.z.atan2(horizontal).to_degrees(),
            distance,
        }
    }
}

impl From<AedPosition> for Position {
    fn from(aed: AedPosition) -> Self {
        direction(aed.azimuth, aed.elevation) * aed.distance
    }
}

/// Unit vector for an azimuth/elevation pair given in degrees
pub fn direction(azimuth_deg: f64, elevation_deg: f64) -> Position {
    let (az, el) = (azimuth_deg.to_radians(), elevation_deg.to_radians());
    Position::new(el.cos() * az.cos(), el.cos() * az.sin(), el.sin())
}

/// Coordinate system an animation is authored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// X/Y/Z meters
    #[default]
    Cartesian,
    /// Azimuth/elevation/distance
    Polar,
}

/// Plane a planar model draws in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Plane {
    /// Horizontal plane
    #[default]
    Xy,
    /// Vertical front plane
    Xz,
    /// Vertical side plane
    Yz,
}

impl Plane {
    /// Parse a plane name (`xy`, `xz`, `yz`), case-insensitive
    pub fn from_name(name: &str) -> Option<Plane> {
        match name.to_ascii_lowercase().as_str() {
            "xy" => Some(Plane::Xy),
            "xz" => Some(Plane::Xz),
            "yz" => Some(Plane::Yz),
            _ => None,
        }
    }

    /// Offset from a center by `a` along the plane's first axis and `b` along its second
    pub fn offset(self, a: f64, b: f64) -> Position {
        match self {
            Plane::Xy => Position::new(a, b, 0.0),
            Plane::Xz => Position::new(a, 0.0, b),
            Plane::Yz => Position::new(0.0, a, b),
        }
    }

    /// Unit normal of the plane
    pub fn normal(self) -> Position {
        match self {
            Plane::Xy => Position::new(0.0, 0.0, 1.0),
            Plane::Xz => Position::new(0.0, 1.0, 0.0),
            Plane::Yz => Position::new(1.0, 0.0, 0.0),
        }
    }
}
