// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves and interpolation basis functions.

use crate::position::Position;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Easing applied to normalized time before a path is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// No easing
    #[default]
    Linear,
    /// Quadratic acceleration
    EaseIn,
    /// Quadratic deceleration
    EaseOut,
    /// Quadratic acceleration then deceleration
    EaseInOut,
    /// Sine acceleration
    SineIn,
    /// Sine deceleration
    SineOut,
    /// Sine acceleration then deceleration
    SineInOut,
}

impl Easing {
    /// Parse an easing name such as `ease-in-out` or `easeInOut`
    pub fn from_name(name: &str) -> Option<Easing> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "linear" => Some(Easing::Linear),
            "easein" => Some(Easing::EaseIn),
            "easeout" => Some(Easing::EaseOut),
            "easeinout" => Some(Easing::EaseInOut),
            "sinein" => Some(Easing::SineIn),
            "sineout" => Some(Easing::SineOut),
            "sineinout" => Some(Easing::SineInOut),
            _ => None,
        }
    }

    /// Apply the curve to `u`, clamped to `[0, 1]`
    pub fn apply(self, u: f64) -> f64 {
        let t = u.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => 0.5 - (t * PI).cos() / 2.0,
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    /// Cubic bezier through four points
    pub fn bezier(p0: Position, p1: Position, p2: Position, p3: Position, t: f64) -> Position {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        p0 * mt3 + p1 * (3.0 * mt2 * t) + p2 * (3.0 * mt * t2) + p3 * t3
    }

    /// Cubic Hermite segment from `p0` to `p1` with tangents `m0`, `m1`
    pub fn hermite(p0: Position, m0: Position, p1: Position, m1: Position, t: f64) -> Position {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
    }

    /// Smoothstep of `t` in `[0, 1]`
    pub fn smoothstep(t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}
