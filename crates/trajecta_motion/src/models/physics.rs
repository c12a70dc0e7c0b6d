// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physical systems evaluated in closed form.
//!
//! None of these integrate step by step: each position is the analytic
//! solution at `elapsed` seconds, so seeking to any time is exact and
//! repeated sampling is idempotent.

use super::{ModelParams, MotionPath, SampleTime};
use crate::error::Result;
use crate::params::{ParamReader, ParamSpec};
use crate::position::{Plane, Position};

/// Damped pendulum swinging in a vertical plane
///
/// `θ(t) = θ0·e^(−damping·t)·cos(ωt)` with `ω = √(g/L)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pendulum {
    /// Suspension point
    pub pivot: Position,
    /// Rod length
    pub length: f64,
    /// Release angle, degrees
    pub initial_angle: f64,
    /// Exponential decay rate of the amplitude
    pub damping: f64,
    /// Gravitational acceleration
    pub gravity: f64,
    /// Swing plane; the bob hangs along the negative second axis
    pub plane: Plane,
}

impl Pendulum {
    /// Swing angle in radians at `t` seconds
    pub fn angle(&self, t: f64) -> f64 {
        let omega = (self.gravity / self.length).sqrt();
        self.initial_angle.to_radians() * (-self.damping * t).exp() * (omega * t).cos()
    }
}

impl ModelParams for Pendulum {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("length", 0.1, 100.0, 3.0),
        ParamSpec::new("initial_angle", -180.0, 180.0, 30.0),
        ParamSpec::new("damping", 0.0, 10.0, 0.1),
        ParamSpec::new("gravity", 0.1, 100.0, 9.81),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            pivot: reader.vector("pivot", Position::new(0.0, 0.0, 5.0))?,
            length: reader.number("length")?,
            initial_angle: reader.number("initial_angle")?,
            damping: reader.number("damping")?,
            gravity: reader.number("gravity")?,
            plane: reader.option("plane", Plane::Xz, Plane::from_name)?,
        })
    }
}

impl MotionPath for Pendulum {
    fn position(&self, time: SampleTime) -> Position {
        let theta = self.angle(time.elapsed);
        self.pivot + self.plane.offset(self.length * theta.sin(), -self.length * theta.cos())
    }

    fn reference_point(&self) -> Position {
        self.pivot + self.plane.offset(0.0, -self.length)
    }
}

/// Ball dropped from `height` above `ground_level`, losing energy at each impact
#[derive(Debug, Clone, PartialEq)]
pub struct Bounce {
    /// Horizontal drop point (its z is ignored)
    pub start: Position,
    /// Drop height above the ground
    pub height: f64,
    /// Ground z coordinate
    pub ground_level: f64,
    /// Fraction of impact velocity kept after each bounce
    pub restitution: f64,
    /// Gravitational acceleration
    pub gravity: f64,
}

impl Bounce {
    /// Height above ground at `t` seconds
    pub fn altitude(&self, t: f64) -> f64 {
        let g = self.gravity;
        if self.height <= 0.0 {
            return 0.0;
        }

        let first_fall = (2.0 * self.height / g).sqrt();
        if t < first_fall {
            return (self.height - 0.5 * g * t * t).max(0.0);
        }

        let e = self.restitution;
        let v0 = e * (2.0 * g * self.height).sqrt();
        if e <= 0.0 || v0 < 1e-9 {
            return 0.0;
        }

        // Flight n lasts first_flight·eⁿ, so the bounces end after first_flight / (1 − e)
        let tau = t - first_fall;
        let first_flight = 2.0 * v0 / g;
        let remaining = 1.0 - tau * (1.0 - e) / first_flight;
        if remaining <= 0.0 {
            return 0.0;
        }

        let n = (remaining.ln() / e.ln()).floor().max(0.0);
        let scale = e.powf(n);
        let velocity = v0 * scale;
        let flight = first_flight * scale;
        let local = (tau - first_flight * (1.0 - scale) / (1.0 - e)).clamp(0.0, flight);
        (velocity * local - 0.5 * g * local * local).max(0.0)
    }
}

impl ModelParams for Bounce {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("height", 0.0, 1000.0, 5.0),
        ParamSpec::new("ground_level", -1000.0, 1000.0, 0.0),
        ParamSpec::new("restitution", 0.0, 0.99, 0.7),
        ParamSpec::new("gravity", 0.1, 100.0, 9.81),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            start: reader.vector("start", Position::ORIGIN)?,
            height: reader.number("height")?,
            ground_level: reader.number("ground_level")?,
            restitution: reader.number("restitution")?,
            gravity: reader.number("gravity")?,
        })
    }
}

impl MotionPath for Bounce {
    fn position(&self, time: SampleTime) -> Position {
        let z = (self.ground_level + self.altitude(time.elapsed)).max(self.ground_level);
        Position::new(self.start.x, self.start.y, z)
    }

    fn reference_point(&self) -> Position {
        Position::new(self.start.x, self.start.y, self.ground_level + self.height)
    }
}

/// Mass on a damped spring released from `rest + displacement` with zero velocity
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    /// Equilibrium position
    pub rest: Position,
    /// Initial offset from equilibrium
    pub displacement: Position,
    /// Spring constant k
    pub stiffness: f64,
    /// Damping coefficient c
    pub damping: f64,
    /// Mass m
    pub mass: f64,
}

impl Spring {
    /// Fraction of the initial displacement remaining at `t` seconds
    pub fn response(&self, t: f64) -> f64 {
        let omega0 = (self.stiffness / self.mass).sqrt();
        let zeta = self.damping / (2.0 * (self.stiffness * self.mass).sqrt());

        if zeta < 1.0 - 1e-9 {
            let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
            (-zeta * omega0 * t).exp() * ((omega_d * t).cos() + (zeta * omega0 / omega_d) * (omega_d * t).sin())
        } else if zeta > 1.0 + 1e-9 {
            let s = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega0 * (zeta - s);
            let r2 = -omega0 * (zeta + s);
            (r2 * (r1 * t).exp() - r1 * (r2 * t).exp()) / (r2 - r1)
        } else {
            (-omega0 * t).exp() * (1.0 + omega0 * t)
        }
    }
}

impl ModelParams for Spring {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("stiffness", 0.1, 1000.0, 20.0),
        ParamSpec::new("damping", 0.0, 100.0, 1.0),
        ParamSpec::new("mass", 0.01, 100.0, 1.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            rest: reader.vector("rest", Position::ORIGIN)?,
            displacement: reader.vector("displacement", Position::new(3.0, 0.0, 0.0))?,
            stiffness: reader.number("stiffness")?,
            damping: reader.number("damping")?,
            mass: reader.number("mass")?,
        })
    }
}

impl MotionPath for Spring {
    fn position(&self, time: SampleTime) -> Position {
        self.rest + self.displacement * self.response(time.elapsed)
    }

    fn reference_point(&self) -> Position {
        self.rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pendulum(damping: f64) -> Pendulum {
        Pendulum {
            pivot: Position::new(0.0, 0.0, 5.0),
            length: 9.81,
            initial_angle: 20.0,
            damping,
            gravity: 9.81,
            plane: Plane::Xz,
        }
    }

    #[test]
    fn test_pendulum_starts_at_release_angle() {
        let p = pendulum(0.0);
        let start = p.position(SampleTime::new(0.0, 10.0));
        let expected = 9.81 * 20f64.to_radians().sin();
        assert!((start.x - expected).abs() < 1e-12);
        // ω = 1, so after half a period the bob is on the other side.
        let half = p.position(SampleTime::new(std::f64::consts::PI, 10.0));
        assert!((half.x + expected).abs() < 1e-9);
    }

    #[test]
    fn test_pendulum_damping_decays() {
        let p = pendulum(0.5);
        let period = std::f64::consts::TAU;
        assert!(p.angle(period).abs() < p.angle(0.0).abs());
        assert!(p.angle(10.0 * period).abs() < 1e-2);
    }

    #[test]
    fn test_pendulum_seek_is_idempotent() {
        let p = pendulum(0.2);
        let a = p.position(SampleTime::new(7.3, 10.0));
        let _ = p.position(SampleTime::new(2.0, 10.0));
        let b = p.position(SampleTime::new(7.3, 10.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_bounce_first_impact_and_peak() {
        let bounce = Bounce {
            start: Position::new(1.0, 2.0, 99.0),
            height: 4.9,
            ground_level: 0.0,
            restitution: 0.5,
            gravity: 9.8,
        };
        // Falls 4.9 m in exactly one second.
        assert!((bounce.position(SampleTime::new(0.0, 10.0)).z - 4.9).abs() < 1e-12);
        assert!(bounce.position(SampleTime::new(1.0, 10.0)).z.abs() < 1e-9);
        // Rebound at 4.9 m/s peaks after 0.5 s at a quarter of the height.
        let peak = bounce.position(SampleTime::new(1.5, 10.0));
        assert!((peak.z - 1.225).abs() < 1e-9);
        assert_eq!((peak.x, peak.y), (1.0, 2.0));
    }

    #[test]
    fn test_bounce_never_goes_below_ground() {
        let bounce = Bounce {
            start: Position::ORIGIN,
            height: 3.0,
            ground_level: -1.0,
            restitution: 0.9,
            gravity: 9.81,
        };
        for i in 0..2000 {
            let z = bounce.position(SampleTime::new(i as f64 * 0.01, 30.0)).z;
            assert!(z >= -1.0);
        }
        assert_eq!(bounce.position(SampleTime::new(10_000.0, 30.0)).z, -1.0);
    }

    #[test]
    fn test_lively_bounce_keeps_going_past_hundreds_of_impacts() {
        let bounce = Bounce {
            start: Position::ORIGIN,
            height: 5.0,
            ground_level: 0.0,
            restitution: 0.99,
            gravity: 9.81,
        };
        let g = bounce.gravity;
        let e = bounce.restitution;
        let first_fall = (2.0 * bounce.height / g).sqrt();
        let v0 = e * (2.0 * g * bounce.height).sqrt();
        let first_flight = 2.0 * v0 / g;

        // Apex of flight 300
        let n = 300;
        let scale = e.powi(n);
        let start = first_fall + first_flight * (1.0 - scale) / (1.0 - e);
        let apex_time = start + 0.5 * first_flight * scale;
        let velocity = v0 * scale;
        let expected = velocity * velocity / (2.0 * g);

        let z = bounce.position(SampleTime::new(apex_time, 300.0)).z;
        assert!(expected > 0.01);
        assert!((z - expected).abs() < 1e-6, "{z} vs {expected}");
    }

    #[test]
    fn test_spring_regimes_start_displaced_and_settle() {
        for damping in [0.5, 2.0 * 20f64.sqrt(), 40.0] {
            let spring = Spring {
                rest: Position::ORIGIN,
                displacement: Position::new(2.0, 0.0, 0.0),
                stiffness: 20.0,
                damping,
                mass: 1.0,
            };
            assert!((spring.response(0.0) - 1.0).abs() < 1e-12, "damping {damping}");
            assert!(spring.position(SampleTime::new(60.0, 1.0)).length() < 1e-3, "damping {damping}");
        }
    }
}
