// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seeded procedural motion.
//!
//! Randomness always comes from the configured seed, so sampling the same
//! model at the same time yields the same position on every call.

use super::{ModelParams, MotionPath, SampleTime};
use crate::error::Result;
use crate::interpolation::Interpolation;
use crate::params::{ParamReader, ParamSpec};
use crate::position::Position;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Waypoints per random-walk epoch
const EPOCH_STEPS: u64 = 64;

/// Odd multiplier spreading epoch numbers across the seed space
const EPOCH_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per-axis sampling rows in noise space
const AXIS_ROWS: [f64; 3] = [0.5, 17.25, 41.75];

/// Multi-octave Perlin wander inside a bounds box
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    /// Center of the bounds box
    pub center: Position,
    /// Half extents of the bounds box
    pub bounds: Position,
    /// Base noise frequency, samples per second
    pub frequency: f64,
    /// Octaves summed
    pub octaves: u32,
    /// Amplitude falloff per octave
    pub persistence: f64,
    /// Displacement scale in meters
    pub scale: f64,
    /// Noise seed
    pub seed: u32,
    perlin: Perlin,
}

impl PerlinNoise {
    fn fbm(&self, x: f64, row: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([x * frequency, row]) * amplitude;
            max_value += amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }

        if max_value > 0.0 {
            total / max_value
        } else {
            0.0
        }
    }
}

impl ModelParams for PerlinNoise {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("frequency", 0.01, 20.0, 0.5),
        ParamSpec::new("octaves", 1.0, 8.0, 3.0),
        ParamSpec::new("persistence", 0.0, 1.0, 0.5),
        ParamSpec::new("scale", 0.0, 1000.0, 3.0),
        ParamSpec::new("seed", 0.0, u32::MAX as f64, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        let seed = reader.count("seed")?;
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            bounds: reader.vector("bounds", Position::new(5.0, 5.0, 2.0))?,
            frequency: reader.number("frequency")?,
            octaves: reader.count("octaves")?.max(1),
            persistence: reader.number("persistence")?,
            scale: reader.number("scale")?,
            seed,
            perlin: Perlin::new(seed),
        })
    }
}

impl MotionPath for PerlinNoise {
    fn position(&self, time: SampleTime) -> Position {
        let x = time.elapsed * self.frequency;
        let offset = Position::new(
            self.fbm(x, AXIS_ROWS[0]),
            self.fbm(x, AXIS_ROWS[1]),
            self.fbm(x, AXIS_ROWS[2]),
        ) * self.scale;
        (self.center + offset).clamp(self.center - self.bounds, self.center + self.bounds)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

/// Random walk through seeded waypoints inside a bounds box
///
/// The walk is cut into fixed-length epochs of waypoints. Each epoch is
/// seeded from `(seed, epoch)` and bent so it ends where the next epoch
/// starts, so any waypoint is found by replaying a single epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalk {
    /// Starting point and center of the bounds box
    pub center: Position,
    /// Half extents of the bounds box
    pub bounds: Position,
    /// Distance between consecutive waypoints
    pub step_size: f64,
    /// Waypoints per second
    pub steps_per_second: f64,
    /// 0 moves linearly between waypoints, 1 eases in and out of each
    pub smoothing: f64,
    /// Walk seed
    pub seed: u64,
}

impl RandomWalk {
    /// Reflect `value` back and forth between `min` and `max`
    fn fold(value: f64, min: f64, max: f64) -> f64 {
        let width = max - min;
        if width <= 0.0 {
            return min;
        }
        let t = (value - min).rem_euclid(2.0 * width);
        let folded = if t > width { 2.0 * width - t } else { t };
        (min + folded).clamp(min, max)
    }

    fn fold_into_bounds(&self, p: Position) -> Position {
        let (min, max) = (self.center - self.bounds, self.center + self.bounds);
        Position::new(
            Self::fold(p.x, min.x, max.x),
            Self::fold(p.y, min.y, max.y),
            Self::fold(p.z, min.z, max.z),
        )
    }

    fn epoch_rng(&self, epoch: u64) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ epoch.wrapping_add(1).wrapping_mul(EPOCH_SEED_MIX))
    }

    fn random_point(&self, rng: &mut Pcg32) -> Position {
        let u = Position::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        self.center + u.scale(self.bounds)
    }

    fn random_step(&self, rng: &mut Pcg32) -> Position {
        let z: f64 = rng.random_range(-1.0..=1.0);
        let phi: f64 = rng.random_range(0.0..std::f64::consts::TAU);
        let ring = (1.0 - z * z).sqrt();
        Position::new(ring * phi.cos(), ring * phi.sin(), z) * self.step_size
    }

    /// First waypoint of an epoch
    fn epoch_start(&self, epoch: u64) -> Position {
        if epoch == 0 {
            return self.center;
        }
        self.random_point(&mut self.epoch_rng(epoch))
    }

    /// Waypoints `k` and `k + 1`
    fn waypoints(&self, k: u64) -> (Position, Position) {
        let epoch = k / EPOCH_STEPS;
        let index = k % EPOCH_STEPS;
        let start = self.epoch_start(epoch);
        let end = self.epoch_start(epoch + 1);

        let mut rng = self.epoch_rng(epoch);
        // Keep the draw order identical to `epoch_start`
        let _ = self.random_point(&mut rng);

        let mut current = start;
        let (mut from, mut to) = (start, start);
        for i in 1..=EPOCH_STEPS {
            current += self.random_step(&mut rng);
            if i == index {
                from = current;
            }
            if i == index + 1 {
                to = current;
            }
        }

        let correction = end - current;
        let bend = |p: Position, i: u64| p + correction * (i as f64 / EPOCH_STEPS as f64);
        (
            self.fold_into_bounds(bend(from, index)),
            self.fold_into_bounds(bend(to, index + 1)),
        )
    }
}

impl ModelParams for RandomWalk {
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("step_size", 0.01, 100.0, 1.0),
        ParamSpec::new("steps_per_second", 0.01, 100.0, 2.0),
        ParamSpec::new("smoothing", 0.0, 1.0, 1.0),
        ParamSpec::new("seed", 0.0, u32::MAX as f64, 0.0),
    ];

    fn compile(reader: &ParamReader<'_>) -> Result<Self> {
        let bounds = reader.vector("bounds", Position::new(5.0, 5.0, 2.0))?;
        Ok(Self {
            center: reader.vector("center", Position::ORIGIN)?,
            bounds: Position::new(bounds.x.abs(), bounds.y.abs(), bounds.z.abs()),
            step_size: reader.number("step_size")?,
            steps_per_second: reader.number("steps_per_second")?,
            smoothing: reader.number("smoothing")?,
            seed: u64::from(reader.count("seed")?),
        })
    }
}

impl MotionPath for RandomWalk {
    fn position(&self, time: SampleTime) -> Position {
        let s = (time.elapsed * self.steps_per_second).max(0.0);
        let k = s.floor() as u64;
        let frac = s - s.floor();
        let (from, to) = self.waypoints(k);
        let weight = Interpolation::lerp(frac, Interpolation::smoothstep(frac), self.smoothing);
        from.lerp(to, weight)
    }

    fn reference_point(&self) -> Position {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterBag;

    fn noise_model(seed: u32) -> PerlinNoise {
        let reader_bag = ParameterBag::new();
        let reader = ParamReader::new(crate::model::ModelKind::PerlinNoise, &reader_bag);
        let mut model = PerlinNoise::compile(&reader).unwrap();
        model.seed = seed;
        model.perlin = Perlin::new(seed);
        model
    }

    fn walk(seed: u64) -> RandomWalk {
        RandomWalk {
            center: Position::ORIGIN,
            bounds: Position::new(2.0, 2.0, 1.0),
            step_size: 1.5,
            steps_per_second: 4.0,
            smoothing: 1.0,
            seed,
        }
    }

    #[test]
    fn test_noise_stays_in_bounds() {
        let mut model = noise_model(7);
        model.scale = 500.0;
        for i in 0..500 {
            let p = model.position(SampleTime::new(i as f64 * 0.37, 60.0));
            assert!(p.x.abs() <= 5.0 && p.y.abs() <= 5.0 && p.z.abs() <= 2.0, "{p:?}");
        }
    }

    #[test]
    fn test_noise_seed_changes_path() {
        let a = noise_model(1).position(SampleTime::new(3.3, 60.0));
        let b = noise_model(2).position(SampleTime::new(3.3, 60.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_walk_starts_at_center_and_stays_in_bounds() {
        let w = walk(42);
        assert_eq!(w.position(SampleTime::new(0.0, 10.0)), Position::ORIGIN);
        for i in 0..400 {
            let p = w.position(SampleTime::new(i as f64 * 0.05, 20.0));
            assert!(p.x.abs() <= 2.0 + 1e-12 && p.y.abs() <= 2.0 + 1e-12 && p.z.abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_walk_hits_waypoints_on_step_boundaries() {
        let w = walk(9);
        let (_, first) = w.waypoints(0);
        assert!(w.position(SampleTime::new(0.25 - 1e-12, 10.0)).distance(first) < 1e-6);
        assert_eq!(w.waypoints(3), w.waypoints(3));
    }

    #[test]
    fn test_walk_is_continuous_across_epochs() {
        let w = walk(5);
        for k in [EPOCH_STEPS - 2, EPOCH_STEPS - 1, 3 * EPOCH_STEPS - 1, 1000 * EPOCH_STEPS - 1] {
            let (_, to) = w.waypoints(k);
            let (from, _) = w.waypoints(k + 1);
            assert!(to.distance(from) < 1e-9, "gap at waypoint {k}");
        }
    }

    #[test]
    fn test_walk_keeps_moving_late() {
        let mut w = walk(11);
        w.steps_per_second = 100.0;
        w.bounds = Position::new(50.0, 50.0, 50.0);
        let at = |t: f64| w.position(SampleTime::new(t, 86_400.0));

        assert_ne!(at(1000.0), at(1800.0));
        assert_ne!(at(1800.0), at(1800.37));
        assert_ne!(at(86_000.0), at(86_000.5));
    }

    #[test]
    fn test_far_waypoints_replay_one_epoch() {
        // A sample near step 1e12 only replays its own epoch
        let w = walk(3);
        let p = w.position(SampleTime::new(2.5e11 + 0.1, 1.0e12));
        assert!(p.x.abs() <= 2.0 + 1e-9 && p.y.abs() <= 2.0 + 1e-9 && p.z.abs() <= 1.0 + 1e-9, "{p:?}");
        assert_eq!(p, w.position(SampleTime::new(2.5e11 + 0.1, 1.0e12)));
    }

    #[test]
    fn test_fold_reflects_between_walls() {
        assert_eq!(RandomWalk::fold(2.5, 0.0, 2.0), 1.5);
        assert_eq!(RandomWalk::fold(-0.5, 0.0, 2.0), 0.5);
        assert_eq!(RandomWalk::fold(5.0, 0.0, 2.0), 1.0);
        assert_eq!(RandomWalk::fold(3.0, 1.0, 1.0), 1.0);
    }
}
