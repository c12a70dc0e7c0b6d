// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-playback timing: loop modes, pause/resume and cycle mapping.
//!
//! A [`PlaybackClock`] never reads wall time itself. Every operation takes
//! the caller's `now` in seconds, which keeps sampling deterministic and lets
//! tests drive time by hand.

use serde::{Deserialize, Serialize};

/// What happens when an animation reaches the end of its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// Play once and hold the final position
    #[default]
    None,
    /// Restart from the beginning
    Loop,
    /// Alternate forward and backward
    PingPong,
}

/// Direction of travel within the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Elapsed time increases
    #[default]
    Forward,
    /// Elapsed time decreases
    Backward,
}

impl Direction {
    /// The opposite direction
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Coarse lifecycle of a clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingPhase {
    /// Not started
    Idle,
    /// Advancing
    Running,
    /// Frozen
    Paused,
    /// Past the end of a non-looping cycle
    Completed,
}

/// Timing sample handed to the motion model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingState {
    /// Seconds into the current cycle, within `[0, duration]`
    pub elapsed_in_cycle: f64,
    /// Completed cycles (ping-pong counts a full round trip)
    pub loop_count: u64,
    /// Direction of travel
    pub direction: Direction,
    /// `elapsed_in_cycle / duration`
    pub progress: f64,
    /// Whether the clock is paused
    pub is_paused: bool,
    /// Whether a non-looping cycle has ended
    pub completed: bool,
}

/// Maps caller time to positions within an animation cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    duration: f64,
    loop_mode: LoopMode,
    speed: f64,
    reverse: bool,
    /// Scaled time banked before the current running segment
    banked: f64,
    /// Start of the current running segment; `None` while paused or idle
    segment_start: Option<f64>,
    started_at: Option<f64>,
    paused_at: Option<f64>,
    paused_accumulated: f64,
}

impl PlaybackClock {
    /// Create an idle clock. `duration` must be positive.
    pub fn new(duration: f64, loop_mode: LoopMode) -> Self {
        Self {
            duration,
            loop_mode,
            speed: 1.0,
            reverse: false,
            banked: 0.0,
            segment_start: None,
            started_at: None,
            paused_at: None,
            paused_accumulated: 0.0,
        }
    }

    /// Scale how fast time advances. Non-positive or non-finite speeds are ignored.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
        self
    }

    /// Play the cycle from its end to its start
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Cycle length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Loop mode
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Playback speed multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Time the clock was started, if it has been
    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    /// Total unscaled seconds spent paused, excluding a pause in progress
    pub fn paused_accumulated(&self) -> f64 {
        self.paused_accumulated
    }

    /// Whether the clock is paused
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Start from the beginning of the cycle
    pub fn start(&mut self, now: f64) {
        self.banked = 0.0;
        self.segment_start = Some(now);
        self.started_at = Some(now);
        self.paused_at = None;
        self.paused_accumulated = 0.0;
    }

    /// Freeze time. Returns `false` if the clock is idle or already paused.
    pub fn pause(&mut self, now: f64) -> bool {
        if self.started_at.is_none() || self.paused_at.is_some() {
            return false;
        }
        self.banked = self.raw_elapsed(now);
        self.segment_start = None;
        self.paused_at = Some(now);
        true
    }

    /// Continue from the frozen time. Returns `false` unless paused.
    pub fn resume(&mut self, now: f64) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        self.paused_accumulated += (now - paused_at).max(0.0);
        self.segment_start = Some(now);
        true
    }

    /// Jump to `elapsed` scaled seconds since start, keeping the pause state
    pub fn seek(&mut self, now: f64, elapsed: f64) {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.banked = elapsed;
        if self.paused_at.is_none() {
            self.segment_start = Some(now);
        }
    }

    /// Scaled seconds of play since start, excluding pauses
    pub fn raw_elapsed(&self, now: f64) -> f64 {
        match self.segment_start {
            Some(start) => self.banked + (now - start).max(0.0) * self.speed,
            None => self.banked,
        }
    }

    /// Lifecycle phase at `now`
    pub fn phase(&self, now: f64) -> TimingPhase {
        if self.started_at.is_none() {
            TimingPhase::Idle
        } else if self.loop_mode == LoopMode::None && self.raw_elapsed(now) >= self.duration {
            TimingPhase::Completed
        } else if self.is_paused() {
            TimingPhase::Paused
        } else {
            TimingPhase::Running
        }
    }

    /// Timing state at `now`
    pub fn sample(&self, now: f64) -> TimingState {
        self.sample_raw(self.raw_elapsed(now))
    }

    /// Timing state at `now` for a follower lagging `lag` seconds behind
    pub fn sample_lagged(&self, now: f64, lag: f64) -> TimingState {
        self.sample_raw(self.raw_elapsed(now) - lag)
    }

    /// Map a raw elapsed time onto the cycle
    pub fn sample_raw(&self, raw: f64) -> TimingState {
        let d = self.duration;
        let (elapsed, loop_count, direction, completed) = match self.loop_mode {
            LoopMode::None => {
                let raw = raw.max(0.0);
                (raw.min(d), 0, Direction::Forward, raw >= d)
            }
            LoopMode::Loop => {
                let count = (raw / d).floor().max(0.0) as u64;
                (wrap(raw, d), count, Direction::Forward, false)
            }
            LoopMode::PingPong => {
                let span = 2.0 * d;
                let count = (raw / span).floor().max(0.0) as u64;
                let offset = wrap(raw, span);
                if offset < d {
                    (offset, count, Direction::Forward, false)
                } else {
                    (span - offset, count, Direction::Backward, false)
                }
            }
        };

        let (elapsed, direction) = if self.reverse {
            (d - elapsed, direction.flipped())
        } else {
            (elapsed, direction)
        };

        TimingState {
            elapsed_in_cycle: elapsed,
            loop_count,
            direction,
            progress: elapsed / d,
            is_paused: self.is_paused(),
            completed,
        }
    }
}

/// `raw` modulo `period`, always in `[0, period)`
fn wrap(raw: f64, period: f64) -> f64 {
    let r = raw.rem_euclid(period);
    // A tiny negative raw rounds up to the period itself
    if r >= period {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn running(duration: f64, loop_mode: LoopMode) -> PlaybackClock {
        let mut clock = PlaybackClock::new(duration, loop_mode);
        clock.start(0.0);
        clock
    }

    #[test]
    fn test_no_loop_clamps_and_completes() {
        let clock = running(10.0, LoopMode::None);
        let state = clock.sample(4.0);
        assert_eq!(state.elapsed_in_cycle, 4.0);
        assert!(!state.completed);

        let state = clock.sample(12.0);
        assert_eq!(state.elapsed_in_cycle, 10.0);
        assert_eq!(state.progress, 1.0);
        assert!(state.completed);
        assert_eq!(clock.phase(12.0), TimingPhase::Completed);
    }

    #[test]
    fn test_loop_wraps() {
        let clock = running(10.0, LoopMode::Loop);
        let state = clock.sample(25.0);
        assert_eq!(state.elapsed_in_cycle, 5.0);
        assert_eq!(state.loop_count, 2);
        assert!(!state.completed);
    }

    #[test]
    fn test_ping_pong() {
        let clock = running(10.0, LoopMode::PingPong);

        let state = clock.sample(5.0);
        assert_eq!(state.elapsed_in_cycle, 5.0);
        assert_eq!(state.direction, Direction::Forward);
        assert_eq!(state.loop_count, 0);

        let state = clock.sample(15.0);
        assert_eq!(state.elapsed_in_cycle, 5.0);
        assert_eq!(state.direction, Direction::Backward);

        let state = clock.sample(25.0);
        assert_eq!(state.elapsed_in_cycle, 5.0);
        assert_eq!(state.direction, Direction::Forward);
        assert_eq!(state.loop_count, 1);
    }

    #[test]
    fn test_ping_pong_turns_at_the_end_of_the_cycle() {
        let clock = running(5.0, LoopMode::PingPong);

        let before = clock.sample(4.999);
        assert_eq!(before.direction, Direction::Forward);
        assert!(before.elapsed_in_cycle > 4.99);

        let turn = clock.sample(5.0);
        assert_eq!(turn.elapsed_in_cycle, 5.0);
        assert_eq!(turn.direction, Direction::Backward);

        let after = clock.sample(6.0);
        assert_eq!(after.elapsed_in_cycle, 4.0);
        assert_eq!(after.direction, Direction::Backward);

        let back = clock.sample(10.0);
        assert_eq!(back.elapsed_in_cycle, 0.0);
        assert_eq!(back.direction, Direction::Forward);
        assert_eq!(back.loop_count, 1);
    }

    #[test]
    fn test_tiny_negative_time_wraps_inside_the_cycle() {
        let looping = running(10.0, LoopMode::Loop);
        let state = looping.sample_raw(-1e-20);
        assert!(state.elapsed_in_cycle < 10.0);
        assert_eq!(state.elapsed_in_cycle, 0.0);
        assert_eq!(state.loop_count, 0);

        let ping_pong = running(10.0, LoopMode::PingPong);
        let state = ping_pong.sample_raw(-1e-20);
        assert_eq!(state.elapsed_in_cycle, 0.0);
        assert_eq!(state.direction, Direction::Forward);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut clock = running(10.0, LoopMode::None);
        assert!(clock.pause(3.0));
        assert!(!clock.pause(3.5));
        assert_eq!(clock.sample(8.0).elapsed_in_cycle, 3.0);
        assert!(clock.sample(8.0).is_paused);
        assert_eq!(clock.phase(8.0), TimingPhase::Paused);

        assert!(clock.resume(8.0));
        assert!(!clock.resume(8.0));
        assert_eq!(clock.sample(8.0).elapsed_in_cycle, 3.0);
        assert_eq!(clock.sample(9.0).elapsed_in_cycle, 4.0);
        assert_eq!(clock.paused_accumulated(), 5.0);
    }

    #[test]
    fn test_speed_and_reverse() {
        let mut clock = PlaybackClock::new(10.0, LoopMode::None).with_speed(2.0).with_reverse(true);
        clock.start(1.0);
        let state = clock.sample(3.0);
        assert_eq!(state.elapsed_in_cycle, 6.0);
        assert_eq!(state.direction, Direction::Backward);
    }

    #[test]
    fn test_lagged_sample_waits_at_start() {
        let clock = running(10.0, LoopMode::None);
        assert_eq!(clock.sample_lagged(1.0, 2.0).elapsed_in_cycle, 0.0);

        let looping = running(10.0, LoopMode::Loop);
        let state = looping.sample_lagged(1.0, 2.0);
        assert_eq!(state.elapsed_in_cycle, 9.0);
        assert_eq!(state.loop_count, 0);
    }

    #[test]
    fn test_seek() {
        let mut clock = running(10.0, LoopMode::None);
        clock.seek(2.0, 7.5);
        assert_eq!(clock.sample(2.0).elapsed_in_cycle, 7.5);
        assert_eq!(clock.sample(3.0).elapsed_in_cycle, 8.5);

        clock.pause(3.0);
        clock.seek(4.0, 1.0);
        assert_eq!(clock.sample(10.0).elapsed_in_cycle, 1.0);
    }

    #[test]
    fn test_idle_clock() {
        let clock = PlaybackClock::new(10.0, LoopMode::Loop);
        assert_eq!(clock.phase(5.0), TimingPhase::Idle);
        assert_eq!(clock.raw_elapsed(5.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_elapsed_stays_in_cycle(raw in -1.0e4f64..1.0e6, duration in 0.01f64..1.0e3) {
            for mode in [LoopMode::None, LoopMode::Loop, LoopMode::PingPong] {
                let clock = PlaybackClock::new(duration, mode);
                let state = clock.sample_raw(raw);
                prop_assert!(state.elapsed_in_cycle >= 0.0);
                prop_assert!(state.elapsed_in_cycle <= duration);
            }
        }

        #[test]
        fn prop_pause_resume_is_exact(pause_at in 0.0f64..100.0, hold in 0.0f64..100.0) {
            let mut clock = running(7.0, LoopMode::Loop);
            clock.pause(pause_at);
            let frozen = clock.sample(pause_at);
            clock.resume(pause_at + hold);
            prop_assert_eq!(clock.sample(pause_at + hold).elapsed_in_cycle, frozen.elapsed_in_cycle);
        }

        #[test]
        fn prop_loop_count_is_monotonic(a in 0.0f64..1.0e5, b in 0.0f64..1.0e5) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let clock = PlaybackClock::new(3.0, LoopMode::Loop);
            prop_assert!(clock.sample_raw(lo).loop_count <= clock.sample_raw(hi).loop_count);
        }
    }
}
