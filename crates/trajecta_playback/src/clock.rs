// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time sources for the orchestrator.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Source of monotonic time in seconds
pub trait Clock: Send + Sync {
    /// Seconds since an arbitrary fixed origin
    fn now(&self) -> f64;
}

/// Wall clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock reading zero now
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<RwLock<f64>>,
}

impl ManualClock {
    /// Create a clock at `start` seconds
    pub fn new(start: f64) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, seconds: f64) {
        *self.now.write() = seconds;
    }

    /// Move time forward
    pub fn advance(&self, seconds: f64) {
        *self.now.write() += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.read()
    }
}
