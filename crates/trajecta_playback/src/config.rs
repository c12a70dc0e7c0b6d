// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Slowest accepted tick rate, Hz
pub const MIN_TICK_RATE: f64 = 1.0;

/// Fastest accepted tick rate, Hz
pub const MAX_TICK_RATE: f64 = 1000.0;

/// What to do when a new request wants tracks another playback holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConflictStrategy {
    /// Stop every conflicting playback
    StopExisting,
    /// Stop strictly lower-priority playbacks; see [`TiePolicy`] for the rest
    #[default]
    PriorityBased,
    /// Refuse the new request
    RejectNew,
    /// Run side by side; the newest playback drives shared tracks
    AllowConcurrent,
}

/// Priority-based handling of conflicts the new request does not win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TiePolicy {
    /// Keep only the tracks nobody stronger holds; refuse if none remain
    #[default]
    TrimToFree,
    /// Refuse the whole request
    Reject,
}

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid RON for the expected type
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks per second
    pub tick_rate: f64,
    /// Conflict strategy
    pub conflict_strategy: ConflictStrategy,
    /// Tie handling under [`ConflictStrategy::PriorityBased`]
    pub tie_policy: TiePolicy,
    /// Emit a final frame returning released tracks to their anchors
    pub return_to_anchor_on_stop: bool,
    /// Pending scheduled actions allowed at once
    pub max_scheduled_actions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            conflict_strategy: ConflictStrategy::PriorityBased,
            tie_policy: TiePolicy::TrimToFree,
            return_to_anchor_on_stop: true,
            max_scheduled_actions: 1024,
        }
    }
}

impl EngineConfig {
    /// Parse from RON text
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Tick rate clamped into the accepted range
    pub fn effective_tick_rate(&self) -> f64 {
        if self.tick_rate.is_nan() {
            return Self::default().tick_rate;
        }
        self.tick_rate.clamp(MIN_TICK_RATE, MAX_TICK_RATE)
    }

    /// Time between ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.effective_tick_rate())
    }
}
