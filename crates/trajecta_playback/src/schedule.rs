// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred actions fired by the orchestrator tick.

use crate::playback::PlaybackId;
use crate::request::PlaybackRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub Uuid);

impl ScheduleId {
    /// Create a new unique schedule ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared cancellation flag; clones observe the same state
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel; irreversible
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a scheduled action does when it fires
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    /// Run a full play request under a pre-assigned ID
    Play {
        /// ID reserved for the playback
        playback_id: PlaybackId,
        /// Request to run
        request: PlaybackRequest,
    },
    /// Start a delayed playback that is already registered
    Start {
        /// Playback waiting to start
        playback_id: PlaybackId,
    },
}

/// A task deferred to an absolute orchestrator time
#[derive(Debug, Clone)]
pub struct ScheduledAction {
    /// Schedule ID
    pub id: ScheduleId,
    /// Task to run
    pub task: ScheduledTask,
    /// Orchestrator time to run at, in seconds
    pub execute_at: f64,
    executed: bool,
    token: CancellationToken,
}

impl ScheduledAction {
    /// Create a pending action
    pub fn new(task: ScheduledTask, execute_at: f64) -> Self {
        Self {
            id: ScheduleId::new(),
            task,
            execute_at,
            executed: false,
            token: CancellationToken::new(),
        }
    }

    /// Token that cancels this action
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the action has run
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Whether the action has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the action should run at `now`
    pub fn is_due(&self, now: f64) -> bool {
        !self.executed && !self.is_cancelled() && self.execute_at <= now
    }

    /// Mark executed and hand out the task, at most once and never after cancellation
    pub fn take(&mut self) -> Option<ScheduledTask> {
        if self.executed || self.is_cancelled() {
            return None;
        }
        self.executed = true;
        Some(self.task.clone())
    }
}
