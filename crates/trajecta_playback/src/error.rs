// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback error types.

use crate::animation::AnimationId;
use crate::playback::PlaybackId;
use crate::track::TrackId;
use trajecta_motion::MotionError;

/// A request or definition that can never be played
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Animation is not registered
    #[error("Animation not found: {0}")]
    AnimationNotFound(AnimationId),

    /// Request names no tracks
    #[error("Playback request has no tracks")]
    NoTracks,

    /// Model kind or parameters are invalid
    #[error(transparent)]
    Model(#[from] MotionError),

    /// Too many pending scheduled actions
    #[error("Scheduled action limit reached ({limit})")]
    ScheduleFull {
        /// Configured limit
        limit: usize,
    },
}

/// Errors raised by the playback engine
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Rejected synchronously: bad request or definition
    #[error("Invalid playback request: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Rejected synchronously: requested tracks are held by playbacks that win
    #[error("Tracks {tracks:?} are held by {} other playback(s)", .holders.len())]
    Conflict {
        /// Playbacks that keep their tracks
        holders: Vec<PlaybackId>,
        /// Contested tracks
        tracks: Vec<TrackId>,
    },

    /// Evaluation failed while the playback was running
    #[error("Playback {playback} failed: {message}")]
    Runtime {
        /// Failed playback
        playback: PlaybackId,
        /// Failure description
        message: String,
    },
}

impl From<MotionError> for PlaybackError {
    fn from(err: MotionError) -> Self {
        Self::Configuration(ConfigurationError::Model(err))
    }
}

/// Broad error taxonomy shared with listeners and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad request or definition
    Configuration,
    /// Track contention
    Conflict,
    /// Failure during evaluation
    Runtime,
}

impl PlaybackError {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Runtime { .. } => ErrorCategory::Runtime,
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
