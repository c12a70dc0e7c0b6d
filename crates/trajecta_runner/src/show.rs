// SPDX-License-Identifier: MIT OR Apache-2.0
//! Show files: engine settings, animations, tracks and timed cues.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trajecta_playback::{
    AnimationDefinition, Clock, EngineConfig, Orchestrator, PlaybackError, PlaybackRequest, ScheduleId, Track,
};

/// Errors loading or installing a show
#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    /// File could not be read
    #[error("Failed to read show {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not a valid show
    #[error("Failed to parse show: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A cue was refused by the engine
    #[error("Cue {index} was rejected: {source}")]
    Cue {
        /// Position of the cue in the file
        index: usize,
        /// Engine error
        source: PlaybackError,
    },
}

/// A request fired at a fixed offset from show start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Seconds after show start
    pub at: f64,
    /// Request to run
    pub request: PlaybackRequest,
}

/// Everything needed to run a show
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowFile {
    /// Engine settings
    pub engine: EngineConfig,
    /// Animation library
    pub animations: Vec<AnimationDefinition>,
    /// Tracks and their anchors
    pub tracks: Vec<Track>,
    /// Timed cues
    pub cues: Vec<Cue>,
    /// Exit once every cue has fired and nothing is playing
    pub exit_when_idle: bool,
}

impl ShowFile {
    /// Parse from RON text
    pub fn from_ron_str(text: &str) -> Result<Self, ShowError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShowError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ShowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Register the library and tracks, then schedule every cue relative to `start`
    pub fn install<C: Clock>(&self, engine: &mut Orchestrator<C>, start: f64) -> Result<Vec<ScheduleId>, ShowError> {
        for animation in &self.animations {
            engine.register_animation(animation.clone());
        }
        for track in &self.tracks {
            engine.register_track(track.clone());
        }

        self.cues
            .iter()
            .enumerate()
            .map(|(index, cue)| {
                engine
                    .schedule(cue.request.clone(), start + cue.at.max(0.0))
                    .map_err(|source| ShowError::Cue { index, source })
            })
            .collect()
    }
}
