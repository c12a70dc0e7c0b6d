// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation definitions as authored in the editor.

use crate::error::{PlaybackError, Result};
use crate::timing::LoopMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use trajecta_motion::{CoordinateSystem, ModelKind, MotionModel, ParamValue, ParameterBag};

/// Shortest cycle accepted, in seconds
pub const MIN_DURATION: f64 = 0.01;

/// Longest cycle accepted, in seconds
pub const MAX_DURATION: f64 = 86_400.0;

/// Identifier of an animation definition (owned by the editor)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub String);

impl AnimationId {
    /// Create an animation ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for AnimationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reusable description of a motion model, duration and loop behaviour
///
/// Playbacks hold their own shared copy, so replacing a definition in the
/// library never changes a playback that is already running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDefinition {
    /// Unique animation ID
    pub id: AnimationId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Model kind name, e.g. `circular` or `catmull-rom`
    pub model: String,
    /// Cycle length in seconds
    pub duration: f64,
    /// Loop behaviour
    #[serde(default)]
    pub loop_mode: LoopMode,
    /// Model parameters
    #[serde(default)]
    pub parameters: ParameterBag,
    /// Coordinate system positions are reported in
    #[serde(default)]
    pub coordinate_system: CoordinateSystem,
}

impl AnimationDefinition {
    /// Create a definition with no parameters
    pub fn new(id: impl Into<String>, model: impl Into<String>, duration: f64) -> Self {
        let id = AnimationId::new(id);
        Self {
            name: id.0.clone(),
            id,
            model: model.into(),
            duration,
            loop_mode: LoopMode::None,
            parameters: ParameterBag::new(),
            coordinate_system: CoordinateSystem::Cartesian,
        }
    }

    /// Set a parameter
    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Set the loop mode
    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Set the reporting coordinate system
    pub fn with_coordinate_system(mut self, coordinate_system: CoordinateSystem) -> Self {
        self.coordinate_system = coordinate_system;
        self
    }

    /// Parse the model kind
    pub fn kind(&self) -> Result<ModelKind> {
        Ok(self.model.parse::<ModelKind>()?)
    }

    /// Duration clamped into the accepted range
    pub fn clamped_duration(&self) -> f64 {
        if self.duration.is_nan() {
            return MIN_DURATION;
        }
        self.duration.clamp(MIN_DURATION, MAX_DURATION)
    }

    /// Compile the motion model, surfacing configuration errors
    pub fn compile(&self) -> Result<MotionModel> {
        let kind = self.kind()?;
        MotionModel::compile(kind, &self.parameters).map_err(PlaybackError::from)
    }
}
