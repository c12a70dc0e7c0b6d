// SPDX-License-Identifier: MIT OR Apache-2.0
//! Motion model errors.

use crate::model::ModelKind;
use thiserror::Error;

/// Errors raised while building a motion model from editor parameters
///
/// All of these are configuration errors: they surface when a playback is
/// created, never while a model is being evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// Model kind name not recognised
    #[error("Unknown motion model: {0}")]
    UnknownModel(String),

    /// A required parameter is missing or empty
    #[error("Model {kind} requires parameter '{name}'")]
    MissingParameter {
        /// Model being compiled
        kind: ModelKind,
        /// Parameter name
        name: &'static str,
    },

    /// A parameter has the wrong shape (e.g. text where a vector is expected)
    #[error("Model {kind}: parameter '{name}' expected {expected}")]
    InvalidParameter {
        /// Model being compiled
        kind: ModelKind,
        /// Parameter name
        name: &'static str,
        /// Expected value shape
        expected: &'static str,
    },
}

/// Result type for motion operations
pub type Result<T> = std::result::Result<T, MotionError>;
