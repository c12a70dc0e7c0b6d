// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner errors.

use crate::show::ShowError;
use crate::transport::TransportError;
use thiserror::Error;

/// Anything that ends a run early
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Show could not be loaded or installed
    #[error(transparent)]
    Show(#[from] ShowError),

    /// Frames could not be written
    #[error(transparent)]
    Transport(#[from] TransportError),
}
