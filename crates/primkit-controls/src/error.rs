#![forbid(unsafe_code)]

use primkit_core::error::{CaptureError, ConfigError, HandlerError};
use thiserror::Error;

/// Failure of a control operation that can both validate input and raise
/// events.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The value was rejected; nothing changed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Capture could not be acquired.
    #[error(transparent)]
    Capture(#[from] CaptureError),
    /// A handler of a raised event failed after the control settled.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ControlError {
    /// The configuration rejection, if this is one.
    #[must_use]
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}
