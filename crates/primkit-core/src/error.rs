#![forbid(unsafe_code)]

//! Error types shared by every primkit crate.
//!
//! # Taxonomy
//!
//! - [`ConfigError`]: a property setter refused a value. The previous value
//!   is kept; callers may ignore the error.
//! - [`CaptureError`]: a pointer-capture request was refused.
//! - [`HandlerError`]: a routed-event handler failed. Controls finish their
//!   own cleanup and then hand the error back unchanged.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::element::ElementId;

/// A configuration value was rejected at the property-set boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value must be `>= 0`.
    #[error("{property} must be non-negative, got {value}")]
    Negative { property: &'static str, value: f64 },
    /// Value must be `> 0`.
    #[error("{property} must be positive, got {value}")]
    NotPositive { property: &'static str, value: f64 },
    /// Value must be finite (NaN may be allowed separately as "auto").
    #[error("{property} must be finite, got {value}")]
    NotFinite { property: &'static str, value: f64 },
    /// Any other rejection.
    #[error("invalid {property}: {reason}")]
    Invalid {
        property: &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Name of the property that rejected the value.
    #[must_use]
    pub fn property(&self) -> &'static str {
        match self {
            Self::Negative { property, .. }
            | Self::NotPositive { property, .. }
            | Self::NotFinite { property, .. }
            | Self::Invalid { property, .. } => property,
        }
    }
}

/// A pointer-capture request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The current holder refuses to yield.
    #[error("pointer capture held exclusively by {holder}")]
    Refused { holder: ElementId },
}

/// Failure raised by an event handler.
#[derive(Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + 'static>>,
}

impl HandlerError {
    /// Create a handler error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl StdError + 'static) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("message", &self.message)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_property() {
        let err = ConfigError::NotPositive {
            property: "Interval",
            value: 0.0,
        };
        assert_eq!(err.property(), "Interval");
        assert_eq!(err.to_string(), "Interval must be positive, got 0");
    }

    #[test]
    fn handler_error_keeps_source() {
        let io = std::io::Error::other("disk");
        let err = HandlerError::with_source("drag start failed", io);
        assert_eq!(err.message(), "drag start failed");
        assert!(err.source().is_some());
    }
}
