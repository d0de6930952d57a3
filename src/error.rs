//! Error types
//!
//! Configuration problems are fatal and surface before an animation is placed
//! on a timeline. Render and sink problems are recoverable: the runner logs
//! them and keeps ticking.

use crate::Channel;

/// Result alias defaulting to [`ConfigError`].
pub type Result<T, E = ConfigError> = core::result::Result<T, E>;

/// Invalid animation options or animation config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("options object is required for {kind}")]
    MissingOptions { kind: &'static str },

    #[error("'{field}' is required for {kind}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("'{field}' must be of type {expected}, got {actual}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("'{field}' must be >= {min}")]
    BelowMinimum { field: &'static str, min: f64 },

    #[error("'{field}' must be <= {max}")]
    AboveMaximum { field: &'static str, max: f64 },

    #[error("'{field}' must have at least {min} elements")]
    TooFewElements { field: &'static str, min: usize },

    #[error("'{field}' must be one of: {allowed}")]
    NotAllowed {
        field: &'static str,
        allowed: String,
    },

    #[error("no duration supplied for {kind} and no calculation override")]
    MissingDuration { kind: &'static str },

    #[error("{kind} requires a brightness sink")]
    MissingSink { kind: &'static str },

    #[error("invalid animation type: {0}")]
    UnknownKind(String),

    #[error("unknown easing function: {0}")]
    UnknownEasing(String),

    #[error("timeline step requires '{field}'")]
    InvalidStep { field: &'static str },

    #[error("timeline step {index}: {source}")]
    Step {
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("malformed animation config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Wrap an error with the index of the timeline step that produced it.
    pub fn at_step(self, index: usize) -> Self {
        Self::Step {
            index,
            source: Box::new(self),
        }
    }

    /// Name of the option the error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. }
            | Self::InvalidType { field, .. }
            | Self::BelowMinimum { field, .. }
            | Self::AboveMaximum { field, .. }
            | Self::TooFewElements { field, .. }
            | Self::NotAllowed { field, .. }
            | Self::InvalidStep { field } => Some(field),
            Self::Step { source, .. } => source.field(),
            _ => None,
        }
    }
}

/// A primitive produced a value that cannot be written to a channel.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("non-finite brightness {value} for channel {channel}")]
    NonFinite { channel: Channel, value: f32 },
}

/// Failure reported by a brightness sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SinkError {
    #[error("channel {0} is unknown in the current mapping")]
    UnknownChannel(Channel),

    #[error("hardware write failed for channel {channel}: {message}")]
    Hardware { channel: Channel, message: String },
}
