//! Error types for kinema_animator

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a timeline callback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// The timeline failed while animating, stopping or finishing
    #[error("timeline '{timeline}' failed: {message}")]
    Failed { timeline: String, message: String },

    /// The timeline's timing parameters cannot be evaluated
    #[error("invalid timing: {0}")]
    InvalidTiming(String),
}

impl TimelineError {
    pub fn failed(timeline: impl Into<String>, message: impl Into<String>) -> Self {
        TimelineError::Failed {
            timeline: timeline.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while scheduling or ticking storyboards
#[derive(Error, Debug)]
pub enum AnimatorError {
    /// A timeline callback failed and the failure policy is `Abort`
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    /// The bound on concurrently scheduled storyboards was reached
    #[error("cannot schedule more than {limit} storyboards")]
    CapacityExceeded { limit: usize },

    /// A hand-off behavior name that no policy implements
    #[error("handoff behavior '{0}' is not supported")]
    UnsupportedHandoff(String),

    /// The animator behind a handle has been dropped
    #[error("animator is no longer alive")]
    Detached,
}

/// Errors that can occur while loading an animator configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid animator configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for animator operations
pub type Result<T> = std::result::Result<T, AnimatorError>;
