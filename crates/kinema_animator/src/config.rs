//! Animator configuration
//!
//! Configuration can be built in code or loaded from a TOML document:
//!
//! ```toml
//! max_scheduled = 512
//! failure_policy = "abort"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnimatorError, ConfigError, TimelineError};

fn default_max_scheduled() -> usize {
    4096
}

/// What the animator does when a timeline callback fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure, evict the failing storyboard and keep going
    #[default]
    Isolate,
    /// Return the failure to the caller immediately
    Abort,
}

impl FailurePolicy {
    /// Turn a timeline failure into either a logged event or an error
    pub(crate) fn absorb(self, err: TimelineError, during: &'static str) -> Result<(), AnimatorError> {
        match self {
            FailurePolicy::Isolate => {
                tracing::error!("Animator: timeline failed during {}: {}", during, err);
                Ok(())
            }
            FailurePolicy::Abort => Err(err.into()),
        }
    }
}

/// Configuration for an [`Animator`](crate::Animator)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Maximum number of storyboards scheduled at the same time
    pub max_scheduled: usize,
    /// Handling of failing timeline callbacks
    pub failure_policy: FailurePolicy,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            max_scheduled: default_max_scheduled(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl AnimatorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn with_max_scheduled(mut self, limit: usize) -> Self {
        self.max_scheduled = limit;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = AnimatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnimatorConfig::default());
        assert_eq!(config.max_scheduled, 4096);
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn test_parse_overrides() {
        let config = AnimatorConfig::from_toml_str(
            r#"
            max_scheduled = 8
            failure_policy = "abort"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_scheduled, 8);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = AnimatorConfig::from_toml_str(r#"failure_policy = "retry""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AnimatorConfig::load("/nonexistent/kinema/animator.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_absorb_by_policy() {
        let err = TimelineError::failed("fade", "boom");
        assert!(FailurePolicy::Isolate.absorb(err.clone(), "animate").is_ok());
        assert!(matches!(
            FailurePolicy::Abort.absorb(err, "animate"),
            Err(AnimatorError::Timeline(_))
        ));
    }
}
