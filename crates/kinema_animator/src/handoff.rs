//! Hand-off behaviors
//!
//! When a new storyboard wants to drive a property that an already scheduled
//! storyboard is driving, the hand-off behavior decides who runs:
//!
//! | Behavior             | New storyboard             | Conflicting storyboards          |
//! |----------------------|----------------------------|----------------------------------|
//! | `Compose`            | waits until they end       | keep running                     |
//! | `TemporaryReplace`   | runs immediately           | paused until the new one ends    |
//! | `SnapshotAndReplace` | runs immediately           | stopped immediately              |
//!
//! Whatever the behavior, conflicting storyboards that were only holding their
//! end value are stopped at the moment the new storyboard actually starts
//! running, so orphaned properties are always restored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimatorError;

/// Policy applied to conflicting storyboards when a new storyboard starts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffBehavior {
    /// The new storyboard waits until every conflicting storyboard has ended
    /// or was removed
    Compose,
    /// The new storyboard runs now; conflicting storyboards are deferred and
    /// resume once the new one has ended or was removed
    TemporaryReplace,
    /// Conflicting storyboards are stopped now and the new storyboard starts
    /// from their snapshotted values
    #[default]
    SnapshotAndReplace,
}

impl HandoffBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffBehavior::Compose => "compose",
            HandoffBehavior::TemporaryReplace => "temporary_replace",
            HandoffBehavior::SnapshotAndReplace => "snapshot_and_replace",
        }
    }
}

impl fmt::Display for HandoffBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandoffBehavior {
    type Err = AnimatorError;

    /// Accepts snake_case names and the PascalCase names used in markup
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compose" | "Compose" => Ok(HandoffBehavior::Compose),
            "temporary_replace" | "TemporaryReplace" => Ok(HandoffBehavior::TemporaryReplace),
            "snapshot_and_replace" | "SnapshotAndReplace" => {
                Ok(HandoffBehavior::SnapshotAndReplace)
            }
            other => Err(AnimatorError::UnsupportedHandoff(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("compose".parse::<HandoffBehavior>().unwrap(), HandoffBehavior::Compose);
        assert_eq!(
            "TemporaryReplace".parse::<HandoffBehavior>().unwrap(),
            HandoffBehavior::TemporaryReplace
        );
        assert_eq!(
            HandoffBehavior::SnapshotAndReplace
                .as_str()
                .parse::<HandoffBehavior>()
                .unwrap(),
            HandoffBehavior::SnapshotAndReplace
        );
    }

    #[test]
    fn test_unsupported_name_is_rejected() {
        let err = "crossfade".parse::<HandoffBehavior>().unwrap_err();
        assert!(matches!(err, AnimatorError::UnsupportedHandoff(ref name) if name == "crossfade"));
        assert_eq!(err.to_string(), "handoff behavior 'crossfade' is not supported");
    }
}
