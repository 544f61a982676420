//! Kinema Animator
//!
//! Conflict-aware scheduling of storyboards against shared element properties.
//!
//! # Features
//!
//! - **Hand-off Policies**: Compose, TemporaryReplace and SnapshotAndReplace
//!   decide what happens to running storyboards when a new one animates the
//!   same properties
//! - **Hold Behavior**: ended storyboards stay resident and keep their values
//!   until stopped or replaced
//! - **Deferred Writes**: direct property writes are buffered and applied once
//!   per tick, after all storyboards advanced
//! - **Thread-safe Control**: storyboards are started and stopped from any
//!   thread through an [`AnimatorHandle`]
//! - **Timelines**: an object-safe [`Timeline`] trait with a base lifecycle,
//!   a reusable timing state machine and the [`PropertySetter`] timeline
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kinema_animator::{Animator, HandoffBehavior, PropertySetter, StoryboardState};
//! use kinema_core::{Element, PropertyValue};
//!
//! let animator = Animator::new();
//! let panel = Element::new();
//! let visible = panel.define_property("Visible", true);
//!
//! let hide = Arc::new(PropertySetter::new("hide").set("Visible", false));
//! animator
//!     .start_storyboard(hide.clone(), &panel, HandoffBehavior::Compose, 0)
//!     .unwrap();
//! animator.animate(16).unwrap();
//! assert_eq!(visible.get(), PropertyValue::Bool(false));
//!
//! animator.stop_storyboard(&*hide, &panel);
//! assert_eq!(
//!     animator.storyboard_state(&*hide, &panel),
//!     Some(StoryboardState::CancelPending)
//! );
//! animator.animate(32).unwrap();
//! assert_eq!(visible.get(), PropertyValue::Bool(true));
//! ```

pub mod animator;
pub mod config;
pub mod conflict;
pub mod context;
pub mod error;
pub mod handoff;
pub mod queues;
pub mod setter;
pub mod timeline;
pub mod timing;

#[cfg(test)]
mod testing;

pub use animator::{Animator, AnimatorHandle, StoryboardState};
pub use config::{AnimatorConfig, FailurePolicy};
pub use conflict::Conflicts;
pub use context::{AnimationContext, AnimationId};
pub use error::{AnimatorError, ConfigError, Result, TimelineError};
pub use handoff::HandoffBehavior;
pub use queues::{CancelQueue, DeferredWrites};
pub use setter::PropertySetter;
pub use timeline::{Timeline, TimelineContext, TimelineState};
pub use timing::{FillBehavior, RepeatBehavior, Step, TimelineTiming};
