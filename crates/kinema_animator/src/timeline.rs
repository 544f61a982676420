//! Timeline capability
//!
//! A `Timeline` is an animation definition shared between every target it
//! runs on. The per-run state of one timeline on one target lives in a
//! `TimelineContext`, which the animator owns exclusively and passes back to
//! the timeline on every callback.
//!
//! The default method bodies implement the base lifecycle of a timeline:
//!
//! ```text
//! setup ──► Setup ──start──► WaitBegin ──► Running ⇄ Reverse ──► Ended (hold)
//!                                              │                    │
//!                                              └──────stop──────────┴──► Idle
//! ```
//!
//! The animator evicts a storyboard once its timeline reports `is_stopped`.
//! A timeline that merely `has_ended` stays scheduled and keeps holding its
//! values.

use std::any::Any;
use std::fmt;

use kinema_core::{Element, PropertyMap};

use crate::error::TimelineError;

/// Lifecycle state of a timeline run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimelineState {
    /// Not running; stopped timelines are evicted by the animator
    #[default]
    Idle,
    /// Initial values have been assigned
    Setup,
    /// Started, waiting for the begin time to elapse
    WaitBegin,
    Running,
    /// Running backwards (auto-reverse)
    Reverse,
    /// Completed and holding the end value
    Ended,
}

/// Mutable per-run state of one timeline bound to one target
pub struct TimelineContext {
    target: Element,
    state: TimelineState,
    time_started: u64,
    data: Option<Box<dyn Any + Send>>,
}

impl TimelineContext {
    pub fn new(target: Element) -> Self {
        Self {
            target,
            state: TimelineState::Idle,
            time_started: 0,
            data: None,
        }
    }

    /// Create a context carrying timeline-specific state
    pub fn with_data<T: Any + Send>(target: Element, data: T) -> Self {
        let mut context = Self::new(target);
        context.data = Some(Box::new(data));
        context
    }

    /// The element this run animates
    pub fn target(&self) -> &Element {
        &self.target
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn set_state(&mut self, state: TimelineState) {
        self.state = state;
    }

    /// Clock value the current phase started at
    pub fn time_started(&self) -> u64 {
        self.time_started
    }

    pub fn set_time_started(&mut self, time: u64) {
        self.time_started = time;
    }

    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_ref().and_then(|d| d.downcast_ref::<T>())
    }

    pub fn data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_mut().and_then(|d| d.downcast_mut::<T>())
    }

    pub fn set_data<T: Any + Send>(&mut self, data: T) {
        self.data = Some(Box::new(data));
    }
}

impl fmt::Debug for TimelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineContext")
            .field("target", &self.target.id())
            .field("state", &self.state)
            .field("time_started", &self.time_started)
            .finish_non_exhaustive()
    }
}

/// An animation definition the animator can schedule
pub trait Timeline: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        "timeline"
    }

    /// Create the per-run context for a target element
    fn create_context(&self, target: &Element) -> TimelineContext {
        TimelineContext::new(target.clone())
    }

    /// Prepare a run
    ///
    /// `initial_values` maps properties taken over from a predecessor to the
    /// values this run should treat as their starting values, instead of the
    /// properties' current values.
    fn setup(&self, context: &mut TimelineContext, initial_values: &PropertyMap) {
        let _ = initial_values;
        context.set_state(TimelineState::Setup);
    }

    /// Start the run at the given clock value
    fn start(&self, context: &mut TimelineContext, start_time: u64) {
        context.set_time_started(start_time);
        context.set_state(TimelineState::WaitBegin);
    }

    /// Advance the run to `now`
    fn animate(&self, context: &mut TimelineContext, now: u64) -> Result<(), TimelineError>;

    /// Stop the run and restore the values it changed
    fn stop(&self, context: &mut TimelineContext) -> Result<(), TimelineError> {
        context.set_state(TimelineState::Idle);
        Ok(())
    }

    /// Called once when the animator evicts a stopped run
    fn finish(&self, context: &mut TimelineContext) -> Result<(), TimelineError> {
        context.set_state(TimelineState::Ended);
        Ok(())
    }

    fn has_ended(&self, context: &TimelineContext) -> bool {
        context.state() == TimelineState::Ended
    }

    fn is_stopped(&self, context: &TimelineContext) -> bool {
        context.state() == TimelineState::Idle
    }

    /// Add every property this run animates, mapped to its restore value
    fn add_all_animated_properties(&self, context: &TimelineContext, out: &mut PropertyMap);
}
