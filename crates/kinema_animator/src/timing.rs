//! Timeline timing
//!
//! `TimelineTiming` holds the timing parameters common to every timeline kind
//! (begin delay, duration, auto-reverse, repeat and fill behavior) and drives
//! a `TimelineContext` through its states. Each call to [`advance`] tells the
//! concrete timeline what to do for the current frame; the timeline does the
//! actual property work.
//!
//! [`advance`]: TimelineTiming::advance

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::timeline::{TimelineContext, TimelineState};

/// Whether a timeline repeats when it reaches its end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatBehavior {
    #[default]
    None,
    Forever,
}

/// What a timeline does once it completes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBehavior {
    /// Stay scheduled and keep holding the end value
    #[default]
    HoldEnd,
    /// Stop and restore the original values
    Stop,
}

/// Outcome of advancing a timeline to the current clock value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Nothing to apply this frame
    Pending,
    /// Apply the animation at this relative time in milliseconds
    Apply(u64),
    /// Apply the final frame, then hold or stop according to `fill`
    Complete { reltime: u64, fill: FillBehavior },
}

/// Timing parameters shared by all timeline kinds
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineTiming {
    /// Delay between start and the first running frame
    pub begin_time_ms: u64,
    /// Length of one pass; `None` lets the timeline decide when it ends
    pub duration_ms: Option<u64>,
    pub auto_reverse: bool,
    pub repeat: RepeatBehavior,
    pub fill: FillBehavior,
}

impl TimelineTiming {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            ..Default::default()
        }
    }

    pub fn begin_time(mut self, begin_time_ms: u64) -> Self {
        self.begin_time_ms = begin_time_ms;
        self
    }

    pub fn auto_reverse(mut self, enabled: bool) -> Self {
        self.auto_reverse = enabled;
        self
    }

    pub fn repeat(mut self, repeat: RepeatBehavior) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn fill(mut self, fill: FillBehavior) -> Self {
        self.fill = fill;
        self
    }

    /// Check that the parameters describe a playable timing
    pub fn validate(&self) -> Result<(), TimelineError> {
        match self.duration_ms {
            None if self.auto_reverse => Err(TimelineError::InvalidTiming(
                "auto_reverse requires a duration".to_string(),
            )),
            Some(0) if self.repeat == RepeatBehavior::Forever => Err(TimelineError::InvalidTiming(
                "repeating forever requires a non-zero duration".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Advance `context` to `now`, updating its state and phase start time
    pub fn advance(&self, context: &mut TimelineContext, now: u64) -> Step {
        let passed = now.saturating_sub(context.time_started());
        match context.state() {
            TimelineState::WaitBegin => {
                if passed < self.begin_time_ms {
                    return Step::Pending;
                }
                context.set_time_started(now);
                context.set_state(TimelineState::Running);
                self.running(context, now, 0)
            }
            TimelineState::Running => self.running(context, now, passed),
            TimelineState::Reverse => self.reversing(context, now, passed),
            TimelineState::Ended => Step::Apply(self.duration_ms.map_or(passed, |d| passed.max(d))),
            TimelineState::Idle | TimelineState::Setup => Step::Pending,
        }
    }

    fn running(&self, context: &mut TimelineContext, now: u64, passed: u64) -> Step {
        let Some(duration) = self.duration_ms else {
            return Step::Apply(passed);
        };
        if passed < duration {
            return Step::Apply(passed);
        }
        if self.auto_reverse {
            context.set_state(TimelineState::Reverse);
            context.set_time_started(now);
            return self.reversing(context, now, 0);
        }
        if self.repeat == RepeatBehavior::Forever {
            context.set_time_started(now);
            return Step::Apply(0);
        }
        Step::Complete {
            reltime: duration,
            fill: self.fill,
        }
    }

    fn reversing(&self, context: &mut TimelineContext, now: u64, passed: u64) -> Step {
        // Reversing needs a known end point
        let Some(duration) = self.duration_ms else {
            return Step::Complete {
                reltime: 0,
                fill: self.fill,
            };
        };
        if passed < duration {
            return Step::Apply(duration - passed);
        }
        if self.repeat == RepeatBehavior::Forever {
            context.set_state(TimelineState::Running);
            context.set_time_started(now);
            return Step::Apply(0);
        }
        Step::Complete {
            reltime: 0,
            fill: self.fill,
        }
    }
}
