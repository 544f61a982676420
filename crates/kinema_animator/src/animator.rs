//! Storyboard animator
//!
//! The `Animator` owns every in-flight storyboard and advances them from a
//! single periodic [`animate`](Animator::animate) call made by the host's
//! render loop. Storyboards can be started and stopped, and property values
//! written, from any thread through the animator or an [`AnimatorHandle`].
//!
//! All state sits behind one mutex. Conflict detection and wait resolution
//! look at the whole schedule at once, so the state is never split into
//! finer-grained locks.
//!
//! # Tick order
//!
//! Each `animate(now)` call, under the lock:
//!
//! 1. calls `stop` on every storyboard queued for cancellation;
//! 2. advances every scheduled storyboard that is not waiting on another,
//!    collecting the ones whose timeline reports stopped;
//! 3. calls `finish` on the collected storyboards and removes them;
//! 4. writes every buffered property value.
//!
//! Ended storyboards (hold behavior) are not removed; they keep their values
//! until stopped explicitly or replaced by a conflicting storyboard.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kinema_animator::{Animator, HandoffBehavior, PropertySetter};
//! use kinema_core::{Element, PropertyValue};
//!
//! let animator = Animator::new();
//! let button = Element::new();
//! let opacity = button.define_property("Opacity", 1.0f32);
//!
//! let dim = Arc::new(PropertySetter::new("dim").set("Opacity", 0.4f32));
//! animator
//!     .start_storyboard(dim, &button, HandoffBehavior::SnapshotAndReplace, 0)
//!     .unwrap();
//!
//! animator.animate(16).unwrap();
//! assert_eq!(opacity.get(), PropertyValue::Float(0.4));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use kinema_core::{Element, ElementId, PropertyHandle, PropertyValue};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::config::AnimatorConfig;
use crate::conflict::{ConflictCollector, Conflicts};
use crate::context::{AnimationContext, AnimationId};
use crate::error::{AnimatorError, Result, TimelineError};
use crate::handoff::HandoffBehavior;
use crate::queues::{CancelQueue, DeferredWrites};
use crate::timeline::Timeline;

/// Observable state of a storyboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoryboardState {
    /// Advanced on every tick
    Active,
    /// Waiting for conflicting storyboards to end
    Deferred,
    /// Completed and holding its end values
    Ended,
    /// Stopped by a hand-off; removed on the next tick
    Stopped,
    /// Stop requested; stopped and removed on the next tick
    CancelPending,
}

/// Internal state of the animator
struct AnimatorInner {
    contexts: SlotMap<AnimationId, AnimationContext>,
    /// Scheduled storyboards in start order
    scheduled: Vec<AnimationId>,
    cancelled: CancelQueue,
    deferred: DeferredWrites,
    next_sequence: u64,
    config: AnimatorConfig,
}

impl AnimatorInner {
    fn new(config: AnimatorConfig) -> Self {
        Self {
            contexts: SlotMap::with_key(),
            scheduled: Vec::new(),
            cancelled: CancelQueue::new(),
            deferred: DeferredWrites::new(),
            next_sequence: 0,
            config,
        }
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    fn start_storyboard(
        &mut self,
        timeline: Arc<dyn Timeline>,
        target: &Element,
        handoff: HandoffBehavior,
        now: u64,
    ) -> Result<AnimationId> {
        let limit = self.config.max_scheduled;
        if self.scheduled.len() >= limit {
            tracing::warn!(
                "Animator: rejecting '{}' on {}, {} storyboards already scheduled",
                timeline.name(),
                target.id(),
                limit
            );
            return Err(AnimatorError::CapacityExceeded { limit });
        }

        self.next_sequence += 1;
        let timeline_context = timeline.create_context(target);
        let context = AnimationContext::new(timeline, timeline_context, self.next_sequence);
        let conflicts = self.find_conflicts(&context);

        let id = self.contexts.insert(context);
        if let Err(err) = self.execute_handoff(id, &conflicts.animations, handoff) {
            self.contexts.remove(id);
            return Err(err);
        }

        if let Some(context) = self.contexts.get_mut(id) {
            // Pending writes already seeded the starting values
            self.deferred.take(&context.animated_properties());
            context.setup(&conflicts.values);
            self.scheduled.push(id);
            context.start(now);
            tracing::debug!(
                "Animator: started '{}' on {} ({}, {} conflicts)",
                context.timeline().name(),
                target.id(),
                handoff,
                conflicts.animations.len()
            );
        }
        Ok(id)
    }

    fn position_of(&self, timeline: &dyn Timeline, target: ElementId) -> Option<usize> {
        self.scheduled.iter().position(|id| {
            self.contexts
                .get(*id)
                .is_some_and(|context| context.matches(timeline, target))
        })
    }

    fn find(&self, timeline: &dyn Timeline, target: ElementId) -> Option<&AnimationContext> {
        self.position_of(timeline, target)
            .and_then(|pos| self.contexts.get(self.scheduled[pos]))
    }

    /// Remove a storyboard from the schedule
    fn unschedule(&mut self, id: AnimationId) -> Option<AnimationContext> {
        self.scheduled.retain(|scheduled| *scheduled != id);
        self.contexts.remove(id)
    }

    fn cancel(&mut self, id: AnimationId) {
        if let Some(context) = self.unschedule(id) {
            self.cancelled.push(context);
        }
    }

    fn stop_storyboard(&mut self, timeline: &dyn Timeline, target: ElementId) -> bool {
        let Some(pos) = self.position_of(timeline, target) else {
            return false;
        };
        let id = self.scheduled[pos];
        self.cancel(id);
        tracing::debug!("Animator: stop requested for '{}' on {}", timeline.name(), target);
        true
    }

    fn stop_all(&mut self) {
        let count = self.scheduled.len();
        for id in std::mem::take(&mut self.scheduled) {
            if let Some(context) = self.contexts.remove(id) {
                self.cancelled.push(context);
            }
        }
        tracing::debug!("Animator: stop requested for all {} storyboards", count);
    }

    fn stop_all_for(&mut self, target: ElementId) -> usize {
        let ids: SmallVec<[AnimationId; 8]> = self
            .scheduled
            .iter()
            .copied()
            .filter(|id| {
                self.contexts
                    .get(*id)
                    .is_some_and(|context| context.target_id() == target)
            })
            .collect();
        for id in &ids {
            self.cancel(*id);
        }
        tracing::debug!("Animator: stop requested for {} storyboards on {}", ids.len(), target);
        ids.len()
    }

    fn storyboard_state(&self, timeline: &dyn Timeline, target: ElementId) -> Option<StoryboardState> {
        if let Some(context) = self.find(timeline, target) {
            let state = if context.is_stopped() || context.is_faulted() {
                StoryboardState::Stopped
            } else if !context.waiting_for().is_empty() {
                StoryboardState::Deferred
            } else if context.has_ended() {
                StoryboardState::Ended
            } else {
                StoryboardState::Active
            };
            return Some(state);
        }
        self.cancelled
            .iter()
            .any(|context| context.matches(timeline, target))
            .then_some(StoryboardState::CancelPending)
    }

    // =========================================================================
    // Conflicts and Hand-off
    // =========================================================================

    /// Collect the scheduled storyboards that share properties with `context`
    ///
    /// Pending direct writes on the new storyboard's properties become its
    /// starting values, unless a conflicting storyboard supplies one. They
    /// stay buffered until the hand-off has succeeded.
    fn find_conflicts(&self, context: &AnimationContext) -> Conflicts {
        let wanted = context.animated_properties();

        let mut collector = ConflictCollector::new(&wanted);
        collector.pending_writes(self.deferred.pending(&wanted));
        for id in &self.scheduled {
            if let Some(scheduled) = self.contexts.get(*id) {
                collector.visit(*id, scheduled.sequence(), scheduled.animated_properties());
            }
        }
        collector.finish()
    }

    fn execute_handoff(
        &mut self,
        id: AnimationId,
        conflicting: &[AnimationId],
        handoff: HandoffBehavior,
    ) -> Result<()> {
        match handoff {
            HandoffBehavior::Compose => {
                if let Some(context) = self.contexts.get_mut(id) {
                    for other in conflicting {
                        context.wait_for(*other);
                    }
                }
            }
            HandoffBehavior::TemporaryReplace => {
                for other in conflicting {
                    if let Some(context) = self.contexts.get_mut(*other) {
                        context.wait_for(id);
                    }
                }
            }
            HandoffBehavior::SnapshotAndReplace => {
                for other in conflicting {
                    self.stop_scheduled(*other)?;
                }
                // Writes queued for the new storyboard's properties would
                // clobber it on this tick's flush
                if let Some(context) = self.contexts.get(id) {
                    let properties = context.animated_properties();
                    self.deferred.take(&properties);
                }
            }
        }
        Ok(())
    }

    /// Stop a storyboard that remains scheduled until the next eviction
    fn stop_scheduled(&mut self, id: AnimationId) -> Result<()> {
        let Some(context) = self.contexts.get_mut(id) else {
            return Ok(());
        };
        if context.is_stopped() {
            return Ok(());
        }
        let result = context.stop();
        self.contain(id, result, "stop")
    }

    /// Apply the failure policy to a callback result of storyboard `id`
    fn contain(
        &mut self,
        id: AnimationId,
        result: std::result::Result<(), TimelineError>,
        during: &'static str,
    ) -> Result<()> {
        if let Err(err) = result {
            self.config.failure_policy.absorb(err, during)?;
            if let Some(context) = self.contexts.get_mut(id) {
                context.mark_faulted();
            }
        }
        Ok(())
    }

    /// Whether storyboard `id` must sit out this tick
    ///
    /// Once every dependency is gone, ended or stopped, the wait set is
    /// cleared and the dependencies still present are stopped, so the
    /// storyboard starts from a clean snapshot rather than stale held values.
    fn is_waiting(&mut self, id: AnimationId) -> Result<bool> {
        let Some(context) = self.contexts.get(id) else {
            return Ok(false);
        };
        if context.waiting_for().is_empty() {
            return Ok(false);
        }

        let mut resolved: SmallVec<[AnimationId; 4]> = SmallVec::new();
        for dependency in context.waiting_for() {
            match self.contexts.get(*dependency) {
                None => {}
                Some(other) if other.has_ended() || other.is_stopped() || other.is_faulted() => {
                    resolved.push(*dependency)
                }
                Some(_) => return Ok(true),
            }
        }

        // Stays deferred if stopping a dependency aborts
        self.execute_handoff(id, &resolved, HandoffBehavior::SnapshotAndReplace)?;
        if let Some(context) = self.contexts.get_mut(id) {
            context.clear_waits();
            tracing::trace!(
                "Animator: '{}' on {} released, stopped {} held dependencies",
                context.timeline().name(),
                context.target_id(),
                resolved.len()
            );
        }
        Ok(false)
    }

    // =========================================================================
    // Tick
    // =========================================================================

    fn animate(&mut self, now: u64) -> Result<bool> {
        let policy = self.config.failure_policy;

        // 1. Cancellations are flushed before time advances
        while let Some(mut context) = self.cancelled.pop() {
            if let Err(err) = context.stop() {
                policy.absorb(err, "stop")?;
            }
        }

        // 2. Advance everything that is not waiting
        let mut evicted: SmallVec<[AnimationId; 8]> = SmallVec::new();
        let ids = self.scheduled.clone();
        for id in ids {
            let Some(context) = self.contexts.get(id) else {
                continue;
            };
            if context.is_faulted() {
                evicted.push(id);
                continue;
            }
            if self.is_waiting(id)? {
                if self.contexts.get(id).is_some_and(|c| c.is_stopped()) {
                    evicted.push(id);
                }
                continue;
            }
            let Some(context) = self.contexts.get_mut(id) else {
                continue;
            };
            let result = context.animate(now);
            self.contain(id, result, "animate")?;
            // Only stopped storyboards leave; ended ones keep holding
            if self
                .contexts
                .get(id)
                .is_some_and(|c| c.is_stopped() || c.is_faulted())
            {
                evicted.push(id);
            }
        }

        // 3. Evict, calling finish first
        let evicted_count = evicted.len();
        for id in evicted {
            let Some(context) = self.contexts.get_mut(id) else {
                continue;
            };
            let result = context.finish();
            self.unschedule(id);
            if let Err(err) = result {
                policy.absorb(err, "finish")?;
            }
        }

        // 4. Buffered writes land last
        let written = self.deferred.flush();

        tracing::trace!(
            "Animator: tick at {}: {} scheduled, {} evicted, {} writes",
            now,
            self.scheduled.len(),
            evicted_count,
            written
        );

        Ok(self.has_running())
    }

    /// Whether any storyboard is still progressing (not ended or stopped)
    fn has_running(&self) -> bool {
        self.scheduled
            .iter()
            .filter_map(|id| self.contexts.get(*id))
            .any(|context| !context.has_ended() && !context.is_stopped())
    }
}

// ============================================================================
// Animator
// ============================================================================

/// Scheduler for storyboards running against shared element properties
///
/// The owner of the animator drives it by calling [`animate`](Self::animate)
/// once per frame. Other threads use an [`AnimatorHandle`].
pub struct Animator {
    inner: Arc<Mutex<AnimatorInner>>,
}

impl Animator {
    pub fn new() -> Self {
        Self::with_config(AnimatorConfig::default())
    }

    pub fn with_config(config: AnimatorConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AnimatorInner::new(config))),
        }
    }

    /// Get a handle to this animator for passing to other threads
    pub fn handle(&self) -> AnimatorHandle {
        AnimatorHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AnimatorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> AnimatorConfig {
        self.lock().config.clone()
    }

    /// Start `timeline` on `target`
    ///
    /// Scheduled storyboards that animate any of the same properties are
    /// handed off according to `handoff`, and the new storyboard starts from
    /// their values. The new storyboard is first advanced by the next tick.
    pub fn start_storyboard(
        &self,
        timeline: Arc<dyn Timeline>,
        target: &Element,
        handoff: HandoffBehavior,
        now: u64,
    ) -> Result<AnimationId> {
        self.lock().start_storyboard(timeline, target, handoff, now)
    }

    /// Request a stop of `timeline` running on `target`
    ///
    /// The storyboard leaves the schedule now; its timeline is stopped on the
    /// next tick. Returns `false` if no such storyboard is scheduled.
    pub fn stop_storyboard(&self, timeline: &dyn Timeline, target: &Element) -> bool {
        self.lock().stop_storyboard(timeline, target.id())
    }

    /// Request a stop of every scheduled storyboard
    pub fn stop_all(&self) {
        self.lock().stop_all();
    }

    /// Request a stop of every storyboard running on `target`
    pub fn stop_all_for(&self, target: &Element) -> usize {
        self.lock().stop_all_for(target.id())
    }

    /// Buffer a write to `property`, applied at the end of the next tick
    ///
    /// A later write to the same property before that tick replaces this one.
    pub fn set_value(&self, property: &PropertyHandle, value: impl Into<PropertyValue>) {
        self.lock().deferred.set(property.clone(), value.into());
    }

    /// Value buffered for `property`, if any
    pub fn try_get_pending_value(&self, property: &PropertyHandle) -> Option<PropertyValue> {
        self.lock().deferred.get(property).cloned()
    }

    /// Advance all storyboards to `now` and apply buffered writes
    ///
    /// Must be called once per frame from a single thread. Returns `true`
    /// while any scheduled storyboard is still progressing.
    pub fn animate(&self, now: u64) -> Result<bool> {
        self.lock().animate(now)
    }

    pub fn scheduled_count(&self) -> usize {
        self.lock().scheduled.len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.lock().cancelled.len()
    }

    pub fn pending_value_count(&self) -> usize {
        self.lock().deferred.len()
    }

    pub fn is_scheduled(&self, timeline: &dyn Timeline, target: &Element) -> bool {
        self.lock().position_of(timeline, target.id()).is_some()
    }

    /// State of `timeline` on `target`; `None` once it has been evicted
    pub fn storyboard_state(&self, timeline: &dyn Timeline, target: &Element) -> Option<StoryboardState> {
        self.lock().storyboard_state(timeline, target.id())
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the animator
///
/// Handles can be cloned freely and sent to other threads. They won't keep
/// the animator alive; once it is dropped, operations are no-ops.
#[derive(Clone)]
pub struct AnimatorHandle {
    inner: Weak<Mutex<AnimatorInner>>,
}

impl AnimatorHandle {
    fn with_inner<R>(&self, f: impl FnOnce(&mut AnimatorInner) -> R) -> Option<R> {
        self.inner.upgrade().map(|inner| {
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
    }

    /// See [`Animator::start_storyboard`]
    pub fn start_storyboard(
        &self,
        timeline: Arc<dyn Timeline>,
        target: &Element,
        handoff: HandoffBehavior,
        now: u64,
    ) -> Result<AnimationId> {
        self.with_inner(|inner| inner.start_storyboard(timeline, target, handoff, now))
            .unwrap_or(Err(AnimatorError::Detached))
    }

    pub fn stop_storyboard(&self, timeline: &dyn Timeline, target: &Element) -> bool {
        self.with_inner(|inner| inner.stop_storyboard(timeline, target.id()))
            .unwrap_or(false)
    }

    pub fn stop_all(&self) {
        self.with_inner(|inner| inner.stop_all());
    }

    pub fn stop_all_for(&self, target: &Element) -> usize {
        self.with_inner(|inner| inner.stop_all_for(target.id()))
            .unwrap_or(0)
    }

    pub fn set_value(&self, property: &PropertyHandle, value: impl Into<PropertyValue>) {
        let value = value.into();
        self.with_inner(|inner| inner.deferred.set(property.clone(), value));
    }

    pub fn try_get_pending_value(&self, property: &PropertyHandle) -> Option<PropertyValue> {
        self.with_inner(|inner| inner.deferred.get(property).cloned())
            .flatten()
    }

    /// Check if the animator is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
