//! Animation contexts
//!
//! An `AnimationContext` couples a shared timeline with the run state the
//! animator owns for it, plus the set of other storyboards that must end
//! before this one may be advanced. Wait dependencies are stored as
//! `AnimationId`s into the animator's arena rather than as references, so a
//! dependency can be stopped or removed independently of its waiters; a
//! stale id simply no longer resolves.

use std::fmt;
use std::sync::Arc;

use kinema_core::{ElementId, PropertyMap};
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::error::TimelineError;
use crate::timeline::{Timeline, TimelineContext};

new_key_type! {
    /// Handle to a scheduled storyboard
    pub struct AnimationId;
}

/// One scheduled run of a timeline on a target
pub struct AnimationContext {
    timeline: Arc<dyn Timeline>,
    timeline_context: TimelineContext,
    waiting_for: SmallVec<[AnimationId; 4]>,
    /// Start order, used to rank conflicting storyboards
    sequence: u64,
    /// A callback failed; the animator evicts the context on its next tick
    faulted: bool,
}

impl AnimationContext {
    pub(crate) fn new(timeline: Arc<dyn Timeline>, timeline_context: TimelineContext, sequence: u64) -> Self {
        Self {
            timeline,
            timeline_context,
            waiting_for: SmallVec::new(),
            sequence,
            faulted: false,
        }
    }

    pub fn timeline(&self) -> &Arc<dyn Timeline> {
        &self.timeline
    }

    pub fn timeline_context(&self) -> &TimelineContext {
        &self.timeline_context
    }

    /// Storyboards that must end before this one may run
    pub fn waiting_for(&self) -> &[AnimationId] {
        &self.waiting_for
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn target_id(&self) -> ElementId {
        self.timeline_context.target().id()
    }

    /// Whether this context runs `timeline` on the element `target`
    pub fn matches(&self, timeline: &dyn Timeline, target: ElementId) -> bool {
        same_timeline(&*self.timeline, timeline) && self.target_id() == target
    }

    pub(crate) fn wait_for(&mut self, id: AnimationId) {
        if !self.waiting_for.contains(&id) {
            self.waiting_for.push(id);
        }
    }

    pub(crate) fn clear_waits(&mut self) {
        self.waiting_for.clear();
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub(crate) fn mark_faulted(&mut self) {
        self.faulted = true;
    }

    pub(crate) fn setup(&mut self, initial_values: &PropertyMap) {
        self.timeline.setup(&mut self.timeline_context, initial_values);
    }

    pub(crate) fn start(&mut self, now: u64) {
        self.timeline.start(&mut self.timeline_context, now);
    }

    pub(crate) fn animate(&mut self, now: u64) -> Result<(), TimelineError> {
        self.timeline.animate(&mut self.timeline_context, now)
    }

    pub(crate) fn stop(&mut self) -> Result<(), TimelineError> {
        self.timeline.stop(&mut self.timeline_context)
    }

    pub(crate) fn finish(&mut self) -> Result<(), TimelineError> {
        self.timeline.finish(&mut self.timeline_context)
    }

    pub fn has_ended(&self) -> bool {
        self.timeline.has_ended(&self.timeline_context)
    }

    pub fn is_stopped(&self) -> bool {
        self.timeline.is_stopped(&self.timeline_context)
    }

    /// Properties this run animates, mapped to their restore values
    pub fn animated_properties(&self) -> PropertyMap {
        let mut properties = PropertyMap::default();
        self.timeline
            .add_all_animated_properties(&self.timeline_context, &mut properties);
        properties
    }
}

impl fmt::Debug for AnimationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationContext")
            .field("timeline", &self.timeline.name())
            .field("context", &self.timeline_context)
            .field("waiting_for", &self.waiting_for.len())
            .field("sequence", &self.sequence)
            .field("faulted", &self.faulted)
            .finish()
    }
}

/// Identity comparison of two timelines, ignoring vtables
pub(crate) fn same_timeline(a: &dyn Timeline, b: &dyn Timeline) -> bool {
    std::ptr::eq(a as *const _ as *const (), b as *const _ as *const ())
}
