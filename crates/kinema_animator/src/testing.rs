//! Test support: a scripted, recording timeline

use std::sync::{Arc, Mutex};

use kinema_core::{Element, ElementId, PropertyHandle, PropertyMap, PropertyValue};

use crate::error::TimelineError;
use crate::timeline::{Timeline, TimelineContext, TimelineState};
use crate::timing::FillBehavior;

/// Route tracing output to the test harness (`RUST_LOG=kinema_animator=trace`)
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A callback the animator made on a probe
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ProbeEvent {
    Setup { target: ElementId, initial: PropertyMap },
    Start { target: ElementId, at: u64 },
    Animate { target: ElementId, now: u64 },
    Stop { target: ElementId },
    Finish { target: ElementId },
}

struct ProbeRun {
    frames: u32,
}

/// Timeline that records every callback and ends on a fixed frame count
pub(crate) struct ProbeTimeline {
    name: &'static str,
    properties: Vec<(PropertyHandle, PropertyValue)>,
    end_after: Option<u32>,
    fill: FillBehavior,
    fail_animate: bool,
    fail_stop: bool,
    log: Mutex<Vec<ProbeEvent>>,
}

impl ProbeTimeline {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            properties: Vec::new(),
            end_after: None,
            fill: FillBehavior::HoldEnd,
            fail_animate: false,
            fail_stop: false,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Report `property` as animated, with `value` as its current value
    pub(crate) fn animates(mut self, property: &PropertyHandle, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((property.clone(), value.into()));
        self
    }

    /// Complete after `frames` animate calls, then hold or stop per `fill`
    pub(crate) fn ends_after(mut self, frames: u32, fill: FillBehavior) -> Self {
        self.end_after = Some(frames);
        self.fill = fill;
        self
    }

    pub(crate) fn failing_animate(mut self) -> Self {
        self.fail_animate = true;
        self
    }

    pub(crate) fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn record(&self, event: ProbeEvent) {
        self.log.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<ProbeEvent> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    pub(crate) fn animate_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Animate { .. }))
            .count()
    }

    pub(crate) fn animate_count_for(&self, target: &Element) -> usize {
        let id = target.id();
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Animate { target, .. } if *target == id))
            .count()
    }

    pub(crate) fn stop_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Stop { .. }))
            .count()
    }

    pub(crate) fn finish_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Finish { .. }))
            .count()
    }

    /// Initial values handed to the most recent `setup`
    pub(crate) fn last_setup(&self) -> Option<PropertyMap> {
        self.events().into_iter().rev().find_map(|e| match e {
            ProbeEvent::Setup { initial, .. } => Some(initial),
            _ => None,
        })
    }
}

impl Timeline for ProbeTimeline {
    fn name(&self) -> &str {
        self.name
    }

    fn create_context(&self, target: &Element) -> TimelineContext {
        TimelineContext::with_data(target.clone(), ProbeRun { frames: 0 })
    }

    fn setup(&self, context: &mut TimelineContext, initial_values: &PropertyMap) {
        self.record(ProbeEvent::Setup {
            target: context.target().id(),
            initial: initial_values.clone(),
        });
        context.set_state(TimelineState::Setup);
    }

    fn start(&self, context: &mut TimelineContext, start_time: u64) {
        self.record(ProbeEvent::Start {
            target: context.target().id(),
            at: start_time,
        });
        context.set_time_started(start_time);
        context.set_state(TimelineState::WaitBegin);
    }

    fn animate(&self, context: &mut TimelineContext, now: u64) -> Result<(), TimelineError> {
        self.record(ProbeEvent::Animate {
            target: context.target().id(),
            now,
        });
        if self.fail_animate {
            return Err(TimelineError::failed(self.name, "scripted animate failure"));
        }
        if !matches!(
            context.state(),
            TimelineState::WaitBegin | TimelineState::Running
        ) {
            return Ok(());
        }
        context.set_state(TimelineState::Running);
        let frames = match context.data_mut::<ProbeRun>() {
            Some(run) => {
                run.frames += 1;
                run.frames
            }
            None => return Err(TimelineError::failed(self.name, "foreign context")),
        };
        if self.end_after.is_some_and(|end| frames >= end) {
            match self.fill {
                FillBehavior::HoldEnd => context.set_state(TimelineState::Ended),
                FillBehavior::Stop => context.set_state(TimelineState::Idle),
            }
        }
        Ok(())
    }

    fn stop(&self, context: &mut TimelineContext) -> Result<(), TimelineError> {
        self.record(ProbeEvent::Stop {
            target: context.target().id(),
        });
        if self.fail_stop {
            return Err(TimelineError::failed(self.name, "scripted stop failure"));
        }
        context.set_state(TimelineState::Idle);
        Ok(())
    }

    fn finish(&self, context: &mut TimelineContext) -> Result<(), TimelineError> {
        self.record(ProbeEvent::Finish {
            target: context.target().id(),
        });
        Ok(())
    }

    fn add_all_animated_properties(&self, _context: &TimelineContext, out: &mut PropertyMap) {
        for (property, value) in &self.properties {
            out.insert(property.clone(), value.clone());
        }
    }
}
