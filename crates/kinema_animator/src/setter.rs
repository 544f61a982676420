//! Discrete property setter timeline
//!
//! `PropertySetter` switches named properties of its target to fixed values
//! while it runs. It performs no interpolation: the values are applied on the
//! first running frame, held or restored when the timing completes, and
//! restored whenever the run is stopped.

use kinema_core::{PropertyHandle, PropertyMap, PropertyValue};

use crate::error::TimelineError;
use crate::timeline::{Timeline, TimelineContext, TimelineState};
use crate::timing::{FillBehavior, Step, TimelineTiming};

/// A property resolved on the target for one run
struct Assignment {
    handle: PropertyHandle,
    value: PropertyValue,
    restore: PropertyValue,
}

#[derive(Default)]
struct SetterRun {
    assignments: Vec<Assignment>,
    applied: bool,
}

/// Timeline that sets properties of its target to fixed values
pub struct PropertySetter {
    name: String,
    timing: TimelineTiming,
    setters: Vec<(String, PropertyValue)>,
}

impl PropertySetter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timing: TimelineTiming::default(),
            setters: Vec::new(),
        }
    }

    /// Set the named property to `value` while this timeline runs
    pub fn set(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.setters.push((property.into(), value.into()));
        self
    }

    pub fn timing(mut self, timing: TimelineTiming) -> Self {
        self.timing = timing;
        self
    }

    fn run_mut<'a>(&self, context: &'a mut TimelineContext) -> Result<&'a mut SetterRun, TimelineError> {
        context
            .data_mut::<SetterRun>()
            .ok_or_else(|| TimelineError::failed(&self.name, "context was not created by this setter"))
    }

    fn apply(run: &mut SetterRun) {
        if run.applied {
            return;
        }
        for assignment in &run.assignments {
            assignment.handle.set(assignment.value.clone());
        }
        run.applied = true;
    }

    fn restore(run: &mut SetterRun) {
        if !run.applied {
            return;
        }
        for assignment in &run.assignments {
            assignment.handle.set(assignment.restore.clone());
        }
        run.applied = false;
    }
}

impl Timeline for PropertySetter {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_context(&self, target: &kinema_core::Element) -> TimelineContext {
        let mut assignments = Vec::with_capacity(self.setters.len());
        for (property, value) in &self.setters {
            match target.property(property) {
                Some(handle) => assignments.push(Assignment {
                    restore: handle.get(),
                    handle,
                    value: value.clone(),
                }),
                None => tracing::warn!(
                    "PropertySetter '{}': element {} has no property '{}'",
                    self.name,
                    target.id(),
                    property
                ),
            }
        }
        TimelineContext::with_data(
            target.clone(),
            SetterRun {
                assignments,
                applied: false,
            },
        )
    }

    fn setup(&self, context: &mut TimelineContext, initial_values: &PropertyMap) {
        if let Some(run) = context.data_mut::<SetterRun>() {
            for assignment in &mut run.assignments {
                assignment.restore = initial_values
                    .get(&assignment.handle)
                    .cloned()
                    .unwrap_or_else(|| assignment.handle.get());
            }
        }
        context.set_state(TimelineState::Setup);
    }

    fn animate(&self, context: &mut TimelineContext, now: u64) -> Result<(), TimelineError> {
        self.timing.validate()?;
        match self.timing.advance(context, now) {
            Step::Pending => Ok(()),
            Step::Apply(_) => {
                Self::apply(self.run_mut(context)?);
                Ok(())
            }
            Step::Complete { fill, .. } => {
                Self::apply(self.run_mut(context)?);
                match fill {
                    FillBehavior::HoldEnd => {
                        context.set_state(TimelineState::Ended);
                        Ok(())
                    }
                    FillBehavior::Stop => self.stop(context),
                }
            }
        }
    }

    fn stop(&self, context: &mut TimelineContext) -> Result<(), TimelineError> {
        Self::restore(self.run_mut(context)?);
        context.set_state(TimelineState::Idle);
        Ok(())
    }

    fn add_all_animated_properties(&self, context: &TimelineContext, out: &mut PropertyMap) {
        if let Some(run) = context.data::<SetterRun>() {
            for assignment in &run.assignments {
                out.insert(assignment.handle.clone(), assignment.restore.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::Element;

    fn element() -> (Element, PropertyHandle) {
        let element = Element::new();
        let opacity = element.define_property("Opacity", 1.0f32);
        (element, opacity)
    }

    #[test]
    fn test_applies_and_holds() {
        let (element, opacity) = element();
        let setter = PropertySetter::new("dim")
            .set("Opacity", 0.25f32)
            .timing(TimelineTiming::new(100));

        let mut context = setter.create_context(&element);
        setter.setup(&mut context, &PropertyMap::default());
        setter.start(&mut context, 0);

        setter.animate(&mut context, 10).unwrap();
        assert_eq!(opacity.get(), PropertyValue::Float(0.25));

        setter.animate(&mut context, 200).unwrap();
        assert!(setter.has_ended(&context));
        assert!(!setter.is_stopped(&context));
        assert_eq!(opacity.get(), PropertyValue::Float(0.25));
    }

    #[test]
    fn test_fill_stop_restores() {
        let (element, opacity) = element();
        let setter = PropertySetter::new("flash")
            .set("Opacity", 0.0f32)
            .timing(TimelineTiming::new(50).fill(FillBehavior::Stop));

        let mut context = setter.create_context(&element);
        setter.setup(&mut context, &PropertyMap::default());
        setter.start(&mut context, 0);

        setter.animate(&mut context, 0).unwrap();
        assert_eq!(opacity.get(), PropertyValue::Float(0.0));

        setter.animate(&mut context, 60).unwrap();
        assert!(setter.is_stopped(&context));
        assert_eq!(opacity.get(), PropertyValue::Float(1.0));
    }

    #[test]
    fn test_setup_takes_initial_values() {
        let (element, opacity) = element();
        let setter = PropertySetter::new("fade").set("Opacity", 0.5f32);

        let mut context = setter.create_context(&element);
        let mut initial = PropertyMap::default();
        initial.insert(opacity.clone(), PropertyValue::Float(0.8));
        setter.setup(&mut context, &initial);

        let mut animated = PropertyMap::default();
        setter.add_all_animated_properties(&context, &mut animated);
        assert_eq!(animated.get(&opacity), Some(&PropertyValue::Float(0.8)));

        setter.start(&mut context, 0);
        setter.animate(&mut context, 0).unwrap();
        setter.stop(&mut context).unwrap();
        assert_eq!(opacity.get(), PropertyValue::Float(0.8));
    }

    #[test]
    fn test_unknown_property_is_skipped() {
        let (element, _) = element();
        let setter = PropertySetter::new("resize").set("Width", 10.0f32);

        let context = setter.create_context(&element);
        let mut animated = PropertyMap::default();
        setter.add_all_animated_properties(&context, &mut animated);
        assert!(animated.is_empty());
    }

    #[test]
    fn test_invalid_timing_fails() {
        let (element, opacity) = element();
        let setter = PropertySetter::new("bounce")
            .set("Opacity", 0.5f32)
            .timing(TimelineTiming::default().auto_reverse(true));

        let mut context = setter.create_context(&element);
        setter.setup(&mut context, &PropertyMap::default());
        setter.start(&mut context, 0);

        assert!(matches!(
            setter.animate(&mut context, 10),
            Err(TimelineError::InvalidTiming(_))
        ));
        assert_eq!(opacity.get(), PropertyValue::Float(1.0));
    }

    #[test]
    fn test_foreign_context_fails() {
        let (element, _) = element();
        let setter = PropertySetter::new("dim").set("Opacity", 0.5f32);

        let mut context = TimelineContext::new(element);
        context.set_state(TimelineState::Running);
        assert!(matches!(
            setter.animate(&mut context, 0),
            Err(TimelineError::Failed { .. })
        ));
    }
}
