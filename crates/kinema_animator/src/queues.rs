//! Per-tick collections
//!
//! Both collections are filled by the public animator operations between two
//! ticks and emptied by the tick itself: the cancel queue first, before any
//! timeline advances, and the deferred writes last, after evictions.

use std::collections::VecDeque;

use kinema_core::{PropertyHandle, PropertyMap, PropertyValue};

use crate::context::AnimationContext;

/// Storyboards removed from the schedule, waiting for their `stop` call
#[derive(Default)]
pub struct CancelQueue {
    contexts: VecDeque<AnimationContext>,
}

impl CancelQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, context: AnimationContext) {
        self.contexts.push_back(context);
    }

    /// Take the oldest queued context
    pub fn pop(&mut self) -> Option<AnimationContext> {
        self.contexts.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationContext> {
        self.contexts.iter()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }
}

/// Property writes buffered until the end of the next tick
#[derive(Default)]
pub struct DeferredWrites {
    values: PropertyMap,
}

impl DeferredWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value` for `property`, replacing any pending value
    ///
    /// Returns `false` when the write is redundant: the same value is already
    /// pending, or nothing is pending and the property already holds it.
    pub fn set(&mut self, property: PropertyHandle, value: PropertyValue) -> bool {
        match self.values.get(&property) {
            Some(pending) if *pending == value => return false,
            None if property.get() == value => return false,
            _ => {}
        }
        self.values.insert(property, value);
        true
    }

    pub fn get(&self, property: &PropertyHandle) -> Option<&PropertyValue> {
        self.values.get(property)
    }

    pub fn remove(&mut self, property: &PropertyHandle) -> Option<PropertyValue> {
        self.values.shift_remove(property)
    }

    /// Copy of the pending values for every key of `properties`
    pub fn pending(&self, properties: &PropertyMap) -> PropertyMap {
        properties
            .keys()
            .filter_map(|property| {
                self.values
                    .get(property)
                    .map(|value| (property.clone(), value.clone()))
            })
            .collect()
    }

    /// Remove and return the pending values for every key of `properties`
    pub fn take(&mut self, properties: &PropertyMap) -> PropertyMap {
        let mut taken = PropertyMap::default();
        for property in properties.keys() {
            if let Some(value) = self.values.shift_remove(property) {
                taken.insert(property.clone(), value);
            }
        }
        taken
    }

    /// Write every pending value to its property, in queue order
    ///
    /// Returns the number of writes applied.
    pub fn flush(&mut self) -> usize {
        let count = self.values.len();
        for (property, value) in self.values.drain(..) {
            property.set(value);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
