//! Animation targets
//!
//! An `Element` is the target a storyboard runs against: it has a stable
//! identity and owns a set of named properties. Timelines resolve the
//! properties they drive by name on their target element.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::property::PropertyHandle;
use crate::value::PropertyValue;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(raw: u64) -> Self {
        ElementId(raw)
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ElementInner {
    id: ElementId,
    properties: RwLock<FxHashMap<String, PropertyHandle>>,
}

/// Shared handle to an animation target
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl Element {
    pub fn new() -> Self {
        Self::with_id(ElementId::next())
    }

    /// Create an element with a host-assigned id
    pub fn with_id(id: ElementId) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                id,
                properties: RwLock::new(FxHashMap::default()),
            }),
        }
    }

    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    /// Define a named property, or return the existing one
    ///
    /// The initial value is ignored when the property already exists.
    pub fn define_property(
        &self,
        name: &str,
        initial: impl Into<PropertyValue>,
    ) -> PropertyHandle {
        let mut properties = self
            .inner
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        properties
            .entry(name.to_string())
            .or_insert_with(|| PropertyHandle::with_owner(name, Some(self.inner.id), initial.into()))
            .clone()
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<PropertyHandle> {
        self.inner
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All properties defined on this element
    pub fn properties(&self) -> Vec<PropertyHandle> {
        self.inner
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("id", &self.inner.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Element::new();
        let b = Element::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_define_property_is_idempotent() {
        let element = Element::new();
        let first = element.define_property("Opacity", 1.0f32);
        let second = element.define_property("Opacity", 0.0f32);

        assert_eq!(first, second);
        assert_eq!(second.get(), PropertyValue::Float(1.0));
        assert_eq!(first.owner(), Some(element.id()));
        assert_eq!(element.properties().len(), 1);
    }

    #[test]
    fn test_property_lookup() {
        let element = Element::with_id(ElementId::from_raw(42));
        element.define_property("Width", 100.0f32);

        assert!(element.property("Width").is_some());
        assert!(element.property("Height").is_none());
        assert_eq!(element.id().to_raw(), 42);
    }
}
