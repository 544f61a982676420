//! Property handles
//!
//! A `PropertyHandle` identifies one mutable property of one element. Handles
//! compare and hash by identity of the underlying cell, so two handles are
//! equal only when they point at the same property, regardless of the value
//! it currently holds. This makes them usable as keys for conflict detection
//! and for buffered writes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::element::ElementId;
use crate::value::PropertyValue;

/// Insertion-ordered map from property handle to value
pub type PropertyMap = IndexMap<PropertyHandle, PropertyValue, FxBuildHasher>;

struct PropertyCell {
    name: Arc<str>,
    owner: Option<ElementId>,
    value: Mutex<PropertyValue>,
    /// Number of writes applied through `set`
    revision: AtomicU64,
}

/// Shared handle to a single animatable property
#[derive(Clone)]
pub struct PropertyHandle {
    cell: Arc<PropertyCell>,
}

impl PropertyHandle {
    /// Create a free-standing property with an initial value
    pub fn new(name: impl Into<Arc<str>>, initial: impl Into<PropertyValue>) -> Self {
        Self::with_owner(name, None, initial.into())
    }

    pub(crate) fn with_owner(
        name: impl Into<Arc<str>>,
        owner: Option<ElementId>,
        initial: PropertyValue,
    ) -> Self {
        Self {
            cell: Arc::new(PropertyCell {
                name: name.into(),
                owner,
                value: Mutex::new(initial),
                revision: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// Element this property belongs to, if it was defined on one
    pub fn owner(&self) -> Option<ElementId> {
        self.cell.owner
    }

    /// Current value
    pub fn get(&self) -> PropertyValue {
        self.cell
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write a new value and bump the revision counter
    pub fn set(&self, value: impl Into<PropertyValue>) {
        *self
            .cell
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = value.into();
        self.cell.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of writes applied so far
    pub fn revision(&self) -> u64 {
        self.cell.revision.load(Ordering::Acquire)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.cell) as usize
    }
}

impl PartialEq for PropertyHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for PropertyHandle {}

impl Hash for PropertyHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PropertyHandle");
        s.field("name", &self.name());
        if let Some(owner) = self.owner() {
            s.field("owner", &owner);
        }
        s.field("value", &self.get()).finish()
    }
}
