//! Conflict detection
//!
//! A new storyboard conflicts with every scheduled storyboard that animates at
//! least one of the same properties. For each contended property the collector
//! also records the value the new storyboard should start from.
//!
//! When several sources offer a starting value for the same property, the
//! winner is decided by rank, not by visiting order:
//!
//! 1. a scheduled storyboard beats a pending direct write;
//! 2. among storyboards, the most recently started one (highest sequence) wins.

use indexmap::IndexMap;
use kinema_core::{PropertyHandle, PropertyMap, PropertyValue};
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::context::AnimationId;

/// Rank of a pending direct write; storyboard sequences start above it
const PENDING_WRITE_RANK: u64 = 0;

/// Result of checking a new storyboard against the schedule
#[derive(Debug, Default)]
pub struct Conflicts {
    /// Scheduled storyboards sharing at least one property, in visiting order
    pub animations: SmallVec<[AnimationId; 4]>,
    /// Contended properties mapped to the new storyboard's starting values
    pub values: PropertyMap,
}

impl Conflicts {
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty() && self.values.is_empty()
    }
}

/// Accumulates conflicts for one new storyboard
pub(crate) struct ConflictCollector<'a> {
    wanted: &'a PropertyMap,
    animations: SmallVec<[AnimationId; 4]>,
    contenders: IndexMap<PropertyHandle, (u64, PropertyValue), FxBuildHasher>,
}

impl<'a> ConflictCollector<'a> {
    /// `wanted` is the property set of the new storyboard
    pub(crate) fn new(wanted: &'a PropertyMap) -> Self {
        Self {
            wanted,
            animations: SmallVec::new(),
            contenders: IndexMap::default(),
        }
    }

    /// Offer pending direct writes that were taken over by the new storyboard
    pub(crate) fn pending_writes(&mut self, taken: PropertyMap) {
        for (property, value) in taken {
            if self.wanted.contains_key(&property) {
                self.offer(property, PENDING_WRITE_RANK, value);
            }
        }
    }

    /// Check one scheduled storyboard
    pub(crate) fn visit(&mut self, id: AnimationId, sequence: u64, animated: PropertyMap) {
        let mut conflicting = false;
        for (property, value) in animated {
            if !self.wanted.contains_key(&property) {
                continue;
            }
            conflicting = true;
            self.offer(property, sequence, value);
        }
        if conflicting {
            self.animations.push(id);
        }
    }

    fn offer(&mut self, property: PropertyHandle, rank: u64, value: PropertyValue) {
        match self.contenders.get_mut(&property) {
            Some(current) if current.0 > rank => {}
            Some(current) => *current = (rank, value),
            None => {
                self.contenders.insert(property, (rank, value));
            }
        }
    }

    pub(crate) fn finish(self) -> Conflicts {
        Conflicts {
            animations: self.animations,
            values: self
                .contenders
                .into_iter()
                .map(|(property, (_, value))| (property, value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn map(entries: &[(&PropertyHandle, f32)]) -> PropertyMap {
        entries
            .iter()
            .map(|(p, v)| ((*p).clone(), PropertyValue::Float(*v)))
            .collect()
    }

    #[test]
    fn test_disjoint_sets_do_not_conflict() {
        let opacity = PropertyHandle::new("Opacity", 1.0f32);
        let width = PropertyHandle::new("Width", 1.0f32);
        let mut ids: SlotMap<AnimationId, ()> = SlotMap::with_key();

        let wanted = map(&[(&opacity, 0.0)]);
        let mut collector = ConflictCollector::new(&wanted);
        collector.visit(ids.insert(()), 1, map(&[(&width, 5.0)]));

        assert!(collector.finish().is_empty());
    }

    #[test]
    fn test_most_recently_started_wins() {
        let opacity = PropertyHandle::new("Opacity", 1.0f32);
        let mut ids: SlotMap<AnimationId, ()> = SlotMap::with_key();
        let older = ids.insert(());
        let newer = ids.insert(());

        let wanted = map(&[(&opacity, 0.0)]);

        // Visiting order must not matter
        let mut collector = ConflictCollector::new(&wanted);
        collector.visit(newer, 7, map(&[(&opacity, 0.7)]));
        collector.visit(older, 3, map(&[(&opacity, 0.3)]));
        let conflicts = collector.finish();

        assert_eq!(conflicts.animations.as_slice(), &[newer, older]);
        assert_eq!(conflicts.values.get(&opacity), Some(&PropertyValue::Float(0.7)));
    }

    #[test]
    fn test_animation_beats_pending_write() {
        let opacity = PropertyHandle::new("Opacity", 1.0f32);
        let width = PropertyHandle::new("Width", 1.0f32);
        let mut ids: SlotMap<AnimationId, ()> = SlotMap::with_key();

        let wanted = map(&[(&opacity, 0.0), (&width, 0.0)]);
        let mut collector = ConflictCollector::new(&wanted);
        collector.pending_writes(map(&[(&opacity, 0.1), (&width, 40.0)]));
        collector.visit(ids.insert(()), 1, map(&[(&opacity, 0.9)]));
        let conflicts = collector.finish();

        assert_eq!(conflicts.animations.len(), 1);
        assert_eq!(conflicts.values.get(&opacity), Some(&PropertyValue::Float(0.9)));
        assert_eq!(conflicts.values.get(&width), Some(&PropertyValue::Float(40.0)));
    }
}
