use core::fmt;
use std::collections::BTreeMap;

use crate::clock::{Actor, ClockMap, LamportTimestamp};
use crate::observed::{self, Entry};
use crate::{DeltaCrdt, MergeError, Replicable};

/// An observed-remove set (OR-Set).
///
/// Elements can be freely added, removed, and re-added. A removal tombstones
/// the element's metadata record rather than erasing it, so independent
/// concurrent edits still merge deterministically: per element, the record
/// with the greater Lamport timestamp wins.
///
/// Based on "An Optimized Conflict-free Replicated Set" by Bieniusa,
/// Zawirski, Preguiça, Shapiro, Baquero, Balegas, and Duarte (2012),
/// arXiv:[1210.3368](https://arxiv.org/abs/1210.3368).
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let mut s = ORSet::new("node-1");
/// s.insert("apple");
/// s.insert("banana");
/// s.remove(&"banana");
///
/// assert!(s.contains(&"apple"));
/// assert!(!s.contains(&"banana"));
/// assert_eq!(s.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ORSet<A: Actor, T: Ord + Clone> {
    current: LamportTimestamp<A>,
    entries: BTreeMap<T, Entry<A, ()>>,
}

/// Delta for [`ORSet`]: the metadata records the remote could not derive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ORSetDelta<A: Actor, T: Ord + Clone> {
    /// Records keyed by element, live and tombstoned alike.
    pub updates: BTreeMap<T, Entry<A, ()>>,
}

impl<A: Actor, T: Ord + Clone> ORSet<A, T> {
    /// Create a new empty set for the given actor.
    pub fn new(actor: A) -> Self {
        Self::with_clock(actor, 0)
    }

    /// Create a new empty set with an explicit initial clock value.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            current: LamportTimestamp::with_clock(clock, actor),
            entries: BTreeMap::new(),
        }
    }

    /// Create a set pre-populated with the given elements.
    pub fn from_elements(actor: A, elements: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new(actor);
        for value in elements {
            set.insert(value);
        }
        set
    }

    /// Insert an element, replacing any tombstone for it with a fresh live
    /// record.
    ///
    /// Returns `true` if the element was not visible before the insert.
    pub fn insert(&mut self, value: T) -> bool {
        self.current.tick();
        let was_visible = matches!(self.entries.get(&value), Some(e) if !e.is_deleted);
        self.entries
            .insert(value, Entry::live(self.current.clone(), ()));
        !was_visible
    }

    /// Remove an element by tombstoning its record under a fresh timestamp.
    ///
    /// Returns the removed element, or `None` if it was not visible.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        match self.entries.get(value) {
            Some(entry) if !entry.is_deleted => {
                self.current.tick();
                self.entries
                    .insert(value.clone(), Entry::tombstone(self.current.clone(), ()));
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Whether the set currently contains an element.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        matches!(self.entries.get(value), Some(e) if !e.is_deleted)
    }

    /// The number of visible elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| !e.is_deleted).count()
    }

    /// Whether no element is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the visible elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.is_deleted)
            .map(|(v, _)| v)
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.current.actor
    }
}

impl<A: Actor, T: Ord + Clone> Replicable for ORSet<A, T> {
    fn merged(&self, other: &Self) -> Self {
        let mut current = self.current.clone();
        current.clock = current.clock.max(other.current.clock);
        Self {
            current,
            entries: observed::merged_entries(&self.entries, &other.entries),
        }
    }
}

impl<A: Actor, T: Ord + Clone + fmt::Debug> DeltaCrdt for ORSet<A, T> {
    type State = ClockMap<A>;
    type Delta = ORSetDelta<A, T>;

    fn state(&self) -> ClockMap<A> {
        observed::state_of(&self.entries)
    }

    fn delta(&self, remote: Option<&ClockMap<A>>) -> ORSetDelta<A, T> {
        ORSetDelta {
            updates: observed::delta_of(&self.entries, remote),
        }
    }

    fn merge_delta(&self, delta: ORSetDelta<A, T>) -> Result<Self, MergeError> {
        let mut copy = self.clone();
        observed::merge_delta_into(&mut copy.entries, &mut copy.current, delta.updates)?;
        Ok(copy)
    }
}
