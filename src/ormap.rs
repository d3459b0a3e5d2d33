use core::fmt;
use std::collections::BTreeMap;

use crate::clock::{Actor, ClockMap, LamportTimestamp};
use crate::observed::{self, Entry};
use crate::{DeltaCrdt, MergeError, Replicable};

/// An observed-remove map (OR-Map).
///
/// A key/value dictionary with add, update, and remove. It differs from
/// [`ORSet`](crate::ORSet) only in that the logical key and the carried
/// value are distinct; the metadata, delta computation, and merge-delta
/// conflict rule are shared with the set, entry for entry.
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let mut m = ORMap::new("node-1");
/// m.insert("color", "red");
/// m.insert("color", "blue");
/// m.remove(&"color");
///
/// assert_eq!(m.get(&"color"), None);
/// assert_eq!(m.len(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ORMap<A: Actor, K: Ord + Clone, V: Clone> {
    current: LamportTimestamp<A>,
    entries: BTreeMap<K, Entry<A, V>>,
}

/// Delta for [`ORMap`]: the metadata records the remote could not derive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ORMapDelta<A: Actor, K: Ord + Clone, V: Clone> {
    /// Records keyed by map key, live and tombstoned alike.
    pub updates: BTreeMap<K, Entry<A, V>>,
}

impl<A: Actor, K: Ord + Clone, V: Clone> ORMap<A, K, V> {
    /// Create a new empty map for the given actor.
    pub fn new(actor: A) -> Self {
        Self::with_clock(actor, 0)
    }

    /// Create a new empty map with an explicit initial clock value.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            current: LamportTimestamp::with_clock(clock, actor),
            entries: BTreeMap::new(),
        }
    }

    /// Create a map pre-populated with the given key/value pairs.
    pub fn from_entries(actor: A, pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut map = Self::new(actor);
        for (key, value) in pairs {
            map.insert(key, value);
        }
        map
    }

    /// Insert or update a key, stamping the record with a fresh timestamp.
    ///
    /// Returns the previously visible value, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.current.tick();
        let previous = match self.entries.get(&key) {
            Some(e) if !e.is_deleted => Some(e.value.clone()),
            _ => None,
        };
        self.entries
            .insert(key, Entry::live(self.current.clone(), value));
        previous
    }

    /// Remove a key by tombstoning its record under a fresh timestamp.
    ///
    /// The tombstone keeps carrying the last value so causal ordering and
    /// conflict detection remain possible. Returns the removed value, or
    /// `None` if the key was not visible.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_deleted => {
                let value = entry.value.clone();
                self.current.tick();
                self.entries.insert(
                    key.clone(),
                    Entry::tombstone(self.current.clone(), value.clone()),
                );
                Some(value)
            }
            _ => None,
        }
    }

    /// The visible value for a key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_deleted => Some(&entry.value),
            _ => None,
        }
    }

    /// Whether the map currently has a visible value for the key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// The number of visible keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| !e.is_deleted).count()
    }

    /// Whether no key is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the visible key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.is_deleted)
            .map(|(k, e)| (k, &e.value))
    }

    /// Iterate over the visible keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate over the visible values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.current.actor
    }
}

impl<A: Actor, K: Ord + Clone, V: Clone> Replicable for ORMap<A, K, V> {
    fn merged(&self, other: &Self) -> Self {
        let mut current = self.current.clone();
        current.clock = current.clock.max(other.current.clock);
        Self {
            current,
            entries: observed::merged_entries(&self.entries, &other.entries),
        }
    }
}

impl<A: Actor, K, V> DeltaCrdt for ORMap<A, K, V>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone + PartialEq + fmt::Debug,
{
    type State = ClockMap<A>;
    type Delta = ORMapDelta<A, K, V>;

    fn state(&self) -> ClockMap<A> {
        observed::state_of(&self.entries)
    }

    fn delta(&self, remote: Option<&ClockMap<A>>) -> ORMapDelta<A, K, V> {
        ORMapDelta {
            updates: observed::delta_of(&self.entries, remote),
        }
    }

    fn merge_delta(&self, delta: ORMapDelta<A, K, V>) -> Result<Self, MergeError> {
        let mut copy = self.clone();
        observed::merge_delta_into(&mut copy.entries, &mut copy.current, delta.updates)?;
        Ok(copy)
    }
}
