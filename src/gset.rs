use std::collections::BTreeMap;

use crate::clock::{Actor, ClockMap, LamportTimestamp};
use crate::{DeltaCrdt, MergeError, Replicable};

/// A grow-only set (G-Set).
///
/// Elements can be added but never removed, so tombstones never arise and
/// merge reduces to set union. Each element is stamped with the Lamport
/// timestamp of its most recent insertion; the stamps are not used for
/// ordering, but they feed the same per-actor clock compaction that the
/// observed-remove collections use, so the delta API is symmetric across
/// all three.
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let mut s1 = GSet::new("node-1");
/// s1.insert("apple");
/// s1.insert("banana");
///
/// let mut s2 = GSet::new("node-2");
/// s2.insert("cherry");
///
/// let merged = s1.merged(&s2);
/// assert_eq!(merged.len(), 3);
/// assert!(merged.contains(&"cherry"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GSet<A: Actor, T: Ord + Clone> {
    current: LamportTimestamp<A>,
    elements: BTreeMap<T, LamportTimestamp<A>>,
}

/// Delta for [`GSet`]: the stamped elements the remote could not derive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GSetDelta<A: Actor, T: Ord + Clone> {
    /// Elements and the timestamps of their most recent insertion.
    pub updates: BTreeMap<T, LamportTimestamp<A>>,
}

impl<A: Actor, T: Ord + Clone> GSet<A, T> {
    /// Create a new empty set for the given actor.
    pub fn new(actor: A) -> Self {
        Self::with_clock(actor, 0)
    }

    /// Create a new empty set with an explicit initial clock value.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            current: LamportTimestamp::with_clock(clock, actor),
            elements: BTreeMap::new(),
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

    /// Insert an element, stamping it with a fresh timestamp.
    ///
    /// Returns `true` if the element was newly inserted.
    pub fn insert(&mut self, value: T) -> bool {
        self.current.tick();
        self.elements
            .insert(value, self.current.clone())
            .is_none()
    }

    /// Whether the set contains an element.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains_key(value)
    }

    /// The number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.keys()
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.current.actor
    }
}

impl<A: Actor, T: Ord + Clone> Replicable for GSet<A, T> {
    fn merged(&self, other: &Self) -> Self {
        let mut elements = self.elements.clone();
        for (value, incoming) in &other.elements {
            match elements.get(value) {
                Some(existing) if existing > incoming => {}
                _ => {
                    elements.insert(value.clone(), incoming.clone());
                }
            }
        }
        let mut current = self.current.clone();
        current.clock = current.clock.max(other.current.clock);
        Self { current, elements }
    }
}

impl<A: Actor, T: Ord + Clone> DeltaCrdt for GSet<A, T> {
    type State = ClockMap<A>;
    type Delta = GSetDelta<A, T>;

    fn state(&self) -> ClockMap<A> {
        self.elements.values().collect()
    }

    fn delta(&self, remote: Option<&ClockMap<A>>) -> GSetDelta<A, T> {
        let updates = match remote {
            None => self.elements.clone(),
            Some(known) => self
                .elements
                .iter()
                .filter(|(_, ts)| known.needs(ts))
                .map(|(v, ts)| (v.clone(), ts.clone()))
                .collect(),
        };
        GSetDelta { updates }
    }

    fn merge_delta(&self, delta: GSetDelta<A, T>) -> Result<Self, MergeError> {
        let mut copy = self.clone();
        for (value, incoming) in delta.updates {
            if incoming.actor == copy.current.actor && incoming.clock > copy.current.clock {
                copy.current.clock = incoming.clock;
            }
            match copy.elements.get(&value) {
                Some(existing) if *existing > incoming => {}
                _ => {
                    copy.elements.insert(value, incoming);
                }
            }
        }
        Ok(copy)
    }
}
