use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use crate::clock::{Actor, ClockMap, LamportTimestamp};
use crate::{DeltaCrdt, MergeError, Replicable};

/// One node of the causal tree behind a [`List`].
///
/// `anchor` is the id of the node this one was logically inserted after;
/// `None` anchors the node at the root of the tree. Every non-root node's
/// anchor must resolve to a node in the pool, active or tombstoned — a
/// violation is reported, never silently tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node<A, T> {
    /// The unique identifier of the node: the timestamp of its insertion.
    pub id: LamportTimestamp<A>,
    /// The id of the node this one logically follows, or `None` for the root.
    pub anchor: Option<LamportTimestamp<A>>,
    /// Whether the node has been tombstoned.
    pub is_deleted: bool,
    /// The list element carried by the node.
    pub value: T,
}

impl<A: Actor, T: Clone> Node<A, T> {
    /// Linearize an unordered pool of nodes into the deterministic causal
    /// tree order.
    ///
    /// Siblings (nodes sharing an anchor) are sorted descending by
    /// `(clock, actor)` so that later concurrent inserts at the same
    /// position come first; the tree is then emitted by pre-order
    /// traversal starting from the root group. Every replica computes the
    /// same order from the same pool, which is the key correctness
    /// property of the causal tree. Deleted nodes are kept in place here;
    /// callers filter them out to obtain the visible sequence.
    #[must_use]
    pub fn ordered(mut unordered: Vec<Self>) -> Vec<Self> {
        unordered.sort_by(|a, b| b.id.cmp(&a.id));

        // Group by anchor, preserving the descending sibling order.
        let mut children: BTreeMap<Option<LamportTimestamp<A>>, Vec<Self>> = BTreeMap::new();
        let total = unordered.len();
        for node in unordered {
            children.entry(node.anchor.clone()).or_default().push(node);
        }

        let mut result = Vec::with_capacity(total);
        let mut stack: Vec<Self> = Vec::new();
        if let Some(roots) = children.remove(&None) {
            // Reversed so the highest-priority sibling is popped first.
            stack.extend(roots.into_iter().rev());
        }
        while let Some(node) = stack.pop() {
            let id = node.id.clone();
            result.push(node);
            if let Some(kids) = children.remove(&Some(id)) {
                stack.extend(kids.into_iter().rev());
            }
        }
        result
    }

    /// Verify that a pool of nodes forms a complete, consistent causal tree:
    /// no duplicate ids, and every anchor resolvable within the pool.
    pub fn verify_consistency(nodes: &[Self]) -> Result<(), MergeError>
    where
        T: fmt::Debug,
    {
        let mut ids = BTreeSet::new();
        for node in nodes {
            if !ids.insert(&node.id) {
                return Err(MergeError::InconsistentCausalTree(format!(
                    "two nodes share the id {:?}",
                    node.id
                )));
            }
        }
        for node in nodes {
            if let Some(anchor) = &node.anchor {
                if !ids.contains(anchor) {
                    return Err(MergeError::InconsistentCausalTree(format!(
                        "node {:?} references anchor {:?}, which is missing from the pool",
                        node.id, anchor
                    )));
                }
            }
        }
        Ok(())
    }
}

/// An ordered sequence CRDT built as a causal tree stored in flat arrays.
///
/// Each element is a [`Node`] anchored to the element it was inserted
/// after. Removal tombstones the node rather than discarding it, so causal
/// ordering and conflict detection survive deletion; the tombstone pool
/// grows without bound by design. The visible sequence is recovered by the
/// deterministic linearization in [`Node::ordered`].
///
/// Based on the causal-tree design from "A comprehensive study of
/// Convergent and Commutative Replicated Data Types" by Shapiro, Preguiça,
/// Baquero, and Zawirski (2011).
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let a = List::from_values("a", ["a"]);
/// let b = List::from_values("b", ["h", "e", "l", "l", "o"]);
///
/// let merged = a.merged(&b);
/// assert_eq!(merged.to_vec(), vec!["h", "e", "l", "l", "o", "a"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct List<A: Actor, T: Clone> {
    current: LamportTimestamp<A>,
    active: Vec<Node<A, T>>,
    tombstones: Vec<Node<A, T>>,
}

/// State snapshot for [`List`]: per-actor maximum clocks, tracked separately
/// for active nodes and tombstones.
///
/// The two pools must stay separate: deletions do not advance the active
/// clock ceiling, and conflating them would let a receiver skip active
/// nodes it has never seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListState<A: Actor> {
    /// Maximum clock seen per actor across active nodes.
    pub active: ClockMap<A>,
    /// Maximum clock seen per actor across tombstones.
    pub tombstones: ClockMap<A>,
}

/// Delta for [`List`]: the nodes the remote could not derive, active and
/// tombstoned, computed independently per pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListDelta<A, T> {
    /// The nodes to replicate.
    pub nodes: Vec<Node<A, T>>,
}

impl<A, T> ListDelta<A, T> {
    fn max_clock(&self) -> u64
    where
        A: Actor,
    {
        self.nodes.iter().map(|n| n.id.clock).max().unwrap_or(0)
    }
}

/// Keep the first occurrence of each id, dropping later duplicates silently.
fn unique_by_id<A: Actor, T: Clone>(
    nodes: impl Iterator<Item = Node<A, T>>,
) -> Vec<Node<A, T>> {
    let mut seen = BTreeSet::new();
    nodes.filter(|n| seen.insert(n.id.clone())).collect()
}

/// Keep the first occurrence of each id; a later occurrence must be
/// identical to the first, anything else is a conflicting history.
fn unique_checked<A: Actor, T: Clone + PartialEq + fmt::Debug>(
    nodes: impl Iterator<Item = Node<A, T>>,
) -> Result<Vec<Node<A, T>>, MergeError> {
    let mut by_id: BTreeMap<LamportTimestamp<A>, usize> = BTreeMap::new();
    let mut result: Vec<Node<A, T>> = Vec::new();
    for node in nodes {
        match by_id.get(&node.id) {
            None => {
                by_id.insert(node.id.clone(), result.len());
                result.push(node);
            }
            Some(&index) => {
                let first = &result[index];
                if *first != node {
                    return Err(MergeError::ConflictingHistory(format!(
                        "nodes disagree under the id {:?}: kept {:?}, incoming {:?}",
                        node.id, first, node
                    )));
                }
            }
        }
    }
    Ok(result)
}

impl<A: Actor, T: Clone> List<A, T> {
    /// Create a new empty list for the given actor.
    pub fn new(actor: A) -> Self {
        Self::with_clock(actor, 0)
    }

    /// Create a new empty list with an explicit initial clock value.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            current: LamportTimestamp::with_clock(clock, actor),
            active: Vec::new(),
            tombstones: Vec::new(),
        }
    }

    /// Create a list pre-populated by appending the given values in order.
    pub fn from_values(actor: A, values: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new(actor);
        for value in values {
            list.push(value);
        }
        list
    }

    /// Insert a value at the given index in the visible sequence.
    ///
    /// The new node is anchored to the node currently at `index - 1`, or to
    /// the root when inserting at position 0.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.len()`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(
            index <= self.active.len(),
            "index {} out of bounds for length {}",
            index,
            self.active.len()
        );
        self.current.tick();
        let anchor = if index == 0 {
            None
        } else {
            Some(self.active[index - 1].id.clone())
        };
        let node = Node {
            id: self.current.clone(),
            anchor,
            is_deleted: false,
            value,
        };
        self.active.insert(index, node);
    }

    /// Append a value at the end of the visible sequence.
    pub fn push(&mut self, value: T) {
        self.insert(self.active.len(), value);
    }

    /// Remove the value at the given index, converting its node into a
    /// tombstone. The node is retained, never discarded.
    ///
    /// Returns the removed value, or `None` if the index is out of bounds.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.active.len() {
            return None;
        }
        let mut node = self.active.remove(index);
        node.is_deleted = true;
        let value = node.value.clone();
        self.tombstones.push(node);
        Some(value)
    }

    /// Overwrite the value at the given index.
    ///
    /// A write is remove-then-reinsert under fresh metadata, not an in-place
    /// mutation: the old node becomes a tombstone and a new node takes its
    /// position. Returns the replaced value, or `None` if the index is out
    /// of bounds.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        let old = self.remove(index)?;
        self.insert(index, value);
        Some(old)
    }

    /// The value at the given index in the visible sequence.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.active.get(index).map(|n| &n.value)
    }

    /// The number of visible (non-tombstoned) values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether the visible sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterate over the visible values in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.active.iter().map(|n| &n.value)
    }

    /// Collect the visible values into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// The number of retained tombstones.
    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.current.actor
    }

    /// Union the tombstones, drop and de-duplicate active nodes that the
    /// combined tombstones cover, and linearize what remains.
    fn merged_parts(
        &self,
        other_active: &[Node<A, T>],
        other_tombstones: &[Node<A, T>],
    ) -> (Vec<Node<A, T>>, Vec<Node<A, T>>) {
        let tombstones = unique_by_id(
            self.tombstones
                .iter()
                .chain(other_tombstones.iter())
                .cloned(),
        );
        let tombstone_ids: BTreeSet<LamportTimestamp<A>> =
            tombstones.iter().map(|n| n.id.clone()).collect();

        let candidates = self
            .active
            .iter()
            .chain(other_active.iter())
            .filter(|n| !tombstone_ids.contains(&n.id))
            .cloned();
        let mut pool = unique_by_id(candidates);
        pool.extend(tombstones.iter().cloned());

        let active = Node::ordered(pool)
            .into_iter()
            .filter(|n| !n.is_deleted)
            .collect();
        (active, tombstones)
    }
}

impl<A: Actor, T: Clone> Replicable for List<A, T> {
    fn merged(&self, other: &Self) -> Self {
        let (active, tombstones) = self.merged_parts(&other.active, &other.tombstones);
        let mut current = self.current.clone();
        current.clock = current.clock.max(other.current.clock);
        Self {
            current,
            active,
            tombstones,
        }
    }
}

impl<A: Actor, T: Clone + PartialEq + fmt::Debug> DeltaCrdt for List<A, T> {
    type State = ListState<A>;
    type Delta = ListDelta<A, T>;

    fn state(&self) -> ListState<A> {
        ListState {
            active: self.active.iter().map(|n| &n.id).collect(),
            tombstones: self.tombstones.iter().map(|n| &n.id).collect(),
        }
    }

    fn delta(&self, remote: Option<&ListState<A>>) -> ListDelta<A, T> {
        let nodes = match remote {
            None => self
                .active
                .iter()
                .chain(self.tombstones.iter())
                .cloned()
                .collect(),
            Some(state) => self
                .active
                .iter()
                .filter(|n| state.active.needs(&n.id))
                .chain(
                    self.tombstones
                        .iter()
                        .filter(|n| state.tombstones.needs(&n.id)),
                )
                .cloned()
                .collect(),
        };
        ListDelta { nodes }
    }

    fn merge_delta(&self, delta: ListDelta<A, T>) -> Result<Self, MergeError> {
        let max_clock = delta.max_clock();
        let (delta_tombstones, delta_active): (Vec<_>, Vec<_>) =
            delta.nodes.into_iter().partition(|n| n.is_deleted);

        let tombstones =
            unique_checked(self.tombstones.iter().cloned().chain(delta_tombstones))?;
        let tombstone_ids: BTreeSet<LamportTimestamp<A>> =
            tombstones.iter().map(|n| n.id.clone()).collect();

        let active = unique_checked(
            self.active
                .iter()
                .cloned()
                .chain(delta_active)
                .filter(|n| !tombstone_ids.contains(&n.id)),
        )?;

        let mut pool = active;
        pool.extend(tombstones.iter().cloned());
        Node::verify_consistency(&pool)?;

        let active = Node::ordered(pool)
            .into_iter()
            .filter(|n| !n.is_deleted)
            .collect();

        let mut current = self.current.clone();
        current.clock = current.clock.max(max_clock);
        Ok(Self {
            current,
            active,
            tombstones,
        })
    }
}
