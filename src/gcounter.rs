use crate::clock::Actor;
use crate::{DeltaCrdt, MergeError, Replicable};

/// A grow-only counter (G-Counter).
///
/// The simplest worked example of state-based convergence: each replica
/// holds a single count, merge keeps the maximum, and the counter can only
/// grow. Incrementing saturates at `u64::MAX` rather than wrapping.
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let c1 = GCounter::with_value("x", 1);
/// let c2 = GCounter::with_value("y", 2);
///
/// let merged = c1.merged(&c2);
/// assert_eq!(merged.value(), 2);
/// // Merging back changes nothing.
/// assert_eq!(merged.merged(&c1).value(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GCounter<A: Actor> {
    actor: A,
    count: u64,
}

impl<A: Actor> GCounter<A> {
    /// Create a new counter at zero for the given actor.
    pub fn new(actor: A) -> Self {
        Self { actor, count: 0 }
    }

    /// Create a new counter with an initial value.
    pub fn with_value(actor: A, value: u64) -> Self {
        Self {
            actor,
            count: value,
        }
    }

    /// Increment the counter by one, saturating at `u64::MAX`.
    pub fn increment(&mut self) {
        self.increment_by(1);
    }

    /// Increment the counter by an arbitrary amount, saturating at
    /// `u64::MAX`.
    pub fn increment_by(&mut self, amount: u64) {
        self.count = self.count.saturating_add(amount);
    }

    /// The counter's value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.count
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.actor
    }
}

impl<A: Actor> Replicable for GCounter<A> {
    fn merged(&self, other: &Self) -> Self {
        Self {
            actor: self.actor.clone(),
            count: self.count.max(other.count),
        }
    }
}

impl<A: Actor> DeltaCrdt for GCounter<A> {
    type State = u64;
    type Delta = u64;

    fn state(&self) -> u64 {
        self.count
    }

    fn delta(&self, _remote: Option<&u64>) -> u64 {
        self.count
    }

    fn merge_delta(&self, delta: u64) -> Result<Self, MergeError> {
        Ok(Self {
            actor: self.actor.clone(),
            count: self.count.max(delta),
        })
    }
}
