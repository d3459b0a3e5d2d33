use crate::clock::{Actor, WallclockTimestamp};
use crate::{DeltaCrdt, MergeError, Replicable};

/// The replicated state of an [`LWWRegister`]: a value stamped with the
/// wall-clock timestamp of the write that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterAtom<A, T> {
    /// The written value.
    pub value: T,
    /// When, and by whom, the value was written.
    pub timestamp: WallclockTimestamp<A>,
}

/// A last-writer-wins register.
///
/// Holds a single value; the write with the latest wall-clock timestamp
/// wins, with the actor identity breaking exact ties. Wall-clock time is
/// used here deliberately — "last writer" means real time, not causal
/// order.
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let mut r = LWWRegister::new("editor-1", "draft");
/// r.set("final");
/// assert_eq!(r.value(), &"final");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LWWRegister<A: Actor, T: Clone> {
    actor: A,
    atom: RegisterAtom<A, T>,
}

impl<A: Actor, T: Clone> LWWRegister<A, T> {
    /// Create a register holding `value`, stamped with the current time.
    pub fn new(actor: A, value: T) -> Self {
        let timestamp = WallclockTimestamp::now(actor.clone());
        Self {
            actor,
            atom: RegisterAtom { value, timestamp },
        }
    }

    /// Create a register with an explicit wall-clock reading, for callers
    /// that supply their own time source.
    pub fn with_timestamp(actor: A, value: T, seconds: f64) -> Self {
        let timestamp = WallclockTimestamp::with_clock(seconds, actor.clone());
        Self {
            actor,
            atom: RegisterAtom { value, timestamp },
        }
    }

    /// The register's current value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.atom.value
    }

    /// Overwrite the value, stamping it with the current time.
    pub fn set(&mut self, value: T) {
        self.atom = RegisterAtom {
            value,
            timestamp: WallclockTimestamp::now(self.actor.clone()),
        };
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.actor
    }

    fn newer_atom(&self, candidate: &RegisterAtom<A, T>) -> RegisterAtom<A, T> {
        if self.atom.timestamp <= candidate.timestamp {
            candidate.clone()
        } else {
            self.atom.clone()
        }
    }
}

impl<A: Actor, T: Clone> Replicable for LWWRegister<A, T> {
    fn merged(&self, other: &Self) -> Self {
        Self {
            actor: self.actor.clone(),
            atom: self.newer_atom(&other.atom),
        }
    }
}

impl<A: Actor, T: Clone> DeltaCrdt for LWWRegister<A, T> {
    type State = RegisterAtom<A, T>;
    type Delta = RegisterAtom<A, T>;

    fn state(&self) -> RegisterAtom<A, T> {
        self.atom.clone()
    }

    fn delta(&self, _remote: Option<&RegisterAtom<A, T>>) -> RegisterAtom<A, T> {
        self.atom.clone()
    }

    fn merge_delta(&self, delta: RegisterAtom<A, T>) -> Result<Self, MergeError> {
        Ok(Self {
            actor: self.actor.clone(),
            atom: self.newer_atom(&delta),
        })
    }
}
