use thiserror::Error;

/// Errors raised while merging a delta into a replica.
///
/// Only [`DeltaCrdt::merge_delta`](crate::DeltaCrdt::merge_delta) and
/// [`DeltaCrdt::apply_delta`](crate::DeltaCrdt::apply_delta) can fail;
/// full-state [`Replicable::merged`](crate::Replicable::merged) is total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Two metadata records share a Lamport timestamp (same actor, same
    /// clock) but disagree on deletion flag or value.
    ///
    /// This implies an actor issued two different updates under one clock
    /// value — a clock-discipline bug upstream. It is surfaced rather than
    /// auto-resolved because silently picking a winner would hide that bug.
    #[error("conflicting history: {0}")]
    ConflictingHistory(String),

    /// A causal-tree merge would produce a node whose anchor does not
    /// resolve anywhere in the merged pool, active or tombstoned.
    ///
    /// A malformed or truncated delta can reference a parent the receiver
    /// never saw; the tree cannot be linearized in that state, so the merge
    /// is rejected before any state is committed.
    #[error("inconsistent causal tree: {0}")]
    InconsistentCausalTree(String),
}
