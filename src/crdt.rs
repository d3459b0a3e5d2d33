use crate::MergeError;

/// Core trait that every replicated type must implement: full-state merge.
///
/// A CRDT (Conflict-free Replicated Data Type) guarantees that concurrent
/// updates on different replicas converge to the same state after merging,
/// without coordination.
///
/// # Properties
///
/// All implementations must satisfy, for the visible content of the type:
/// - **Commutativity:** `a.merged(&b) == b.merged(&a)`
/// - **Associativity:** `a.merged(&b).merged(&c) == a.merged(&b.merged(&c))`
/// - **Idempotency:** `a.merged(&a) == a`
///
/// `merged` is total: it never fails, no matter how the two replicas
/// diverged.
pub trait Replicable {
    /// Return a new value holding the least upper bound of both states.
    ///
    /// Neither input is mutated.
    #[must_use]
    fn merged(&self, other: &Self) -> Self;

    /// Merge another replica's state into this one in place.
    ///
    /// The result is computed into a copy and only then committed, so `self`
    /// is never left partially merged.
    fn merge(&mut self, other: &Self)
    where
        Self: Sized,
    {
        *self = self.merged(other);
    }
}

/// Extension trait for delta-state replication.
///
/// Instead of shipping full state on every reconciliation, a replica first
/// sends a compact [`state`](DeltaCrdt::state) summary; the peer answers with
/// a [`delta`](DeltaCrdt::delta) containing only the entries the summary
/// cannot already derive. Applying that delta converges the requester with
/// the sender.
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let mut a = ORSet::new("a");
/// a.insert(1);
/// a.insert(2);
///
/// let mut b = ORSet::new("b");
/// b.insert(3);
///
/// // Two-phase handshake: b presents its state, a answers with a delta.
/// let delta = a.delta(Some(&b.state()));
/// b.apply_delta(delta).unwrap();
/// assert_eq!(b.len(), 3);
/// ```
///
/// See [Delta State Replicated Data Types](https://arxiv.org/abs/1603.01529)
/// and [Efficient Synchronization of State-based
/// CRDTs](https://arxiv.org/pdf/1803.02750.pdf) for the underlying theory.
pub trait DeltaCrdt: Replicable {
    /// The compact summary of what this replica has observed.
    ///
    /// Computed on demand, order-independent, and much smaller than the full
    /// data set.
    type State;

    /// A stand-alone partial record of metadata entries, sufficient to bring
    /// a receiver up to date relative to the state it provided.
    ///
    /// Deltas are produced fresh and share no storage with the value that
    /// produced them.
    type Delta;

    /// The current state summary of this replica.
    fn state(&self) -> Self::State;

    /// Compute the delta that brings a replica at `remote` state up to date
    /// with this one.
    ///
    /// With `None`, the returned delta represents the entire local state
    /// (the bootstrap case for a replica that has seen nothing yet).
    fn delta(&self, remote: Option<&Self::State>) -> Self::Delta;

    /// Return a new value with the delta merged in.
    ///
    /// Fails with [`MergeError::ConflictingHistory`] when an incoming record
    /// shares a causal position with a local record but disagrees on content,
    /// and with [`MergeError::InconsistentCausalTree`] when a causal-tree
    /// delta references an anchor the merged pool does not contain. A genuine
    /// conflict is reported, never silently resolved.
    fn merge_delta(&self, delta: Self::Delta) -> Result<Self, MergeError>
    where
        Self: Sized;

    /// Merge a delta into this replica in place.
    ///
    /// The merge is computed into a copy first; on error, `self` is left
    /// untouched.
    fn apply_delta(&mut self, delta: Self::Delta) -> Result<(), MergeError>
    where
        Self: Sized,
    {
        *self = self.merge_delta(delta)?;
        Ok(())
    }
}
