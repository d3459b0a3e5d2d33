//! Causal clocks: Lamport and wall-clock timestamps with deterministic
//! tie-breaking, and the per-actor clock compaction map used to compute
//! minimal deltas.
//!
//! Every mutation of a replicated type is stamped with a timestamp. Two
//! timestamps from different actors can carry the same clock value; the
//! actor identity breaks the tie so that ordering is total and every
//! replica resolves concurrent updates the same way.
//!
//! # Example
//!
//! ```
//! use replica_kit::LamportTimestamp;
//!
//! let mut ts = LamportTimestamp::new("device-1");
//! ts.tick();
//! ts.tick();
//! assert_eq!(ts.clock, 2);
//!
//! let other = LamportTimestamp::with_clock(2, "device-2");
//! // Same clock value: the actor id decides the order.
//! assert!(ts < other);
//! ```

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// An actor identity: an opaque, totally-ordered, hashable value naming one
/// logical replica.
///
/// The identity is always supplied by the application; the library never
/// infers it. Any `Clone + Ord + Hash + Debug` type qualifies — strings and
/// integers are typical choices.
pub trait Actor: Clone + Ord + Hash + fmt::Debug {}

impl<A: Clone + Ord + Hash + fmt::Debug> Actor for A {}

/// A Lamport timestamp: a logical clock paired with the actor that issued it.
///
/// Timestamps are compared by `clock` first and by `actor` when the clocks
/// are identical, which happens whenever two replicas update "at the same
/// time". The derived ordering satisfies reflexivity, antisymmetry, and
/// transitivity, so it can serve directly as the merge ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LamportTimestamp<A> {
    /// The logical clock value. 64 bits is treated as practically unbounded.
    pub clock: u64,
    /// The identity of the actor that issued this timestamp.
    pub actor: A,
}

impl<A> LamportTimestamp<A> {
    /// Create a timestamp at clock zero for the given actor.
    pub fn new(actor: A) -> Self {
        Self { clock: 0, actor }
    }

    /// Create a timestamp with an explicit initial clock value.
    pub fn with_clock(clock: u64, actor: A) -> Self {
        Self { clock, actor }
    }

    /// Advance the clock by exactly one unit.
    ///
    /// This is the only way a clock advances locally, and it must happen on
    /// every local mutation of the type holding the timestamp.
    pub fn tick(&mut self) {
        self.clock += 1;
    }
}

impl<A: fmt::Display> fmt::Display for LamportTimestamp<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.clock, self.actor)
    }
}

/// A wall-clock timestamp: seconds since the Unix epoch paired with the
/// actor that issued it.
///
/// Used where "last writer" must mean real time rather than causal order,
/// as in [`LWWRegister`](crate::LWWRegister). The tie-break rule is the same
/// as for [`LamportTimestamp`]: identical clock readings are ordered by
/// actor identity.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallclockTimestamp<A> {
    /// Seconds since the Unix epoch.
    pub clock: f64,
    /// The identity of the actor that issued this timestamp.
    pub actor: A,
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

impl<A> WallclockTimestamp<A> {
    /// Create a timestamp for the given actor stamped with the current time.
    pub fn now(actor: A) -> Self {
        Self {
            clock: unix_seconds(),
            actor,
        }
    }

    /// Create a timestamp with an explicit wall-clock reading.
    pub fn with_clock(clock: f64, actor: A) -> Self {
        Self { clock, actor }
    }
}

impl<A: PartialEq> PartialEq for WallclockTimestamp<A> {
    fn eq(&self, other: &Self) -> bool {
        self.clock.to_bits() == other.clock.to_bits() && self.actor == other.actor
    }
}

impl<A: Eq> Eq for WallclockTimestamp<A> {}

impl<A: Hash> Hash for WallclockTimestamp<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.clock.to_bits().hash(state);
        self.actor.hash(state);
    }
}

impl<A: Ord> Ord for WallclockTimestamp<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.clock
            .total_cmp(&other.clock)
            .then_with(|| self.actor.cmp(&other.actor))
    }
}

impl<A: Ord> PartialOrd for WallclockTimestamp<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: fmt::Display> fmt::Display for WallclockTimestamp<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.clock, self.actor)
    }
}

/// The highest clock value observed per actor.
///
/// This is the compaction state behind every delta computation on the
/// observed-remove collections and the causal-tree list: a replica summarizes
/// what it has seen as one maximum clock per actor, and the sender includes
/// exactly the entries the summary cannot already derive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockMap<A: Actor> {
    max_clock_by_actor: BTreeMap<A, u64>,
}

impl<A: Actor> ClockMap<A> {
    /// Create an empty clock map.
    pub fn new() -> Self {
        Self {
            max_clock_by_actor: BTreeMap::new(),
        }
    }

    /// Record a timestamp, keeping the maximum clock value seen per actor.
    pub fn observe(&mut self, timestamp: &LamportTimestamp<A>) {
        let entry = self
            .max_clock_by_actor
            .entry(timestamp.actor.clone())
            .or_insert(timestamp.clock);
        *entry = (*entry).max(timestamp.clock);
    }

    /// Whether the replica summarized by this map still needs an entry
    /// stamped with the given timestamp.
    ///
    /// True when the map has never heard from the timestamp's actor, or when
    /// the recorded maximum for that actor is strictly less than the
    /// timestamp's clock.
    #[must_use]
    pub fn needs(&self, timestamp: &LamportTimestamp<A>) -> bool {
        match self.max_clock_by_actor.get(&timestamp.actor) {
            Some(&max) => timestamp.clock > max,
            None => true,
        }
    }

    /// The recorded maximum clock for an actor, if any entry from that actor
    /// has been observed.
    #[must_use]
    pub fn get(&self, actor: &A) -> Option<u64> {
        self.max_clock_by_actor.get(actor).copied()
    }

    /// The number of actors recorded in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.max_clock_by_actor.len()
    }

    /// Whether no actor has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_clock_by_actor.is_empty()
    }
}

impl<'a, A: Actor> FromIterator<&'a LamportTimestamp<A>> for ClockMap<A> {
    fn from_iter<I: IntoIterator<Item = &'a LamportTimestamp<A>>>(iter: I) -> Self {
        let mut map = Self::new();
        for ts in iter {
            map.observe(ts);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_by_one() {
        let mut ts = LamportTimestamp::new("a");
        assert_eq!(ts.clock, 0);
        ts.tick();
        ts.tick();
        assert_eq!(ts.clock, 2);
    }

    #[test]
    fn clock_orders_before_actor() {
        let a = LamportTimestamp::with_clock(1, "z");
        let b = LamportTimestamp::with_clock(2, "a");
        assert!(a < b);
    }

    #[test]
    fn actor_breaks_clock_ties() {
        let a = LamportTimestamp::with_clock(3, "a");
        let b = LamportTimestamp::with_clock(3, "b");
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn equality_requires_clock_and_actor() {
        let a = LamportTimestamp::with_clock(3, "a");
        let b = LamportTimestamp::with_clock(3, "a");
        let c = LamportTimestamp::with_clock(3, "b");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ordering_is_transitive() {
        let a = LamportTimestamp::with_clock(1, "a");
        let b = LamportTimestamp::with_clock(1, "b");
        let c = LamportTimestamp::with_clock(2, "a");
        assert!(a <= b);
        assert!(b <= c);
        assert!(a <= c);
    }

    #[test]
    fn display_format() {
        let ts = LamportTimestamp::with_clock(7, "x");
        assert_eq!(ts.to_string(), "[7-x]");
    }

    #[test]
    fn wallclock_orders_by_time_then_actor() {
        let a = WallclockTimestamp::with_clock(100.0, "b");
        let b = WallclockTimestamp::with_clock(100.5, "a");
        let c = WallclockTimestamp::with_clock(100.5, "b");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn wallclock_now_is_monotone_enough() {
        let a = WallclockTimestamp::now("a");
        let b = WallclockTimestamp::now("a");
        assert!(a <= b);
    }

    #[test]
    fn clock_map_records_maximum() {
        let mut map = ClockMap::new();
        map.observe(&LamportTimestamp::with_clock(2, "a"));
        map.observe(&LamportTimestamp::with_clock(5, "a"));
        map.observe(&LamportTimestamp::with_clock(3, "a"));
        map.observe(&LamportTimestamp::with_clock(1, "b"));
        assert_eq!(map.get(&"a"), Some(5));
        assert_eq!(map.get(&"b"), Some(1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn needs_unknown_actor() {
        let map: ClockMap<&str> = [&LamportTimestamp::with_clock(4, "a")].into_iter().collect();
        assert!(map.needs(&LamportTimestamp::with_clock(1, "b")));
    }

    #[test]
    fn needs_strictly_newer_clock() {
        let map: ClockMap<&str> = [&LamportTimestamp::with_clock(4, "a")].into_iter().collect();
        assert!(map.needs(&LamportTimestamp::with_clock(5, "a")));
        assert!(!map.needs(&LamportTimestamp::with_clock(4, "a")));
        assert!(!map.needs(&LamportTimestamp::with_clock(3, "a")));
    }
}
