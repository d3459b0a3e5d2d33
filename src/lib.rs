//! # replica-kit
//!
//! Delta-state CRDTs for replicating data across devices without
//! coordination.
//!
//! A CRDT (Conflict-free Replicated Data Type) is a data structure that can
//! be replicated across multiple devices and updated independently. When
//! replicas are merged, they are guaranteed to converge to the same state
//! without requiring coordination or consensus.
//!
//! ## Quick Start
//!
//! ```
//! use replica_kit::prelude::*;
//!
//! let mut s1 = ORSet::new("device-1");
//! s1.insert("apple");
//!
//! let mut s2 = ORSet::new("device-2");
//! s2.insert("banana");
//! s2.remove(&"banana");
//!
//! s1.merge(&s2);
//! assert!(s1.contains(&"apple"));
//! assert!(!s1.contains(&"banana"));
//! ```
//!
//! ## Available CRDTs
//!
//! ### Counters
//! - [`GCounter`] - Grow-only counter (increment only)
//! - [`PNCounter`] - Positive-negative counter (increment and decrement)
//!
//! ### Registers
//! - [`LWWRegister`] - Last-writer-wins register (timestamp-based resolution)
//!
//! ### Collections
//! - [`GSet`] - Grow-only set (add only)
//! - [`ORSet`] - Observed-remove set (add and remove freely)
//! - [`ORMap`] - Observed-remove map (key/value dictionary)
//! - [`List`] - Ordered sequence backed by a causal tree
//!
//! ## The Convergence Traits
//!
//! All types implement [`Replicable`], whose [`Replicable::merged`] is total
//! and guaranteed to be commutative, associative, and idempotent. Every type
//! also implements [`DeltaCrdt`], the bandwidth-efficient two-phase
//! handshake: a receiver publishes a compact [`DeltaCrdt::state`] snapshot,
//! the sender answers with the minimal [`DeltaCrdt::delta`], and the
//! receiver folds it in with [`DeltaCrdt::merge_delta`]. Unlike full-state
//! merge, merging a delta can fail: a delta is a claim about a replica's
//! history, and a claim that contradicts local history is reported as a
//! [`MergeError`] instead of being silently absorbed.
//!
//! ## Actors and Clocks
//!
//! Every replica is owned by an [`Actor`]: any cloneable, ordered, hashable
//! identity such as a `&str`, an integer, or a UUID. Mutations are stamped
//! with [`LamportTimestamp`]s, ordered by clock first and actor second, so
//! any two timestamps are comparable and merges never depend on wall time.

#![warn(missing_docs)]

mod clock;
mod crdt;
mod error;
mod gcounter;
mod gset;
mod list;
mod observed;
mod ormap;
mod orset;
mod pncounter;
mod register;

pub mod prelude;

pub use clock::{Actor, ClockMap, LamportTimestamp, WallclockTimestamp};
pub use crdt::{DeltaCrdt, Replicable};
pub use error::MergeError;
pub use gcounter::GCounter;
pub use gset::{GSet, GSetDelta};
pub use list::{List, ListDelta, ListState, Node};
pub use observed::Entry;
pub use ormap::{ORMap, ORMapDelta};
pub use orset::{ORSet, ORSetDelta};
pub use pncounter::{PNCounter, PNCounterAtom};
pub use register::{LWWRegister, RegisterAtom};
