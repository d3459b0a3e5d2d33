//! Shared machinery for the observed-remove collections.
//!
//! [`ORSet`](crate::ORSet) and [`ORMap`](crate::ORMap) keep one metadata
//! record per logical key and share, entry for entry, the same delta
//! computation and the same merge-delta conflict rule. Both live here, over
//! a generic key/value map, so the algorithm exists exactly once.

use core::fmt;
use std::collections::BTreeMap;

use crate::clock::{Actor, ClockMap, LamportTimestamp};
use crate::MergeError;

/// A metadata record for one logical key of an observed-remove collection.
///
/// Associates a value (or a tombstone marker) with the timestamp of the
/// operation that produced it. Records are immutable once created: a later
/// add, update, or remove replaces the record with a new one under a fresh
/// timestamp, it never edits in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry<A, V> {
    /// The timestamp of the operation that produced this record.
    pub timestamp: LamportTimestamp<A>,
    /// Whether the key is tombstoned. Tombstones are retained, never erased,
    /// so causal ordering and conflict detection survive deletion.
    pub is_deleted: bool,
    /// The value carried by the record. For sets this is `()` — the key is
    /// the value.
    pub value: V,
}

impl<A, V> Entry<A, V> {
    /// A live record stamped with the given timestamp.
    pub fn live(timestamp: LamportTimestamp<A>, value: V) -> Self {
        Self {
            timestamp,
            is_deleted: false,
            value,
        }
    }

    /// A tombstoned record stamped with the given timestamp.
    pub fn tombstone(timestamp: LamportTimestamp<A>, value: V) -> Self {
        Self {
            timestamp,
            is_deleted: true,
            value,
        }
    }
}

/// Per-actor maximum clocks across all records, live and tombstoned alike.
pub(crate) fn state_of<K, A: Actor, V>(entries: &BTreeMap<K, Entry<A, V>>) -> ClockMap<A> {
    entries.values().map(|e| &e.timestamp).collect()
}

/// The entries a remote replica cannot already derive from its clock map:
/// those from actors it has never heard of, plus those whose clock exceeds
/// its recorded maximum for that actor.
///
/// With no remote state, every entry is included (the bootstrap case).
pub(crate) fn delta_of<K, A, V>(
    entries: &BTreeMap<K, Entry<A, V>>,
    remote: Option<&ClockMap<A>>,
) -> BTreeMap<K, Entry<A, V>>
where
    K: Ord + Clone,
    A: Actor,
    V: Clone,
{
    match remote {
        None => entries.clone(),
        Some(known) => entries
            .iter()
            .filter(|(_, entry)| known.needs(&entry.timestamp))
            .map(|(k, entry)| (k.clone(), entry.clone()))
            .collect(),
    }
}

/// Full-state merge of two record maps: per key, the record with the greater
/// timestamp wins.
pub(crate) fn merged_entries<K, A, V>(
    local: &BTreeMap<K, Entry<A, V>>,
    remote: &BTreeMap<K, Entry<A, V>>,
) -> BTreeMap<K, Entry<A, V>>
where
    K: Ord + Clone,
    A: Actor,
    V: Clone,
{
    let mut result = local.clone();
    for (key, incoming) in remote {
        match result.get(key) {
            Some(existing) if existing.timestamp > incoming.timestamp => {}
            _ => {
                result.insert(key.clone(), incoming.clone());
            }
        }
    }
    result
}

/// Apply a delta to a record map under the canonical conflict rule.
///
/// Per incoming `(key, record)` pair:
/// - a strictly greater timestamp wins unconditionally;
/// - an equal timestamp is accepted only when deletion flag and value match
///   the local record — any disagreement is a genuine conflict and fails
///   with [`MergeError::ConflictingHistory`];
/// - a strictly smaller timestamp is redundant and ignored.
///
/// An incoming record stamped by the receiver's own actor with a clock ahead
/// of `current` advances `current` to that clock, so the receiver never
/// re-issues a clock value already used remotely.
pub(crate) fn merge_delta_into<K, A, V>(
    entries: &mut BTreeMap<K, Entry<A, V>>,
    current: &mut LamportTimestamp<A>,
    updates: BTreeMap<K, Entry<A, V>>,
) -> Result<(), MergeError>
where
    K: Ord + fmt::Debug,
    A: Actor,
    V: PartialEq + fmt::Debug,
{
    for (key, incoming) in updates {
        let incoming_ts = incoming.timestamp.clone();
        match entries.get(&key) {
            Some(local) => {
                if incoming.timestamp > local.timestamp {
                    entries.insert(key, incoming);
                } else if incoming.timestamp == local.timestamp {
                    if incoming.is_deleted != local.is_deleted || incoming.value != local.value {
                        return Err(MergeError::ConflictingHistory(format!(
                            "records for key {key:?} disagree under timestamp {incoming_ts:?}: \
                             local {local:?}, remote {incoming:?}"
                        )));
                    }
                }
                // Strictly older: redundant, nothing to do.
            }
            None => {
                entries.insert(key, incoming);
            }
        }
        if incoming_ts.actor == current.actor && incoming_ts.clock > current.clock {
            current.clock = incoming_ts.clock;
        }
    }
    Ok(())
}
