//! Tests for shipping replicas and deltas over a wire as JSON.

#![cfg(feature = "serde")]

use replica_kit::prelude::*;
use replica_kit::ListDelta;

#[test]
fn orset_survives_the_wire() {
    let mut set = ORSet::from_elements("device-1".to_string(), ["apple", "banana"]);
    set.remove(&"banana");

    let wire = serde_json::to_string(&set).unwrap();
    let restored: ORSet<String, &str> = serde_json::from_str(&wire).unwrap();

    assert_eq!(restored, set);
    assert!(restored.contains(&"apple"));
    assert!(!restored.contains(&"banana"));
}

#[test]
fn delta_handshake_over_json() {
    // The full two-phase exchange with both payloads serialized, the way a
    // sync service would actually run it.
    let mut source = ORMap::from_entries("server".to_string(), [("color", "red")]);
    source.insert("size", "large");
    source.remove(&"color");

    let receiver = ORMap::<String, &str, &str>::new("client".to_string());

    let state_wire = serde_json::to_string(&receiver.state()).unwrap();
    let state = serde_json::from_str(&state_wire).unwrap();

    let delta_wire = serde_json::to_string(&source.delta(Some(&state))).unwrap();
    let delta = serde_json::from_str(&delta_wire).unwrap();

    let synced = receiver.merge_delta(delta).unwrap();
    assert_eq!(synced.get(&"size"), Some(&"large"));
    assert_eq!(synced.get(&"color"), None);
}

#[test]
fn list_bootstrap_over_json() {
    let mut source = List::from_values("a".to_string(), ["h", "e", "l", "l", "o"]);
    source.remove(4);

    let wire = serde_json::to_string(&source.delta(None)).unwrap();
    let delta: ListDelta<String, &str> = serde_json::from_str(&wire).unwrap();

    let replica = List::new("b".to_string()).merge_delta(delta).unwrap();
    assert_eq!(replica.to_vec(), source.to_vec());
    assert_eq!(replica.tombstone_count(), 1);
}

#[test]
fn counters_survive_the_wire() {
    let mut pn = PNCounter::new("a".to_string());
    pn.increment_by(5);
    pn.decrement_by(7);

    let wire = serde_json::to_string(&pn).unwrap();
    let restored: PNCounter<String> = serde_json::from_str(&wire).unwrap();
    assert_eq!(restored, pn);
    assert_eq!(restored.value(), -2);
}

#[test]
fn register_timestamp_precision_survives_the_wire() {
    let reg = LWWRegister::with_timestamp("a".to_string(), 42, 1_700_000_000.123_456);

    let wire = serde_json::to_string(&reg).unwrap();
    let restored: LWWRegister<String, i32> = serde_json::from_str(&wire).unwrap();
    assert_eq!(restored, reg);
}
