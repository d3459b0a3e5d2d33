//! Property-based tests for the merge laws.
//!
//! `merged` keeps the receiver's actor identity, so the laws are checked on
//! the visible content of each type rather than on full structural equality.

use proptest::prelude::*;
use replica_kit::prelude::*;

fn gcounter(actor: &'static str) -> impl Strategy<Value = GCounter<&'static str>> {
    (0u64..1_000).prop_map(move |n| {
        let mut c = GCounter::new(actor);
        c.increment_by(n);
        c
    })
}

fn pncounter(actor: &'static str) -> impl Strategy<Value = PNCounter<&'static str>> {
    (0u64..1_000, 0u64..1_000).prop_map(move |(ups, downs)| {
        let mut c = PNCounter::new(actor);
        c.increment_by(ups);
        c.decrement_by(downs);
        c
    })
}

fn orset(actor: &'static str) -> impl Strategy<Value = ORSet<&'static str, u8>> {
    (
        prop::collection::vec(any::<u8>(), 0..12),
        prop::collection::vec(any::<u8>(), 0..6),
    )
        .prop_map(move |(adds, removes)| {
            let mut s = ORSet::new(actor);
            for v in adds {
                s.insert(v);
            }
            for v in removes {
                s.remove(&v);
            }
            s
        })
}

fn list(actor: &'static str) -> impl Strategy<Value = List<&'static str, u8>> {
    (
        prop::collection::vec(any::<u8>(), 0..10),
        prop::collection::vec(any::<usize>(), 0..4),
    )
        .prop_map(move |(values, removals)| {
            let mut l = List::from_values(actor, values);
            for index in removals {
                if !l.is_empty() {
                    l.remove(index % l.len());
                }
            }
            l
        })
}

proptest! {
    #[test]
    fn gcounter_merge_commutes(a in gcounter("a"), b in gcounter("b")) {
        prop_assert_eq!(a.merged(&b).value(), b.merged(&a).value());
    }

    #[test]
    fn gcounter_merge_associates(
        a in gcounter("a"),
        b in gcounter("b"),
        c in gcounter("c"),
    ) {
        let left = a.merged(&b).merged(&c);
        let right = a.merged(&b.merged(&c));
        prop_assert_eq!(left.value(), right.value());
    }

    #[test]
    fn gcounter_merge_is_idempotent(a in gcounter("a"), b in gcounter("b")) {
        let once = a.merged(&b);
        prop_assert_eq!(once.merged(&b).value(), once.value());
    }

    #[test]
    fn pncounter_merge_commutes(a in pncounter("a"), b in pncounter("b")) {
        prop_assert_eq!(a.merged(&b).value(), b.merged(&a).value());
    }

    #[test]
    fn pncounter_merge_associates(
        a in pncounter("a"),
        b in pncounter("b"),
        c in pncounter("c"),
    ) {
        let left = a.merged(&b).merged(&c);
        let right = a.merged(&b.merged(&c));
        prop_assert_eq!(left.value(), right.value());
    }

    #[test]
    fn orset_merge_commutes(a in orset("a"), b in orset("b")) {
        let left: Vec<_> = a.merged(&b).iter().copied().collect();
        let right: Vec<_> = b.merged(&a).iter().copied().collect();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn orset_merge_associates(
        a in orset("a"),
        b in orset("b"),
        c in orset("c"),
    ) {
        let left: Vec<_> = a.merged(&b).merged(&c).iter().copied().collect();
        let right: Vec<_> = a.merged(&b.merged(&c)).iter().copied().collect();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn orset_merge_is_idempotent(a in orset("a"), b in orset("b")) {
        let once = a.merged(&b);
        prop_assert_eq!(once.merged(&b), once.clone());
        prop_assert_eq!(once.merged(&once), once);
    }

    #[test]
    fn orset_delta_sync_matches_full_merge(a in orset("a"), b in orset("b")) {
        let full: Vec<_> = b.merged(&a).iter().copied().collect();
        let synced = b.merge_delta(a.delta(Some(&b.state()))).unwrap();
        let synced: Vec<_> = synced.iter().copied().collect();
        prop_assert_eq!(full, synced);
    }

    #[test]
    fn list_merge_commutes(a in list("a"), b in list("b")) {
        prop_assert_eq!(a.merged(&b).to_vec(), b.merged(&a).to_vec());
    }

    #[test]
    fn list_merge_associates(a in list("a"), b in list("b"), c in list("c")) {
        let left = a.merged(&b).merged(&c);
        let right = a.merged(&b.merged(&c));
        prop_assert_eq!(left.to_vec(), right.to_vec());
    }

    #[test]
    fn list_merge_is_idempotent(a in list("a"), b in list("b")) {
        let once = a.merged(&b);
        prop_assert_eq!(once.merged(&b).to_vec(), once.to_vec());
        prop_assert_eq!(once.merged(&once).to_vec(), once.to_vec());
    }

    #[test]
    fn list_delta_sync_matches_full_merge(a in list("a"), b in list("b")) {
        let full = b.merged(&a);
        let synced = b.merge_delta(a.delta(Some(&b.state()))).unwrap();
        prop_assert_eq!(full.to_vec(), synced.to_vec());
    }

    #[test]
    fn list_bootstrap_reproduces_visible_sequence(a in list("a")) {
        let replica = List::<&str, u8>::new("b").merge_delta(a.delta(None)).unwrap();
        prop_assert_eq!(replica.to_vec(), a.to_vec());
    }
}
