use crate::clock::Actor;
use crate::{DeltaCrdt, MergeError, Replicable};

/// The replicated state of a [`PNCounter`]: one grow-only count for
/// increments and one for decrements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounterAtom {
    /// Total increments observed.
    pub increments: u64,
    /// Total decrements observed.
    pub decrements: u64,
}

impl PNCounterAtom {
    fn merged(&self, other: &Self) -> Self {
        Self {
            increments: self.increments.max(other.increments),
            decrements: self.decrements.max(other.decrements),
        }
    }
}

/// A positive-negative counter (PN-Counter).
///
/// Supports increment and decrement by tracking the two directions as
/// separate grow-only counts; the value is their difference. Arithmetic
/// saturates at the representable bounds instead of wrapping or failing:
/// each unsigned component clamps to `i64::MAX` before the subtraction,
/// and a counter constructed from `i64::MIN` clamps to a magnitude of
/// `i64::MIN + 1`, matching the asymmetry of two's-complement.
///
/// # Example
///
/// ```
/// use replica_kit::prelude::*;
///
/// let mut c1 = PNCounter::new("node-1");
/// c1.increment();
/// c1.increment();
/// c1.decrement();
/// assert_eq!(c1.value(), 1);
///
/// let mut c2 = PNCounter::new("node-2");
/// c2.decrement();
///
/// assert_eq!(c1.merged(&c2).value(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounter<A: Actor> {
    actor: A,
    atom: PNCounterAtom,
}

fn clamp_to_i64(value: u64) -> i64 {
    if value <= i64::MAX as u64 {
        value as i64
    } else {
        i64::MAX
    }
}

impl<A: Actor> PNCounter<A> {
    /// Create a new counter at zero for the given actor.
    pub fn new(actor: A) -> Self {
        Self {
            actor,
            atom: PNCounterAtom::default(),
        }
    }

    /// Create a new counter with a signed initial value.
    ///
    /// `i64::MIN` is clamped to a magnitude of `i64::MIN + 1`, the largest
    /// negative value whose absolute value is still representable after the
    /// clamping in [`value`](Self::value).
    pub fn with_value(actor: A, value: i64) -> Self {
        let atom = if value >= 0 {
            PNCounterAtom {
                increments: value as u64,
                decrements: 0,
            }
        } else {
            let magnitude = if value > i64::MIN {
                value.unsigned_abs()
            } else {
                (i64::MIN + 1).unsigned_abs()
            };
            PNCounterAtom {
                increments: 0,
                decrements: magnitude,
            }
        };
        Self { actor, atom }
    }

    /// Increment the counter by one, saturating at the representable bound.
    pub fn increment(&mut self) {
        self.increment_by(1);
    }

    /// Increment the counter by an arbitrary amount, saturating at the
    /// representable bound.
    pub fn increment_by(&mut self, amount: u64) {
        self.atom.increments = self.atom.increments.saturating_add(amount);
    }

    /// Decrement the counter by one, saturating at the representable bound.
    pub fn decrement(&mut self) {
        self.decrement_by(1);
    }

    /// Decrement the counter by an arbitrary amount, saturating at the
    /// representable bound.
    pub fn decrement_by(&mut self, amount: u64) {
        self.atom.decrements = self.atom.decrements.saturating_add(amount);
    }

    /// The counter's value: increments minus decrements, each side clamped
    /// to `i64::MAX` first.
    #[must_use]
    pub fn value(&self) -> i64 {
        clamp_to_i64(self.atom.increments) - clamp_to_i64(self.atom.decrements)
    }

    /// This replica's actor identity.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.actor
    }
}

impl<A: Actor> Replicable for PNCounter<A> {
    fn merged(&self, other: &Self) -> Self {
        Self {
            actor: self.actor.clone(),
            atom: self.atom.merged(&other.atom),
        }
    }
}

impl<A: Actor> DeltaCrdt for PNCounter<A> {
    type State = PNCounterAtom;
    type Delta = PNCounterAtom;

    fn state(&self) -> PNCounterAtom {
        self.atom
    }

    fn delta(&self, _remote: Option<&PNCounterAtom>) -> PNCounterAtom {
        self.atom
    }

    fn merge_delta(&self, delta: PNCounterAtom) -> Result<Self, MergeError> {
        Ok(Self {
            actor: self.actor.clone(),
            atom: self.atom.merged(&delta),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_counter_is_zero() {
        let c = PNCounter::new("a");
        assert_eq!(c.value(), 0);
    }

    #[test]
    fn increment_and_decrement() {
        let mut c = PNCounter::new("a");
        c.increment();
        c.increment();
        c.decrement();
        assert_eq!(c.value(), 1);
    }

    #[test]
    fn can_go_negative() {
        let mut c = PNCounter::new("a");
        c.decrement();
        c.decrement();
        assert_eq!(c.value(), -2);
    }

    #[test]
    fn with_positive_value() {
        let c = PNCounter::with_value("a", 42);
        assert_eq!(c.value(), 42);
    }

    #[test]
    fn with_negative_value() {
        let c = PNCounter::with_value("a", -42);
        assert_eq!(c.value(), -42);
    }

    #[test]
    fn most_negative_value_clamps() {
        let c = PNCounter::with_value("a", i64::MIN);
        assert_eq!(c.value(), i64::MIN + 1);
    }

    #[test]
    fn value_clamps_components() {
        let c = PNCounter {
            actor: "a",
            atom: PNCounterAtom {
                increments: u64::MAX,
                decrements: 0,
            },
        };
        assert_eq!(c.value(), i64::MAX);
    }

    #[test]
    fn merge_takes_componentwise_max() {
        let mut c1 = PNCounter::new("a");
        c1.increment();
        c1.increment();

        let mut c2 = PNCounter::new("b");
        c2.decrement();

        let merged = c1.merged(&c2);
        assert_eq!(merged.value(), 1);
        assert_eq!(c2.merged(&c1).value(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut c1 = PNCounter::new("a");
        c1.increment();
        let mut c2 = PNCounter::new("b");
        c2.decrement();

        let once = c1.merged(&c2);
        assert_eq!(once.merged(&c2), once);
    }

    #[test]
    fn delta_equivalent_to_full_merge() {
        let mut c1 = PNCounter::new("a");
        c1.increment();
        c1.increment();
        let mut c2 = PNCounter::new("b");
        c2.decrement();

        let full = c2.merged(&c1);
        let via_delta = c2.merge_delta(c1.delta(Some(&c2.state()))).unwrap();
        assert_eq!(full.value(), via_delta.value());
    }
}
