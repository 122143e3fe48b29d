//! Operation-based Counter CRDT.
//!
//! Tracks a signed 64-bit value. The delta is the net change since the last
//! flush — merging deltas is plain addition, which is commutative,
//! associative, and (for the zero delta) idempotent.

use crate::lattice::{DeltaCRDT, Lattice};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    value: i64,
    #[serde(skip)]
    pending: i64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn increment(&mut self, n: i64) {
        self.value += n;
        self.pending += n;
    }

    pub fn decrement(&mut self, n: i64) {
        self.increment(-n);
    }
}

impl Lattice for Counter {
    fn bottom() -> Self {
        Self::default()
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            value: self.value + other.value,
            pending: 0,
        }
    }
}

impl Lattice for i64 {
    fn bottom() -> Self {
        0
    }

    fn join(&self, other: &Self) -> Self {
        self + other
    }
}

impl DeltaCRDT for Counter {
    type Delta = i64;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        if self.pending == 0 {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        self.value += delta;
    }

    fn full_state_delta(&self) -> Self::Delta {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_then_decrement() {
        let mut c = Counter::new();
        c.increment(5);
        c.decrement(2);
        assert_eq!(c.value(), 3);
    }

    #[test]
    fn delta_accumulates_net_change() {
        let mut c = Counter::new();
        c.increment(5);
        c.decrement(2);
        assert_eq!(c.split_delta(), Some(3));
        assert_eq!(c.split_delta(), None);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut c = Counter::new();
        c.increment(5);
        c.decrement(2);
        let json = serde_json::to_string(&c).unwrap();
        let restored: Counter = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value(), 3);
    }

    #[test]
    fn apply_delta_is_additive_and_commutative() {
        let mut a = Counter::new();
        a.increment(3);
        let da = a.split_delta().unwrap();

        let mut b = Counter::new();
        b.apply_delta(&da);
        b.increment(7);
        let db = b.split_delta().unwrap();

        let mut replica_x = Counter::new();
        replica_x.apply_delta(&da);
        replica_x.apply_delta(&db);

        let mut replica_y = Counter::new();
        replica_y.apply_delta(&db);
        replica_y.apply_delta(&da);

        assert_eq!(replica_x.value(), replica_y.value());
        assert_eq!(replica_x.value(), 10);
    }
}
