//! Last-Write-Wins Register CRDT.
//!
//! Stores an [`statefun_any::AnyValue`] tagged with a clock. The value with
//! the winning clock always survives a join; ties break on replica id, then
//! on the value's comparable key for full determinism.

use crate::lattice::{DeltaCRDT, Lattice};
use serde::{Deserialize, Serialize};
use statefun_any::AnyValue;

/// Governs how the numeric clock attached to a write is interpreted when two
/// writes race.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockKind {
    /// Wall-clock milliseconds; highest wins (ordinary LWW).
    Default,
    /// Wall-clock milliseconds; lowest wins — the earliest write survives.
    Reverse,
    /// Caller-supplied clock value; highest wins.
    Custom,
    /// Caller-supplied clock value, bumped to exceed the register's current
    /// clock if necessary so a replica's own write always advances.
    CustomAutoIncrement,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    replica_id: String,
    value: Option<AnyValue>,
    clock_kind: ClockKind,
    clock_value: u64,
    #[serde(skip)]
    pending: Option<RegisterDelta>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDelta {
    /// `None` means "this register has never been written" — distinct from
    /// a register whose value happens to decode to a falsy wrapper type.
    pub value: Option<AnyValue>,
    pub clock_kind: ClockKind,
    pub clock_value: u64,
    pub replica_id: String,
}

/// Rank used to compare two clocks regardless of kind: for `Reverse` the
/// natural order is inverted so the comparison stays a plain `u64` max.
fn effective_rank(kind: ClockKind, clock_value: u64) -> u64 {
    match kind {
        ClockKind::Reverse => u64::MAX - clock_value,
        ClockKind::Default | ClockKind::Custom | ClockKind::CustomAutoIncrement => clock_value,
    }
}

fn candidate_wins(
    candidate: (ClockKind, u64, &str, Option<&AnyValue>),
    incumbent: (ClockKind, u64, &str, Option<&AnyValue>),
) -> bool {
    let (c_kind, c_clock, c_replica, c_value) = candidate;
    let (i_kind, i_clock, i_replica, i_value) = incumbent;
    let c_rank = effective_rank(c_kind, c_clock);
    let i_rank = effective_rank(i_kind, i_clock);
    match c_rank.cmp(&i_rank) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match c_replica.cmp(i_replica) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                c_value.map(|v| v.to_comparable()) >= i_value.map(|v| v.to_comparable())
            }
        },
    }
}

impl Register {
    pub fn new(replica_id: impl Into<String>) -> Self {
        Self {
            replica_id: replica_id.into(),
            value: None,
            clock_kind: ClockKind::Default,
            clock_value: 0,
            pending: None,
        }
    }

    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Assign a new value under the given clock policy. `custom_value` is
    /// consulted only for `Custom`/`CustomAutoIncrement`.
    pub fn set_value(&mut self, value: AnyValue, clock: ClockKind, custom_value: u64) {
        let next_clock = match clock {
            ClockKind::Default | ClockKind::Reverse => now_millis(),
            ClockKind::Custom => custom_value,
            ClockKind::CustomAutoIncrement => custom_value.max(self.clock_value + 1),
        };

        let wins = candidate_wins(
            (clock, next_clock, &self.replica_id, Some(&value)),
            (self.clock_kind, self.clock_value, &self.replica_id, self.value.as_ref()),
        );
        if !wins {
            return;
        }
        self.value = Some(value.clone());
        self.clock_kind = clock;
        self.clock_value = next_clock;
        self.pending = Some(RegisterDelta {
            value: Some(value),
            clock_kind: clock,
            clock_value: next_clock,
            replica_id: self.replica_id.clone(),
        });
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

impl Lattice for Register {
    fn bottom() -> Self {
        Self::new(String::new())
    }

    fn join(&self, other: &Self) -> Self {
        let self_wins = candidate_wins(
            (self.clock_kind, self.clock_value, &self.replica_id, self.value.as_ref()),
            (other.clock_kind, other.clock_value, &other.replica_id, other.value.as_ref()),
        );
        if self_wins {
            self.clone()
        } else {
            other.clone()
        }
    }
}

impl DeltaCRDT for Register {
    type Delta = RegisterDelta;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        self.pending.take()
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        // A delta carrying no value came from a register that has never
        // been written; there's nothing to apply.
        let Some(candidate_value) = delta.value.clone() else {
            return;
        };
        let wins = candidate_wins(
            (delta.clock_kind, delta.clock_value, &delta.replica_id, Some(&candidate_value)),
            (self.clock_kind, self.clock_value, &self.replica_id, self.value.as_ref()),
        );
        if wins {
            self.value = Some(candidate_value);
            self.clock_kind = delta.clock_kind;
            self.clock_value = delta.clock_value;
        }
    }

    fn full_state_delta(&self) -> Self::Delta {
        RegisterDelta {
            value: self.value.clone(),
            clock_kind: self.clock_kind,
            clock_value: self.clock_value,
            replica_id: self.replica_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_custom_clock_wins() {
        let mut r = Register::new("r1");
        r.set_value(AnyValue::encode_i64(1), ClockKind::Custom, 10);
        r.set_value(AnyValue::encode_i64(2), ClockKind::Custom, 5);
        assert_eq!(r.value().unwrap().decode_i64().unwrap(), 1);
        r.set_value(AnyValue::encode_i64(3), ClockKind::Custom, 20);
        assert_eq!(r.value().unwrap().decode_i64().unwrap(), 3);
    }

    #[test]
    fn auto_increment_always_advances_self() {
        let mut r = Register::new("r1");
        r.set_value(AnyValue::encode_i64(1), ClockKind::CustomAutoIncrement, 0);
        r.set_value(AnyValue::encode_i64(2), ClockKind::CustomAutoIncrement, 0);
        assert_eq!(r.value().unwrap().decode_i64().unwrap(), 2);
    }

    #[test]
    fn join_is_idempotent() {
        let mut r = Register::new("r1");
        r.set_value(AnyValue::encode_i64(7), ClockKind::Custom, 1);
        let joined = r.join(&r);
        assert_eq!(joined, r);
    }

    #[test]
    fn initial_delta_reproduces_state() {
        let mut r = Register::new("r1");
        r.set_value(AnyValue::encode_i64(9), ClockKind::Custom, 3);
        let delta = r.get_and_reset_delta(true).unwrap();
        let mut fresh = Register::bottom();
        fresh.apply_delta(&delta);
        assert_eq!(fresh.value(), r.value());
    }

    #[test]
    fn never_written_register_initial_delta_stays_empty() {
        let mut r = Register::new("r1");
        let delta = r.get_and_reset_delta(true).unwrap();
        assert_eq!(delta.value, None);

        let mut fresh = Register::bottom();
        fresh.apply_delta(&delta);
        assert_eq!(fresh.value(), None);
        assert_eq!(fresh, Register::bottom());
    }
}
