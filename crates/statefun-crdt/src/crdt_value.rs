//! The heterogeneous CRDT union: the value type of the general-purpose `Map`,
//! and the top-level state type for a Replicated Entity, since either may be
//! initialized to any one of the eight supported kinds.

use crate::counter::Counter;
use crate::error::CrdtError;
use crate::lattice::{DeltaCRDT, Lattice};
use crate::map::{GenericMap, MapDelta};
use crate::register::{Register, RegisterDelta};
use crate::set::{Set, SetDelta};
use crate::vote::{Vote, VoteDelta};
use serde::{Deserialize, Serialize};

pub type CounterMap = GenericMap<Counter>;
pub type RegisterMap = GenericMap<Register>;
pub type MultiMap = GenericMap<Set>;
pub type Map = GenericMap<CrdtValue>;

/// Identifies a CRDT kind, as carried by an inbound delta envelope's tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrdtKind {
    Counter,
    Register,
    Set,
    Map,
    CounterMap,
    RegisterMap,
    MultiMap,
    Vote,
}

impl CrdtKind {
    /// Maps a wire envelope tag to a kind. Fails with `UnknownCrdtKind` if the
    /// tag matches none of the known kinds.
    pub fn from_tag(tag: &str) -> Result<Self, CrdtError> {
        Ok(match tag {
            "Counter" | "GCounter" | "PNCounter" => CrdtKind::Counter,
            "Register" | "LWWRegister" => CrdtKind::Register,
            "Set" | "ORSet" => CrdtKind::Set,
            "Map" | "ORMap" => CrdtKind::Map,
            "CounterMap" => CrdtKind::CounterMap,
            "RegisterMap" => CrdtKind::RegisterMap,
            "MultiMap" => CrdtKind::MultiMap,
            "Vote" => CrdtKind::Vote,
            other => return Err(CrdtError::UnknownCrdtKind(other.to_string())),
        })
    }

    /// The canonical wire tag for this kind, the inverse of [`Self::from_tag`].
    pub fn tag(self) -> &'static str {
        match self {
            CrdtKind::Counter => "Counter",
            CrdtKind::Register => "Register",
            CrdtKind::Set => "Set",
            CrdtKind::Map => "Map",
            CrdtKind::CounterMap => "CounterMap",
            CrdtKind::RegisterMap => "RegisterMap",
            CrdtKind::MultiMap => "MultiMap",
            CrdtKind::Vote => "Vote",
        }
    }

    /// Constructs a fresh, empty instance of this kind, for the caller to
    /// immediately `apply_delta` onto.
    pub fn construct(self, replica_id: &str) -> CrdtValue {
        match self {
            CrdtKind::Counter => CrdtValue::Counter(Counter::new()),
            CrdtKind::Register => CrdtValue::Register(Register::new(replica_id)),
            CrdtKind::Set => CrdtValue::Set(Set::new(replica_id)),
            CrdtKind::Map => CrdtValue::Map(Box::new(Map::new())),
            CrdtKind::CounterMap => CrdtValue::CounterMap(Box::new(CounterMap::new())),
            CrdtKind::RegisterMap => CrdtValue::RegisterMap(Box::new(RegisterMap::new())),
            CrdtKind::MultiMap => CrdtValue::MultiMap(Box::new(MultiMap::new())),
            CrdtKind::Vote => CrdtValue::Vote(Vote::new()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CrdtValue {
    Counter(Counter),
    Register(Register),
    Set(Set),
    Map(Box<Map>),
    CounterMap(Box<CounterMap>),
    RegisterMap(Box<RegisterMap>),
    MultiMap(Box<MultiMap>),
    Vote(Vote),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CrdtValueDelta {
    Counter(i64),
    Register(RegisterDelta),
    Set(SetDelta),
    Map(Box<MapDelta<CrdtValue>>),
    CounterMap(Box<MapDelta<Counter>>),
    RegisterMap(Box<MapDelta<Register>>),
    MultiMap(Box<MapDelta<Set>>),
    Vote(VoteDelta),
}

impl Lattice for CrdtValue {
    fn bottom() -> Self {
        CrdtValue::Counter(Counter::bottom())
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (CrdtValue::Counter(a), CrdtValue::Counter(b)) => CrdtValue::Counter(a.join(b)),
            (CrdtValue::Register(a), CrdtValue::Register(b)) => CrdtValue::Register(a.join(b)),
            (CrdtValue::Set(a), CrdtValue::Set(b)) => CrdtValue::Set(a.join(b)),
            (CrdtValue::Map(a), CrdtValue::Map(b)) => CrdtValue::Map(Box::new(a.join(b))),
            (CrdtValue::CounterMap(a), CrdtValue::CounterMap(b)) => {
                CrdtValue::CounterMap(Box::new(a.join(b)))
            }
            (CrdtValue::RegisterMap(a), CrdtValue::RegisterMap(b)) => {
                CrdtValue::RegisterMap(Box::new(a.join(b)))
            }
            (CrdtValue::MultiMap(a), CrdtValue::MultiMap(b)) => {
                CrdtValue::MultiMap(Box::new(a.join(b)))
            }
            (CrdtValue::Vote(a), CrdtValue::Vote(b)) => CrdtValue::Vote(a.join(b)),
            // Mismatched kinds cannot occur in practice: the kind is fixed at
            // construction and carried by every delta's tag.
            _ => self.clone(),
        }
    }
}

impl DeltaCRDT for CrdtValue {
    type Delta = CrdtValueDelta;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        match self {
            CrdtValue::Counter(v) => v.split_delta().map(CrdtValueDelta::Counter),
            CrdtValue::Register(v) => v.split_delta().map(CrdtValueDelta::Register),
            CrdtValue::Set(v) => v.split_delta().map(CrdtValueDelta::Set),
            CrdtValue::Map(v) => v.split_delta().map(|d| CrdtValueDelta::Map(Box::new(d))),
            CrdtValue::CounterMap(v) => v
                .split_delta()
                .map(|d| CrdtValueDelta::CounterMap(Box::new(d))),
            CrdtValue::RegisterMap(v) => v
                .split_delta()
                .map(|d| CrdtValueDelta::RegisterMap(Box::new(d))),
            CrdtValue::MultiMap(v) => v
                .split_delta()
                .map(|d| CrdtValueDelta::MultiMap(Box::new(d))),
            CrdtValue::Vote(v) => v.split_delta().map(CrdtValueDelta::Vote),
        }
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        match (self, delta) {
            (CrdtValue::Counter(v), CrdtValueDelta::Counter(d)) => v.apply_delta(d),
            (CrdtValue::Register(v), CrdtValueDelta::Register(d)) => v.apply_delta(d),
            (CrdtValue::Set(v), CrdtValueDelta::Set(d)) => v.apply_delta(d),
            (CrdtValue::Map(v), CrdtValueDelta::Map(d)) => v.apply_delta(d),
            (CrdtValue::CounterMap(v), CrdtValueDelta::CounterMap(d)) => v.apply_delta(d),
            (CrdtValue::RegisterMap(v), CrdtValueDelta::RegisterMap(d)) => v.apply_delta(d),
            (CrdtValue::MultiMap(v), CrdtValueDelta::MultiMap(d)) => v.apply_delta(d),
            (CrdtValue::Vote(v), CrdtValueDelta::Vote(d)) => v.apply_delta(d),
            _ => {} // kind mismatch: ignored, see `join`'s note
        }
    }

    fn full_state_delta(&self) -> Self::Delta {
        match self {
            CrdtValue::Counter(v) => CrdtValueDelta::Counter(v.full_state_delta()),
            CrdtValue::Register(v) => CrdtValueDelta::Register(v.full_state_delta()),
            CrdtValue::Set(v) => CrdtValueDelta::Set(v.full_state_delta()),
            CrdtValue::Map(v) => CrdtValueDelta::Map(Box::new(v.full_state_delta())),
            CrdtValue::CounterMap(v) => CrdtValueDelta::CounterMap(Box::new(v.full_state_delta())),
            CrdtValue::RegisterMap(v) => {
                CrdtValueDelta::RegisterMap(Box::new(v.full_state_delta()))
            }
            CrdtValue::MultiMap(v) => CrdtValueDelta::MultiMap(Box::new(v.full_state_delta())),
            CrdtValue::Vote(v) => CrdtValueDelta::Vote(v.full_state_delta()),
        }
    }
}

impl Lattice for CrdtValueDelta {
    fn bottom() -> Self {
        CrdtValueDelta::Counter(0)
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (CrdtValueDelta::Counter(a), CrdtValueDelta::Counter(b)) => {
                CrdtValueDelta::Counter(a.join(b))
            }
            _ => self.clone(),
        }
    }
}

impl CrdtValue {
    pub fn kind(&self) -> CrdtKind {
        match self {
            CrdtValue::Counter(_) => CrdtKind::Counter,
            CrdtValue::Register(_) => CrdtKind::Register,
            CrdtValue::Set(_) => CrdtKind::Set,
            CrdtValue::Map(_) => CrdtKind::Map,
            CrdtValue::CounterMap(_) => CrdtKind::CounterMap,
            CrdtValue::RegisterMap(_) => CrdtKind::RegisterMap,
            CrdtValue::MultiMap(_) => CrdtKind::MultiMap,
            CrdtValue::Vote(_) => CrdtKind::Vote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statefun_any::AnyValue;

    #[test]
    fn unknown_kind_tag_fails() {
        assert!(CrdtKind::from_tag("Bogus").is_err());
    }

    #[test]
    fn factory_roundtrip_initial_delta() {
        let mut c = CrdtKind::Counter.construct("r1");
        if let CrdtValue::Counter(counter) = &mut c {
            counter.increment(4);
        }
        let delta = c.get_and_reset_delta(true).unwrap();
        let mut fresh = CrdtKind::Counter.construct("r2");
        fresh.apply_delta(&delta);
        assert_eq!(fresh, c);
    }

    #[test]
    fn heterogeneous_map_holds_mixed_kinds() {
        let mut m: Map = Map::new();
        let k1 = AnyValue::encode_string("counter-key");
        let k2 = AnyValue::encode_string("set-key");
        m.set(k1.clone(), CrdtKind::Counter.construct("r1"));
        m.set(k2.clone(), CrdtKind::Set.construct("r1"));
        assert!(matches!(m.get(&k1), Some(CrdtValue::Counter(_))));
        assert!(matches!(m.get(&k2), Some(CrdtValue::Set(_))));
    }
}
