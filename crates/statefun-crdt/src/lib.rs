//! Mergeable data types for Replicated Entities.
//!
//! Every CRDT here implements [`lattice::Lattice`] (the join-semilattice math
//! that proves convergence) and [`lattice::DeltaCRDT`] (the operational
//! `get_and_reset_delta` / `apply_delta` contract the host drives entities
//! through).

pub mod counter;
pub mod crdt_value;
pub mod error;
pub mod lattice;
pub mod map;
pub mod register;
pub mod set;
pub mod vote;

pub use counter::Counter;
pub use crdt_value::{CounterMap, CrdtKind, CrdtValue, CrdtValueDelta, Map, MultiMap, RegisterMap};
pub use error::CrdtError;
pub use lattice::{DeltaCRDT, Lattice};
pub use map::{GenericMap, MapDelta};
pub use register::{ClockKind, Register, RegisterDelta};
pub use set::{Set, SetDelta};
pub use vote::{Vote, VoteDelta};
