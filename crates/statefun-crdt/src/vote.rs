//! Vote CRDT. Every replica contributes one boolean vote; the tallies
//! (`votes_for`, `total_voters`) are observed only — they arrive via inbound
//! deltas from the proxy, which aggregates votes across replicas. The
//! outbound delta carries only this node's own vote.

use crate::lattice::{DeltaCRDT, Lattice};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    self_vote: bool,
    votes_for: u64,
    total_voters: u64,
    #[serde(skip)]
    dirty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDelta {
    pub self_vote: bool,
    pub votes_for: u64,
    pub total_voters: u64,
}

impl Vote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote(&mut self, cast: bool) {
        if self.self_vote != cast {
            self.self_vote = cast;
            self.dirty = true;
        }
    }

    pub fn self_vote(&self) -> bool {
        self.self_vote
    }

    pub fn votes_for(&self) -> u64 {
        self.votes_for
    }

    pub fn total_voters(&self) -> u64 {
        self.total_voters
    }

    pub fn at_least_one(&self) -> bool {
        self.votes_for >= 1
    }

    pub fn majority(&self) -> bool {
        self.total_voters > 0 && self.votes_for * 2 > self.total_voters
    }

    pub fn all(&self) -> bool {
        self.total_voters > 0 && self.votes_for == self.total_voters
    }
}

impl Lattice for Vote {
    fn bottom() -> Self {
        Self::default()
    }

    fn join(&self, other: &Self) -> Self {
        // Tallies are proxy-maintained observations, not locally mergeable
        // state; the higher tally is assumed the more recent observation.
        Self {
            self_vote: self.self_vote || other.self_vote,
            votes_for: self.votes_for.max(other.votes_for),
            total_voters: self.total_voters.max(other.total_voters),
            dirty: false,
        }
    }
}

impl DeltaCRDT for Vote {
    type Delta = VoteDelta;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(VoteDelta {
            self_vote: self.self_vote,
            votes_for: self.votes_for,
            total_voters: self.total_voters,
        })
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        // Inbound deltas from the proxy carry the aggregated tallies; a
        // delta from this replica's own prior flush would also carry
        // self_vote, which is harmless to reapply.
        self.votes_for = delta.votes_for;
        self.total_voters = delta.total_voters;
    }

    fn full_state_delta(&self) -> Self::Delta {
        VoteDelta {
            self_vote: self.self_vote,
            votes_for: self.votes_for,
            total_voters: self.total_voters,
        }
    }
}

impl Lattice for VoteDelta {
    fn bottom() -> Self {
        Self {
            self_vote: false,
            votes_for: 0,
            total_voters: 0,
        }
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            self_vote: self.self_vote || other.self_vote,
            votes_for: self.votes_for.max(other.votes_for),
            total_voters: self.total_voters.max(other.total_voters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_vote_marks_dirty() {
        let mut v = Vote::new();
        assert_eq!(v.split_delta(), None);
        v.vote(true);
        assert!(v.self_vote());
        let d = v.split_delta().unwrap();
        assert!(d.self_vote);
        assert_eq!(v.split_delta(), None);
    }

    #[test]
    fn majority_and_all() {
        let mut v = Vote::new();
        v.apply_delta(&VoteDelta {
            self_vote: true,
            votes_for: 2,
            total_voters: 3,
        });
        assert!(v.at_least_one());
        assert!(v.majority());
        assert!(!v.all());
    }
}
