//! Add-Wins Set CRDT (Observed-Remove Set).
//!
//! Each `add` generates a unique tag; `delete` only removes currently-observed
//! tags. Concurrent add and delete of the same element: add wins.

use crate::lattice::{DeltaCRDT, Lattice};
use serde::{Deserialize, Serialize};
use statefun_any::{AnyValue, ComparableKey};
use std::collections::{BTreeMap, BTreeSet};
use ulid::Ulid;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub replica_id: String,
    pub unique_id: Ulid,
}

impl Tag {
    pub fn new(replica_id: impl Into<String>) -> Self {
        Self {
            replica_id: replica_id.into(),
            unique_id: Ulid::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set {
    replica_id: String,
    /// Maps an element's comparable key to its current value and active tags.
    entries: BTreeMap<ComparableKey, (AnyValue, BTreeSet<Tag>)>,
    tombstones: BTreeSet<Tag>,
    #[serde(skip)]
    pending: Option<SetDelta>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDelta {
    pub cleared: bool,
    pub added: BTreeMap<ComparableKey, (AnyValue, BTreeSet<Tag>)>,
    pub removed: BTreeSet<Tag>,
}

impl Set {
    pub fn new(replica_id: impl Into<String>) -> Self {
        Self {
            replica_id: replica_id.into(),
            entries: BTreeMap::new(),
            tombstones: BTreeSet::new(),
            pending: None,
        }
    }

    fn delta_mut(&mut self) -> &mut SetDelta {
        self.pending.get_or_insert_with(SetDelta::default)
    }

    pub fn add(&mut self, value: AnyValue) {
        let key = value.to_comparable();
        let tag = Tag::new(self.replica_id.clone());
        self.entries
            .entry(key.clone())
            .or_insert_with(|| (value.clone(), BTreeSet::new()))
            .1
            .insert(tag.clone());
        self.delta_mut()
            .added
            .entry(key)
            .or_insert_with(|| (value, BTreeSet::new()))
            .1
            .insert(tag);
    }

    pub fn add_all(&mut self, values: impl IntoIterator<Item = AnyValue>) {
        for v in values {
            self.add(v);
        }
    }

    /// Deletes an element. When this removes the last remaining element, the
    /// observable delta collapses to `clear` rather than a targeted removal —
    /// preserved intentionally for compatibility with existing proxy behavior.
    pub fn delete(&mut self, value: &AnyValue) {
        let key = value.to_comparable();
        if !self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() == 1 {
            self.clear();
            return;
        }
        if let Some((_, tags)) = self.entries.remove(&key) {
            self.tombstones.extend(tags.iter().cloned());
            self.delta_mut().removed.extend(tags);
        }
    }

    pub fn clear(&mut self) {
        let all_tags: BTreeSet<Tag> = self
            .entries
            .values()
            .flat_map(|(_, tags)| tags.iter().cloned())
            .collect();
        self.tombstones.extend(all_tags);
        self.entries.clear();
        let delta = self.delta_mut();
        delta.cleared = true;
        delta.added.clear();
        delta.removed.clear();
    }

    pub fn has(&self, value: &AnyValue) -> bool {
        self.entries.contains_key(&value.to_comparable())
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnyValue> {
        self.entries.values().map(|(v, _)| v)
    }
}

impl Lattice for Set {
    fn bottom() -> Self {
        Self::new(String::new())
    }

    fn join(&self, other: &Self) -> Self {
        let mut result = Self::new(self.replica_id.clone());
        result.tombstones = self.tombstones.union(&other.tombstones).cloned().collect();

        let all_keys: BTreeSet<_> = self
            .entries
            .keys()
            .chain(other.entries.keys())
            .cloned()
            .collect();

        for key in all_keys {
            let mut merged_tags = BTreeSet::new();
            let mut value = None;
            if let Some((v, tags)) = self.entries.get(&key) {
                value = Some(v.clone());
                merged_tags.extend(tags.iter().filter(|t| !result.tombstones.contains(t)).cloned());
            }
            if let Some((v, tags)) = other.entries.get(&key) {
                value.get_or_insert_with(|| v.clone());
                merged_tags.extend(tags.iter().filter(|t| !result.tombstones.contains(t)).cloned());
            }
            if !merged_tags.is_empty() {
                result.entries.insert(key, (value.unwrap(), merged_tags));
            }
        }
        result
    }
}

impl Lattice for SetDelta {
    fn bottom() -> Self {
        Self::default()
    }

    fn join(&self, other: &Self) -> Self {
        let mut added = self.added.clone();
        for (k, (v, tags)) in &other.added {
            added
                .entry(k.clone())
                .or_insert_with(|| (v.clone(), BTreeSet::new()))
                .1
                .extend(tags.iter().cloned());
        }
        Self {
            cleared: self.cleared || other.cleared,
            added,
            removed: self.removed.union(&other.removed).cloned().collect(),
        }
    }
}

impl DeltaCRDT for Set {
    type Delta = SetDelta;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        self.pending.take()
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        if delta.cleared {
            let all_tags: BTreeSet<Tag> = self
                .entries
                .values()
                .flat_map(|(_, tags)| tags.iter().cloned())
                .collect();
            self.tombstones.extend(all_tags);
            self.entries.clear();
        }
        self.tombstones.extend(delta.removed.iter().cloned());
        for (key, (value, tags)) in &delta.added {
            let entry = self
                .entries
                .entry(key.clone())
                .or_insert_with(|| (value.clone(), BTreeSet::new()));
            for tag in tags {
                if !self.tombstones.contains(tag) {
                    entry.1.insert(tag.clone());
                }
            }
        }
        self.entries.retain(|_, (_, tags)| !tags.is_empty());
    }

    fn full_state_delta(&self) -> Self::Delta {
        SetDelta {
            cleared: false,
            added: self.entries.clone(),
            removed: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_has() {
        let mut s = Set::new("r1");
        s.add(AnyValue::encode_string("a"));
        assert!(s.has(&AnyValue::encode_string("a")));
        assert_eq!(s.size(), 1);
    }

    #[test]
    fn delete_last_collapses_to_clear() {
        let mut s = Set::new("r1");
        s.add(AnyValue::encode_string("a"));
        s.split_delta();
        s.delete(&AnyValue::encode_string("a"));
        let delta = s.split_delta().unwrap();
        assert!(delta.cleared);
        assert!(s.is_empty());
    }

    #[test]
    fn join_is_commutative() {
        let mut a = Set::new("a");
        a.add(AnyValue::encode_string("x"));
        let mut b = Set::new("b");
        b.add(AnyValue::encode_string("y"));
        assert_eq!(a.join(&b), b.join(&a));
    }

    #[test]
    fn initial_flush_reproduces_state() {
        let mut s = Set::new("r1");
        s.add(AnyValue::encode_string("a"));
        s.add(AnyValue::encode_string("b"));
        let delta = s.get_and_reset_delta(true).unwrap();
        let mut fresh = Set::bottom();
        fresh.apply_delta(&delta);
        assert_eq!(fresh.size(), s.size());
        assert!(fresh.has(&AnyValue::encode_string("a")));
    }
}
