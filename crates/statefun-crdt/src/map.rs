//! Generic keyed CRDT container. A [`GenericMap`] maps a comparable key to a
//! nested CRDT value of type `V`; merging a map merges each entry's value
//! with its type's own join, plus set semantics over the key space.
//!
//! [`crate::CounterMap`], [`crate::RegisterMap`], and [`crate::MultiMap`] are
//! this type specialized to `Counter`, `Register`, and `Set` respectively.
//! The heterogeneous `Map` in [`crate::any_value::CrdtValue`] specializes it
//! to a tagged union so a single map can hold differently-kinded nested
//! CRDTs.

use crate::lattice::{DeltaCRDT, Lattice};
use statefun_any::{AnyValue, ComparableKey};
use std::collections::{BTreeMap, BTreeSet};

use serde::de::Deserialize;
use serde::ser::{Serialize, SerializeStruct};

#[derive(Clone, Debug, PartialEq)]
pub struct GenericMap<V: DeltaCRDT + Clone + PartialEq> {
    entries: BTreeMap<ComparableKey, (AnyValue, V)>,
    added_this_flush: BTreeSet<ComparableKey>,
    removed_this_flush: BTreeSet<ComparableKey>,
    cleared_this_flush: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapDelta<V: DeltaCRDT> {
    pub cleared: bool,
    pub removed: BTreeSet<ComparableKey>,
    pub added: BTreeMap<ComparableKey, (AnyValue, V::Delta)>,
    pub updated: BTreeMap<ComparableKey, V::Delta>,
}

impl<V: DeltaCRDT> Default for MapDelta<V> {
    fn default() -> Self {
        Self {
            cleared: false,
            removed: BTreeSet::new(),
            added: BTreeMap::new(),
            updated: BTreeMap::new(),
        }
    }
}

// `BTreeMap<ComparableKey, _>` doesn't round-trip through `serde_json`
// directly (JSON object keys must be strings), so these are hand-written
// rather than derived: each collection is carried on the wire as a plain
// sequence of pairs/triples and rebuilt into a map on the way back in.
impl<V: DeltaCRDT> Serialize for MapDelta<V>
where
    V::Delta: Serialize,
{
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let removed: Vec<&ComparableKey> = self.removed.iter().collect();
        let added: Vec<(&ComparableKey, &AnyValue, &V::Delta)> =
            self.added.iter().map(|(k, (av, d))| (k, av, d)).collect();
        let updated: Vec<(&ComparableKey, &V::Delta)> = self.updated.iter().collect();

        let mut state = serializer.serialize_struct("MapDelta", 4)?;
        state.serialize_field("cleared", &self.cleared)?;
        state.serialize_field("removed", &removed)?;
        state.serialize_field("added", &added)?;
        state.serialize_field("updated", &updated)?;
        state.end()
    }
}

impl<'de, V: DeltaCRDT> Deserialize<'de> for MapDelta<V>
where
    V::Delta: Deserialize<'de>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(bound(deserialize = "Delta: serde::Deserialize<'de>"))]
        struct Raw<Delta> {
            cleared: bool,
            removed: Vec<ComparableKey>,
            added: Vec<(ComparableKey, AnyValue, Delta)>,
            updated: Vec<(ComparableKey, Delta)>,
        }

        let raw = Raw::<V::Delta>::deserialize(deserializer)?;
        Ok(MapDelta {
            cleared: raw.cleared,
            removed: raw.removed.into_iter().collect(),
            added: raw.added.into_iter().map(|(k, av, d)| (k, (av, d))).collect(),
            updated: raw.updated.into_iter().collect(),
        })
    }
}

impl<V: DeltaCRDT + Clone + PartialEq> GenericMap<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            added_this_flush: BTreeSet::new(),
            removed_this_flush: BTreeSet::new(),
            cleared_this_flush: false,
        }
    }

    pub fn get(&self, key: &AnyValue) -> Option<&V> {
        self.entries.get(&key.to_comparable()).map(|(_, v)| v)
    }

    /// Mutable access to an existing key only; does not itself track the
    /// entry as modified — `flush` collects each live entry's own pending
    /// delta, so mutations made through this reference are still captured.
    pub fn get_mut(&mut self, key: &AnyValue) -> Option<&mut V> {
        self.entries.get_mut(&key.to_comparable()).map(|(_, v)| v)
    }

    /// Returns the entry for `key`, invoking `default` to construct and
    /// insert one if absent. Mirrors the default-value-callback behavior: an
    /// auto-inserted entry becomes a tracked addition.
    pub fn get_or_insert_with(&mut self, key: &AnyValue, default: impl FnOnce() -> V) -> &mut V {
        let ck = key.to_comparable();
        if !self.entries.contains_key(&ck) {
            self.entries.insert(ck.clone(), (key.clone(), default()));
            self.added_this_flush.insert(ck.clone());
        }
        &mut self.entries.get_mut(&ck).unwrap().1
    }

    /// Replaces the value at `key` with a freshly constructed CRDT instance.
    /// Interpreted as remove-then-add: both operations are carried in the
    /// next flushed delta when the key already existed.
    pub fn set(&mut self, key: AnyValue, value: V) {
        let ck = key.to_comparable();
        if self.entries.contains_key(&ck) {
            self.removed_this_flush.insert(ck.clone());
        }
        self.entries.insert(ck.clone(), (key, value));
        self.added_this_flush.insert(ck);
    }

    pub fn delete(&mut self, key: &AnyValue) {
        let ck = key.to_comparable();
        if self.entries.remove(&ck).is_some() {
            self.removed_this_flush.insert(ck.clone());
            self.added_this_flush.remove(&ck);
        }
    }

    pub fn clear(&mut self) {
        self.cleared_this_flush = true;
        self.added_this_flush.clear();
        self.removed_this_flush.clear();
        self.entries.clear();
    }

    pub fn has(&self, key: &AnyValue) -> bool {
        self.entries.contains_key(&key.to_comparable())
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AnyValue> {
        self.entries.values().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnyValue, &V)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

impl<V: DeltaCRDT + Clone + PartialEq> Default for GenericMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: DeltaCRDT + Clone + PartialEq> Lattice for GenericMap<V> {
    fn bottom() -> Self {
        Self::new()
    }

    fn join(&self, other: &Self) -> Self {
        let mut result = Self::new();
        let all_keys: BTreeSet<_> = self
            .entries
            .keys()
            .chain(other.entries.keys())
            .cloned()
            .collect();
        for key in all_keys {
            match (self.entries.get(&key), other.entries.get(&key)) {
                (Some((av, a)), Some((_, b))) => {
                    result.entries.insert(key, (av.clone(), a.join(b)));
                }
                (Some((av, a)), None) => {
                    result.entries.insert(key, (av.clone(), a.clone()));
                }
                (None, Some((av, b))) => {
                    result.entries.insert(key, (av.clone(), b.clone()));
                }
                (None, None) => unreachable!(),
            }
        }
        result
    }
}

impl<V: DeltaCRDT + Clone + PartialEq> DeltaCRDT for GenericMap<V> {
    type Delta = MapDelta<V>;

    fn split_delta(&mut self) -> Option<Self::Delta> {
        let cleared = std::mem::take(&mut self.cleared_this_flush);
        let removed = std::mem::take(&mut self.removed_this_flush);
        let added_keys = std::mem::take(&mut self.added_this_flush);

        let mut added = BTreeMap::new();
        let mut updated = BTreeMap::new();
        for (key, (any_key, value)) in self.entries.iter_mut() {
            if added_keys.contains(key) {
                added.insert(key.clone(), (any_key.clone(), value.full_state_delta()));
                value.split_delta();
            } else if let Some(delta) = value.split_delta() {
                updated.insert(key.clone(), delta);
            }
        }

        if !cleared && removed.is_empty() && added.is_empty() && updated.is_empty() {
            None
        } else {
            Some(MapDelta {
                cleared,
                removed,
                added,
                updated,
            })
        }
    }

    fn apply_delta(&mut self, delta: &Self::Delta) {
        if delta.cleared {
            self.entries.clear();
        }
        for key in &delta.removed {
            self.entries.remove(key);
        }
        for (key, (any_key, sub_delta)) in &delta.added {
            let (_, value) = self.entries.entry(key.clone()).or_insert_with(|| {
                let mut v = V::bottom();
                v.apply_delta(sub_delta);
                (any_key.clone(), v)
            });
            value.apply_delta(sub_delta);
        }
        for (key, sub_delta) in &delta.updated {
            if let Some((_, value)) = self.entries.get_mut(key) {
                value.apply_delta(sub_delta);
            }
        }
    }

    fn full_state_delta(&self) -> Self::Delta {
        let mut added = BTreeMap::new();
        for (key, (any_key, value)) in &self.entries {
            added.insert(key.clone(), (any_key.clone(), value.full_state_delta()));
        }
        MapDelta {
            cleared: false,
            removed: BTreeSet::new(),
            added,
            updated: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::Counter;

    #[test]
    fn counter_map_convergence() {
        // Mirrors the framework's CounterMap convergence scenario.
        let mut a: GenericMap<Counter> = GenericMap::new();
        let k = AnyValue::encode_string("k");

        a.get_or_insert_with(&k, Counter::new).increment(3);
        let d1 = a.split_delta().unwrap();

        let mut b: GenericMap<Counter> = GenericMap::new();
        b.apply_delta(&d1);

        a.get_or_insert_with(&k, Counter::new).increment(2);
        let d2 = a.split_delta().unwrap();

        b.get_or_insert_with(&k, Counter::new).increment(7);
        let d3 = b.split_delta().unwrap();

        b.apply_delta(&d2);
        a.apply_delta(&d3);

        assert_eq!(a.get(&k).unwrap().value(), 12);
        assert_eq!(b.get(&k).unwrap().value(), 12);
    }

    #[test]
    fn delete_then_set_in_same_window_carries_both() {
        let mut m: GenericMap<Counter> = GenericMap::new();
        let k = AnyValue::encode_string("k");
        m.set(k.clone(), Counter::new());
        m.split_delta();
        m.delete(&k);
        m.set(k.clone(), Counter::new());
        let delta = m.split_delta().unwrap();
        assert!(delta.removed.contains(&k.to_comparable()));
        assert!(delta.added.contains_key(&k.to_comparable()));
    }
}
