use std::borrow::Borrow;
use std::marker::PhantomData;
use std::mem;

use allocative::Allocative;
use bitvec::prelude::*;
use tracing::debug;

use super::{
    Entry, INITIAL_CAPACITY, KeyedStore, StoreKey, hash_of, needs_grow, needs_shrink,
};

/// The series of slot indices examined for one key.
///
/// Capacities are always powers of two. On such an array every strategy
/// visits each slot exactly once within `capacity` attempts, so a walk that
/// finds no free slot means the array is full.
pub trait ProbeSequence {
    /// Slot examined on `attempt` (starting at 0) for a key hashing to `hash`.
    fn slot(hash: u64, attempt: usize, capacity: usize) -> usize;
}

/// `(h + i) mod capacity`
#[derive(Debug, Clone, Copy, Default, Allocative)]
pub struct Linear;

/// `(h + i * (i + 1) / 2) mod capacity`, the triangular offsets 0, 1, 3, 6...
#[derive(Debug, Clone, Copy, Default, Allocative)]
pub struct Quadratic;

/// `(h1 + i * h2) mod capacity` where `h2` is taken from the high half of the
/// hash and forced odd, hence coprime with the capacity.
#[derive(Debug, Clone, Copy, Default, Allocative)]
pub struct DoubleHash;

impl ProbeSequence for Linear {
    fn slot(hash: u64, attempt: usize, capacity: usize) -> usize {
        let capacity = capacity as u64;
        ((hash % capacity + attempt as u64) % capacity) as usize
    }
}

impl ProbeSequence for Quadratic {
    fn slot(hash: u64, attempt: usize, capacity: usize) -> usize {
        let capacity = capacity as u64;
        let attempt = attempt as u64;
        ((hash % capacity + attempt * (attempt + 1) / 2) % capacity) as usize
    }
}

impl ProbeSequence for DoubleHash {
    fn slot(hash: u64, attempt: usize, capacity: usize) -> usize {
        let capacity = capacity as u64;
        let step = ((hash >> 32) % capacity) | 1;
        ((hash % capacity + attempt as u64 * step) % capacity) as usize
    }
}

pub type LinearProbeMap<K, V> = OpenAddressingMap<K, V, Linear>;
pub type QuadraticProbeMap<K, V> = OpenAddressingMap<K, V, Quadratic>;
pub type DoubleHashMap<K, V> = OpenAddressingMap<K, V, DoubleHash>;

/// State of one cell of the backing array.
#[derive(Debug, Clone, Allocative)]
enum Slot<K, V> {
    /// Never written since the last rebuild. Terminates a probe.
    Empty,
    Occupied(Entry<K, V>),
    /// Held a deleted entry. Probes continue past it; inserts may reuse it.
    Tombstone,
}

/// Outcome of walking a key's probe sequence on insert.
enum Placement {
    /// The key is already stored at this slot.
    Existing(usize),
    /// The key is absent; this is the first reusable slot on its sequence.
    Vacant(usize),
}

/// An open-addressing hash map over a flat slot array.
///
/// Deleted entries leave a tombstone behind so later probes keep
/// walking; tombstones are only purged when the array is rebuilt on grow or
/// shrink.
#[derive(Debug, Clone, Allocative)]
pub struct OpenAddressingMap<K, V, P> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    #[allocative(skip)]
    probe: PhantomData<P>,
}

impl<K: StoreKey, V, P: ProbeSequence> Default for OpenAddressingMap<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, V, P: ProbeSequence> OpenAddressingMap<K, V, P> {
    pub fn new() -> Self {
        Self {
            slots: empty_slots(INITIAL_CAPACITY),
            len: 0,
            probe: PhantomData,
        }
    }

    /// Number of slots holding a deleted-entry marker.
    pub fn tombstones(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Tombstone))
            .count()
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        let hash = hash_of(key);
        let capacity = self.slots.len();

        for attempt in 0..capacity {
            let index = P::slot(hash, attempt, capacity);
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(entry) if key == entry.key.borrow() => return Some(index),
                _ => {}
            }
        }
        None
    }

    fn place(&self, key: &K) -> Placement {
        let hash = hash_of(key);
        let capacity = self.slots.len();
        let mut reusable = None;

        for attempt in 0..capacity {
            let index = P::slot(hash, attempt, capacity);
            match &self.slots[index] {
                Slot::Empty => return Placement::Vacant(reusable.unwrap_or(index)),
                Slot::Tombstone => {
                    reusable.get_or_insert(index);
                }
                Slot::Occupied(entry) if entry.key == *key => return Placement::Existing(index),
                Slot::Occupied(_) => {}
            }
        }
        match reusable {
            Some(index) => Placement::Vacant(index),
            None => unreachable!("put grows the array before it can fill up"),
        }
    }

    /// Reinserts every live entry into a fresh array of `capacity` slots,
    /// dropping all tombstones.
    fn rebuild(&mut self, capacity: usize) {
        let previous = self.slots.len();
        let entries: Vec<Entry<K, V>> = mem::take(&mut self.slots)
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Occupied(entry) => Some(entry),
                _ => None,
            })
            .collect();
        let hashes: Vec<u64> = entries.iter().map(|entry| hash_of(&entry.key)).collect();

        let capacity = capacity.max(INITIAL_CAPACITY);
        let placement = plan::<P>(&hashes, capacity);

        let mut slots = empty_slots(capacity);
        for (entry, index) in entries.into_iter().zip(placement) {
            slots[index] = Slot::Occupied(entry);
        }
        self.slots = slots;

        debug!(from = previous, to = capacity, len = self.len, "rebuilt slot array");
    }
}

impl<K: StoreKey, V, P: ProbeSequence> KeyedStore<K, V> for OpenAddressingMap<K, V, P> {
    fn put(&mut self, key: K, value: V) {
        if needs_grow(self.len, self.slots.len()) {
            self.rebuild(self.slots.len() * 2);
        }

        match self.place(&key) {
            Placement::Existing(index) => {
                if let Slot::Occupied(entry) = &mut self.slots[index] {
                    entry.value = value;
                }
            }
            Placement::Vacant(index) => {
                self.slots[index] = Slot::Occupied(Entry { key, value });
                self.len += 1;
            }
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        match &self.slots[self.find(key)?] {
            Slot::Occupied(entry) => Some(&entry.value),
            _ => None,
        }
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        let index = self.find(key)?;
        match &mut self.slots[index] {
            Slot::Occupied(entry) => Some(&mut entry.value),
            _ => None,
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        let index = self.find(key)?;
        let Slot::Occupied(entry) = mem::replace(&mut self.slots[index], Slot::Tombstone) else {
            unreachable!("find only reports occupied slots")
        };
        self.len -= 1;

        if needs_shrink(self.len, self.slots.len()) {
            self.rebuild(self.slots.len() / 2);
        }
        Some(entry.value)
    }

    fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K>
    where
        K: 'a,
    {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(entry) => Some(&entry.key),
            _ => None,
        })
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    (0..capacity).map(|_| Slot::Empty).collect()
}

/// Assigns a slot to every hash in a fresh array of `capacity` slots.
///
/// Callers never pass more hashes than slots.
fn plan<P: ProbeSequence>(hashes: &[u64], capacity: usize) -> Vec<usize> {
    let mut taken = bitvec![0; capacity];

    hashes
        .iter()
        .map(|&hash| {
            let Some(index) = (0..capacity)
                .map(|attempt| P::slot(hash, attempt, capacity))
                .find(|&index| !taken[index])
            else {
                unreachable!("every probe sequence covers the whole array");
            };
            taken.set(index, true);
            index
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_probe_wraps_around() {
        assert_eq!(Linear::slot(15, 0, 16), 15);
        assert_eq!(Linear::slot(15, 1, 16), 0);
        assert_eq!(Linear::slot(31, 2, 16), 1);
    }

    #[test]
    fn test_quadratic_probe_offsets() {
        let slots: Vec<usize> = (0..5).map(|i| Quadratic::slot(3, i, 16)).collect();
        assert_eq!(slots, vec![3, 4, 6, 9, 13]);
    }

    fn visits_every_slot<P: ProbeSequence>(hash: u64, capacity: usize) -> bool {
        let mut seen = bitvec![0; capacity];
        for attempt in 0..capacity {
            seen.set(P::slot(hash, attempt, capacity), true);
        }
        seen.all()
    }

    #[test]
    fn test_probe_sequences_cover_power_of_two_arrays() {
        for capacity in [16, 32, 64, 1024] {
            for hash in (0..200u64).map(|h| h.wrapping_mul(0x9E37_79B9_7F4A_7C15)) {
                assert!(visits_every_slot::<Linear>(hash, capacity));
                assert!(visits_every_slot::<Quadratic>(hash, capacity), "{hash} {capacity}");
                assert!(visits_every_slot::<DoubleHash>(hash, capacity), "{hash} {capacity}");
            }
        }
    }

    #[test]
    fn test_double_hash_step_is_never_zero() {
        for hash in 0..1_000u64 {
            for capacity in [16, 32, 64] {
                let first = DoubleHash::slot(hash, 0, capacity);
                let second = DoubleHash::slot(hash, 1, capacity);
                assert_ne!(first, second, "hash {hash} capacity {capacity}");
            }
        }
    }

    #[test]
    fn test_remove_leaves_tombstone_until_rebuild() {
        let mut map: LinearProbeMap<String, u32> = LinearProbeMap::new();
        for i in 0..8 {
            map.put(i.to_string(), i);
        }
        map.remove("3");
        map.remove("5");

        assert_eq!(map.tombstones(), 2);
        assert_eq!(map.len(), 6);
        assert_eq!(map.capacity(), INITIAL_CAPACITY);

        // the next grow purges them
        for i in 8..15 {
            map.put(i.to_string(), i);
        }
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.capacity(), INITIAL_CAPACITY * 2);
    }

    #[test]
    fn test_put_behind_tombstone_does_not_duplicate() {
        let mut map: LinearProbeMap<u64, &str> = LinearProbeMap::new();
        // pick two keys that share a home slot so the second sits behind the first
        let home = |k: &u64| hash_of(k) % INITIAL_CAPACITY as u64;
        let first = 0u64;
        let second = (1..)
            .find(|k| home(k) == home(&first))
            .unwrap_or_default();

        map.put(first, "a");
        map.put(second, "b");
        map.remove(&first);
        map.put(second, "c");

        assert_eq!(map.len(), 1);
        assert_eq!(map.keys().filter(|&&k| k == second).count(), 1);
        assert_eq!(map.get(&second), Some(&"c"));
    }

    #[test]
    fn test_tombstone_slot_is_reused() {
        let mut map: QuadraticProbeMap<String, u32> = QuadraticProbeMap::new();
        map.put("a".into(), 1);
        map.remove("a");
        assert_eq!(map.tombstones(), 1);

        map.put("a".into(), 2);
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.get("a"), Some(&2));
    }

    #[test]
    fn test_quadratic_keeps_every_entry() {
        let mut map: QuadraticProbeMap<u32, u32> = QuadraticProbeMap::new();
        for i in 0..500 {
            map.put(i, i * 2);
        }
        assert_eq!(map.len(), 500);
        for i in 0..500 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn test_plan_fills_array_with_identical_hashes() {
        let hashes = [7u64; 16];
        for placement in [
            plan::<Linear>(&hashes, 16),
            plan::<Quadratic>(&hashes, 16),
            plan::<DoubleHash>(&hashes, 16),
        ] {
            let mut slots = placement;
            slots.sort_unstable();
            slots.dedup();
            assert_eq!(slots.len(), 16);
        }
    }
}
