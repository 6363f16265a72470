//! Key/value stores backing a [crate::Table].
//!
//! Four interchangeable collision-resolution strategies share the
//! [KeyedStore] contract. [AnyStore] is the closed set of them, picked at
//! runtime through a [StoreKind].

mod chaining;
mod open_addressing;

use std::borrow::Borrow;
use std::fmt::{self, Display};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::str::FromStr;

use allocative::Allocative;

use crate::error::DbError;

pub use chaining::ChainingMap;
pub use open_addressing::{
    DoubleHash, DoubleHashMap, Linear, LinearProbeMap, OpenAddressingMap, ProbeSequence,
    Quadratic, QuadraticProbeMap,
};

/// Number of slots every store starts with. Shrinking never goes below it.
pub const INITIAL_CAPACITY: usize = 16;

/// Anything usable as a key or as the borrowed form of one.
///
/// `Display` feeds the polynomial hash of [ChainingMap].
pub trait StoreKey: Hash + Eq + Display {}

impl<T: Hash + Eq + Display + ?Sized> StoreKey for T {}

/// The contract shared by all four map strategies.
///
/// None of these operations fail. Looking up or removing an absent key is a
/// no-op that reports `None`. `put` and `remove` may rebuild the whole backing
/// array when the load factor crosses 0.75 (grow) or 0.25 (shrink), so they
/// are `O(n)` in the worst case.
pub trait KeyedStore<K, V> {
    /// Inserts `value` under `key`, overwriting any previous value.
    fn put(&mut self, key: K, value: V);

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized;

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized;

    /// Removes `key` and returns its value, possibly shrinking the store.
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized;

    /// Every live key exactly once, in backing-array order.
    ///
    /// The iterator borrows the store, so calling `keys` again restarts the
    /// walk from the first slot.
    fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K>
    where
        K: 'a;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Current length of the backing array.
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        self.get(key).is_some()
    }
}

/// A key together with its value, as stored in buckets and slots.
#[derive(Debug, Clone, PartialEq, Eq, Allocative)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

/// Selects which collision-resolution strategy a table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Allocative)]
pub enum StoreKind {
    /// Separate chaining with a polynomial string hash.
    Chaining,
    /// Open addressing, step `i`.
    #[default]
    LinearProbe,
    /// Open addressing, triangular step `i * (i + 1) / 2`.
    QuadraticProbe,
    /// Open addressing, step `i * h2(key)` with an odd `h2`.
    DoubleHash,
}

impl StoreKind {
    pub const ALL: [StoreKind; 4] = [
        StoreKind::Chaining,
        StoreKind::LinearProbe,
        StoreKind::QuadraticProbe,
        StoreKind::DoubleHash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chaining => "chaining",
            Self::LinearProbe => "linear",
            Self::QuadraticProbe => "quadratic",
            Self::DoubleHash => "double",
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chaining" | "chain" => Ok(Self::Chaining),
            "linear" | "linear-probe" => Ok(Self::LinearProbe),
            "quadratic" | "quadratic-probe" => Ok(Self::QuadraticProbe),
            "double" | "double-hash" => Ok(Self::DoubleHash),
            _ => Err(DbError::UnknownStoreKind(s.to_string())),
        }
    }
}

/// One of the four strategies, chosen at construction time.
#[derive(Debug, Clone, Allocative)]
pub enum AnyStore<K, V> {
    Chaining(ChainingMap<K, V>),
    LinearProbe(LinearProbeMap<K, V>),
    QuadraticProbe(QuadraticProbeMap<K, V>),
    DoubleHash(DoubleHashMap<K, V>),
}

impl<K: StoreKey, V> AnyStore<K, V> {
    pub fn new(kind: StoreKind) -> Self {
        match kind {
            StoreKind::Chaining => Self::Chaining(ChainingMap::new()),
            StoreKind::LinearProbe => Self::LinearProbe(LinearProbeMap::new()),
            StoreKind::QuadraticProbe => Self::QuadraticProbe(QuadraticProbeMap::new()),
            StoreKind::DoubleHash => Self::DoubleHash(DoubleHashMap::new()),
        }
    }

    pub fn kind(&self) -> StoreKind {
        match self {
            Self::Chaining(_) => StoreKind::Chaining,
            Self::LinearProbe(_) => StoreKind::LinearProbe,
            Self::QuadraticProbe(_) => StoreKind::QuadraticProbe,
            Self::DoubleHash(_) => StoreKind::DoubleHash,
        }
    }
}

macro_rules! dispatch {
    ($store:expr, $inner:ident => $body:expr) => {
        match $store {
            AnyStore::Chaining($inner) => $body,
            AnyStore::LinearProbe($inner) => $body,
            AnyStore::QuadraticProbe($inner) => $body,
            AnyStore::DoubleHash($inner) => $body,
        }
    };
}

impl<K: StoreKey, V> KeyedStore<K, V> for AnyStore<K, V> {
    fn put(&mut self, key: K, value: V) {
        dispatch!(self, store => store.put(key, value))
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        dispatch!(self, store => store.get(key))
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        dispatch!(self, store => store.get_mut(key))
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        dispatch!(self, store => store.remove(key))
    }

    fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K>
    where
        K: 'a,
    {
        let keys: Box<dyn Iterator<Item = &'a K> + 'a> =
            dispatch!(self, store => Box::new(store.keys()));
        keys
    }

    fn len(&self) -> usize {
        dispatch!(self, store => store.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, store => store.capacity())
    }
}

/// `true` once `len` has reached 3/4 of `capacity`; checked before every insert.
pub(crate) fn needs_grow(len: usize, capacity: usize) -> bool {
    len * 4 >= capacity * 3
}

/// `true` when `len` has dropped to 1/4 of `capacity` and there is room to halve.
pub(crate) fn needs_shrink(len: usize, capacity: usize) -> bool {
    len * 4 <= capacity && capacity > INITIAL_CAPACITY
}

/// The default hash used by the open-addressing strategies.
pub(crate) fn hash_of<Q: Hash + ?Sized>(key: &Q) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn store(kind: StoreKind) -> AnyStore<String, usize> {
        AnyStore::new(kind)
    }

    // ─────────────────────────────────────────────────────────────
    // put / get
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_put_then_get_returns_value() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for i in 0..40 {
                s.put(format!("key{i}"), i);
            }
            for i in 0..40 {
                assert_eq!(s.get(format!("key{i}").as_str()), Some(&i), "{kind}");
            }
            assert_eq!(s.get("missing"), None, "{kind}");
        }
    }

    #[test]
    fn test_overwrite_keeps_size() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            s.put("k".into(), 1);
            assert_eq!(s.len(), 1);
            s.put("k".into(), 2);
            assert_eq!(s.len(), 1, "{kind}");
            assert_eq!(s.get("k"), Some(&2), "{kind}");
        }
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            s.put("k".into(), 1);
            if let Some(v) = s.get_mut("k") {
                *v = 7;
            }
            assert_eq!(s.get("k"), Some(&7), "{kind}");
            assert!(s.get_mut("nope").is_none());
        }
    }

    // ─────────────────────────────────────────────────────────────
    // remove
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_remove_hides_key() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for i in 0..10 {
                s.put(i.to_string(), i);
            }
            assert_eq!(s.remove("4"), Some(4), "{kind}");
            assert_eq!(s.get("4"), None, "{kind}");
            assert!(!s.contains_key("4"));
            assert!(s.keys().all(|k| k != "4"), "{kind}");
            assert_eq!(s.len(), 9);
        }
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            s.put("a".into(), 1);
            assert_eq!(s.remove("b"), None);
            assert_eq!(s.len(), 1, "{kind}");
            assert_eq!(s.capacity(), INITIAL_CAPACITY);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // resize
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_growth_keeps_every_key() {
        // 16 -> 32 -> 64 -> 128 -> 256
        let n = 100;
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for i in 0..n {
                s.put(format!("user{i}"), i);
            }
            assert_eq!(s.len(), n, "{kind}");
            assert!(s.capacity() >= INITIAL_CAPACITY * 8, "{kind}");
            assert!(s.len() * 4 <= s.capacity() * 3, "{kind}");

            let keys: HashSet<String> = s.keys().cloned().collect();
            let expected: HashSet<String> = (0..n).map(|i| format!("user{i}")).collect();
            assert_eq!(keys, expected, "{kind}");
        }
    }

    #[test]
    fn test_shrink_never_drops_below_initial_capacity() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for i in 0..200 {
                s.put(i.to_string(), i);
            }
            let grown = s.capacity();
            for i in 0..200 {
                s.remove(i.to_string().as_str());
                assert!(s.capacity() >= INITIAL_CAPACITY, "{kind}");
            }
            assert!(grown > INITIAL_CAPACITY);
            assert_eq!(s.capacity(), INITIAL_CAPACITY, "{kind}");
            assert!(s.is_empty());
            assert_eq!(s.keys().count(), 0);

            s.put("again".into(), 1);
            assert_eq!(s.get("again"), Some(&1), "{kind}");
        }
    }

    #[test]
    fn test_every_remove_leaves_store_above_shrink_threshold() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for i in 0..5_000 {
                s.put(format!("key{i}"), i);
            }
            for i in 0..5_000 {
                let before = s.capacity();
                s.remove(format!("key{i}").as_str());

                assert!(!needs_shrink(s.len(), s.capacity()), "{kind} after {i}");
                assert!(
                    s.capacity() == before || s.capacity() == before / 2,
                    "{kind}: {before} -> {}",
                    s.capacity()
                );
            }
            assert_eq!(s.capacity(), INITIAL_CAPACITY, "{kind}");
        }
    }

    #[test]
    fn test_churn_with_tombstones() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for round in 0..20 {
                for i in 0..11 {
                    s.put(format!("{round}-{i}"), i);
                }
                for i in 0..11 {
                    if i % 3 != 0 {
                        s.remove(format!("{round}-{i}").as_str());
                    }
                }
            }
            // four survivors per round
            assert_eq!(s.len(), 20 * 4, "{kind}");
            assert_eq!(s.keys().count(), s.len(), "{kind}");
            for round in 0..20 {
                assert_eq!(s.get(format!("{round}-9").as_str()), Some(&9), "{kind}");
                assert_eq!(s.get(format!("{round}-10").as_str()), None, "{kind}");
            }
        }
    }

    #[test]
    fn test_keys_is_restartable() {
        for kind in StoreKind::ALL {
            let mut s = store(kind);
            for i in 0..5 {
                s.put(i.to_string(), i);
            }
            let first: Vec<&String> = s.keys().collect();
            let second: Vec<&String> = s.keys().collect();
            assert_eq!(first, second, "{kind}");
            assert_eq!(first.len(), 5);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // StoreKind
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_store_kind_round_trips_through_text() {
        for kind in StoreKind::ALL {
            assert_eq!(kind.to_string().parse::<StoreKind>(), Ok(kind));
            assert_eq!(AnyStore::<String, ()>::new(kind).kind(), kind);
        }
        assert_eq!("DOUBLE-HASH".parse::<StoreKind>(), Ok(StoreKind::DoubleHash));
        assert!(matches!(
            "cuckoo".parse::<StoreKind>(),
            Err(DbError::UnknownStoreKind(_))
        ));
    }

    #[test]
    fn test_load_factor_triggers() {
        assert!(!needs_grow(11, 16));
        assert!(needs_grow(12, 16));
        assert!(needs_shrink(8, 32));
        assert!(!needs_shrink(9, 32));
        assert!(!needs_shrink(0, INITIAL_CAPACITY));
    }
}
