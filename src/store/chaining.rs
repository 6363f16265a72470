use std::borrow::Borrow;
use std::fmt::{self, Display, Write};
use std::mem;

use allocative::Allocative;
use tracing::debug;

use super::{Entry, INITIAL_CAPACITY, KeyedStore, StoreKey, needs_grow, needs_shrink};

const POLY_BASE: u64 = 31;
const POLY_MODULUS: u64 = 1_000_000_007;

/// Separate chaining: each bucket holds an unbounded list of entries that is
/// scanned linearly.
///
/// Buckets are picked with a base-31 polynomial hash over the key's text,
/// which spreads similar string keys better than the default hash at the cost
/// of work proportional to the key length.
#[derive(Debug, Clone, Allocative)]
pub struct ChainingMap<K, V> {
    buckets: Vec<Vec<Entry<K, V>>>,
    len: usize,
}

impl<K: StoreKey, V> Default for ChainingMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, V> ChainingMap<K, V> {
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(INITIAL_CAPACITY),
            len: 0,
        }
    }

    /// Length of the longest bucket list.
    pub fn longest_chain(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn bucket_of<Q: Display + ?Sized>(&self, key: &Q) -> usize {
        (polynomial_hash(key) % self.buckets.len() as u64) as usize
    }

    fn rebuild(&mut self, capacity: usize) {
        let previous = mem::replace(&mut self.buckets, empty_buckets(capacity));
        for entry in previous.into_iter().flatten() {
            let bucket = self.bucket_of(&entry.key);
            self.buckets[bucket].push(entry);
        }
        debug!(to = capacity, len = self.len, "rebuilt bucket array");
    }
}

impl<K: StoreKey, V> KeyedStore<K, V> for ChainingMap<K, V> {
    fn put(&mut self, key: K, value: V) {
        if needs_grow(self.len, self.buckets.len()) {
            self.rebuild(self.buckets.len() * 2);
        }

        let bucket = self.bucket_of(&key);
        let chain = &mut self.buckets[bucket];
        match chain.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.value = value,
            None => {
                chain.push(Entry { key, value });
                self.len += 1;
            }
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|entry| key == entry.key.borrow())
            .map(|entry| &entry.value)
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        let bucket = self.bucket_of(key);
        self.buckets[bucket]
            .iter_mut()
            .find(|entry| key == entry.key.borrow())
            .map(|entry| &mut entry.value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: StoreKey + ?Sized,
    {
        let bucket = self.bucket_of(key);
        let chain = &mut self.buckets[bucket];
        let position = chain.iter().position(|entry| key == entry.key.borrow())?;
        let entry = chain.swap_remove(position);
        self.len -= 1;

        if needs_shrink(self.len, self.buckets.len()) {
            self.rebuild(self.buckets.len() / 2);
        }
        Some(entry.value)
    }

    fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K>
    where
        K: 'a,
    {
        self.buckets.iter().flatten().map(|entry| &entry.key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Vec<Entry<K, V>>> {
    (0..capacity).map(|_| Vec::new()).collect()
}

/// Accumulates `sum(c_i * 31^i) mod 1_000_000_007` over the UTF-16 code
/// units written into it.
struct PolynomialHasher {
    hash: u64,
    power: u64,
}

impl Write for PolynomialHasher {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for unit in s.encode_utf16() {
            self.hash = (self.hash + u64::from(unit) * self.power % POLY_MODULUS) % POLY_MODULUS;
            self.power = self.power * POLY_BASE % POLY_MODULUS;
        }
        Ok(())
    }
}

/// Polynomial hash of the key's `Display` text. The empty text hashes to 0.
pub(crate) fn polynomial_hash<Q: Display + ?Sized>(key: &Q) -> u64 {
    let mut hasher = PolynomialHasher { hash: 0, power: 1 };
    // writing into the hasher itself never fails
    let _ = write!(hasher, "{key}");
    hasher.hash
}
