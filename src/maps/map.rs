use super::table::{Probe, RawIter, RawTable};
use crate::allocators::{Allocator, HeapAlloc, alloc_failure};
use crate::error::Result;
use core::marker::PhantomData;
use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::ops::Index;

// Use 'fnv' for the default FNV-1a hash over the key's bytes
use fnv::FnvBuildHasher;

/// An open-addressed hash map with double hashing.
///
/// # Overview
/// * **Buckets:** key, value, state byte (empty / occupied / tombstone) and
///   the cached 64-bit hash of the key.
/// * **Growth:** the first insert allocates [`super::DEFAULT_CAPACITY`]
///   buckets; after that the table doubles once live entries plus
///   tombstones reach [`super::LOAD_FACTOR`] of the capacity. Entries move
///   by their cached hash, keys are never re-hashed.
/// * **Removal:** leaves a tombstone, which the next insert probing through
///   it reuses.
///
/// Iteration order is bucket order and changes whenever the table is rebuilt.
pub struct HashMap<K, V, S = FnvBuildHasher, A: Allocator = HeapAlloc> {
    table: RawTable<K, V, A>,
    hasher: S,
}

// --- 1. Construction & Size ---

impl<K, V> HashMap<K, V, FnvBuildHasher, HeapAlloc> {
    /// Creates an empty map. Nothing is allocated until the first insert.
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher::default())
    }

    /// Creates a map with at least `capacity` buckets, rounded up to a
    /// power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RawTable::with_capacity(capacity, HeapAlloc),
            hasher: FnvBuildHasher::default(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S, HeapAlloc> {
    pub const fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_in(hasher, HeapAlloc)
    }
}

impl<K, V, A: Allocator> HashMap<K, V, FnvBuildHasher, A> {
    pub fn with_allocator(alloc: A) -> Self {
        Self::with_hasher_in(FnvBuildHasher::default(), alloc)
    }
}

impl<K, V, S, A: Allocator> HashMap<K, V, S, A> {
    pub const fn with_hasher_in(hasher: S, alloc: A) -> Self {
        Self {
            table: RawTable::new(alloc),
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drops every entry; the bucket array is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.table.retain(|k, v| f(k, v));
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: self.table.raw_iter(),
            _marker: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            raw: self.table.raw_iter(),
            _marker: PhantomData,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }
}

// --- 2. Hashed Operations ---

impl<K, V, S, A> HashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    /// Hash of `key` under this map's hasher, for the `*_with_hash` methods.
    #[inline]
    pub fn hash_key<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.hasher.hash_one(key)
    }

    /// Inserts a key-value pair, returning the previous value for `key`.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.hash_key(&key);
        self.table.insert(hash, key, value)
    }

    /// Inserts a key-value pair, returning the previous value for `key`.
    ///
    /// # Panics
    /// If the allocator cannot provide a larger bucket array.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(old) => old,
            Err(err) => alloc_failure("HashMap::insert", err),
        }
    }

    /// Inserts with a hash the caller computed with [`HashMap::hash_key`].
    pub fn insert_with_hash(&mut self, hash: u64, key: K, value: V) -> Option<V> {
        match self.table.insert(hash, key, value) {
            Ok(old) => old,
            Err(err) => alloc_failure("HashMap::insert_with_hash", err),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_with_hash(self.hash_key(key), key)
    }

    /// Looks `key` up under a precomputed hash.
    pub fn get_with_hash<Q>(&self, hash: u64, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.table.find(hash, key)?;
        Some(unsafe { self.table.bucket(index).value() })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.table.find(self.hash_key(key), key)?;
        Some(unsafe { self.table.bucket_mut(index).value_mut() })
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.table.find(self.hash_key(key), key)?;
        let bucket = unsafe { self.table.bucket(index) };
        Some(unsafe { (bucket.key(), bucket.value()) })
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(self.hash_key(key), key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.table.remove(hash, key)
    }

    /// Returns the value for `key`, inserting `make()` first if absent.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, make: F) -> &mut V {
        let hash = self.hash_key(&key);
        let index = match self.table.slot_for(hash, &key) {
            Ok(Probe::Found(index)) => index,
            Ok(Probe::Vacant(index)) => {
                self.table.occupy(index, hash, key, make());
                index
            }
            Err(err) => alloc_failure("HashMap::get_or_insert_with", err),
        };
        unsafe { self.table.bucket_mut(index).value_mut() }
    }

    /// Subscript access: the value for `key`, default-constructed if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Sizes the table for `entries` live entries in total.
    pub fn try_reserve(&mut self, entries: usize) -> Result<()> {
        self.table.reserve(entries)
    }

    pub fn reserve(&mut self, entries: usize) {
        if let Err(err) = self.table.reserve(entries) {
            alloc_failure("HashMap::reserve", err);
        }
    }

    /// Rebuilds at the next capacity (64 from empty, then doubling).
    pub fn grow(&mut self) -> Result<()> {
        self.table.grow()
    }
}

// --- 3. Iterator Support ---

pub struct Iter<'a, K, V> {
    raw: RawIter<K, V>,
    _marker: PhantomData<&'a (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let bucket = unsafe { &*self.raw.next()? };
        Some(unsafe { (bucket.key(), bucket.value()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.left(), Some(self.raw.left()))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct IterMut<'a, K, V> {
    raw: RawIter<K, V>,
    _marker: PhantomData<&'a mut (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let bucket = unsafe { &mut *self.raw.next()? };
        let key = unsafe { &*(bucket.key() as *const K) };
        Some((key, unsafe { bucket.value_mut() }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.left(), Some(self.raw.left()))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator; entries not yet yielded are dropped with it.
pub struct IntoIter<K, V, A: Allocator = HeapAlloc> {
    table: RawTable<K, V, A>,
    cursor: usize,
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.table.drain_next(&mut self.cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len(), Some(self.table.len()))
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}

impl<K, V, S, A: Allocator> IntoIterator for HashMap<K, V, S, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> IntoIter<K, V, A> {
        IntoIter {
            table: self.table,
            cursor: 0,
        }
    }
}

impl<'a, K, V, S, A: Allocator> IntoIterator for &'a HashMap<K, V, S, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, A: Allocator> IntoIterator for &'a mut HashMap<K, V, S, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

// --- 4. Trait Implementations ---

impl<K, V, S: Default, A: Allocator + Default> Default for HashMap<K, V, S, A> {
    fn default() -> Self {
        Self::with_hasher_in(S::default(), A::default())
    }
}

impl<K: Debug, V: Debug, S, A: Allocator> Debug for HashMap<K, V, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, A> FromIterator<(K, V)> for HashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    A: Allocator + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S, A> Extend<(K, V)> for HashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, A> PartialEq for HashMap<K, V, S, A>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Eq + Hash, V: Eq, S: BuildHasher, A: Allocator> Eq for HashMap<K, V, S, A> {}

// Allow: map[&key] (panics when absent; use `get_or_insert_default` to insert)
impl<K, V, Q, S, A> Index<&Q> for HashMap<K, V, S, A>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
    S: BuildHasher,
    A: Allocator,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found in HashMap"),
        }
    }
}

// --- 5. Test Suite ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::{ArenaAlloc, TrackingAlloc};
    use crate::error::Error;
    use crate::maps::{DEFAULT_CAPACITY, LOAD_FACTOR};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap as StdMap;
    use std::rc::Rc;

    #[test]
    fn test_map_growth_scenario() {
        let mut map = HashMap::new();
        for i in 0..100u64 {
            map.insert(i, i * i);
        }
        assert_eq!(map.len(), 100);
        assert!(map.capacity() as f64 >= 100.0 / LOAD_FACTOR);
        for i in 0..100u64 {
            assert_eq!(map[&i], i * i);
        }

        for i in (0..100u64).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * i));
        }
        assert_eq!(map.len(), 50);
        for i in 0..100u64 {
            assert_eq!(map.contains_key(&i), i % 2 == 1, "key {i}");
        }

        for i in 100..150u64 {
            map.insert(i, i * i);
        }
        assert_eq!(map.len(), 100);
        for i in (1..100u64).step_by(2).chain(100..150) {
            assert_eq!(map.get(&i), Some(&(i * i)));
        }
    }

    #[test]
    fn test_map_empty_lookups_do_not_allocate() {
        let mut map: HashMap<&str, i32> = HashMap::new();
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.get("a"), None);
        assert_eq!(map.remove("a"), None);
        assert_eq!(map.capacity(), 0);
        map.insert("a", 1);
        assert_eq!(map.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_map_insert_replaces() {
        let mut map = HashMap::new();
        assert_eq!(map.insert("k", 1), None);
        assert_eq!(map.insert("k", 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove_entry("k"), Some(("k", 2)));
        assert_eq!(map.insert("k", 3), None);
        assert_eq!(map.get_key_value("k"), Some((&"k", &3)));
    }

    #[test]
    fn test_map_subscript_inserts_default() {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in "a b a c a b".split(' ') {
            *counts.get_or_insert_default(word.to_string()) += 1;
        }
        assert_eq!(counts["a"], 3);
        assert_eq!(counts["b"], 2);
        assert_eq!(counts["c"], 1);

        let v = counts.get_or_insert_with("d".to_string(), || 10);
        *v += 1;
        assert_eq!(counts.get("d"), Some(&11));
    }

    #[test]
    fn test_map_precomputed_hash() {
        let mut map: HashMap<&str, i32> = HashMap::new();
        let hash = map.hash_key("answer");
        map.insert_with_hash(hash, "answer", 42);
        assert_eq!(map.get_with_hash(hash, "answer"), Some(&42));
        assert_eq!(map.get("answer"), Some(&42));
    }

    #[test]
    fn test_map_iteration_skips_tombstones() {
        let mut map: HashMap<u32, u32> = (0..20).map(|i| (i, i)).collect();
        map.retain(|k, _| k % 4 != 0);
        map.remove(&1);
        let mut keys: Vec<u32> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 3, 5, 6, 7, 9, 10, 11, 13, 14, 15, 17, 18, 19]);
        assert_eq!(map.iter().len(), map.len());

        for v in map.values_mut() {
            *v *= 10;
        }
        assert_eq!(map[&7], 70);
        let total: u32 = map.values().sum();
        assert_eq!(total, keys.iter().sum::<u32>() * 10);
    }

    #[test]
    fn test_map_into_iter_drops_rest() {
        let probe = Rc::new(());
        let mut map = HashMap::new();
        for i in 0..10 {
            map.insert(i, probe.clone());
        }
        let mut iter = map.into_iter();
        let (_, first) = iter.next().unwrap();
        assert_eq!(iter.len(), 9);
        drop(iter);
        assert_eq!(Rc::strong_count(&probe), 2);
        drop(first);
        assert_eq!(Rc::strong_count(&probe), 1);
    }

    #[test]
    fn test_map_clear_and_reserve() {
        let mut map = HashMap::with_capacity(10);
        assert_eq!(map.capacity(), 16);
        map.reserve(1000);
        let cap = map.capacity();
        assert!(cap.is_power_of_two());
        for i in 0..1000 {
            map.insert(i, ());
        }
        assert_eq!(map.capacity(), cap);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), cap);
        map.grow().unwrap();
        assert_eq!(map.capacity(), cap * 2);
    }

    #[test]
    fn test_map_equality_ignores_layout() {
        let a: HashMap<i32, i32> = (0..50).map(|i| (i, -i)).collect();
        let mut b = HashMap::with_capacity(1024);
        for i in (0..50).rev() {
            b.insert(i, -i);
        }
        assert_eq!(a, b);
        b.insert(0, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_map_randomized_against_std() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut ours = HashMap::new();
        let mut reference = StdMap::new();
        for _ in 0..20_000 {
            let key = rng.gen_range(0..500u32);
            if rng.gen_bool(0.6) {
                let value = rng.r#gen::<u32>();
                assert_eq!(ours.insert(key, value), reference.insert(key, value));
            } else {
                assert_eq!(ours.remove(&key), reference.remove(&key));
            }
        }
        assert_eq!(ours.len(), reference.len());
        for (k, v) in &reference {
            assert_eq!(ours.get(k), Some(v));
        }
    }

    #[test]
    fn test_map_tracking_allocator_balance() {
        let mut tracker = TrackingAlloc::new();
        {
            let mut map = HashMap::with_allocator(&mut tracker);
            for i in 0..500u32 {
                map.insert(i, i.to_string());
            }
            assert_eq!(map.get(&499).map(String::as_str), Some("499"));
        }
        tracker.assert_no_leaks().unwrap();
        assert!(tracker.total_allocations() >= 4);
    }

    #[test]
    fn test_map_arena_exhaustion_is_reported() {
        let mut map: HashMap<u64, u64, FnvBuildHasher, ArenaAlloc<4096>> =
            HashMap::with_allocator(ArenaAlloc::new());
        let mut failure = None;
        for i in 0..10_000 {
            if let Err(err) = map.try_insert(i, i) {
                failure = Some(err);
                break;
            }
        }
        assert!(matches!(failure, Some(Error::OutOfMemory { .. })));
        assert!(map.len() > 0);
        assert_eq!(map.get(&0), Some(&0));
    }
}
