use super::AnySet;
use crate::allocators::{Allocator, HeapAlloc, alloc_failure};
use crate::error::Result;
use crate::maps::table::{Probe, RawIter, RawTable};
use core::marker::PhantomData;
use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;

use fnv::FnvBuildHasher;

/// A hash set on the same double-hashed bucket table as
/// [`crate::maps::HashMap`], with `()` in the value slot.
///
/// Since `()` is a zero-sized type, a bucket costs only the key, the state
/// byte and the cached hash.
pub struct HashSet<T, S = FnvBuildHasher, A: Allocator = HeapAlloc> {
    table: RawTable<T, (), A>,
    hasher: S,
}

// ==================================================================================
// 1. Construction & Size
// ==================================================================================

impl<T> HashSet<T, FnvBuildHasher, HeapAlloc> {
    pub fn new() -> Self {
        Self::with_hasher_in(FnvBuildHasher::default(), HeapAlloc)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RawTable::with_capacity(capacity, HeapAlloc),
            hasher: FnvBuildHasher::default(),
        }
    }
}

impl<T, A: Allocator> HashSet<T, FnvBuildHasher, A> {
    pub fn with_allocator(alloc: A) -> Self {
        Self::with_hasher_in(FnvBuildHasher::default(), alloc)
    }
}

impl<T, S, A: Allocator> HashSet<T, S, A> {
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

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Removes every element for which `f` returns `false`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.table.retain(|k, _| f(k));
    }

    /// Returns an iterator visiting all elements in bucket order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            raw: self.table.raw_iter(),
            _marker: PhantomData,
        }
    }
}

// ==================================================================================
// 2. Hashed Operations
// ==================================================================================

impl<T, S, A> HashSet<T, S, A>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    #[inline]
    pub fn hash_key<Q>(&self, value: &Q) -> u64
    where
        T: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.hasher.hash_one(value)
    }

    /// Adds `value`; returns `false` (dropping `value`) if it was present.
    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        let hash = self.hash_key(&value);
        self.insert_hashed(hash, value)
    }

    fn insert_hashed(&mut self, hash: u64, value: T) -> Result<bool> {
        match self.table.slot_for(hash, &value)? {
            Probe::Found(_) => Ok(false),
            Probe::Vacant(index) => {
                self.table.occupy(index, hash, value, ());
                Ok(true)
            }
        }
    }

    pub fn insert(&mut self, value: T) -> bool {
        match self.try_insert(value) {
            Ok(added) => added,
            Err(err) => alloc_failure("HashSet::insert", err),
        }
    }

    /// Adds `value` under a hash computed with [`HashSet::hash_key`].
    pub fn insert_with_hash(&mut self, hash: u64, value: T) -> bool {
        match self.insert_hashed(hash, value) {
            Ok(added) => added,
            Err(err) => alloc_failure("HashSet::insert_with_hash", err),
        }
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.find(self.hash_key(value), value).is_some()
    }

    /// The stored element equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.table.find(self.hash_key(value), value)?;
        Some(unsafe { self.table.bucket(index).key() })
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(value);
        self.table.remove(hash, value).map(|(k, ())| k)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(value).is_some()
    }

    pub fn reserve(&mut self, entries: usize) {
        if let Err(err) = self.table.reserve(entries) {
            alloc_failure("HashSet::reserve", err);
        }
    }

    pub fn grow(&mut self) -> Result<()> {
        self.table.grow()
    }

    // --- Set Operations ---

    /// Values in `self` but not in `other`.
    ///
    /// `other` can be any collection implementing `AnySet`.
    pub fn difference<'a, O>(&'a self, other: &'a O) -> impl Iterator<Item = &'a T>
    where
        O: AnySet<T>,
    {
        self.iter().filter(move |v| !other.contains(v))
    }

    /// Values in both `self` and `other`.
    pub fn intersection<'a, O>(&'a self, other: &'a O) -> impl Iterator<Item = &'a T>
    where
        O: AnySet<T>,
    {
        self.iter().filter(move |v| other.contains(v))
    }

    /// Values of `self`, then those of `other` that `self` lacks.
    pub fn union<'a, I>(&'a self, other: I) -> impl Iterator<Item = &'a T>
    where
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: 'a,
    {
        self.iter()
            .chain(other.into_iter().filter(move |v| !self.contains(*v)))
    }

    pub fn is_disjoint<O: AnySet<T>>(&self, other: &O) -> bool {
        self.iter().all(|v| !other.contains(v))
    }

    pub fn is_subset<O: AnySet<T>>(&self, other: &O) -> bool {
        self.iter().all(|v| other.contains(v))
    }

    pub fn is_superset<'a, I>(&self, other: I) -> bool
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        other.into_iter().all(|v| self.contains(v))
    }
}

// ==================================================================================
// 3. Iterators
// ==================================================================================

pub struct Iter<'a, T> {
    raw: RawIter<T, ()>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let bucket = unsafe { &*self.raw.next()? };
        Some(unsafe { bucket.key() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.left(), Some(self.raw.left()))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IntoIter<T, A: Allocator = HeapAlloc> {
    table: RawTable<T, (), A>,
    cursor: usize,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.table.drain_next(&mut self.cursor).map(|(k, ())| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len(), Some(self.table.len()))
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, S, A: Allocator> IntoIterator for HashSet<T, S, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter {
            table: self.table,
            cursor: 0,
        }
    }
}

// Allows `for x in &set` or passing `&set` to `union`
impl<'a, T, S, A: Allocator> IntoIterator for &'a HashSet<T, S, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

// ==================================================================================
// 4. Trait Implementations
// ==================================================================================

impl<T, S: Default, A: Allocator + Default> Default for HashSet<T, S, A> {
    fn default() -> Self {
        Self::with_hasher_in(S::default(), A::default())
    }
}

impl<T: Debug, S, A: Allocator> Debug for HashSet<T, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S, A> FromIterator<T> for HashSet<T, S, A>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
    A: Allocator + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S, A> Extend<T> for HashSet<T, S, A>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, S, A> PartialEq for HashSet<T, S, A>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<T: Eq + Hash, S: BuildHasher, A: Allocator> Eq for HashSet<T, S, A> {}

// ==================================================================================
// 5. Tests
// ==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trees::TreeSet;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{self, BTreeSet};

    #[test]
    fn test_set_basic_crud() {
        let mut set = HashSet::new();
        assert!(set.is_empty());
        assert!(set.insert(10));
        assert!(set.insert(20));
        assert!(!set.insert(10));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&10));
        assert!(!set.contains(&99));
        assert!(set.remove(&10));
        assert!(!set.remove(&10));
        assert_eq!(set.len(), 1);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_set_get_and_take_by_borrow() {
        let mut set: HashSet<String> = ["alpha", "beta"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set.get("alpha").map(String::as_str), Some("alpha"));
        assert_eq!(set.take("beta"), Some("beta".to_string()));
        assert_eq!(set.take("beta"), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_set_precomputed_hash() {
        let mut set: HashSet<u64> = HashSet::new();
        let hash = set.hash_key(&5);
        assert!(set.insert_with_hash(hash, 5));
        assert!(!set.insert_with_hash(hash, 5));
        assert!(set.contains(&5));
    }

    #[test]
    fn test_set_operations_against_std_and_tree() {
        let a: HashSet<i32> = (1..=6).collect();
        let std_set: collections::HashSet<i32> = (4..=9).collect();
        let btree: BTreeSet<i32> = (1..=3).collect();
        let tree: TreeSet<i32> = (0..=10).collect();

        let mut diff: Vec<_> = a.difference(&std_set).copied().collect();
        diff.sort_unstable();
        assert_eq!(diff, vec![1, 2, 3]);

        let mut inter: Vec<_> = a.intersection(&std_set).copied().collect();
        inter.sort_unstable();
        assert_eq!(inter, vec![4, 5, 6]);

        let mut all: Vec<_> = a.union(&std_set).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (1..=9).collect::<Vec<_>>());

        assert!(a.is_subset(&tree));
        assert!(!a.is_subset(&std_set));
        assert!(a.is_superset(&btree));
        assert!(!a.is_disjoint(&btree));
        let lone: HashSet<i32> = HashSet::from_iter([42]);
        assert!(lone.is_disjoint(&btree));
    }

    #[test]
    fn test_set_retain_and_into_iter() {
        let mut set: HashSet<u32> = (0..100).collect();
        set.retain(|v| v % 10 == 0);
        let mut values: Vec<u32> = set.into_iter().collect();
        values.sort_unstable();
        assert_eq!(values, (0..100).step_by(10).collect::<Vec<_>>());
    }

    #[test]
    fn test_set_churn_keeps_membership() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ours = HashSet::new();
        let mut reference = collections::HashSet::new();
        for _ in 0..10_000 {
            let v = rng.gen_range(0..300u16);
            if rng.gen_bool(0.5) {
                assert_eq!(ours.insert(v), reference.insert(v));
            } else {
                assert_eq!(ours.remove(&v), reference.remove(&v));
            }
        }
        assert_eq!(ours.len(), reference.len());
        assert!(reference.iter().all(|v| ours.contains(v)));
        assert_eq!(ours.iter().count(), ours.len());
    }

    #[test]
    fn test_set_equality() {
        let a: HashSet<&str> = ["x", "y"].into_iter().collect();
        let mut b = HashSet::with_capacity(256);
        b.insert("y");
        b.insert("x");
        assert_eq!(a, b);
        b.remove("x");
        assert_ne!(a, b);
    }
}
