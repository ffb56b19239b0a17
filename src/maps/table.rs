use super::{DEFAULT_CAPACITY, GROWTH_FACTOR, LOAD_FACTOR};
use crate::allocators::{Allocator, alloc_failure, release};
use crate::error::{Error, Result};
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ptr;
use std::borrow::Borrow;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub(crate) enum BucketState {
    Empty,
    Occupied,
    Tombstone,
}

pub(crate) struct Bucket<K, V> {
    state: BucketState,
    hash: u64,
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
}

impl<K, V> Bucket<K, V> {
    /// # Safety
    /// The bucket must be occupied.
    #[inline(always)]
    pub(crate) unsafe fn key(&self) -> &K {
        unsafe { self.key.assume_init_ref() }
    }

    /// # Safety
    /// The bucket must be occupied.
    #[inline(always)]
    pub(crate) unsafe fn value(&self) -> &V {
        unsafe { self.value.assume_init_ref() }
    }

    /// # Safety
    /// The bucket must be occupied.
    #[inline(always)]
    pub(crate) unsafe fn value_mut(&mut self) -> &mut V {
        unsafe { self.value.assume_init_mut() }
    }
}

pub(crate) enum Probe {
    Found(usize),
    /// First tombstone on the probe path, else the empty bucket that ended it.
    Vacant(usize),
}

/// Bucket array shared by the map and the set.
///
/// Capacity is zero or a power of two. The probe for hash `h` starts at
/// `h mod capacity` and advances by an odd step derived from
/// `1 + h mod (capacity - 1)`, which is coprime with the capacity, so a
/// probe sequence visits every bucket once.
pub(crate) struct RawTable<K, V, A: Allocator> {
    buckets: *mut Bucket<K, V>,
    capacity: usize,
    len: usize,
    tombstones: usize,
    alloc: A,
    _marker: PhantomData<(K, V)>,
}

unsafe impl<K: Send, V: Send, A: Allocator + Send> Send for RawTable<K, V, A> {}
unsafe impl<K: Sync, V: Sync, A: Allocator + Sync> Sync for RawTable<K, V, A> {}

#[inline]
fn load_limit(capacity: usize) -> usize {
    (capacity as f64 * LOAD_FACTOR) as usize
}

/// Smallest power-of-two capacity that holds `entries` under the load factor.
pub(crate) fn capacity_for(entries: usize) -> Result<usize> {
    if entries == 0 {
        return Ok(0);
    }
    let raw = (entries as f64 / LOAD_FACTOR).ceil() as usize;
    raw.checked_add(1)
        .and_then(usize::checked_next_power_of_two)
        .ok_or(Error::CapacityOverflow)
}

#[inline(always)]
fn probe_start(hash: u64, capacity: usize) -> (usize, usize) {
    let cap = capacity as u64;
    let index = (hash % cap) as usize;
    let step = if capacity <= 1 {
        1
    } else {
        ((1 + hash % (cap - 1)) | 1) as usize
    };
    (index, step)
}

impl<K, V, A: Allocator> RawTable<K, V, A> {
    pub(crate) const fn new(alloc: A) -> Self {
        Self {
            buckets: ptr::null_mut(),
            capacity: 0,
            len: 0,
            tombstones: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Table with `capacity.next_power_of_two()` buckets; zero allocates nothing.
    pub(crate) fn with_capacity(capacity: usize, alloc: A) -> Self {
        let mut table = Self::new(alloc);
        if capacity > 0 {
            let target = capacity.checked_next_power_of_two();
            if let Err(err) = target.ok_or(Error::CapacityOverflow).and_then(|cap| table.rebuild(cap)) {
                alloc_failure("HashMap::with_capacity", err);
            }
        }
        table
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[inline(always)]
    pub(crate) unsafe fn bucket(&self, index: usize) -> &Bucket<K, V> {
        unsafe { &*self.buckets.add(index) }
    }

    #[inline(always)]
    pub(crate) unsafe fn bucket_mut(&mut self, index: usize) -> &mut Bucket<K, V> {
        unsafe { &mut *self.buckets.add(index) }
    }

    fn allocate(alloc: &mut A, capacity: usize) -> Result<*mut Bucket<K, V>> {
        let buckets = alloc.malloc::<Bucket<K, V>>(capacity)?.as_ptr();
        for i in 0..capacity {
            unsafe {
                ptr::write(
                    buckets.add(i),
                    Bucket {
                        state: BucketState::Empty,
                        hash: 0,
                        key: MaybeUninit::uninit(),
                        value: MaybeUninit::uninit(),
                    },
                );
            }
        }
        Ok(buckets)
    }

    /// Moves every live entry into a fresh array of `new_capacity` buckets,
    /// placing them by their cached hashes. Tombstones are dropped.
    pub(crate) fn rebuild(&mut self, new_capacity: usize) -> Result<()> {
        debug_assert!(new_capacity.is_power_of_two() && new_capacity > self.len);
        let fresh = Self::allocate(&mut self.alloc, new_capacity)?;
        for i in 0..self.capacity {
            let old = unsafe { &mut *self.buckets.add(i) };
            if old.state != BucketState::Occupied {
                continue;
            }
            let (mut index, step) = probe_start(old.hash, new_capacity);
            loop {
                let slot = unsafe { &mut *fresh.add(index) };
                if slot.state == BucketState::Empty {
                    slot.state = BucketState::Occupied;
                    slot.hash = old.hash;
                    unsafe {
                        slot.key.write(old.key.assume_init_read());
                        slot.value.write(old.value.assume_init_read());
                    }
                    break;
                }
                index = (index + step) & (new_capacity - 1);
            }
        }
        tracing::trace!(
            old_capacity = self.capacity,
            new_capacity,
            live = self.len,
            tombstones = self.tombstones,
            "hash table rebuilt"
        );
        let old = mem::replace(&mut self.buckets, fresh);
        unsafe { release(&mut self.alloc, old, self.capacity) };
        self.capacity = new_capacity;
        self.tombstones = 0;
        Ok(())
    }

    /// Capacity after one growth step.
    pub(crate) fn next_capacity(&self) -> Result<usize> {
        if self.capacity == 0 {
            return Ok(DEFAULT_CAPACITY);
        }
        let scaled = (self.capacity as f64 * (1.0 + GROWTH_FACTOR)) as usize;
        scaled
            .max(self.capacity + 1)
            .checked_next_power_of_two()
            .ok_or(Error::CapacityOverflow)
    }

    pub(crate) fn grow(&mut self) -> Result<()> {
        let next = self.next_capacity()?;
        self.rebuild(next)
    }

    /// Grows unless tombstones alone crowd the table, in which case it is
    /// rebuilt at the same capacity.
    fn make_room(&mut self) -> Result<()> {
        if self.capacity > 0 && (self.len + 1) * 2 < load_limit(self.capacity) {
            self.rebuild(self.capacity)
        } else {
            self.grow()
        }
    }

    #[inline]
    fn over_load(&self) -> bool {
        self.capacity == 0 || self.len + self.tombstones + 1 >= load_limit(self.capacity)
    }

    /// Makes room for `entries` live entries in total.
    pub(crate) fn reserve(&mut self, entries: usize) -> Result<()> {
        let needed = capacity_for(entries)?;
        if needed > self.capacity {
            self.rebuild(needed)?;
        }
        Ok(())
    }

    pub(crate) fn find<Q>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if self.capacity == 0 {
            return None;
        }
        let (mut index, step) = probe_start(hash, self.capacity);
        for _ in 0..self.capacity {
            let bucket = unsafe { self.bucket(index) };
            match bucket.state {
                BucketState::Empty => return None,
                BucketState::Occupied if bucket.hash == hash && <K as Borrow<Q>>::borrow(unsafe { bucket.key() }) == key => {
                    return Some(index);
                }
                _ => {}
            }
            index = (index + step) & (self.capacity - 1);
        }
        None
    }

    fn find_slot<Q>(&self, hash: u64, key: &Q) -> Option<Probe>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if self.capacity == 0 {
            return None;
        }
        let (mut index, step) = probe_start(hash, self.capacity);
        let mut first_tombstone = None;
        for _ in 0..self.capacity {
            let bucket = unsafe { self.bucket(index) };
            match bucket.state {
                BucketState::Empty => return Some(Probe::Vacant(first_tombstone.unwrap_or(index))),
                BucketState::Tombstone => {
                    first_tombstone.get_or_insert(index);
                }
                BucketState::Occupied => {
                    if bucket.hash == hash && <K as Borrow<Q>>::borrow(unsafe { bucket.key() }) == key {
                        return Some(Probe::Found(index));
                    }
                }
            }
            index = (index + step) & (self.capacity - 1);
        }
        first_tombstone.map(Probe::Vacant)
    }

    /// Locates `key`, or a bucket it may be written to once the table has
    /// room for one more entry.
    pub(crate) fn slot_for<Q>(&mut self, hash: u64, key: &Q) -> Result<Probe>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        loop {
            match self.find_slot(hash, key) {
                Some(Probe::Found(index)) => return Ok(Probe::Found(index)),
                Some(Probe::Vacant(index)) if !self.over_load() => return Ok(Probe::Vacant(index)),
                _ => self.make_room()?,
            }
        }
    }

    /// Fills a vacant bucket returned by [`RawTable::slot_for`].
    pub(crate) fn occupy(&mut self, index: usize, hash: u64, key: K, value: V) {
        let bucket = unsafe { self.bucket_mut(index) };
        debug_assert!(bucket.state != BucketState::Occupied);
        let reused = bucket.state == BucketState::Tombstone;
        bucket.state = BucketState::Occupied;
        bucket.hash = hash;
        bucket.key.write(key);
        bucket.value.write(value);
        if reused {
            self.tombstones -= 1;
        }
        self.len += 1;
    }

    /// Inserts or replaces, returning the replaced value.
    pub(crate) fn insert(&mut self, hash: u64, key: K, value: V) -> Result<Option<V>>
    where
        K: Eq,
    {
        match self.slot_for(hash, &key)? {
            Probe::Found(index) => {
                let slot = unsafe { self.bucket_mut(index).value_mut() };
                Ok(Some(mem::replace(slot, value)))
            }
            Probe::Vacant(index) => {
                self.occupy(index, hash, key, value);
                Ok(None)
            }
        }
    }

    /// Empties bucket `index` into a tombstone and returns its entry.
    pub(crate) fn take(&mut self, index: usize) -> (K, V) {
        let bucket = unsafe { self.bucket_mut(index) };
        debug_assert!(bucket.state == BucketState::Occupied);
        bucket.state = BucketState::Tombstone;
        let entry = unsafe { (bucket.key.assume_init_read(), bucket.value.assume_init_read()) };
        self.len -= 1;
        self.tombstones += 1;
        entry
    }

    pub(crate) fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.find(hash, key)?;
        Some(self.take(index))
    }

    /// Keeps the entries `keep` accepts; the rest become tombstones.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        for index in 0..self.capacity {
            let bucket = unsafe { self.bucket_mut(index) };
            if bucket.state == BucketState::Occupied {
                let kept = unsafe { keep(bucket.key.assume_init_ref(), bucket.value.assume_init_mut()) };
                if !kept {
                    drop(self.take(index));
                }
            }
        }
    }

    /// Drops every entry and resets all buckets to empty. Capacity is kept.
    pub(crate) fn clear(&mut self) {
        for index in 0..self.capacity {
            let bucket = unsafe { self.bucket_mut(index) };
            if bucket.state == BucketState::Occupied {
                unsafe {
                    bucket.key.assume_init_drop();
                    bucket.value.assume_init_drop();
                }
            }
            bucket.state = BucketState::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    pub(crate) fn raw_iter(&self) -> RawIter<K, V> {
        RawIter {
            buckets: self.buckets,
            next: 0,
            end: self.capacity,
            left: self.len,
        }
    }

    /// Moves the next live entry at or after `*cursor` out, leaving a
    /// tombstone behind so probe chains through it stay intact.
    pub(crate) fn drain_next(&mut self, cursor: &mut usize) -> Option<(K, V)> {
        while *cursor < self.capacity {
            let index = *cursor;
            *cursor += 1;
            let bucket = unsafe { self.bucket_mut(index) };
            if bucket.state == BucketState::Occupied {
                bucket.state = BucketState::Tombstone;
                let entry = unsafe { (bucket.key.assume_init_read(), bucket.value.assume_init_read()) };
                self.len -= 1;
                self.tombstones += 1;
                return Some(entry);
            }
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn occupied_count(&self) -> usize {
        (0..self.capacity)
            .filter(|&i| unsafe { self.bucket(i) }.state == BucketState::Occupied)
            .count()
    }
}

impl<K, V, A: Allocator> Drop for RawTable<K, V, A> {
    fn drop(&mut self) {
        if self.buckets.is_null() {
            return;
        }
        if mem::needs_drop::<K>() || mem::needs_drop::<V>() {
            self.clear();
        }
        unsafe { release(&mut self.alloc, self.buckets, self.capacity) };
    }
}

/// Visits occupied buckets in array order.
pub(crate) struct RawIter<K, V> {
    buckets: *mut Bucket<K, V>,
    next: usize,
    end: usize,
    left: usize,
}

impl<K, V> RawIter<K, V> {
    #[inline]
    pub(crate) fn left(&self) -> usize {
        self.left
    }
}

impl<K, V> Iterator for RawIter<K, V> {
    type Item = *mut Bucket<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.left > 0 && self.next < self.end {
            let bucket = unsafe { self.buckets.add(self.next) };
            self.next += 1;
            if unsafe { (*bucket).state } == BucketState::Occupied {
                self.left -= 1;
                return Some(bucket);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.left, Some(self.left))
    }
}
