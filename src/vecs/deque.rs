//! Block-mapped double-ended queue.
//!
//! Elements live in fixed blocks of [`BLOCK_SIZE`] slots. A map of block
//! pointers tracks the live blocks `front_block..=back_block`; the first
//! element sits at `start` in the front block and the back block is filled
//! up to `end`. Pushing past either end allocates one block; popping the
//! last element out of a block frees it. Elements never move once written.

use crate::allocators::{Allocator, HeapAlloc, alloc_failure, release};
use crate::error::{Error, Result};
use core::fmt;
use core::mem;
use core::ptr;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Elements per block.
pub const BLOCK_SIZE: usize = 2048;

/// Block slots in a freshly created map.
pub const INITIAL_MAP_SIZE: usize = 4;

// ─── AnyDeque ─────────────────────────────────────────────────────────────────

/// An object-safe abstraction over double-ended queue types.
///
/// Implemented by both `VecDeque<T>` and [`Deque<T, A>`] so that code can work
/// on a deque without knowing its storage.
pub trait AnyDeque<T> {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn push_back(&mut self, item: T);
    fn push_front(&mut self, item: T);
    fn pop_back(&mut self) -> Option<T>;
    fn pop_front(&mut self) -> Option<T>;
    fn clear(&mut self);
    fn front(&self) -> Option<&T>;
    fn back(&self) -> Option<&T>;
}

impl<T> AnyDeque<T> for VecDeque<T> {
    fn len(&self) -> usize {
        self.len()
    }
    fn push_back(&mut self, item: T) {
        self.push_back(item);
    }
    fn push_front(&mut self, item: T) {
        self.push_front(item);
    }
    fn pop_back(&mut self) -> Option<T> {
        self.pop_back()
    }
    fn pop_front(&mut self) -> Option<T> {
        self.pop_front()
    }
    fn clear(&mut self) {
        self.clear();
    }
    fn front(&self) -> Option<&T> {
        self.front()
    }
    fn back(&self) -> Option<&T> {
        self.back()
    }
}

impl<T, A: Allocator> AnyDeque<T> for Deque<T, A> {
    fn len(&self) -> usize {
        self.len
    }
    fn push_back(&mut self, item: T) {
        Deque::push_back(self, item);
    }
    fn push_front(&mut self, item: T) {
        Deque::push_front(self, item);
    }
    fn pop_back(&mut self) -> Option<T> {
        Deque::pop_back(self)
    }
    fn pop_front(&mut self) -> Option<T> {
        Deque::pop_front(self)
    }
    fn clear(&mut self) {
        Deque::clear(self);
    }
    fn front(&self) -> Option<&T> {
        Deque::front(self)
    }
    fn back(&self) -> Option<&T> {
        Deque::back(self)
    }
}

// ─── Deque ────────────────────────────────────────────────────────────────────

/// A double-ended queue over a map of fixed-size blocks.
///
/// The map is created lazily on the first push with [`INITIAL_MAP_SIZE`]
/// slots and the first block in the middle. When either end runs out of map
/// slots the map doubles and the live block range is re-centered.
pub struct Deque<T, A: Allocator = HeapAlloc> {
    map: *mut *mut T,
    map_size: usize,
    front_block: usize,
    back_block: usize,
    start: usize,
    end: usize,
    len: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for Deque<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Deque<T, A> {}

impl<T> Deque<T, HeapAlloc> {
    pub const fn new() -> Self {
        Self::with_allocator(HeapAlloc)
    }
}

impl<T, A: Allocator> Deque<T, A> {
    pub const fn with_allocator(alloc: A) -> Self {
        Self {
            map: ptr::null_mut(),
            map_size: 0,
            front_block: 0,
            back_block: 0,
            start: 0,
            end: 0,
            len: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Blocks currently allocated.
    pub fn allocated_blocks(&self) -> usize {
        if self.map.is_null() {
            0
        } else {
            self.back_block - self.front_block + 1
        }
    }

    /// Slots in the block map.
    #[inline]
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    #[inline(always)]
    unsafe fn block(&self, index: usize) -> *mut T {
        unsafe { *self.map.add(index) }
    }

    /// Address of logical element `index`, which must be `< len`.
    #[inline(always)]
    fn slot(&self, index: usize) -> *mut T {
        let pos = self.start + index;
        unsafe { self.block(self.front_block + pos / BLOCK_SIZE).add(pos % BLOCK_SIZE) }
    }

    fn init_map(&mut self) -> Result<()> {
        let map = self.alloc.malloc::<*mut T>(INITIAL_MAP_SIZE)?;
        let block = match self.alloc.malloc::<T>(BLOCK_SIZE) {
            Ok(block) => block,
            Err(err) => {
                unsafe { release(&mut self.alloc, map.as_ptr(), INITIAL_MAP_SIZE) };
                return Err(err);
            }
        };
        let middle = INITIAL_MAP_SIZE / 2;
        unsafe {
            for i in 0..INITIAL_MAP_SIZE {
                map.as_ptr().add(i).write(ptr::null_mut());
            }
            map.as_ptr().add(middle).write(block.as_ptr());
        }
        self.map = map.as_ptr();
        self.map_size = INITIAL_MAP_SIZE;
        self.front_block = middle;
        self.back_block = middle;
        self.start = 0;
        self.end = 0;
        Ok(())
    }

    /// Doubles the map and re-centers the live blocks so both ends gain
    /// free slots.
    #[inline(never)]
    fn resize_map(&mut self) -> Result<()> {
        let in_use = self.back_block - self.front_block + 1;
        let new_size = self.map_size.checked_mul(2).ok_or(Error::CapacityOverflow)?;
        let new_front = ((new_size - in_use) / 2).max(1);
        let new_map = self.alloc.malloc::<*mut T>(new_size)?;
        unsafe {
            for i in 0..new_size {
                new_map.as_ptr().add(i).write(ptr::null_mut());
            }
            ptr::copy_nonoverlapping(
                self.map.add(self.front_block),
                new_map.as_ptr().add(new_front),
                in_use,
            );
        }
        tracing::trace!(
            old_size = self.map_size,
            new_size,
            blocks = in_use,
            "deque block map resized"
        );
        let old_map = mem::replace(&mut self.map, new_map.as_ptr());
        let old_size = mem::replace(&mut self.map_size, new_size);
        self.front_block = new_front;
        self.back_block = new_front + in_use - 1;
        // The deque already runs on the new map; a failed free only loses the old one.
        unsafe { self.alloc.free(old_map, old_size) }
    }

    unsafe fn free_block(&mut self, index: usize) {
        unsafe {
            let block = self.block(index);
            release(&mut self.alloc, block, BLOCK_SIZE);
            self.map.add(index).write(ptr::null_mut());
        }
    }

    // --- Modification ---

    pub fn try_push_back(&mut self, value: T) -> Result<()> {
        if self.map.is_null() {
            self.init_map()?;
        }
        if self.end == BLOCK_SIZE {
            if self.back_block + 1 == self.map_size {
                self.resize_map()?;
            }
            let block = self.alloc.malloc::<T>(BLOCK_SIZE)?;
            unsafe { self.map.add(self.back_block + 1).write(block.as_ptr()) };
            self.back_block += 1;
            self.end = 0;
        }
        unsafe { self.block(self.back_block).add(self.end).write(value) };
        self.end += 1;
        self.len += 1;
        Ok(())
    }

    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            alloc_failure("Deque::push_back", err);
        }
    }

    pub fn try_push_front(&mut self, value: T) -> Result<()> {
        if self.map.is_null() {
            self.init_map()?;
        }
        if self.len == 0 {
            // Start the single empty block from its top so the element stays
            // in it.
            self.start = BLOCK_SIZE;
            self.end = BLOCK_SIZE;
        }
        if self.start == 0 {
            if self.front_block == 0 {
                self.resize_map()?;
            }
            let block = self.alloc.malloc::<T>(BLOCK_SIZE)?;
            unsafe { self.map.add(self.front_block - 1).write(block.as_ptr()) };
            self.front_block -= 1;
            self.start = BLOCK_SIZE;
        }
        self.start -= 1;
        unsafe { self.block(self.front_block).add(self.start).write(value) };
        self.len += 1;
        Ok(())
    }

    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            alloc_failure("Deque::push_front", err);
        }
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.end -= 1;
        let value = unsafe { self.block(self.back_block).add(self.end).read() };
        self.len -= 1;
        if self.len == 0 {
            self.start = 0;
            self.end = 0;
        } else if self.end == 0 {
            unsafe { self.free_block(self.back_block) };
            self.back_block -= 1;
            self.end = BLOCK_SIZE;
        }
        Some(value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = unsafe { self.block(self.front_block).add(self.start).read() };
        self.start += 1;
        self.len -= 1;
        if self.len == 0 {
            self.start = 0;
            self.end = 0;
        } else if self.start == BLOCK_SIZE {
            unsafe { self.free_block(self.front_block) };
            self.front_block += 1;
            self.start = 0;
        }
        Some(value)
    }

    /// Drops every element. One block stays allocated.
    pub fn clear(&mut self) {
        while self.pop_back().is_some() {}
    }

    // --- Access ---

    pub fn get(&self, index: usize) -> Option<&T> {
        (index < self.len).then(|| unsafe { &*self.slot(index) })
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        (index < self.len).then(|| unsafe { &mut *self.slot(index) })
    }

    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.get(index).ok_or(Error::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.get_mut(index).ok_or(Error::OutOfRange { index, len })
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.len.checked_sub(1).and_then(move |i| self.get_mut(i))
    }

    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            deque: self,
            front: 0,
            back: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            map: self.map,
            front_block: self.front_block,
            start: self.start,
            front: 0,
            back: self.len,
            _marker: PhantomData,
        }
    }
}

// --- Trait Implementations ---

impl<T, A: Allocator> Drop for Deque<T, A> {
    fn drop(&mut self) {
        if self.map.is_null() {
            return;
        }
        self.clear();
        unsafe {
            for i in self.front_block..=self.back_block {
                self.free_block(i);
            }
            release(&mut self.alloc, self.map, self.map_size);
        }
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Deque<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::with_allocator(self.alloc.clone());
        out.extend(self.iter().cloned());
        out
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Deque<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: Allocator + Default> Default for Deque<T, A> {
    fn default() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<T: PartialEq, A: Allocator> PartialEq for Deque<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for Deque<T, A> {}

impl<T, A: Allocator> Index<usize> for Deque<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {index} out of range for deque of length {}", self.len),
        }
    }
}

impl<T, A: Allocator> IndexMut<usize> for Deque<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("index {index} out of range for deque of length {len}"),
        }
    }
}

impl<T, A: Allocator> Extend<T> for Deque<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Deque<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut d = Self::default();
        d.extend(iter);
        d
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Deque<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Deque<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: Allocator> IntoIterator for Deque<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { deque: self }
    }
}

// ─── Iterators ────────────────────────────────────────────────────────────────

/// Random-access iterator by logical index; crosses block gaps transparently.
pub struct Iter<'a, T, A: Allocator = HeapAlloc> {
    deque: &'a Deque<T, A>,
    front: usize,
    back: usize,
}

impl<'a, T, A: Allocator> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = self.deque.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<'a, T, A: Allocator> DoubleEndedIterator for Iter<'a, T, A> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.deque.get(self.back)
    }
}

impl<T, A: Allocator> ExactSizeIterator for Iter<'_, T, A> {}
impl<T, A: Allocator> FusedIterator for Iter<'_, T, A> {}

pub struct IterMut<'a, T> {
    map: *mut *mut T,
    front_block: usize,
    start: usize,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<T> IterMut<'_, T> {
    #[inline(always)]
    fn slot(&self, index: usize) -> *mut T {
        let pos = self.start + index;
        unsafe { (*self.map.add(self.front_block + pos / BLOCK_SIZE)).add(pos % BLOCK_SIZE) }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        let slot = self.slot(self.front);
        self.front += 1;
        Some(unsafe { &mut *slot })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { &mut *self.slot(self.back) })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

pub struct IntoIter<T, A: Allocator = HeapAlloc> {
    deque: Deque<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len, Some(self.deque.len))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        self.deque.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
