use crate::allocators::{
    Allocator, HeapAlloc, METADATA_ALIGN, MetaAlloc, ObjectAlloc, alloc_failure, release,
};
use crate::error::{Error, Result};
use crate::utils::Numeric;
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::ptr::{self, NonNull};
use core::slice;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};

/// A trait generalizing any contiguous sequence.
///
/// Lets `Vector` compare against and extend from std vectors, slices, arrays
/// and other `Vector`s without converting them first.
pub trait AnyVec<T> {
    fn as_slice(&self) -> &[T];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn contains(&self, x: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().contains(x)
    }
}

impl<T> AnyVec<T> for std::vec::Vec<T> {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AnyVec<T> for [T] {
    fn as_slice(&self) -> &[T] {
        self
    }
}

impl<T, const N: usize> AnyVec<T> for [T; N] {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> AnyVec<T> for Vector<T, A> {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }
}

/// A growable contiguous array whose storage comes from an [`Allocator`].
///
/// # Behavior
/// * **Growth:** a push into a full vector reserves `max(1, 2 * capacity)`.
/// * **Relocation:** always through `realloc`; Rust values move bitwise.
/// * **Shrinking:** only on `shrink_to_fit`, never automatically.
/// * **Interface:** derefs to `[T]`, so slice methods work directly.
pub struct Vector<T, A: Allocator = HeapAlloc> {
    ptr: *mut T,
    len: usize,
    cap: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for Vector<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Vector<T, A> {}

impl<T> Vector<T, HeapAlloc> {
    pub const fn new() -> Self {
        Self::with_allocator(HeapAlloc)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, HeapAlloc)
    }
}

impl<T: Clone> Vector<T, HeapAlloc> {
    /// `n` clones of `value`.
    pub fn from_elem(n: usize, value: T) -> Self {
        let mut v = Self::with_capacity(n);
        v.resize(n, value);
        v
    }
}

impl<T, A: Allocator> Vector<T, A> {
    pub const fn with_allocator(alloc: A) -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut v = Self::with_allocator(alloc);
        if capacity > 0 {
            v.reserve(capacity);
        }
        v
    }

    // --- Inspection ---

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.ptr, self.len) }
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.ptr.is_null() {
            &mut []
        } else {
            unsafe { slice::from_raw_parts_mut(self.ptr, self.len) }
        }
    }

    // --- Capacity ---

    /// Makes room for `new_capacity` elements in total. No-op when the
    /// capacity is already large enough.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity <= self.cap {
            return Ok(());
        }
        let fresh = unsafe { self.alloc.realloc(self.ptr, new_capacity, self.cap)? };
        self.ptr = fresh.as_ptr();
        self.cap = new_capacity;
        Ok(())
    }

    pub fn reserve(&mut self, new_capacity: usize) {
        if let Err(err) = self.try_reserve(new_capacity) {
            alloc_failure("Vector::reserve", err);
        }
    }

    #[inline(never)]
    fn grow_one(&mut self) -> Result<()> {
        let doubled = self.cap.checked_mul(2).ok_or(Error::CapacityOverflow)?;
        self.try_reserve(doubled.max(1))
    }

    /// Releases unused capacity.
    pub fn shrink_to_fit(&mut self) {
        if self.len == self.cap {
            return;
        }
        if self.len == 0 {
            unsafe { release(&mut self.alloc, self.ptr, self.cap) };
            self.ptr = ptr::null_mut();
            self.cap = 0;
            return;
        }
        match unsafe { self.alloc.realloc(self.ptr, self.len, self.cap) } {
            Ok(fresh) => {
                self.ptr = fresh.as_ptr();
                self.cap = self.len;
            }
            Err(err) => alloc_failure("Vector::shrink_to_fit", err),
        }
    }

    // --- Modification ---

    pub fn try_push(&mut self, value: T) -> Result<()> {
        if self.len == self.cap {
            self.grow_one()?;
        }
        unsafe { ptr::write(self.ptr.add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            alloc_failure("Vector::push", err);
        }
    }

    /// Constructs the new last element in place and returns it.
    pub fn push_with<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        if self.len == self.cap {
            if let Err(err) = self.grow_one() {
                alloc_failure("Vector::push_with", err);
            }
        }
        unsafe {
            let slot = self.ptr.add(self.len);
            ptr::write(slot, make());
            self.len += 1;
            &mut *slot
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { ptr::read(self.ptr.add(self.len)) })
    }

    /// Drops the last `count` elements, or all of them if there are fewer.
    pub fn pop_n(&mut self, count: usize) {
        self.truncate(self.len.saturating_sub(count));
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(unsafe { self.ptr.add(len) }, self.len - len);
        self.len = len;
        unsafe { ptr::drop_in_place(tail) };
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut make: F) {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len);
        while self.len < new_len {
            unsafe { ptr::write(self.ptr.add(self.len), make()) };
            self.len += 1;
        }
    }

    pub fn insert(&mut self, index: usize, value: T) {
        if let Err(err) = self.try_insert(index, value) {
            alloc_failure("Vector::insert", err);
        }
    }

    /// Inserts `value` at `index`, shifting the tail right. Fails with
    /// `OutOfRange` if `index > len`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(Error::OutOfRange { index, len: self.len });
        }
        if self.len == self.cap {
            self.grow_one()?;
        }
        unsafe {
            let at = self.ptr.add(index);
            ptr::copy(at, at.add(1), self.len - index);
            ptr::write(at, value);
        }
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index (is {}) should be < len (is {})",
            index,
            self.len
        );
        unsafe {
            let at = self.ptr.add(index);
            let value = ptr::read(at);
            ptr::copy(at.add(1), at, self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Drops the element at `index`, keeping order.
    pub fn erase(&mut self, index: usize) {
        drop(self.remove(index));
    }

    /// Drops the elements in `start..end`, keeping order.
    pub fn erase_range(&mut self, start: usize, end: usize) {
        assert!(
            start <= end && end <= self.len,
            "erase range {}..{} out of bounds for len {}",
            start,
            end,
            self.len
        );
        let old_len = self.len;
        // Leak the tail rather than double-drop if a destructor panics.
        self.len = start;
        unsafe {
            let gap = self.ptr.add(start);
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(gap, end - start));
            ptr::copy(self.ptr.add(end), gap, old_len - end);
        }
        self.len = old_len - (end - start);
    }

    /// O(1) removal: the last element fills the hole.
    pub fn swap_remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "swap_remove index (is {}) should be < len (is {})",
            index,
            self.len
        );
        self.len -= 1;
        unsafe {
            let hole = self.ptr.add(index);
            let value = ptr::read(hole);
            ptr::copy(self.ptr.add(self.len), hole, 1);
            value
        }
    }

    #[inline]
    pub fn swap_elements(&mut self, a: usize, b: usize) {
        self.as_mut_slice().swap(a, b);
    }

    /// Exchanges contents and allocators with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Moves every element of `other` to the end of `self`.
    pub fn append<B: Allocator>(&mut self, other: &mut Vector<T, B>) {
        if other.len == 0 {
            return;
        }
        let total = self.len + other.len;
        if total > self.cap {
            self.reserve(total.max(self.cap * 2));
        }
        unsafe { ptr::copy_nonoverlapping(other.ptr, self.ptr.add(self.len), other.len) };
        self.len = total;
        other.len = 0;
    }

    // --- Access ---

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    // --- Interop ---

    pub fn eq_any<V: AnyVec<T> + ?Sized>(&self, other: &V) -> bool
    where
        T: PartialEq,
    {
        self.as_slice() == other.as_slice()
    }

    pub fn extend_from_any<V: AnyVec<T> + ?Sized>(&mut self, other: &V)
    where
        T: Clone,
    {
        self.extend_from_slice(other.as_slice());
    }

    // --- Searching ---

    /// Position of `value`. A sorted vector is binary searched.
    pub fn find(&self, value: &T, sorted: bool) -> Option<usize>
    where
        T: Ord,
    {
        if sorted {
            self.as_slice().binary_search(value).ok()
        } else {
            self.iter().position(|x| x == value)
        }
    }

    /// Index of the first largest element.
    pub fn biggest(&self) -> Option<usize>
    where
        T: PartialOrd,
    {
        self.pick(|candidate, best| candidate > best)
    }

    /// Index of the first smallest element.
    pub fn smallest(&self) -> Option<usize>
    where
        T: PartialOrd,
    {
        self.pick(|candidate, best| candidate < best)
    }

    fn pick(&self, better: impl Fn(&T, &T) -> bool) -> Option<usize> {
        let slice = self.as_slice();
        let mut best = 0;
        for (i, x) in slice.iter().enumerate().skip(1) {
            if better(x, &slice[best]) {
                best = i;
            }
        }
        (!slice.is_empty()).then_some(best)
    }
}

impl<T: Clone, A: Allocator> Vector<T, A> {
    pub fn resize(&mut self, new_len: usize, value: T) {
        self.resize_with(new_len, || value.clone());
    }

    /// Appends clones of every element of `other`.
    pub fn extend_from_slice(&mut self, other: &[T]) {
        let total = self.len + other.len();
        if total > self.cap {
            self.reserve(total.max(self.cap * 2));
        }
        for x in other {
            unsafe { ptr::write(self.ptr.add(self.len), x.clone()) };
            self.len += 1;
        }
    }

    /// Replaces the contents with clones of `other`.
    pub fn assign(&mut self, other: &[T]) {
        self.clear();
        self.extend_from_slice(other);
    }

    /// Replaces the contents with `n` clones of `value`.
    pub fn assign_fill(&mut self, n: usize, value: T) {
        self.clear();
        self.resize(n, value);
    }
}

impl<T: Default, A: Allocator> Vector<T, A> {
    pub fn resize_default(&mut self, new_len: usize) {
        self.resize_with(new_len, T::default);
    }
}

// --- Reductions ---

impl<T: Numeric, A: Allocator> Vector<T, A> {
    pub fn sum(&self) -> T {
        self.iter().fold(T::ZERO, |acc, &x| acc + x)
    }

    pub fn product(&self) -> T {
        self.iter().fold(T::ONE, |acc, &x| acc * x)
    }

    /// `None` when empty, or when `len` does not fit in `T`.
    pub fn mean(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        T::from_count(self.len).map(|count| self.sum() / count)
    }

    /// Middle value of a sorted copy; the mean of the two middle values for
    /// an even length.
    pub fn median(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let mut sorted: Vector<T> = self.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            Some(sorted[mid])
        } else {
            Some((sorted[mid - 1] + sorted[mid]) / (T::ONE + T::ONE))
        }
    }
}

// --- Header-carrying allocators ---

impl<T> Vector<T, MetaAlloc> {
    pub fn with_metadata_size(header_size: usize) -> Self {
        Self::with_allocator(MetaAlloc::with_header_size(header_size))
    }

    #[inline]
    pub fn metadata_size(&self) -> usize {
        self.alloc.header_size()
    }

    /// Changes the header size. Drops the contents and releases the current
    /// block, header included.
    pub fn set_metadata_size(&mut self, header_size: usize) {
        self.clear();
        if !self.ptr.is_null() {
            unsafe { release(&mut self.alloc, self.ptr, self.cap) };
            self.ptr = ptr::null_mut();
            self.cap = 0;
        }
        self.alloc.set_header_size(header_size);
    }

    /// Allocates the block (and its zeroed header) if there is none yet.
    pub fn create_metadata(&mut self) {
        if self.ptr.is_null() {
            self.reserve(1);
        }
    }

    fn metadata_ptr(&self) -> Option<NonNull<u8>> {
        let ptr = NonNull::new(self.ptr)?;
        unsafe { self.alloc.get_metadata(ptr) }.ok()
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        let header = self.metadata_ptr()?;
        Some(unsafe { slice::from_raw_parts(header.as_ptr(), self.metadata_size()) })
    }

    pub fn metadata_mut(&mut self) -> Option<&mut [u8]> {
        let header = self.metadata_ptr()?;
        Some(unsafe { slice::from_raw_parts_mut(header.as_ptr(), self.metadata_size()) })
    }

    /// Views the header as a `U`.
    ///
    /// # Safety
    /// The header bytes must be a valid `U`. A fresh header is all zeroes.
    ///
    /// # Panics
    /// If `U` is larger than the header or needs more than
    /// [`METADATA_ALIGN`] alignment.
    pub unsafe fn get_metadata<U>(&self) -> Option<&U> {
        Self::check_header_fits::<U>(self.metadata_size());
        self.metadata_ptr().map(|p| unsafe { p.cast::<U>().as_ref() })
    }

    /// # Safety
    /// Same as [`Vector::get_metadata`].
    pub unsafe fn get_metadata_mut<U>(&mut self) -> Option<&mut U> {
        Self::check_header_fits::<U>(self.metadata_size());
        self.metadata_ptr().map(|p| unsafe { p.cast::<U>().as_mut() })
    }

    fn check_header_fits<U>(header_size: usize) {
        assert!(
            mem::size_of::<U>() <= header_size && mem::align_of::<U>() <= METADATA_ALIGN,
            "metadata type does not fit a {header_size}-byte header"
        );
    }
}

impl<T, U: Default> Vector<T, ObjectAlloc<U>> {
    /// Allocates the block (constructing its object) if there is none yet.
    pub fn create_object(&mut self) -> Result<&mut U> {
        if self.ptr.is_null() {
            self.try_reserve(1)?;
        }
        let ptr = NonNull::new(self.ptr).ok_or(Error::OutOfMemory { bytes: 0 })?;
        Ok(unsafe { self.alloc.get_object(ptr)?.as_mut() })
    }

    pub fn get_object(&self) -> Option<&U> {
        let ptr = NonNull::new(self.ptr)?;
        unsafe { self.alloc.get_object(ptr).ok().map(|p| p.as_ref()) }
    }

    pub fn get_object_mut(&mut self) -> Option<&mut U> {
        let ptr = NonNull::new(self.ptr)?;
        unsafe { self.alloc.get_object(ptr).ok().map(|mut p| p.as_mut()) }
    }
}

// --- Trait Implementations ---

// 1. Deref / DerefMut (Slice access)
impl<T, A: Allocator> Deref for Vector<T, A> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for Vector<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

// 2. Drop
impl<T, A: Allocator> Drop for Vector<T, A> {
    fn drop(&mut self) {
        self.clear();
        if !self.ptr.is_null() {
            unsafe { release(&mut self.alloc, self.ptr, self.cap) };
        }
    }
}

// 3. Clone
impl<T: Clone, A: Allocator + Clone> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::with_allocator(self.alloc.clone());
        if self.len > 0 {
            out.reserve(self.len);
            out.extend_from_slice(self);
        }
        out
    }
}

// 4. Debug
impl<T: fmt::Debug, A: Allocator> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

// 5. Default
impl<T, A: Allocator + Default> Default for Vector<T, A> {
    fn default() -> Self {
        Self::with_allocator(A::default())
    }
}

// 6. Comparison
impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<Vector<T, B>> for Vector<T, A> {
    fn eq(&self, other: &Vector<T, B>) -> bool {
        self.len == other.len && self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq, A: Allocator> PartialEq<[T]> for Vector<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for Vector<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, A: Allocator> Eq for Vector<T, A> {}

impl<T: PartialOrd, A: Allocator> PartialOrd for Vector<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.len.cmp(&other.len) {
            Ordering::Equal => self.as_slice().partial_cmp(other.as_slice()),
            by_len => Some(by_len),
        }
    }
}

impl<T: Ord, A: Allocator> Ord for Vector<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.len
            .cmp(&other.len)
            .then_with(|| self.as_slice().cmp(other.as_slice()))
    }
}

// 7. Hash
impl<T: Hash, A: Allocator> Hash for Vector<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

// 8. Indexing
impl<T, A: Allocator> Index<usize> for Vector<T, A> {
    type Output = T;
    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T, A: Allocator> IndexMut<usize> for Vector<T, A> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

// 9. Extend / FromIterator
impl<T, A: Allocator> Extend<T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if self.len + lower > self.cap {
            self.reserve(self.len + lower);
        }
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Vector<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::default();
        v.extend(iter);
        v
    }
}

// 10. Conversions
impl<T: Clone> From<&[T]> for Vector<T> {
    fn from(slice: &[T]) -> Self {
        let mut v = Self::with_capacity(slice.len());
        v.extend_from_slice(slice);
        v
    }
}

impl<T, const N: usize> From<[T; N]> for Vector<T> {
    fn from(array: [T; N]) -> Self {
        let mut v = Self::with_capacity(N);
        v.extend(array);
        v
    }
}

impl<T> From<Vec<T>> for Vector<T> {
    fn from(vec: Vec<T>) -> Self {
        let mut v = Self::with_capacity(vec.len());
        v.extend(vec);
        v
    }
}

impl<T, A: Allocator> AsRef<[T]> for Vector<T, A> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> Borrow<[T]> for Vector<T, A> {
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

// 11. Iteration
impl<'a, T, A: Allocator> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Vector<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: Allocator> IntoIterator for Vector<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let me = ManuallyDrop::new(self);
        IntoIter {
            ptr: me.ptr,
            cap: me.cap,
            start: 0,
            end: me.len,
            alloc: unsafe { ptr::read(&me.alloc) },
        }
    }
}

/// Owning iterator; frees the storage through the allocator when dropped.
pub struct IntoIter<T, A: Allocator = HeapAlloc> {
    ptr: *mut T,
    cap: usize,
    start: usize,
    end: usize,
    alloc: A,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let value = unsafe { ptr::read(self.ptr.add(self.start)) };
        self.start += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.start;
        (n, Some(n))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        Some(unsafe { ptr::read(self.ptr.add(self.end)) })
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.add(self.start),
                self.end - self.start,
            ));
            release(&mut self.alloc, self.ptr, self.cap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::{ArenaAlloc, TrackingAlloc};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_vec_growth_policy() {
        let mut v = Vector::new();
        assert_eq!(v.capacity(), 0);
        v.push(1);
        assert_eq!(v.capacity(), 1);
        v.push(2);
        assert_eq!(v.capacity(), 2);
        v.push(3);
        assert_eq!(v.capacity(), 4);
        for i in 0..100 {
            v.push(i);
            assert!(v.len() <= v.capacity());
        }
    }

    #[test]
    fn test_vec_erase_range_scenario() {
        let mut v: Vector<i32> = (0..10).collect();
        v.erase_range(2, 7);
        assert_eq!(v, [0, 1, 7, 8, 9]);
        assert_eq!(v.len(), 5);
        v.erase(0);
        assert_eq!(v, [1, 7, 8, 9]);
        v.push(42);
        assert_eq!(v, [1, 7, 8, 9, 42]);
    }

    #[test]
    fn test_vec_insert_remove_swap_remove() {
        let mut v = Vector::from([1, 2, 3]);
        v.insert(0, 0);
        v.insert(4, 4);
        assert_eq!(v, [0, 1, 2, 3, 4]);
        assert_eq!(v.remove(2), 2);
        assert_eq!(v.swap_remove(0), 0);
        assert_eq!(v, [4, 1, 3]);
        v.swap_elements(0, 2);
        assert_eq!(v, [3, 1, 4]);
    }

    #[test]
    fn test_vec_shrink_to_fit() {
        let mut v = Vector::with_capacity(64);
        v.extend(0..10);
        v.shrink_to_fit();
        assert_eq!(v.len(), v.capacity());
        v.clear();
        v.shrink_to_fit();
        assert_eq!(v.capacity(), 0);
        v.push(1);
        assert_eq!(v[0], 1);
    }

    #[test]
    fn test_vec_pop_and_pop_n() {
        let mut v: Vector<_> = (1..=5).collect();
        assert_eq!(v.pop(), Some(5));
        v.pop_n(2);
        assert_eq!(v, [1, 2]);
        v.pop_n(10);
        assert!(v.is_empty());
        assert_eq!(v.pop(), None);
    }

    #[test]
    fn test_vec_checked_access() {
        let mut v = Vector::from([10, 20]);
        assert_eq!(*v.at(1).unwrap(), 20);
        assert!(matches!(v.at(2), Err(Error::OutOfRange { index: 2, len: 2 })));
        *v.at_mut(0).unwrap() = 11;
        assert_eq!(v.front(), Some(&11));
        assert_eq!(v.back(), Some(&20));
        assert_eq!(Vector::<i32>::new().front(), None);
    }

    #[test]
    fn test_vec_clone_and_compare() {
        let v: Vector<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let c = v.clone();
        assert_eq!(v, v);
        assert_eq!(c, v);
        let shorter = Vector::from(vec![String::from("a")]);
        assert!(shorter < v);
        assert!(v.eq_any(&vec![String::from("a"), String::from("b")]));
    }

    #[test]
    fn test_vec_orders_by_length_first() {
        let short = Vector::from([2]);
        let long = Vector::from([1, 1]);
        assert_eq!(short.cmp(&long), Ordering::Less);
        assert_eq!(short.partial_cmp(&long), Some(Ordering::Less));
        assert!(Vector::from([1, 2]) < Vector::from([1, 3]));
        assert!(Vector::from([0.5]) < Vector::from([0.1, 0.1]));
        assert_eq!(Vector::from([4, 4]).cmp(&Vector::from([4, 4])), Ordering::Equal);
    }

    #[test]
    fn test_vec_mean_with_count_outside_element_range() {
        assert_eq!(Vector::<u8>::from_elem(256, 0).mean(), None);
        assert_eq!(Vector::<i8>::from_elem(200, 0).mean(), None);
        assert_eq!(Vector::<u8>::from_elem(255, 1).mean(), Some(1));
        assert_eq!(Vector::<i8>::from_elem(127, 0).mean(), Some(0));
        assert_eq!(Vector::<u16>::from_elem(256, 3).mean(), Some(3));
    }

    #[test]
    fn test_vec_try_insert_past_end() {
        let mut v = Vector::from([1, 2, 3]);
        assert!(matches!(v.try_insert(4, 9), Err(Error::OutOfRange { index: 4, len: 3 })));
        assert_eq!(v, [1, 2, 3]);
        v.try_insert(3, 4).unwrap();
        assert_eq!(v, [1, 2, 3, 4]);
    }

    #[test]
    fn test_vec_find_and_extremes() {
        let v = Vector::from([5, 3, 9, 1, 9]);
        assert_eq!(v.find(&9, false), Some(2));
        assert_eq!(v.find(&7, false), None);
        assert_eq!(v.biggest(), Some(2));
        assert_eq!(v.smallest(), Some(3));

        let sorted = Vector::from([1, 3, 5, 7, 9]);
        assert_eq!(sorted.find(&7, true), Some(3));
        assert_eq!(sorted.find(&4, true), None);
    }

    #[test]
    fn test_vec_reductions() {
        let v = Vector::from([4, 1, 3, 2]);
        assert_eq!(v.sum(), 10);
        assert_eq!(v.product(), 24);
        assert_eq!(v.mean(), Some(2));
        assert_eq!(v.median(), Some(2));
        assert_eq!(v, [4, 1, 3, 2]);

        let f = Vector::from([1.0f64, 5.0, 3.0]);
        assert_eq!(f.median(), Some(3.0));
        assert_eq!(f.mean(), Some(3.0));
        assert_eq!(Vector::<f32>::new().median(), None);
    }

    #[test]
    fn test_vec_resize_and_assign() {
        let mut v = Vector::new();
        v.resize(3, 7u8);
        assert_eq!(v, [7, 7, 7]);
        v.resize_default(5);
        assert_eq!(v, [7, 7, 7, 0, 0]);
        v.resize(1, 0);
        assert_eq!(v, [7]);
        v.assign(&[1, 2]);
        assert_eq!(v, [1, 2]);
        v.assign_fill(2, 9);
        assert_eq!(v, [9, 9]);
        let w = Vector::from_elem(3, 'x');
        assert_eq!(w, ['x', 'x', 'x']);
    }

    #[test]
    fn test_vec_append_and_swap() {
        let mut a = Vector::from([1, 2]);
        let mut b = Vector::from([3, 4]);
        a.append(&mut b);
        assert_eq!(a, [1, 2, 3, 4]);
        assert!(b.is_empty());
        b.push(9);
        a.swap(&mut b);
        assert_eq!(a, [9]);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_vec_push_with_returns_slot() {
        let mut v: Vector<Vec<u8>> = Vector::new();
        v.push_with(Vec::new).push(3);
        assert_eq!(v[0], vec![3]);
    }

    #[test]
    fn test_vec_drops_every_element_once() {
        let drops = Rc::new(Cell::new(0));
        struct D(Rc<Cell<u32>>);
        impl Drop for D {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }
        {
            let mut v = Vector::new();
            for _ in 0..10 {
                v.push(D(drops.clone()));
            }
            v.erase_range(0, 3);
            assert_eq!(drops.get(), 3);
            drop(v.remove(0));
            assert_eq!(drops.get(), 4);
            let mut it = v.into_iter();
            drop(it.next());
            assert_eq!(drops.get(), 5);
        }
        assert_eq!(drops.get(), 10);
    }

    #[test]
    fn test_vec_tracked_allocator_balanced() {
        let mut tracker = TrackingAlloc::new();
        {
            let mut v = Vector::with_allocator(&mut tracker);
            for i in 0..1000u64 {
                v.push(i);
            }
            v.erase_range(0, 500);
            v.shrink_to_fit();
            assert_eq!(v.capacity(), 500);
            let total: u64 = v.iter().sum();
            assert_eq!(total, (500..1000).sum());
        }
        tracker.assert_no_leaks().unwrap();
    }

    #[test]
    fn test_vec_out_of_memory_surfaces() {
        let mut v = Vector::with_allocator(ArenaAlloc::<64>::new());
        let mut pushed = 0;
        let err = loop {
            match v.try_push(pushed as u64) {
                Ok(()) => pushed += 1,
                Err(err) => break err,
            }
        };
        assert!(matches!(err, Error::OutOfMemory { .. }));
        assert!(pushed >= 4);
        assert_eq!(v.len(), pushed);
    }

    #[test]
    #[should_panic(expected = "Vector::push")]
    fn test_vec_push_panics_on_exhaustion() {
        let mut v = Vector::with_allocator(ArenaAlloc::<16>::new());
        for i in 0..100u64 {
            v.push(i);
        }
    }

    #[test]
    fn test_vec_metadata_survives_growth() {
        let mut v: Vector<u32, MetaAlloc> = Vector::with_metadata_size(8);
        assert!(v.metadata().is_none());
        v.create_metadata();
        assert_eq!(v.metadata().unwrap(), &[0; 8]);
        unsafe { *v.get_metadata_mut::<u64>().unwrap() = 0xDEAD_BEEF };
        for i in 0..1000 {
            v.push(i);
        }
        assert_eq!(unsafe { *v.get_metadata::<u64>().unwrap() }, 0xDEAD_BEEF);
        assert_eq!(v[999], 999);

        v.set_metadata_size(32);
        assert!(v.is_empty());
        v.create_metadata();
        assert_eq!(v.metadata().unwrap().len(), 32);
    }

    #[derive(Default, Debug, PartialEq)]
    struct Header {
        name: String,
        hits: u32,
    }

    #[test]
    fn test_vec_object_header() {
        let mut v: Vector<u8, ObjectAlloc<Header>> = Vector::default();
        assert!(v.get_object().is_none());
        v.create_object().unwrap().name.push_str("bytes");
        for b in 0..200u8 {
            v.push(b);
        }
        v.get_object_mut().unwrap().hits += 1;
        assert_eq!(
            v.get_object(),
            Some(&Header {
                name: "bytes".into(),
                hits: 1
            })
        );
    }
}
