use super::{Allocator, array_layout};
use crate::error::{Error, Result};
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

/// Bump allocator over a fixed buffer of `N` bytes.
///
/// * `malloc` bumps the high-water offset, aligned for `T`.
/// * `free` is a no-op. Memory comes back only through [`ArenaAlloc::reset`].
/// * `realloc` grows or shrinks in place when the block is the most recent
///   allocation, otherwise it copies into a fresh block.
///
/// The buffer lives on the heap so its address stays put when the arena (or
/// a container holding it) moves. One arena should back one container at a
/// time: whoever owns the top of the arena gets in-place growth.
pub struct ArenaAlloc<const N: usize = { 256 * 1024 }> {
    buffer: Box<[MaybeUninit<u8>]>,
    used: usize,
}

impl<const N: usize> ArenaAlloc<N> {
    pub fn new() -> Self {
        Self {
            buffer: vec![MaybeUninit::uninit(); N].into_boxed_slice(),
            used: 0,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes consumed so far, alignment padding included.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        N - self.used
    }

    /// Makes the whole buffer available again.
    ///
    /// Requires `&mut self`, so no container can still be holding blocks.
    pub fn reset(&mut self) {
        self.used = 0;
    }

    #[inline(always)]
    fn base(&mut self) -> *mut u8 {
        self.buffer.as_mut_ptr() as *mut u8
    }

    fn bump(&mut self, bytes: usize, align: usize) -> Result<NonNull<u8>> {
        let base = self.base() as usize;
        let start = (base + self.used).next_multiple_of(align) - base;
        let end = start.checked_add(bytes).ok_or(Error::CapacityOverflow)?;
        if end > N {
            tracing::debug!(
                requested = bytes,
                used = self.used,
                capacity = N,
                "arena exhausted"
            );
            return Err(Error::OutOfMemory { bytes });
        }
        self.used = end;
        // `start <= N`, so the pointer stays inside the buffer.
        Ok(unsafe { NonNull::new_unchecked(self.base().add(start)) })
    }

    #[inline]
    fn offset_of(&mut self, ptr: *const u8) -> usize {
        ptr as usize - self.base() as usize
    }
}

impl<const N: usize> Default for ArenaAlloc<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for ArenaAlloc<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaAlloc")
            .field("capacity", &N)
            .field("used", &self.used)
            .finish()
    }
}

impl<const N: usize> Allocator for ArenaAlloc<N> {
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        let layout = array_layout::<T>(n)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        Ok(self.bump(layout.size(), layout.align())?.cast())
    }

    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>> {
        let old_bytes = array_layout::<T>(old_n)?.size();
        if ptr.is_null() || old_bytes == 0 {
            return self.malloc(new_n);
        }
        let new_bytes = array_layout::<T>(new_n)?.size();
        let offset = self.offset_of(ptr as *const u8);

        if offset + old_bytes == self.used {
            let end = offset.checked_add(new_bytes).ok_or(Error::CapacityOverflow)?;
            if end > N {
                tracing::debug!(requested = new_bytes, used = self.used, capacity = N, "arena exhausted");
                return Err(Error::OutOfMemory { bytes: new_bytes });
            }
            self.used = end;
            // SAFETY: `ptr` was non-null on entry.
            return Ok(unsafe { NonNull::new_unchecked(ptr) });
        }

        let fresh = self.malloc::<T>(new_n)?;
        unsafe {
            ptr::copy_nonoverlapping(
                ptr as *const u8,
                fresh.as_ptr() as *mut u8,
                old_bytes.min(new_bytes),
            );
        }
        Ok(fresh)
    }

    #[inline]
    unsafe fn free<T>(&mut self, _ptr: *mut T, _n: usize) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_bump_and_alignment() {
        let mut arena = ArenaAlloc::<256>::new();
        let a = arena.malloc::<u8>(3).unwrap();
        let b = arena.malloc::<u64>(2).unwrap();
        assert_eq!(b.as_ptr() as usize % std::mem::align_of::<u64>(), 0);
        assert!(b.as_ptr() as usize >= a.as_ptr() as usize + 3);
        assert!(arena.used() >= 3 + 16);
        assert_eq!(arena.remaining(), 256 - arena.used());
    }

    #[test]
    fn test_arena_exhaustion() {
        let mut arena = ArenaAlloc::<64>::new();
        assert!(arena.malloc::<u8>(60).is_ok());
        assert!(matches!(
            arena.malloc::<u8>(10),
            Err(Error::OutOfMemory { bytes: 10 })
        ));
        arena.reset();
        assert!(arena.malloc::<u8>(64).is_ok());
    }

    #[test]
    fn test_arena_realloc_in_place_at_top() {
        let mut arena = ArenaAlloc::<1024>::new();
        let p = arena.malloc::<u32>(4).unwrap();
        unsafe {
            p.as_ptr().write(7);
            let q = arena.realloc(p.as_ptr(), 16, 4).unwrap();
            assert_eq!(p, q);
            assert_eq!(*q.as_ptr(), 7);
            let used = arena.used();
            let q = arena.realloc(q.as_ptr(), 2, 16).unwrap();
            assert_eq!(p, q);
            assert_eq!(arena.used(), used - 14 * 4);
        }
    }

    #[test]
    fn test_arena_realloc_copies_when_not_top() {
        let mut arena = ArenaAlloc::<1024>::new();
        let p = arena.malloc::<u16>(2).unwrap();
        unsafe {
            p.as_ptr().write(1);
            p.as_ptr().add(1).write(2);
        }
        let _blocker = arena.malloc::<u8>(1).unwrap();
        unsafe {
            let q = arena.realloc(p.as_ptr(), 8, 2).unwrap();
            assert_ne!(p, q);
            assert_eq!(*q.as_ptr(), 1);
            assert_eq!(*q.as_ptr().add(1), 2);
        }
    }
}
