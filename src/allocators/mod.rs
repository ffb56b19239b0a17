//! The allocator protocol every container in this crate allocates through.
//!
//! An allocator hands out storage for `n` values of an element type chosen per
//! call. Containers hold their allocator by value, so a stateless allocator
//! such as [`HeapAlloc`] costs nothing, while a stateful one (an arena, a
//! tracking allocator) travels with the container when it moves. Pass
//! `&mut alloc` to let a container borrow an allocator you want to inspect
//! afterwards.

pub mod arena;
pub mod heap_alloc;
pub mod meta;
pub mod tracking;

pub use arena::ArenaAlloc;
pub use heap_alloc::HeapAlloc;
pub use meta::{MetaAlloc, ObjectAlloc};
pub use tracking::TrackingAlloc;

use crate::error::{Error, Result};
use std::alloc::Layout;
use std::ptr::NonNull;

/// Alignment of the header block written by [`MetaAlloc`].
pub const METADATA_ALIGN: usize = 16;

/// Header size used by `MetaAlloc::default()`.
pub const DEFAULT_METADATA_SIZE: usize = 16;

/// Uniform `malloc` / `realloc` / `free` contract.
///
/// * `malloc(n)` returns uninitialized storage aligned for `T` holding at
///   least `n` values. A zero-byte request returns a dangling pointer.
/// * `realloc(p, new_n, old_n)` preserves the first `min(old_n, new_n)`
///   values bit for bit and invalidates `p`. A null `p` behaves like
///   `malloc(new_n)`. Shrinking is supported.
/// * `free(p, n)` releases storage obtained from the same allocator at size
///   `n`. A null `p` is a no-op.
pub trait Allocator {
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>>;

    /// # Safety
    /// `ptr` must be null or come from this allocator with exactly `old_n`
    /// elements of `T`.
    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>>;

    /// # Safety
    /// `ptr` must be null or come from this allocator with exactly `n`
    /// elements of `T`. The storage must not be used afterwards.
    unsafe fn free<T>(&mut self, ptr: *mut T, n: usize) -> Result<()>;
}

impl<A: Allocator> Allocator for &mut A {
    #[inline(always)]
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        (**self).malloc(n)
    }

    #[inline(always)]
    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>> {
        unsafe { (**self).realloc(ptr, new_n, old_n) }
    }

    #[inline(always)]
    unsafe fn free<T>(&mut self, ptr: *mut T, n: usize) -> Result<()> {
        unsafe { (**self).free(ptr, n) }
    }
}

#[inline]
pub(crate) fn array_layout<T>(n: usize) -> Result<Layout> {
    Layout::array::<T>(n).map_err(|_| Error::CapacityOverflow)
}

/// Layout of a block made of `header` followed by `n` values of `T`, and the
/// byte offset of the first value.
pub(crate) fn prefixed_layout<T>(header: Layout, n: usize) -> Result<(Layout, usize)> {
    let (layout, offset) = header
        .extend(array_layout::<T>(n)?)
        .map_err(|_| Error::CapacityOverflow)?;
    Ok((layout.pad_to_align(), offset))
}

/// A non-null pointer aligned to `align`, for zero-byte blocks.
#[inline]
pub(crate) fn dangling_for(align: usize) -> NonNull<u8> {
    // `align` is a non-zero power of two coming from a `Layout`.
    NonNull::new(std::ptr::without_provenance_mut(align)).unwrap_or(NonNull::dangling())
}

/// Panics for the infallible container methods (`push`, `reserve`, ...) once
/// their `try_` counterpart failed.
#[cold]
#[inline(never)]
pub(crate) fn alloc_failure(op: &'static str, err: Error) -> ! {
    panic!("{op}: {err}")
}

/// Frees container storage from a destructor, where errors cannot propagate.
///
/// # Safety
/// Same contract as [`Allocator::free`].
pub(crate) unsafe fn release<T, A: Allocator>(alloc: &mut A, ptr: *mut T, n: usize) {
    if let Err(err) = unsafe { alloc.free(ptr, n) } {
        tracing::error!(%err, elements = n, "failed to release container storage");
    }
}
