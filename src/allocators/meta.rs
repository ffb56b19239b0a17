//! Allocators that keep a header in front of every element buffer.
//!
//! Both variants lay a block out as `[header][padding][elements]`. The
//! header and the elements share one allocation, so a single `realloc`
//! carries both along.

use super::{Allocator, DEFAULT_METADATA_SIZE, METADATA_ALIGN, dangling_for, prefixed_layout};
use crate::error::{Error, Result};
use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// Grows or releases the block behind `ptr`, whose elements start at
/// `offset` inside a block of `old` layout.
unsafe fn resize_block(old: Layout, new: Layout, offset: usize, ptr: *mut u8) -> Result<NonNull<u8>> {
    let block = unsafe { ptr.sub(offset) };
    let raw = unsafe { alloc::realloc(block, old, new.size()) };
    let raw = NonNull::new(raw).ok_or(Error::OutOfMemory { bytes: new.size() })?;
    Ok(unsafe { raw.add(offset) })
}

// ==================================================================================
// MetaAlloc
// ==================================================================================

/// Prefixes each allocation with `header_size` zeroed bytes of caller-owned
/// metadata.
///
/// The header is created zeroed by `malloc`, kept intact by `realloc`, and
/// read back with [`MetaAlloc::get_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaAlloc {
    header_size: usize,
}

impl MetaAlloc {
    pub const fn with_header_size(header_size: usize) -> Self {
        Self { header_size }
    }

    #[inline]
    pub const fn header_size(&self) -> usize {
        self.header_size
    }

    /// Changes the header size for future allocations.
    ///
    /// Blocks allocated with the previous size must be freed first.
    pub fn set_header_size(&mut self, header_size: usize) {
        self.header_size = header_size;
    }

    #[inline]
    fn header(&self) -> Result<Layout> {
        Layout::from_size_align(self.header_size, METADATA_ALIGN).map_err(|_| Error::CapacityOverflow)
    }

    /// Byte distance from the start of a block to its first `T`.
    pub fn metadata_offset<T>(&self) -> Result<usize> {
        Ok(prefixed_layout::<T>(self.header()?, 0)?.1)
    }

    /// Returns the header in front of `ptr`.
    ///
    /// # Safety
    /// `ptr` must be a live, non-dangling block of `T` from this allocator.
    pub unsafe fn get_metadata<T>(&self, ptr: NonNull<T>) -> Result<NonNull<u8>> {
        let offset = self.metadata_offset::<T>()?;
        Ok(unsafe { ptr.cast::<u8>().sub(offset) })
    }
}

impl Default for MetaAlloc {
    fn default() -> Self {
        Self::with_header_size(DEFAULT_METADATA_SIZE)
    }
}

impl Allocator for MetaAlloc {
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        let (layout, offset) = prefixed_layout::<T>(self.header()?, n)?;
        if layout.size() == 0 {
            return Ok(dangling_for(layout.align()).cast());
        }
        let block = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(Error::OutOfMemory {
            bytes: layout.size(),
        })?;
        unsafe {
            ptr::write_bytes(block.as_ptr(), 0, self.header_size);
            Ok(block.add(offset).cast())
        }
    }

    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>> {
        let header = self.header()?;
        let (old, offset) = prefixed_layout::<T>(header, old_n)?;
        if ptr.is_null() || old.size() == 0 {
            return self.malloc(new_n);
        }
        let (new, _) = prefixed_layout::<T>(header, new_n)?;
        Ok(unsafe { resize_block(old, new, offset, ptr as *mut u8)? }.cast())
    }

    unsafe fn free<T>(&mut self, ptr: *mut T, n: usize) -> Result<()> {
        let (layout, offset) = prefixed_layout::<T>(self.header()?, n)?;
        if !ptr.is_null() && layout.size() != 0 {
            unsafe { alloc::dealloc((ptr as *mut u8).sub(offset), layout) };
        }
        Ok(())
    }
}

// ==================================================================================
// ObjectAlloc
// ==================================================================================

/// Prefixes each allocation with a live `U`.
///
/// `malloc` constructs `U::default()` in the header, `free` drops it, and
/// `realloc` moves it together with the elements.
pub struct ObjectAlloc<U> {
    _marker: PhantomData<fn() -> U>,
}

impl<U: Default> ObjectAlloc<U> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Returns the object in front of `ptr`.
    ///
    /// # Safety
    /// `ptr` must be a live block of `T` from an `ObjectAlloc<U>`.
    pub unsafe fn get_object<T>(&self, ptr: NonNull<T>) -> Result<NonNull<U>> {
        let offset = prefixed_layout::<T>(Layout::new::<U>(), 0)?.1;
        Ok(unsafe { ptr.cast::<u8>().sub(offset) }.cast())
    }
}

impl<U> Clone for ObjectAlloc<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for ObjectAlloc<U> {}

impl<U: Default> Default for ObjectAlloc<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> std::fmt::Debug for ObjectAlloc<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectAlloc")
            .field("object", &std::any::type_name::<U>())
            .finish()
    }
}

impl<U: Default> Allocator for ObjectAlloc<U> {
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        let (layout, offset) = prefixed_layout::<T>(Layout::new::<U>(), n)?;
        let block = if layout.size() == 0 {
            dangling_for(layout.align())
        } else {
            NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(Error::OutOfMemory {
                bytes: layout.size(),
            })?
        };
        unsafe {
            block.cast::<U>().write(U::default());
            Ok(block.add(offset).cast())
        }
    }

    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>> {
        let header = Layout::new::<U>();
        let (old, offset) = prefixed_layout::<T>(header, old_n)?;
        if ptr.is_null() {
            return self.malloc(new_n);
        }
        let (new, _) = prefixed_layout::<T>(header, new_n)?;
        if old.size() == 0 || new.size() == 0 {
            // Zero-sized on one side: move the object by hand.
            let fresh = self.malloc::<T>(new_n)?;
            unsafe {
                let object = ptr.cast::<u8>().sub(offset).cast::<U>();
                ptr::drop_in_place(self.get_object(fresh)?.as_ptr());
                self.get_object(fresh)?.write(object.read());
                if old.size() != 0 {
                    alloc::dealloc(object.cast(), old);
                }
            }
            return Ok(fresh);
        }
        Ok(unsafe { resize_block(old, new, offset, ptr as *mut u8)? }.cast())
    }

    unsafe fn free<T>(&mut self, ptr: *mut T, n: usize) -> Result<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let (layout, offset) = prefixed_layout::<T>(Layout::new::<U>(), n)?;
        unsafe {
            let block = (ptr as *mut u8).sub(offset);
            ptr::drop_in_place(block.cast::<U>());
            if layout.size() != 0 {
                alloc::dealloc(block, layout);
            }
        }
        Ok(())
    }
}
