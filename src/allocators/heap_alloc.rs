use super::{Allocator, array_layout};
use crate::error::{Error, Result};
use std::alloc;
use std::ptr::NonNull;

/// Stateless passthrough to the global allocator.
///
/// Zero-sized, so containers using it pay no storage for the allocator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapAlloc;

impl Allocator for HeapAlloc {
    #[inline]
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        let layout = array_layout::<T>(n)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        let raw = unsafe { alloc::alloc(layout) };
        NonNull::new(raw as *mut T).ok_or(Error::OutOfMemory {
            bytes: layout.size(),
        })
    }

    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>> {
        let old_layout = array_layout::<T>(old_n)?;
        if ptr.is_null() || old_layout.size() == 0 {
            return self.malloc(new_n);
        }
        let new_layout = array_layout::<T>(new_n)?;
        if new_layout.size() == 0 {
            unsafe { self.free(ptr, old_n)? };
            return Ok(NonNull::dangling());
        }
        let raw = unsafe { alloc::realloc(ptr as *mut u8, old_layout, new_layout.size()) };
        NonNull::new(raw as *mut T).ok_or(Error::OutOfMemory {
            bytes: new_layout.size(),
        })
    }

    #[inline]
    unsafe fn free<T>(&mut self, ptr: *mut T, n: usize) -> Result<()> {
        let layout = array_layout::<T>(n)?;
        if !ptr.is_null() && layout.size() != 0 {
            unsafe { alloc::dealloc(ptr as *mut u8, layout) };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_malloc_realloc_free() {
        let mut a = HeapAlloc;
        let p = a.malloc::<u32>(4).unwrap();
        unsafe {
            for i in 0..4 {
                p.as_ptr().add(i).write(i as u32 * 10);
            }
            let p = a.realloc(p.as_ptr(), 100, 4).unwrap();
            for i in 0..4 {
                assert_eq!(*p.as_ptr().add(i), i as u32 * 10);
            }
            let p = a.realloc(p.as_ptr(), 2, 100).unwrap();
            assert_eq!(*p.as_ptr().add(1), 10);
            a.free(p.as_ptr(), 2).unwrap();
        }
    }

    #[test]
    fn test_heap_null_and_zero_sized() {
        let mut a = HeapAlloc;
        unsafe {
            a.free::<u64>(std::ptr::null_mut(), 8).unwrap();
            let p = a.realloc::<u64>(std::ptr::null_mut(), 3, 0).unwrap();
            a.free(p.as_ptr(), 3).unwrap();
        }
        let z = a.malloc::<()>(1000).unwrap();
        assert_eq!(z, NonNull::dangling());
        assert_eq!(std::mem::size_of::<HeapAlloc>(), 0);
    }
}
