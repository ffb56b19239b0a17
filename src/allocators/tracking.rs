use super::{Allocator, prefixed_layout};
use crate::error::{Error, Result};
use crate::trees::{RbNode, RbTree};
use std::alloc::{self, Layout};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ptr::{self, NonNull};

/// Bookkeeping for one live block, keyed by the address handed to the caller.
#[derive(Debug)]
struct Allocation {
    addr: usize,
    count: usize,
    bytes: usize,
    layout: Layout,
    type_name: &'static str,
}

impl PartialEq for Allocation {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for Allocation {}

impl PartialOrd for Allocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Allocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr.cmp(&other.addr)
    }
}

impl Borrow<usize> for Allocation {
    fn borrow(&self) -> &usize {
        &self.addr
    }
}

type Entry = RbNode<Allocation>;

/// Debug allocator that verifies every `realloc` and `free`.
///
/// Every block carries its own tree node in front of the elements, so the
/// live set needs no allocations of its own. `realloc` and `free` fail with
/// [`Error::StrayPointer`] for an address the allocator never handed out and
/// with [`Error::SizeMismatch`] when the element count differs from the one
/// recorded; the block is left untouched in both cases.
///
/// Dropping the allocator with live blocks logs each of them at error level
/// and then reclaims the memory.
pub struct TrackingAlloc {
    live: RbTree<Allocation>,
    live_bytes: usize,
    total_allocations: u64,
}

impl TrackingAlloc {
    pub const fn new() -> Self {
        Self {
            live: RbTree::new(),
            live_bytes: 0,
            total_allocations: 0,
        }
    }

    /// Number of blocks allocated and not yet freed.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Element bytes held by live blocks, headers excluded.
    #[inline]
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Successful `malloc` calls plus relocations done by `realloc`.
    #[inline]
    pub fn total_allocations(&self) -> u64 {
        self.total_allocations
    }

    /// `(address, element count)` of every live block, by address.
    pub fn live_blocks(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.live.iter().map(|a| (a.addr, a.count))
    }

    pub fn assert_no_leaks(&self) -> Result<()> {
        if self.live.is_empty() {
            Ok(())
        } else {
            Err(Error::Leak {
                count: self.live.len(),
                bytes: self.live_bytes,
            })
        }
    }

    /// Looks up `ptr` and checks the caller's element count against the
    /// recorded one.
    fn lookup<T>(&self, op: &'static str, ptr: *mut T, n: usize) -> Result<NonNull<Entry>> {
        let addr = ptr as usize;
        let Some(node) = self.live.find(&addr) else {
            tracing::warn!(op, addr, "stray pointer");
            return Err(Error::StrayPointer { op, addr });
        };
        let recorded = unsafe { node.as_ref() }.value().count;
        if recorded != n {
            tracing::warn!(
                op,
                addr,
                recorded,
                passed = n,
                "size mismatch"
            );
            return Err(Error::SizeMismatch {
                op,
                addr,
                recorded,
                passed: n,
            });
        }
        Ok(node)
    }

    fn record<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        let (layout, offset) = prefixed_layout::<T>(Layout::new::<Entry>(), n)?;
        let block = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(Error::OutOfMemory {
            bytes: layout.size(),
        })?;
        let elements = unsafe { block.add(offset) };
        let bytes = n * std::mem::size_of::<T>();
        let entry = block.cast::<Entry>();
        unsafe {
            entry.write(RbNode::new(Allocation {
                addr: elements.as_ptr() as usize,
                count: n,
                bytes,
                layout,
                type_name: std::any::type_name::<T>(),
            }));
            self.live.insert(entry);
        }
        self.live_bytes += bytes;
        self.total_allocations += 1;
        self.check();
        Ok(elements.cast())
    }

    /// Unlinks `node` and returns its block to the system.
    unsafe fn discard(&mut self, node: NonNull<Entry>) {
        unsafe {
            let node = self.live.erase(node);
            let (bytes, layout) = {
                let a = node.as_ref().value();
                (a.bytes, a.layout)
            };
            self.live_bytes -= bytes;
            ptr::drop_in_place(node.as_ptr());
            alloc::dealloc(node.as_ptr().cast(), layout);
        }
        self.check();
    }

    #[inline(always)]
    fn check(&self) {
        #[cfg(feature = "paranoid")]
        if let Err(broken) = self.live.validate() {
            panic!("tracking allocator tree corrupted: {broken}");
        }
    }
}

impl Default for TrackingAlloc {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TrackingAlloc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingAlloc")
            .field("live_count", &self.live_count())
            .field("live_bytes", &self.live_bytes)
            .field("total_allocations", &self.total_allocations)
            .finish()
    }
}

impl Allocator for TrackingAlloc {
    fn malloc<T>(&mut self, n: usize) -> Result<NonNull<T>> {
        self.record(n)
    }

    unsafe fn realloc<T>(&mut self, ptr: *mut T, new_n: usize, old_n: usize) -> Result<NonNull<T>> {
        if ptr.is_null() {
            return self.malloc(new_n);
        }
        let old = self.lookup("realloc", ptr, old_n)?;
        let fresh = self.record::<T>(new_n)?;
        unsafe {
            ptr::copy_nonoverlapping(ptr, fresh.as_ptr(), old_n.min(new_n));
            self.discard(old);
        }
        Ok(fresh)
    }

    unsafe fn free<T>(&mut self, ptr: *mut T, n: usize) -> Result<()> {
        if ptr.is_null() {
            return Ok(());
        }
        let node = self.lookup("free", ptr, n)?;
        unsafe { self.discard(node) };
        Ok(())
    }
}

impl Drop for TrackingAlloc {
    fn drop(&mut self) {
        if self.live.is_empty() {
            return;
        }
        tracing::error!(
            count = self.live.len(),
            bytes = self.live_bytes,
            "tracking allocator dropped with live allocations"
        );
        while let Some(node) = self.live.first_node() {
            let a = unsafe { node.as_ref() }.value();
            tracing::error!(
                addr = a.addr,
                elements = a.count,
                ty = a.type_name,
                "leaked block"
            );
            unsafe { self.discard(node) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_balanced_sequence() {
        let mut tracker = TrackingAlloc::new();
        let a = tracker.malloc::<u8>(8).unwrap();
        let b = tracker.malloc::<u8>(16).unwrap();
        let c = tracker.malloc::<u8>(32).unwrap();
        assert_eq!(tracker.live_count(), 3);
        assert_eq!(tracker.live_bytes(), 56);

        unsafe { tracker.free(b.as_ptr(), 16).unwrap() };
        let d = tracker.malloc::<u8>(24).unwrap();
        unsafe {
            tracker.free(a.as_ptr(), 8).unwrap();
            tracker.free(c.as_ptr(), 32).unwrap();
            tracker.free(d.as_ptr(), 24).unwrap();
        }
        assert_eq!(tracker.live_count(), 0);
        assert_eq!(tracker.live_bytes(), 0);
        tracker.assert_no_leaks().unwrap();
    }

    #[test]
    fn test_tracking_rejects_stray_pointer() {
        let mut tracker = TrackingAlloc::new();
        let mut local = 0u64;
        let err = unsafe { tracker.free(&mut local as *mut u64, 1) }.unwrap_err();
        assert!(matches!(err, Error::StrayPointer { op: "free", .. }));

        let p = tracker.malloc::<u64>(4).unwrap();
        let inner = unsafe { p.as_ptr().add(1) };
        let err = unsafe { tracker.realloc(inner, 8, 3) }.unwrap_err();
        assert!(matches!(err, Error::StrayPointer { op: "realloc", .. }));
        unsafe { tracker.free(p.as_ptr(), 4).unwrap() };
    }

    #[test]
    fn test_tracking_rejects_size_mismatch() {
        let mut tracker = TrackingAlloc::new();
        let p = tracker.malloc::<u32>(10).unwrap();
        let err = unsafe { tracker.free(p.as_ptr(), 9) }.unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                recorded: 10,
                passed: 9,
                ..
            }
        ));
        assert_eq!(tracker.live_count(), 1);
        unsafe { tracker.free(p.as_ptr(), 10).unwrap() };
    }

    #[test]
    fn test_tracking_realloc_preserves_and_rekeys() {
        let mut tracker = TrackingAlloc::new();
        let p = tracker.malloc::<u32>(3).unwrap();
        unsafe {
            for i in 0..3 {
                p.as_ptr().add(i).write(i as u32 + 1);
            }
            let q = tracker.realloc(p.as_ptr(), 6, 3).unwrap();
            assert_eq!(std::slice::from_raw_parts(q.as_ptr(), 3), &[1, 2, 3]);
            assert_eq!(tracker.live_count(), 1);
            assert!(tracker.free(q.as_ptr(), 3).is_err());

            let r = tracker.realloc(q.as_ptr(), 2, 6).unwrap();
            assert_eq!(std::slice::from_raw_parts(r.as_ptr(), 2), &[1, 2]);
            tracker.free(r.as_ptr(), 2).unwrap();
        }
        tracker.assert_no_leaks().unwrap();
    }

    #[test]
    fn test_tracking_reports_leaks() {
        let mut tracker = TrackingAlloc::new();
        let _leaked = tracker.malloc::<u16>(5).unwrap();
        assert!(matches!(
            tracker.assert_no_leaks(),
            Err(Error::Leak { count: 1, bytes: 10 })
        ));
        assert_eq!(tracker.live_blocks().count(), 1);
        // Dropping reclaims the block after logging it.
    }
}
