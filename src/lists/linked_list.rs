use crate::allocators::{Allocator, HeapAlloc, alloc_failure, release};
use crate::error::Result;
use core::marker::PhantomData;
use core::ptr;
use std::fmt;
use std::iter::FusedIterator;

struct Node<T> {
    value: T,
    prev: *mut Node<T>,
    next: *mut Node<T>,
}

/// Doubly-linked list whose nodes come one at a time from `A`.
pub struct LinkedList<T, A: Allocator = HeapAlloc> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    len: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for LinkedList<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for LinkedList<T, A> {}

impl<T> LinkedList<T, HeapAlloc> {
    pub const fn new() -> Self {
        Self::with_allocator(HeapAlloc)
    }
}

impl<T, A: Allocator> LinkedList<T, A> {
    pub const fn with_allocator(alloc: A) -> Self {
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
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

    fn new_node(&mut self, value: T) -> Result<*mut Node<T>> {
        let node = self.alloc.malloc::<Node<T>>(1)?.as_ptr();
        unsafe {
            node.write(Node {
                value,
                prev: ptr::null_mut(),
                next: ptr::null_mut(),
            });
        }
        Ok(node)
    }

    /// Detaches `node`, frees it and returns its value.
    ///
    /// # Safety
    /// `node` must be linked into this list.
    unsafe fn unlink(&mut self, node: *mut Node<T>) -> T {
        unsafe {
            let Node { value, prev, next } = node.read();
            if prev.is_null() {
                self.head = next;
            } else {
                (*prev).next = next;
            }
            if next.is_null() {
                self.tail = prev;
            } else {
                (*next).prev = prev;
            }
            release(&mut self.alloc, node, 1);
            self.len -= 1;
            value
        }
    }

    pub fn try_push_back(&mut self, value: T) -> Result<()> {
        let node = self.new_node(value)?;
        unsafe {
            (*node).prev = self.tail;
            if self.tail.is_null() {
                self.head = node;
            } else {
                (*self.tail).next = node;
            }
        }
        self.tail = node;
        self.len += 1;
        Ok(())
    }

    pub fn push_back(&mut self, value: T) {
        if let Err(err) = self.try_push_back(value) {
            alloc_failure("LinkedList::push_back", err);
        }
    }

    pub fn try_push_front(&mut self, value: T) -> Result<()> {
        let node = self.new_node(value)?;
        unsafe {
            (*node).next = self.head;
            if self.head.is_null() {
                self.tail = node;
            } else {
                (*self.head).prev = node;
            }
        }
        self.head = node;
        self.len += 1;
        Ok(())
    }

    pub fn push_front(&mut self, value: T) {
        if let Err(err) = self.try_push_front(value) {
            alloc_failure("LinkedList::push_front", err);
        }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.head.is_null() {
            return None;
        }
        Some(unsafe { self.unlink(self.head) })
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.tail.is_null() {
            return None;
        }
        Some(unsafe { self.unlink(self.tail) })
    }

    pub fn front(&self) -> Option<&T> {
        unsafe { self.head.as_ref().map(|n| &n.value) }
    }

    pub fn back(&self) -> Option<&T> {
        unsafe { self.tail.as_ref().map(|n| &n.value) }
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        unsafe { self.head.as_mut().map(|n| &mut n.value) }
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        unsafe { self.tail.as_mut().map(|n| &mut n.value) }
    }

    /// Unlinks every node equal to `value`; returns how many were removed.
    pub fn remove(&mut self, value: &T) -> usize
    where
        T: PartialEq,
    {
        let mut removed = 0;
        let mut cursor = self.head;
        while !cursor.is_null() {
            let next = unsafe { (*cursor).next };
            if unsafe { &(*cursor).value } == value {
                drop(unsafe { self.unlink(cursor) });
                removed += 1;
            }
            cursor = next;
        }
        removed
    }

    /// Reverses the list in place by swapping every node's links.
    pub fn reverse(&mut self) {
        let mut cursor = self.head;
        while !cursor.is_null() {
            unsafe {
                let node = &mut *cursor;
                std::mem::swap(&mut node.prev, &mut node.next);
                cursor = node.prev;
            }
        }
        std::mem::swap(&mut self.head, &mut self.tail);
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|v| v == value)
    }

    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            head: self.head,
            tail: self.tail,
            len: self.len,
            _marker: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            head: self.head,
            tail: self.tail,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

// --- Iterators ---

pub struct Iter<'a, T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    len: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let node = unsafe { &*self.head };
        self.head = node.next;
        self.len -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let node = unsafe { &*self.tail };
        self.tail = node.prev;
        self.len -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IterMut<'a, T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    len: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        let node = unsafe { &mut *self.head };
        self.head = node.next;
        self.len -= 1;
        Some(&mut node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        let node = unsafe { &mut *self.tail };
        self.tail = node.prev;
        self.len -= 1;
        Some(&mut node.value)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

pub struct IntoIter<T, A: Allocator = HeapAlloc> {
    list: LinkedList<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> IntoIterator for LinkedList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter { list: self }
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a LinkedList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut LinkedList<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

// --- Standard Traits ---

impl<T, A: Allocator> Drop for LinkedList<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for LinkedList<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::with_allocator(self.alloc.clone());
        out.extend(self.iter().cloned());
        out
    }
}

impl<T, A: Allocator + Default> Default for LinkedList<T, A> {
    fn default() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for LinkedList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<LinkedList<T, B>> for LinkedList<T, A> {
    fn eq(&self, other: &LinkedList<T, B>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for LinkedList<T, A> {}

impl<T, A: Allocator> Extend<T> for LinkedList<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for LinkedList<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::default();
        list.extend(iter);
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::{ArenaAlloc, TrackingAlloc};
    use crate::error::Error;

    #[test]
    fn test_list_push_pop_both_ends() {
        let mut list = LinkedList::new();
        list.push_back(2);
        list.push_back(3);
        list.push_front(1);
        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert!(list.front().is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_list_remove_all_matches() {
        let mut list: LinkedList<i32> = [1, 2, 1, 3, 1].into_iter().collect();
        assert_eq!(list.remove(&1), 3);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(list.remove(&9), 0);
        assert_eq!(list.front(), Some(&2));
        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.remove(&2) + list.remove(&3), 2);
        assert!(list.is_empty());
        list.push_back(5);
        assert_eq!(list.front(), Some(&5));
    }

    #[test]
    fn test_list_reverse() {
        let mut list: LinkedList<char> = "abcd".chars().collect();
        list.reverse();
        assert_eq!(list.iter().collect::<String>(), "dcba");
        assert_eq!(list.iter().rev().collect::<String>(), "abcd");
        list.push_back('z');
        assert_eq!(list.back(), Some(&'z'));
        assert_eq!(list.front(), Some(&'d'));
    }

    #[test]
    fn test_list_clone_is_deep() {
        let mut a: LinkedList<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b = a.clone();
        a.front_mut().unwrap().push('!');
        for s in &mut a {
            s.push('?');
        }
        assert_eq!(b.iter().cloned().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(a.front().map(String::as_str), Some("x!?"));
        assert!(b.contains(&"y".to_string()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_list_nodes_balance_in_tracking() {
        let mut tracker = TrackingAlloc::new();
        {
            let mut list = LinkedList::with_allocator(&mut tracker);
            for i in 0..64 {
                list.push_back(i);
            }
            list.remove(&10);
            let _ = list.pop_front();
            let drained: Vec<i32> = list.into_iter().rev().take(3).collect();
            assert_eq!(drained, vec![63, 62, 61]);
        }
        tracker.assert_no_leaks().unwrap();
        assert_eq!(tracker.total_allocations(), 64);
    }

    #[test]
    fn test_list_arena_exhaustion() {
        let mut list = LinkedList::with_allocator(ArenaAlloc::<256>::new());
        let mut pushed = 0;
        while list.try_push_back([0u64; 4]).is_ok() {
            pushed += 1;
        }
        assert!(pushed > 0);
        assert!(matches!(list.try_push_front([1; 4]), Err(Error::OutOfMemory { .. })));
        assert_eq!(list.len(), pushed);
    }
}
