use super::linked_list::{Iter, LinkedList};
use crate::allocators::{Allocator, HeapAlloc};
use crate::error::Result;
use std::fmt;

/// FIFO queue over a [`LinkedList`]: enqueue at the back, dequeue at the front.
pub struct Queue<T, A: Allocator = HeapAlloc> {
    list: LinkedList<T, A>,
}

impl<T> Queue<T, HeapAlloc> {
    pub const fn new() -> Self {
        Self {
            list: LinkedList::new(),
        }
    }
}

impl<T, A: Allocator> Queue<T, A> {
    pub const fn with_allocator(alloc: A) -> Self {
        Self {
            list: LinkedList::with_allocator(alloc),
        }
    }

    #[inline]
    pub fn enqueue(&mut self, value: T) {
        self.list.push_back(value);
    }

    pub fn try_enqueue(&mut self, value: T) -> Result<()> {
        self.list.try_push_back(value)
    }

    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    /// Next value to be dequeued.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.list.front()
    }

    /// Most recently enqueued value.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.list.back()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        self.list.iter()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Queue<T, A> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Queue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: Allocator + Default> Default for Queue<T, A> {
    fn default() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<T, A: Allocator> Extend<T> for Queue<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.list.extend(iter);
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Queue<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            list: iter.into_iter().collect(),
        }
    }
}
