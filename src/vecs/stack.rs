use super::vec::Vector;
use crate::allocators::{Allocator, HeapAlloc};
use crate::error::Result;
use std::fmt;

/// LIFO stack backed by a [`Vector`].
pub struct Stack<T, A: Allocator = HeapAlloc> {
    items: Vector<T, A>,
}

impl<T> Stack<T, HeapAlloc> {
    pub const fn new() -> Self {
        Self {
            items: Vector::new(),
        }
    }
}

impl<T, A: Allocator> Stack<T, A> {
    pub const fn with_allocator(alloc: A) -> Self {
        Self {
            items: Vector::with_allocator(alloc),
        }
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    pub fn try_push(&mut self, value: T) -> Result<()> {
        self.items.try_push(value)
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub fn top(&self) -> Option<&T> {
        self.items.back()
    }

    #[inline]
    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.items.back_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Stack<T, A> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Stack<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: Allocator + Default> Default for Stack<T, A> {
    fn default() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Stack<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
