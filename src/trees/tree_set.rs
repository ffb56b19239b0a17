use super::rbtree::{Iter, RbNode, RbTree};
use crate::allocators::{Allocator, HeapAlloc, alloc_failure, release};
use crate::error::Result;
use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::ptr::NonNull;

/// An ordered set of unique values whose nodes come from an [`Allocator`].
pub struct TreeSet<T: Ord, A: Allocator = HeapAlloc> {
    tree: RbTree<T>,
    alloc: A,
}

impl<T: Ord> TreeSet<T, HeapAlloc> {
    pub fn new() -> Self {
        Self::with_allocator(HeapAlloc)
    }
}

impl<T: Ord, A: Allocator> TreeSet<T, A> {
    pub fn with_allocator(alloc: A) -> Self {
        Self {
            tree: RbTree::new(),
            alloc,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Adds `value`, returning `false` if an equal value was already present.
    pub fn insert(&mut self, value: T) -> bool {
        match self.try_insert(value) {
            Ok(added) => added,
            Err(err) => alloc_failure("TreeSet::insert", err),
        }
    }

    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        if self.tree.contains(&value) {
            return Ok(false);
        }
        let node = self.alloc.malloc::<RbNode<T>>(1)?;
        unsafe {
            node.as_ptr().write(RbNode::new(value));
            self.tree.insert(node);
        }
        Ok(true)
    }

    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.tree.find(value)?;
        Some(unsafe { self.unlink(node) })
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(value).is_some()
    }

    unsafe fn unlink(&mut self, node: NonNull<RbNode<T>>) -> T {
        unsafe {
            let node = self.tree.erase(node);
            let value = node.as_ptr().read().into_value();
            release(&mut self.alloc, node.as_ptr(), 1);
            value
        }
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(value)
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(value)
    }

    pub fn first(&self) -> Option<&T> {
        self.tree.min()
    }

    pub fn last(&self) -> Option<&T> {
        self.tree.max()
    }

    pub fn pop_first(&mut self) -> Option<T> {
        let node = self.tree.first_node()?;
        Some(unsafe { self.unlink(node) })
    }

    /// Smallest value not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.lower_bound(key).get()
    }

    /// Smallest value greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.upper_bound(key).get()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    pub fn clear(&mut self) {
        while self.pop_first().is_some() {}
    }
}

impl<T: Ord, A: Allocator> Drop for TreeSet<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Ord> Default for TreeSet<T, HeapAlloc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Debug, A: Allocator> Debug for TreeSet<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord + Clone, A: Allocator + Clone> Clone for TreeSet<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::with_allocator(self.alloc.clone());
        out.extend(self.iter().cloned());
        out
    }
}

impl<T: Ord, A: Allocator> PartialEq for TreeSet<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Ord, A: Allocator> Eq for TreeSet<T, A> {}

impl<T: Ord, A: Allocator> Extend<T> for TreeSet<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord, A: Allocator + Default> FromIterator<T> for TreeSet<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_allocator(A::default());
        set.extend(iter);
        set
    }
}

impl<'a, T: Ord, A: Allocator> IntoIterator for &'a TreeSet<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
