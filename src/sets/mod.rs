pub mod set;

pub use set::HashSet;

use crate::allocators::Allocator;
use crate::trees::TreeSet;
use std::collections::{self, BTreeSet};
use std::hash::{BuildHasher, Hash};

/// A trait for any collection that supports efficient containment checks.
///
/// This allows `HashSet` to perform set operations (like `difference` or
/// `is_subset`) against std sets and [`TreeSet`] without converting them first.
pub trait AnySet<T> {
    /// Returns `true` if the collection contains the value.
    fn contains(&self, value: &T) -> bool;
}

impl<T, S, A> AnySet<T> for HashSet<T, S, A>
where
    T: Eq + Hash,
    S: BuildHasher,
    A: Allocator,
{
    fn contains(&self, value: &T) -> bool {
        HashSet::contains(self, value)
    }
}

impl<T: Ord, A: Allocator> AnySet<T> for TreeSet<T, A> {
    fn contains(&self, value: &T) -> bool {
        TreeSet::contains(self, value)
    }
}

// Support standard HashSet
impl<T, S> AnySet<T> for collections::HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn contains(&self, value: &T) -> bool {
        self.contains(value)
    }
}

// Support standard BTreeSet
impl<T: Ord> AnySet<T> for BTreeSet<T> {
    fn contains(&self, value: &T) -> bool {
        self.contains(value)
    }
}
