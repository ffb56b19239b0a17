use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

/// A tree node carrying its own links.
///
/// The tree never allocates nodes. Callers place an `RbNode` wherever they
/// like (inside a larger allocation, in a `Box`, in an arena) and hand the
/// tree a pointer to it.
pub struct RbNode<T> {
    value: T,
    left: *mut RbNode<T>,
    right: *mut RbNode<T>,
    parent: *mut RbNode<T>,
    color: Color,
}

impl<T> RbNode<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value,
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            parent: ptr::null_mut(),
            color: Color::Red,
        }
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: Debug> Debug for RbNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbNode")
            .field("value", &self.value)
            .field("color", &self.color)
            .finish()
    }
}

#[inline(always)]
unsafe fn is_red<T>(node: *mut RbNode<T>) -> bool {
    !node.is_null() && unsafe { (*node).color == Color::Red }
}

unsafe fn minimum<T>(mut node: *mut RbNode<T>) -> *mut RbNode<T> {
    unsafe {
        while !(*node).left.is_null() {
            node = (*node).left;
        }
    }
    node
}

unsafe fn maximum<T>(mut node: *mut RbNode<T>) -> *mut RbNode<T> {
    unsafe {
        while !(*node).right.is_null() {
            node = (*node).right;
        }
    }
    node
}

unsafe fn next_node<T>(mut node: *mut RbNode<T>) -> *mut RbNode<T> {
    unsafe {
        if !(*node).right.is_null() {
            return minimum((*node).right);
        }
        let mut parent = (*node).parent;
        while !parent.is_null() && node == (*parent).right {
            node = parent;
            parent = (*parent).parent;
        }
        parent
    }
}

unsafe fn prev_node<T>(mut node: *mut RbNode<T>) -> *mut RbNode<T> {
    unsafe {
        if !(*node).left.is_null() {
            return maximum((*node).left);
        }
        let mut parent = (*node).parent;
        while !parent.is_null() && node == (*parent).left {
            node = parent;
            parent = (*parent).parent;
        }
        parent
    }
}

/// An intrusive red-black tree over externally owned [`RbNode`]s.
///
/// Equal values are allowed; a new duplicate lands after the existing ones
/// in iteration order. Dropping the tree leaves the nodes untouched: whoever
/// allocated them frees them.
pub struct RbTree<T> {
    root: *mut RbNode<T>,
    len: usize,
    _marker: PhantomData<*const RbNode<T>>,
}

impl<T> RbTree<T> {
    pub const fn new() -> Self {
        Self {
            root: ptr::null_mut(),
            len: 0,
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

    pub fn first_node(&self) -> Option<NonNull<RbNode<T>>> {
        if self.root.is_null() {
            return None;
        }
        NonNull::new(unsafe { minimum(self.root) })
    }

    pub fn last_node(&self) -> Option<NonNull<RbNode<T>>> {
        if self.root.is_null() {
            return None;
        }
        NonNull::new(unsafe { maximum(self.root) })
    }

    pub fn min(&self) -> Option<&T> {
        self.first_node().map(|n| unsafe { &(*n.as_ptr()).value })
    }

    pub fn max(&self) -> Option<&T> {
        self.last_node().map(|n| unsafe { &(*n.as_ptr()).value })
    }

    /// # Safety
    /// `node` must be linked into this tree.
    pub unsafe fn successor(&self, node: NonNull<RbNode<T>>) -> Option<NonNull<RbNode<T>>> {
        NonNull::new(unsafe { next_node(node.as_ptr()) })
    }

    /// # Safety
    /// `node` must be linked into this tree.
    pub unsafe fn predecessor(&self, node: NonNull<RbNode<T>>) -> Option<NonNull<RbNode<T>>> {
        NonNull::new(unsafe { prev_node(node.as_ptr()) })
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            front: self.first_node().map_or(ptr::null_mut(), NonNull::as_ptr),
            back: self.last_node().map_or(ptr::null_mut(), NonNull::as_ptr),
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Cursor on the smallest value, or past-the-end when empty.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor {
            node: self.first_node().map_or(ptr::null_mut(), NonNull::as_ptr),
            tree: self,
        }
    }

    /// Unlinks and returns the smallest node.
    pub fn pop_first(&mut self) -> Option<NonNull<RbNode<T>>> {
        let node = self.first_node()?;
        Some(unsafe { self.erase(node) })
    }

    unsafe fn left_rotate(&mut self, x: *mut RbNode<T>) {
        unsafe {
            let y = (*x).right;
            (*x).right = (*y).left;
            if !(*y).left.is_null() {
                (*(*y).left).parent = x;
            }
            (*y).parent = (*x).parent;
            if (*x).parent.is_null() {
                self.root = y;
            } else if x == (*(*x).parent).left {
                (*(*x).parent).left = y;
            } else {
                (*(*x).parent).right = y;
            }
            (*y).left = x;
            (*x).parent = y;
        }
    }

    unsafe fn right_rotate(&mut self, x: *mut RbNode<T>) {
        unsafe {
            let y = (*x).left;
            (*x).left = (*y).right;
            if !(*y).right.is_null() {
                (*(*y).right).parent = x;
            }
            (*y).parent = (*x).parent;
            if (*x).parent.is_null() {
                self.root = y;
            } else if x == (*(*x).parent).right {
                (*(*x).parent).right = y;
            } else {
                (*(*x).parent).left = y;
            }
            (*y).right = x;
            (*x).parent = y;
        }
    }

    unsafe fn insert_fixup(&mut self, mut z: *mut RbNode<T>) {
        unsafe {
            while is_red((*z).parent) {
                // A red parent is never the root, so the grandparent exists.
                let parent = (*z).parent;
                let grand = (*parent).parent;
                if parent == (*grand).left {
                    let uncle = (*grand).right;
                    if is_red(uncle) {
                        (*parent).color = Color::Black;
                        (*uncle).color = Color::Black;
                        (*grand).color = Color::Red;
                        z = grand;
                    } else {
                        if z == (*parent).right {
                            z = parent;
                            self.left_rotate(z);
                        }
                        let parent = (*z).parent;
                        let grand = (*parent).parent;
                        (*parent).color = Color::Black;
                        (*grand).color = Color::Red;
                        self.right_rotate(grand);
                    }
                } else {
                    let uncle = (*grand).left;
                    if is_red(uncle) {
                        (*parent).color = Color::Black;
                        (*uncle).color = Color::Black;
                        (*grand).color = Color::Red;
                        z = grand;
                    } else {
                        if z == (*parent).left {
                            z = parent;
                            self.right_rotate(z);
                        }
                        let parent = (*z).parent;
                        let grand = (*parent).parent;
                        (*parent).color = Color::Black;
                        (*grand).color = Color::Red;
                        self.left_rotate(grand);
                    }
                }
            }
            (*self.root).color = Color::Black;
        }
    }

    unsafe fn transplant(&mut self, u: *mut RbNode<T>, v: *mut RbNode<T>) {
        unsafe {
            let parent = (*u).parent;
            if parent.is_null() {
                self.root = v;
            } else if u == (*parent).left {
                (*parent).left = v;
            } else {
                (*parent).right = v;
            }
            if !v.is_null() {
                (*v).parent = parent;
            }
        }
    }

    /// Unlinks `node` and rebalances. The node's memory is untouched apart
    /// from its links, which are cleared.
    ///
    /// # Safety
    /// `node` must be linked into this tree.
    pub unsafe fn erase(&mut self, node: NonNull<RbNode<T>>) -> NonNull<RbNode<T>> {
        let z = node.as_ptr();
        unsafe {
            let mut removed_color = (*z).color;
            let x;
            let x_parent;
            if (*z).left.is_null() {
                x = (*z).right;
                x_parent = (*z).parent;
                self.transplant(z, x);
            } else if (*z).right.is_null() {
                x = (*z).left;
                x_parent = (*z).parent;
                self.transplant(z, x);
            } else {
                let y = minimum((*z).right);
                removed_color = (*y).color;
                x = (*y).right;
                if (*y).parent == z {
                    x_parent = y;
                } else {
                    x_parent = (*y).parent;
                    self.transplant(y, x);
                    (*y).right = (*z).right;
                    (*(*y).right).parent = y;
                }
                self.transplant(z, y);
                (*y).left = (*z).left;
                (*(*y).left).parent = y;
                (*y).color = (*z).color;
            }
            if removed_color == Color::Black {
                self.erase_fixup(x, x_parent);
            }
            (*z).left = ptr::null_mut();
            (*z).right = ptr::null_mut();
            (*z).parent = ptr::null_mut();
        }
        self.len -= 1;
        node
    }

    unsafe fn erase_fixup(&mut self, mut x: *mut RbNode<T>, mut parent: *mut RbNode<T>) {
        unsafe {
            while x != self.root && !is_red(x) && !parent.is_null() {
                if x == (*parent).left {
                    let mut w = (*parent).right;
                    if is_red(w) {
                        (*w).color = Color::Black;
                        (*parent).color = Color::Red;
                        self.left_rotate(parent);
                        w = (*parent).right;
                    }
                    if w.is_null() {
                        x = parent;
                        parent = (*x).parent;
                        continue;
                    }
                    if !is_red((*w).left) && !is_red((*w).right) {
                        (*w).color = Color::Red;
                        x = parent;
                        parent = (*x).parent;
                    } else {
                        if !is_red((*w).right) {
                            (*(*w).left).color = Color::Black;
                            (*w).color = Color::Red;
                            self.right_rotate(w);
                            w = (*parent).right;
                        }
                        (*w).color = (*parent).color;
                        (*parent).color = Color::Black;
                        if !(*w).right.is_null() {
                            (*(*w).right).color = Color::Black;
                        }
                        self.left_rotate(parent);
                        x = self.root;
                        parent = ptr::null_mut();
                    }
                } else {
                    let mut w = (*parent).left;
                    if is_red(w) {
                        (*w).color = Color::Black;
                        (*parent).color = Color::Red;
                        self.right_rotate(parent);
                        w = (*parent).left;
                    }
                    if w.is_null() {
                        x = parent;
                        parent = (*x).parent;
                        continue;
                    }
                    if !is_red((*w).left) && !is_red((*w).right) {
                        (*w).color = Color::Red;
                        x = parent;
                        parent = (*x).parent;
                    } else {
                        if !is_red((*w).left) {
                            (*(*w).right).color = Color::Black;
                            (*w).color = Color::Red;
                            self.left_rotate(w);
                            w = (*parent).left;
                        }
                        (*w).color = (*parent).color;
                        (*parent).color = Color::Black;
                        if !(*w).left.is_null() {
                            (*(*w).left).color = Color::Black;
                        }
                        self.right_rotate(parent);
                        x = self.root;
                        parent = ptr::null_mut();
                    }
                }
            }
            if !x.is_null() {
                (*x).color = Color::Black;
            }
        }
    }

    /// Checks the red-black invariants and returns the black height.
    #[cfg(any(test, feature = "paranoid"))]
    pub(crate) fn validate(&self) -> Result<usize, &'static str> {
        unsafe fn walk<T>(node: *mut RbNode<T>, parent: *mut RbNode<T>) -> Result<usize, &'static str> {
            if node.is_null() {
                return Ok(1);
            }
            unsafe {
                if (*node).parent != parent {
                    return Err("broken parent link");
                }
                if is_red(node) && (is_red((*node).left) || is_red((*node).right)) {
                    return Err("red node with red child");
                }
                let left = walk((*node).left, node)?;
                let right = walk((*node).right, node)?;
                if left != right {
                    return Err("black height mismatch");
                }
                Ok(left + usize::from(!is_red(node)))
            }
        }
        if unsafe { is_red(self.root) } {
            return Err("red root");
        }
        let height = unsafe { walk(self.root, ptr::null_mut())? };
        if self.iter().count() != self.len {
            return Err("length out of sync");
        }
        Ok(height)
    }
}

impl<T: Ord> RbTree<T> {
    /// Links `node` into the tree.
    ///
    /// # Safety
    /// `node` must point to a live `RbNode` that is not linked into any
    /// tree, and must stay valid and unmoved until it is erased.
    pub unsafe fn insert(&mut self, node: NonNull<RbNode<T>>) {
        let z = node.as_ptr();
        unsafe {
            (*z).left = ptr::null_mut();
            (*z).right = ptr::null_mut();
            (*z).color = Color::Red;

            let mut parent = ptr::null_mut();
            let mut cursor = self.root;
            while !cursor.is_null() {
                parent = cursor;
                cursor = if (*z).value < (*cursor).value {
                    (*cursor).left
                } else {
                    (*cursor).right
                };
            }
            (*z).parent = parent;
            if parent.is_null() {
                self.root = z;
            } else if (*z).value < (*parent).value {
                (*parent).left = z;
            } else {
                (*parent).right = z;
            }
            self.len += 1;
            self.insert_fixup(z);
        }
    }

    pub fn find<Q>(&self, key: &Q) -> Option<NonNull<RbNode<T>>>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root;
        while !cursor.is_null() {
            let value: &Q = unsafe { (*cursor).value.borrow() };
            cursor = match key.cmp(value) {
                std::cmp::Ordering::Less => unsafe { (*cursor).left },
                std::cmp::Ordering::Greater => unsafe { (*cursor).right },
                std::cmp::Ordering::Equal => return NonNull::new(cursor),
            };
        }
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|n| unsafe { &(*n.as_ptr()).value })
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Cursor on the first value not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bound(|value| value >= key)
    }

    /// Cursor on the first value greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bound(|value| value > key)
    }

    fn bound<Q, F>(&self, mut goes_left: F) -> Cursor<'_, T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        F: FnMut(&Q) -> bool,
    {
        let mut result = ptr::null_mut();
        let mut cursor = self.root;
        while !cursor.is_null() {
            if goes_left(unsafe { (*cursor).value.borrow() }) {
                result = cursor;
                cursor = unsafe { (*cursor).left };
            } else {
                cursor = unsafe { (*cursor).right };
            }
        }
        Cursor {
            node: result,
            tree: self,
        }
    }
}

impl<T> Default for RbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for RbTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a RbTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ==================================================================================
// Cursor & Iterator
// ==================================================================================

/// A position in the tree. The null position sits past the largest value;
/// moving backwards from it lands on the largest value.
pub struct Cursor<'a, T> {
    node: *mut RbNode<T>,
    tree: &'a RbTree<T>,
}

impl<'a, T> Cursor<'a, T> {
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        if self.node.is_null() {
            None
        } else {
            Some(unsafe { &(*self.node).value })
        }
    }

    #[inline]
    pub fn node(&self) -> Option<NonNull<RbNode<T>>> {
        NonNull::new(self.node)
    }

    pub fn move_next(&mut self) {
        if !self.node.is_null() {
            self.node = unsafe { next_node(self.node) };
        }
    }

    pub fn move_prev(&mut self) {
        if self.node.is_null() {
            self.node = self.tree.last_node().map_or(ptr::null_mut(), NonNull::as_ptr);
        } else {
            self.node = unsafe { prev_node(self.node) };
        }
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            tree: self.tree,
        }
    }
}

/// In-order iterator, double ended.
pub struct Iter<'a, T> {
    front: *mut RbNode<T>,
    back: *mut RbNode<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front;
        self.remaining -= 1;
        unsafe {
            self.front = next_node(node);
            Some(&(*node).value)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back;
        self.remaining -= 1;
        unsafe {
            self.back = prev_node(node);
            Some(&(*node).value)
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}
