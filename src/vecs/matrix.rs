use crate::allocators::{Allocator, HeapAlloc, alloc_failure, release};
use crate::error::{Error, Result};
use core::fmt;
use core::ptr;
use core::slice;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A growable list of fixed-width rows in one row-major buffer.
///
/// Element `(r, c)` lives at `data[r * columns + c]`. Rows are appended by
/// copying a slice of exactly `columns` values; [`Matrix::column`] gives a
/// strided view down one column.
pub struct Matrix<T: Copy, A: Allocator = HeapAlloc> {
    data: *mut T,
    rows: usize,
    columns: usize,
    capacity: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T: Copy> Matrix<T, HeapAlloc> {
    /// Empty matrix with rows of `columns` values.
    pub fn new(columns: usize) -> Self {
        Self::with_allocator(columns, HeapAlloc)
    }

    /// `rows x columns` matrix filled with `T::default()`.
    pub fn with_shape(rows: usize, columns: usize) -> Self
    where
        T: Default,
    {
        let mut m = Self::new(columns);
        m.reserve(rows);
        let blank = vec![T::default(); columns];
        for _ in 0..rows {
            m.push_row(&blank);
        }
        m
    }
}

impl<T: Copy, A: Allocator> Matrix<T, A> {
    pub const fn with_allocator(columns: usize, alloc: A) -> Self {
        Self {
            data: ptr::null_mut(),
            rows: 0,
            columns,
            capacity: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Row capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Makes room for `rows` rows in total.
    pub fn try_reserve(&mut self, rows: usize) -> Result<()> {
        if rows <= self.capacity {
            return Ok(());
        }
        let new_len = rows.checked_mul(self.columns).ok_or(Error::CapacityOverflow)?;
        let old_len = self.capacity * self.columns;
        let fresh = unsafe { self.alloc.realloc(self.data, new_len, old_len)? };
        self.data = fresh.as_ptr();
        self.capacity = rows;
        Ok(())
    }

    pub fn reserve(&mut self, rows: usize) {
        if let Err(err) = self.try_reserve(rows) {
            alloc_failure("Matrix::reserve", err);
        }
    }

    /// Appends a copy of `row`.
    ///
    /// # Panics
    /// If `row.len() != columns`.
    pub fn push_row(&mut self, row: &[T]) {
        assert_eq!(
            row.len(),
            self.columns,
            "row of width {} pushed into a matrix of width {}",
            row.len(),
            self.columns
        );
        if self.rows == self.capacity {
            self.reserve((self.capacity * 2).max(1));
        }
        unsafe {
            ptr::copy_nonoverlapping(row.as_ptr(), self.data.add(self.rows * self.columns), self.columns);
        }
        self.rows += 1;
    }

    /// Forgets the last row. Rows are `Copy`, so nothing is dropped.
    pub fn pop_row(&mut self) -> bool {
        if self.rows == 0 {
            return false;
        }
        self.rows -= 1;
        true
    }

    pub fn clear(&mut self) {
        self.rows = 0;
    }

    #[inline]
    pub fn row(&self, r: usize) -> Option<&[T]> {
        (r < self.rows).then(|| unsafe { slice::from_raw_parts(self.data.add(r * self.columns), self.columns) })
    }

    #[inline]
    pub fn row_mut(&mut self, r: usize) -> Option<&mut [T]> {
        (r < self.rows)
            .then(|| unsafe { slice::from_raw_parts_mut(self.data.add(r * self.columns), self.columns) })
    }

    pub fn first_row(&self) -> Option<&[T]> {
        self.row(0)
    }

    pub fn last_row(&self) -> Option<&[T]> {
        self.rows.checked_sub(1).and_then(|r| self.row(r))
    }

    pub fn get(&self, r: usize, c: usize) -> Result<&T> {
        if c >= self.columns {
            return Err(Error::OutOfRange {
                index: c,
                len: self.columns,
            });
        }
        let len = self.rows;
        self.row(r).map(|row| &row[c]).ok_or(Error::OutOfRange { index: r, len })
    }

    pub fn get_mut(&mut self, r: usize, c: usize) -> Result<&mut T> {
        if c >= self.columns {
            return Err(Error::OutOfRange {
                index: c,
                len: self.columns,
            });
        }
        let len = self.rows;
        self.row_mut(r)
            .map(|row| &mut row[c])
            .ok_or(Error::OutOfRange { index: r, len })
    }

    /// Strided view of column `c`.
    ///
    /// # Panics
    /// If `c >= columns`.
    pub fn column(&self, c: usize) -> Column<'_, T> {
        assert!(c < self.columns, "column {c} out of range for width {}", self.columns);
        Column {
            base: self.data.wrapping_add(c),
            stride: self.columns,
            len: self.rows,
            _marker: PhantomData,
        }
    }

    /// Rows, top to bottom.
    pub fn iter_rows(&self) -> impl DoubleEndedIterator<Item = &[T]> + '_ {
        (0..self.rows).filter_map(move |r| self.row(r))
    }
}

impl<T: Copy, A: Allocator> Drop for Matrix<T, A> {
    fn drop(&mut self) {
        if !self.data.is_null() {
            unsafe { release(&mut self.alloc, self.data, self.capacity * self.columns) };
        }
    }
}

impl<T: Copy, A: Allocator + Clone> Clone for Matrix<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::with_allocator(self.columns, self.alloc.clone());
        out.reserve(self.rows);
        for row in self.iter_rows() {
            out.push_row(row);
        }
        out
    }
}

impl<T: Copy + PartialEq, A: Allocator> PartialEq for Matrix<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows && self.iter_rows().eq(other.iter_rows())
    }
}

impl<T: Copy + fmt::Debug, A: Allocator> fmt::Debug for Matrix<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter_rows()).finish()
    }
}

impl<T: Copy, A: Allocator> Index<usize> for Matrix<T, A> {
    type Output = [T];

    fn index(&self, r: usize) -> &[T] {
        match self.row(r) {
            Some(row) => row,
            None => panic!("row {r} out of range for {} rows", self.rows),
        }
    }
}

impl<T: Copy, A: Allocator> IndexMut<usize> for Matrix<T, A> {
    fn index_mut(&mut self, r: usize) -> &mut [T] {
        let rows = self.rows;
        match self.row_mut(r) {
            Some(row) => row,
            None => panic!("row {r} out of range for {rows} rows"),
        }
    }
}

/// One column of a [`Matrix`], read with a stride of one row.
pub struct Column<'a, T> {
    base: *const T,
    stride: usize,
    len: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Column<'a, T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, r: usize) -> Option<&'a T> {
        (r < self.len).then(|| unsafe { &*self.base.add(r * self.stride) })
    }

    pub fn iter(&self) -> ColumnIter<'a, T> {
        ColumnIter {
            column: Column {
                base: self.base,
                stride: self.stride,
                len: self.len,
                _marker: PhantomData,
            },
            next: 0,
        }
    }
}

impl<T> Index<usize> for Column<'_, T> {
    type Output = T;

    fn index(&self, r: usize) -> &T {
        match self.get(r) {
            Some(v) => v,
            None => panic!("row {r} out of range for column of length {}", self.len),
        }
    }
}

pub struct ColumnIter<'a, T> {
    column: Column<'a, T>,
    next: usize,
}

impl<'a, T> Iterator for ColumnIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let item = self.column.get(self.next)?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.column.len - self.next;
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for ColumnIter<'_, T> {}
impl<T> FusedIterator for ColumnIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::TrackingAlloc;

    #[test]
    fn test_matrix_row_major_layout() {
        let mut m = Matrix::new(3);
        m.push_row(&[1, 2, 3]);
        m.push_row(&[4, 5, 6]);
        assert_eq!(m.rows(), 2);
        assert_eq!(&m[1], &[4, 5, 6]);
        assert_eq!(*m.get(1, 2).unwrap(), 6);
        let col: Vec<i32> = m.column(1).iter().copied().collect();
        assert_eq!(col, vec![2, 5]);
        assert_eq!(m.column(2)[0], 3);
    }

    #[test]
    fn test_matrix_growth_and_pop() {
        let mut m = Matrix::new(2);
        for i in 0..100u16 {
            m.push_row(&[i, i * 2]);
        }
        assert!(m.capacity() >= 100);
        assert_eq!(m.first_row(), Some(&[0, 0][..]));
        assert_eq!(m.last_row(), Some(&[99, 198][..]));
        assert!(m.pop_row());
        assert_eq!(m.last_row(), Some(&[98, 196][..]));
        m.clear();
        assert!(!m.pop_row());
        assert!(m.first_row().is_none());
    }

    #[test]
    fn test_matrix_checked_access() {
        let mut m = Matrix::<f32>::with_shape(2, 2);
        *m.get_mut(0, 1).unwrap() = 1.5;
        assert_eq!(m[0], [0.0, 1.5]);
        assert!(matches!(m.get(2, 0), Err(Error::OutOfRange { index: 2, len: 2 })));
        assert!(matches!(m.get(0, 5), Err(Error::OutOfRange { index: 5, len: 2 })));
    }

    #[test]
    #[should_panic(expected = "row of width 1")]
    fn test_matrix_rejects_wrong_width() {
        let mut m = Matrix::new(2);
        m.push_row(&[1]);
    }

    #[test]
    fn test_matrix_clone_with_tracking() {
        let mut tracker = TrackingAlloc::new();
        {
            let mut m = Matrix::with_allocator(4, &mut tracker);
            for i in 0..10u8 {
                m.push_row(&[i; 4]);
            }
            assert_eq!(m.row(9), Some(&[9u8; 4][..]));
        }
        tracker.assert_no_leaks().unwrap();

        let a = Matrix::<u8>::with_shape(3, 3);
        let b = a.clone();
        assert_eq!(a, b);
    }
}
