//! Byte string with a small-buffer optimization.
//!
//! Provides [`Text`]: `N` bytes of inline storage that hold a NUL-terminated
//! string, spilling to an allocator-owned heap block once the content no
//! longer fits. The last inline byte doubles as the representation tag: it is
//! `0` while inline (where it is also the terminator of a full buffer) and
//! non-zero once the leading words hold a `(pointer, length, capacity)`
//! triple. Moving a `Text` is a plain `N`-byte copy in either state.
//!
//! Inline content never contains a NUL byte, because the inline length is
//! recovered with a `strlen` scan. Writing a NUL forces the heap
//! representation, which tracks its length explicitly.

use super::AnyText;
use crate::allocators::{Allocator, HeapAlloc, alloc_failure, release};
use crate::error::{Error, Result};
use crate::vecs::Vector;
use core::ffi::{c_long, c_longlong};
use core::ptr;
use core::slice;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Deref, Index};
use std::path::Path;
use std::slice::SliceIndex;
use std::str::FromStr;

pub type Text32 = Text<32>;
pub type Text64 = Text<64>;
pub type Text128 = Text<128>;
pub type Text256 = Text<256>;
pub type Text512 = Text<512>;
pub type Text1024 = Text<1024>;
pub type Text2048 = Text<2048>;
pub type Text4096 = Text<4096>;
pub type DefaultText = Text64;

#[derive(Clone, Copy)]
#[repr(C)]
struct HeapParts {
    ptr: *mut u8,
    len: usize,
    /// Excludes the terminator.
    cap: usize,
}

#[repr(C)]
union TextData<const N: usize> {
    bytes: [u8; N],
    heap: HeapParts,
}

/// A byte string that keeps up to `N - 1` bytes inline.
///
/// # Overview
/// * Inline: `bytes[N - 1] == 0`, content is `bytes[..strlen]`.
/// * Heap: `bytes[N - 1] != 0`, content lives in an `A`-allocated block of
///   `capacity + 1` bytes, always NUL-terminated at `len`.
///
/// The transition is one-way; clearing a heap text keeps its block.
pub struct Text<const N: usize = 64, A: Allocator = HeapAlloc> {
    data: TextData<N>,
    alloc: A,
}

unsafe impl<const N: usize, A: Allocator + Send> Send for Text<N, A> {}
unsafe impl<const N: usize, A: Allocator + Sync> Sync for Text<N, A> {}

impl<const N: usize> Text<N, HeapAlloc> {
    /// Creates an empty, inline text.
    ///
    /// ```rust
    /// use alloc_containers::Text64;
    /// let t = Text64::new();
    /// assert!(t.is_inline());
    /// ```
    ///
    /// ```rust,compile_fail
    /// use alloc_containers::Text;
    /// // the heap triple would overlap the tag byte
    /// let t: Text<16> = Text::new();
    /// ```
    pub const fn new() -> Self {
        Self::with_allocator(HeapAlloc)
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self::from_bytes_in(bytes, HeapAlloc)
    }

    /// Concatenates `parts` with `delimiter` between consecutive parts.
    pub fn join<P: AsRef<[u8]>>(parts: &[P], delimiter: impl AsRef<[u8]>) -> Self {
        let delimiter = delimiter.as_ref();
        let mut out = Self::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.append(delimiter);
            }
            out.append(part);
        }
        out
    }

    /// Renders `value` with its `Display` impl.
    pub fn from_display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        let mut out = Self::new();
        if let Err(err) = out.format(format_args!("{value}")) {
            alloc_failure("Text::from_display", err);
        }
        out
    }

    /// Fixed-point rendering with `places` decimals.
    pub fn from_float(value: f64, places: usize) -> Self {
        let mut out = Self::new();
        if let Err(err) = out.format(format_args!("{value:.places$}")) {
            alloc_failure("Text::from_float", err);
        }
        out
    }

    /// Reads the whole file, byte for byte.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mut out = Self::new();
        out.try_append(&bytes)?;
        Ok(out)
    }
}

impl<const N: usize, A: Allocator> Text<N, A> {
    /// Bytes that fit without a heap block.
    pub const INLINE_CAPACITY: usize = N - 1;

    pub const fn with_allocator(alloc: A) -> Self {
        const {
            assert!(
                N > 3 * size_of::<usize>(),
                "Text<N> needs more inline bytes than its heap triple occupies"
            );
        }
        Self {
            data: TextData { bytes: [0; N] },
            alloc,
        }
    }

    pub fn from_bytes_in(bytes: impl AsRef<[u8]>, alloc: A) -> Self {
        let mut out = Self::with_allocator(alloc);
        out.append(bytes);
        out
    }

    // --- Representation ---

    #[inline(always)]
    fn raw(&self) -> *const u8 {
        ptr::addr_of!(self.data).cast()
    }

    #[inline(always)]
    fn raw_mut(&mut self) -> *mut u8 {
        ptr::addr_of_mut!(self.data).cast()
    }

    /// Returns `true` while the content lives in the inline buffer.
    #[inline(always)]
    pub fn is_inline(&self) -> bool {
        unsafe { *self.raw().add(N - 1) == 0 }
    }

    #[inline(always)]
    fn heap(&self) -> HeapParts {
        let parts = unsafe { self.data.heap };
        #[cfg(feature = "paranoid")]
        {
            assert!(parts.len <= parts.cap, "text heap length exceeds capacity");
            assert_eq!(unsafe { *parts.ptr.add(parts.len) }, 0, "text heap block lost its terminator");
        }
        parts
    }

    #[inline(always)]
    fn heap_mut(&mut self) -> &mut HeapParts {
        unsafe { &mut self.data.heap }
    }

    #[inline]
    fn inline_len(&self) -> usize {
        let bytes = unsafe { &self.data.bytes };
        bytes.iter().position(|&b| b == 0).unwrap_or(N - 1)
    }

    #[inline]
    fn data_ptr_mut(&mut self) -> *mut u8 {
        if self.is_inline() { self.raw_mut() } else { self.heap().ptr }
    }

    /// Moves the terminator to `new_len`.
    ///
    /// # Safety
    /// `new_len <= capacity()` and `[..new_len]` is initialized.
    #[inline]
    unsafe fn set_len(&mut self, new_len: usize) {
        unsafe {
            if self.is_inline() {
                *self.raw_mut().add(new_len) = 0;
            } else {
                let heap = self.heap_mut();
                heap.len = new_len;
                *heap.ptr.add(new_len) = 0;
            }
        }
    }

    fn content_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        unsafe { slice::from_raw_parts_mut(self.data_ptr_mut(), len) }
    }

    // --- Size & Capacity ---

    #[inline]
    pub fn len(&self) -> usize {
        if self.is_inline() { self.inline_len() } else { self.heap().len }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes storable without reallocating, terminator excluded.
    #[inline]
    pub fn capacity(&self) -> usize {
        if self.is_inline() { N - 1 } else { self.heap().cap }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        let with_nul = self.as_bytes_with_nul();
        &with_nul[..with_nul.len() - 1]
    }

    /// Content followed by its terminating NUL.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        if self.is_inline() {
            let bytes = unsafe { &self.data.bytes };
            &bytes[..=self.inline_len()]
        } else {
            let heap = self.heap();
            unsafe { slice::from_raw_parts(heap.ptr, heap.len + 1) }
        }
    }

    /// Pointer to NUL-terminated content.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        if self.is_inline() { self.raw() } else { self.heap().ptr }
    }

    pub fn to_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// Grows the capacity to at least `new_capacity` bytes.
    ///
    /// Exceeding the inline capacity moves the content to a heap block of
    /// exactly `new_capacity + 1` bytes.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }
        let block = new_capacity.checked_add(1).ok_or(Error::CapacityOverflow)?;
        if self.is_inline() {
            let len = self.inline_len();
            let fresh = self.alloc.malloc::<u8>(block)?.as_ptr();
            unsafe {
                ptr::copy_nonoverlapping(self.raw(), fresh, len);
                *fresh.add(len) = 0;
            }
            tracing::trace!(inline = N, len, capacity = new_capacity, "text spilled to heap");
            self.data.heap = HeapParts {
                ptr: fresh,
                len,
                cap: new_capacity,
            };
            unsafe { *self.raw_mut().add(N - 1) = 1 };
        } else {
            let old = self.heap();
            let fresh = unsafe { self.alloc.realloc(old.ptr, block, old.cap + 1)? };
            let heap = self.heap_mut();
            heap.ptr = fresh.as_ptr();
            heap.cap = new_capacity;
        }
        Ok(())
    }

    pub fn reserve(&mut self, new_capacity: usize) {
        if let Err(err) = self.try_reserve(new_capacity) {
            alloc_failure("Text::reserve", err);
        }
    }

    /// Makes `new_len` bytes writable. Content with a NUL cannot stay inline.
    fn make_room(&mut self, new_len: usize, has_nul: bool) -> Result<()> {
        if has_nul && self.is_inline() {
            return self.try_reserve(new_len.max(N));
        }
        let cap = self.capacity();
        if new_len > cap {
            self.try_reserve(new_len.max(cap.saturating_mul(2)))
        } else {
            Ok(())
        }
    }

    // --- Core Operations ---

    /// Appends `bytes` and returns the new length.
    pub fn try_append(&mut self, bytes: impl AsRef<[u8]>) -> Result<usize> {
        let bytes = bytes.as_ref();
        let len = self.len();
        let new_len = len.checked_add(bytes.len()).ok_or(Error::CapacityOverflow)?;
        self.make_room(new_len, bytes.contains(&0))?;
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.data_ptr_mut().add(len), bytes.len());
            self.set_len(new_len);
        }
        Ok(new_len)
    }

    pub fn append(&mut self, bytes: impl AsRef<[u8]>) -> usize {
        match self.try_append(bytes) {
            Ok(len) => len,
            Err(err) => alloc_failure("Text::append", err),
        }
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.append([byte]);
    }

    pub fn try_insert(&mut self, index: usize, bytes: impl AsRef<[u8]>) -> Result<()> {
        let bytes = bytes.as_ref();
        let len = self.len();
        if index > len {
            return Err(Error::OutOfRange { index, len });
        }
        let new_len = len.checked_add(bytes.len()).ok_or(Error::CapacityOverflow)?;
        self.make_room(new_len, bytes.contains(&0))?;
        unsafe {
            let p = self.data_ptr_mut();
            ptr::copy(p.add(index), p.add(index + bytes.len()), len - index);
            ptr::copy_nonoverlapping(bytes.as_ptr(), p.add(index), bytes.len());
            self.set_len(new_len);
        }
        Ok(())
    }

    /// Inserts `bytes` before position `index`.
    ///
    /// # Panics
    /// If `index > len()`, or the allocator fails.
    pub fn insert(&mut self, index: usize, bytes: impl AsRef<[u8]>) {
        if let Err(err) = self.try_insert(index, bytes) {
            alloc_failure("Text::insert", err);
        }
    }

    pub fn insert_byte(&mut self, index: usize, byte: u8) {
        self.insert(index, [byte]);
    }

    /// Removes up to `count` bytes starting at `start`. Out-of-range
    /// arguments are clamped.
    pub fn erase(&mut self, start: usize, count: usize) {
        let len = self.len();
        let start = start.min(len);
        let count = count.min(len - start);
        if count == 0 {
            return;
        }
        unsafe {
            let p = self.data_ptr_mut();
            ptr::copy(p.add(start + count), p.add(start), len - start - count);
            self.set_len(len - count);
        }
    }

    /// Cuts the text at `index`; no-op when `index >= len()`.
    pub fn slice(&mut self, index: usize) {
        if index < self.len() {
            unsafe { self.set_len(index) };
        }
    }

    pub fn clear(&mut self) {
        unsafe { self.set_len(0) };
    }

    /// Truncates, or zero-fills up to `new_len`.
    pub fn try_resize(&mut self, new_len: usize) -> Result<()> {
        let len = self.len();
        if new_len <= len {
            self.slice(new_len);
            return Ok(());
        }
        self.make_room(new_len, true)?;
        unsafe {
            ptr::write_bytes(self.data_ptr_mut().add(len), 0, new_len - len);
            self.set_len(new_len);
        }
        Ok(())
    }

    pub fn resize(&mut self, new_len: usize) {
        if let Err(err) = self.try_resize(new_len) {
            alloc_failure("Text::resize", err);
        }
    }

    /// Replaces the content with the rendered `args`.
    ///
    /// The rendered length is measured first so the text is sized once.
    pub fn format(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        struct Measure(usize);

        impl fmt::Write for Measure {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.0 += s.len();
                Ok(())
            }
        }

        let mut measure = Measure(0);
        fmt::write(&mut measure, args)?;
        self.clear();
        self.try_reserve(measure.0)?;
        fmt::write(self, args)?;
        Ok(())
    }

    // --- Search ---

    /// First occurrence of `needle`. An empty needle matches at 0.
    pub fn find(&self, needle: impl AsRef<[u8]>) -> Option<usize> {
        let (hay, needle) = (self.as_bytes(), needle.as_ref());
        if needle.is_empty() {
            return Some(0);
        }
        hay.windows(needle.len()).position(|w| w == needle)
    }

    pub fn find_first_of(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().position(|&b| b == byte)
    }

    pub fn find_last_of(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().rposition(|&b| b == byte)
    }

    pub fn count(&self, byte: u8) -> usize {
        self.as_bytes().iter().filter(|&&b| b == byte).count()
    }

    // --- Numeric ---

    /// Non-empty and made only of ASCII digits.
    pub fn is_number(&self) -> bool {
        !self.is_empty() && self.as_bytes().iter().all(u8::is_ascii_digit)
    }

    fn parse_as<T: FromStr>(&self, kind: &'static str) -> Result<T> {
        core::str::from_utf8(self.as_bytes())
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| Error::Parse {
                kind,
                text: String::from_utf8_lossy(self.as_bytes()).into_owned(),
            })
    }

    pub fn to_int(&self) -> Result<i32> {
        self.parse_as("int")
    }

    pub fn to_long(&self) -> Result<c_long> {
        self.parse_as("long")
    }

    pub fn to_long_long(&self) -> Result<c_longlong> {
        self.parse_as("long long")
    }

    pub fn to_float(&self) -> Result<f32> {
        self.parse_as("float")
    }

    pub fn to_double(&self) -> Result<f64> {
        self.parse_as("double")
    }

    /// Writes the content byte for byte, replacing the file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.as_bytes())?;
        Ok(())
    }
}

// --- Derived texts ---

impl<const N: usize, A: Allocator + Clone> Text<N, A> {
    /// Bytes `[start, end)`, with both bounds clamped to the length.
    pub fn substr(&self, start: usize, end: usize) -> Self {
        let bytes = self.as_bytes();
        let end = end.min(bytes.len());
        let start = start.min(end);
        Self::from_bytes_in(&bytes[start..end], self.alloc.clone())
    }

    pub fn substr_from(&self, start: usize) -> Self {
        self.substr(start, self.len())
    }

    pub fn reversed(&self) -> Self {
        let mut out = self.clone();
        out.content_mut().reverse();
        out
    }

    /// ASCII uppercase copy.
    pub fn upper(&self) -> Self {
        let mut out = self.clone();
        out.content_mut().make_ascii_uppercase();
        out
    }

    /// ASCII lowercase copy.
    pub fn lower(&self) -> Self {
        let mut out = self.clone();
        out.content_mut().make_ascii_lowercase();
        out
    }

    /// Splits on every `delimiter`, keeping empty pieces: `n` delimiters
    /// always give `n + 1` parts.
    pub fn split(&self, delimiter: u8) -> Vector<Self> {
        self.as_bytes()
            .split(|&b| b == delimiter)
            .map(|part| Self::from_bytes_in(part, self.alloc.clone()))
            .collect()
    }
}

// --- Safety & Standard Traits ---

impl<const N: usize, A: Allocator> Drop for Text<N, A> {
    fn drop(&mut self) {
        if !self.is_inline() {
            let heap = self.heap();
            unsafe { release(&mut self.alloc, heap.ptr, heap.cap + 1) };
        }
    }
}

impl<const N: usize, A: Allocator + Clone> Clone for Text<N, A> {
    fn clone(&self) -> Self {
        Self::from_bytes_in(self.as_bytes(), self.alloc.clone())
    }
}

impl<const N: usize, A: Allocator + Default> Default for Text<N, A> {
    fn default() -> Self {
        Self::with_allocator(A::default())
    }
}

impl<const N: usize, A: Allocator> Deref for Text<N, A> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize, A: Allocator, I: SliceIndex<[u8]>> Index<I> for Text<N, A> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &I::Output {
        &self.as_bytes()[index]
    }
}

impl<const N: usize, A: Allocator> fmt::Display for Text<N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl<const N: usize, A: Allocator> fmt::Debug for Text<N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

// Allow writing to it like a buffer: write!(t, "{}", 42)
impl<const N: usize, A: Allocator> fmt::Write for Text<N, A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.try_append(s).map(drop).map_err(|_| fmt::Error)
    }
}

impl<const N: usize> From<&str> for Text<N, HeapAlloc> {
    fn from(s: &str) -> Self {
        Self::from_bytes(s)
    }
}

impl<const N: usize> From<&[u8]> for Text<N, HeapAlloc> {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize, A: Allocator + Default> FromIterator<u8> for Text<N, A> {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut out = Self::default();
        out.extend(iter);
        out
    }
}

impl<const N: usize, A: Allocator> Extend<u8> for Text<N, A> {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        for byte in iter {
            self.push(byte);
        }
    }
}

// --- Equality & Ordering ---

// Texts of different inline sizes or allocators compare by content.
impl<const N: usize, const M: usize, A: Allocator, B: Allocator> PartialEq<Text<M, B>> for Text<N, A> {
    fn eq(&self, other: &Text<M, B>) -> bool {
        self.len() == other.len() && self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize, A: Allocator> Eq for Text<N, A> {}

impl<const N: usize, A: Allocator> PartialEq<str> for Text<N, A> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, const N: usize, A: Allocator> PartialEq<&'a str> for Text<N, A> {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize, A: Allocator> PartialEq<[u8]> for Text<N, A> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<const N: usize, const M: usize, A: Allocator, B: Allocator> PartialOrd<Text<M, B>> for Text<N, A> {
    fn partial_cmp(&self, other: &Text<M, B>) -> Option<Ordering> {
        Some(self.as_bytes().cmp(other.as_bytes()))
    }
}

impl<const N: usize, A: Allocator> Ord for Text<N, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

// Hashes like `[u8]` so maps keyed by `Text` can be queried with byte slices.
impl<const N: usize, A: Allocator> Hash for Text<N, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl<const N: usize, A: Allocator> Borrow<[u8]> for Text<N, A> {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize, A: Allocator> AsRef<[u8]> for Text<N, A> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// --- Concatenation ---

macro_rules! impl_concat {
    ($($rhs:ty => |$v:ident| $bytes:expr),* $(,)?) => {
        $(
            impl<const N: usize, A: Allocator> AddAssign<$rhs> for Text<N, A> {
                #[inline]
                fn add_assign(&mut self, $v: $rhs) {
                    self.append($bytes);
                }
            }

            impl<const N: usize, A: Allocator> Add<$rhs> for Text<N, A> {
                type Output = Self;

                #[inline]
                fn add(mut self, rhs: $rhs) -> Self {
                    self += rhs;
                    self
                }
            }
        )*
    };
}

impl_concat! {
    &str => |s| s,
    &[u8] => |b| b,
    u8 => |b| [b],
}

impl<const N: usize, const M: usize, A: Allocator, B: Allocator> AddAssign<&Text<M, B>> for Text<N, A> {
    fn add_assign(&mut self, rhs: &Text<M, B>) {
        self.append(rhs.as_bytes());
    }
}

impl<const N: usize, const M: usize, A: Allocator, B: Allocator> Add<&Text<M, B>> for Text<N, A> {
    type Output = Self;

    fn add(mut self, rhs: &Text<M, B>) -> Self {
        self += rhs;
        self
    }
}

impl<const N: usize, A: Allocator> AnyText for Text<N, A> {
    fn as_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
    fn append_bytes(&mut self, bytes: &[u8]) {
        self.append(bytes);
    }
    fn clear(&mut self) {
        self.clear();
    }
    fn truncate(&mut self, len: usize) {
        self.slice(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::TrackingAlloc;
    use std::fmt::Write;

    #[test]
    fn test_text_short_stays_inline() {
        let t = Text64::from("hello");
        assert!(t.is_inline());
        assert_eq!(t.len(), 5);
        assert_eq!(t.capacity(), 63);
        assert_eq!(t, "hello");
        assert_eq!(t.as_bytes_with_nul(), b"hello\0");

        let full = Text32::from_bytes([b'a'; 31]);
        assert!(full.is_inline());
        assert_eq!(full.len(), 31);
        assert_eq!(full.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn test_text_spills_past_inline_capacity() {
        let mut t = Text64::from("hi");
        let mut expected = String::from("hi");
        for _ in 0..100 {
            t += "x";
            expected.push('x');
            assert_eq!(t.is_inline(), expected.len() <= 63);
            assert_eq!(t.len(), expected.len());
            assert_eq!(t[t.len() - 1], b'x');
            assert_eq!(t.as_bytes(), expected.as_bytes());
        }
        assert!(!t.is_inline());
        assert_eq!(t.as_bytes_with_nul()[102], 0);
        assert_eq!(unsafe { *t.as_ptr().add(t.len()) }, 0);
    }

    #[test]
    fn test_text_nul_content_moves_to_heap() {
        let mut t = Text32::from("ab");
        t.push(0);
        t.push(b'c');
        assert!(!t.is_inline());
        assert_eq!(t.as_bytes(), b"ab\0c");

        let mut z = Text32::new();
        z.resize(3);
        assert_eq!(z.len(), 3);
        assert_eq!(z.as_bytes(), &[0, 0, 0]);
    }

    #[test]
    fn test_text_reserve_is_absolute() {
        let mut t = Text32::from("abc");
        t.reserve(10);
        assert!(t.is_inline());
        t.reserve(100);
        assert!(!t.is_inline());
        assert_eq!(t.capacity(), 100);
        assert_eq!(t, "abc");
        t.reserve(200);
        assert_eq!(t.capacity(), 200);
        t.clear();
        assert!(t.is_empty());
        assert!(!t.is_inline());
    }

    #[test]
    fn test_text_insert_erase_substr() {
        let mut t = Text64::from("hello world");
        t.insert(5, ",");
        assert_eq!(t, "hello, world");
        t.insert_byte(0, b'>');
        assert_eq!(t, ">hello, world");
        t.erase(0, 1);
        t.erase(5, 100);
        assert_eq!(t, "hello");
        t.erase(99, 1);
        assert_eq!(t, "hello");

        assert_eq!(t.substr(1, 3), "el");
        assert_eq!(t.substr(3, 99), "lo");
        assert_eq!(t.substr(4, 2), "");
        assert_eq!(t.substr_from(2), "llo");
        t.slice(2);
        assert_eq!(t, "he");
        t.slice(10);
        assert_eq!(t, "he");
    }

    #[test]
    fn test_text_try_insert_past_end() {
        let mut t = Text64::from("abc");
        assert!(matches!(t.try_insert(4, "x"), Err(Error::OutOfRange { index: 4, len: 3 })));
        assert_eq!(t, "abc");
        t.try_insert(3, "d").unwrap();
        assert_eq!(t, "abcd");
    }

    #[test]
    fn test_text_search() {
        let t = Text64::from("banana");
        assert_eq!(t.find("nan"), Some(2));
        assert_eq!(t.find("xyz"), None);
        assert_eq!(t.find(""), Some(0));
        assert_eq!(t.find_first_of(b'a'), Some(1));
        assert_eq!(t.find_last_of(b'a'), Some(5));
        assert_eq!(t.find_first_of(b'z'), None);
        assert_eq!(t.count(b'a'), 3);
    }

    #[test]
    fn test_text_case_and_reverse() {
        let t = Text64::from("Hello, World 42");
        assert_eq!(t.upper(), "HELLO, WORLD 42");
        assert_eq!(t.upper().lower(), t.lower());
        assert_eq!(t.reversed(), "24 dlroW ,olleH");
        assert_eq!(t.reversed().reversed(), t);
    }

    #[test]
    fn test_text_split_and_join() {
        let t = Text64::from("a,,b,");
        let parts = t.split(b',');
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "a");
        assert_eq!(parts[1], "");
        assert_eq!(parts[2], "b");
        assert_eq!(parts[3], "");
        assert_eq!(Text64::join(&parts, ","), t);

        assert_eq!(Text64::new().split(b',').len(), 1);
    }

    #[test]
    fn test_text_numbers() {
        assert_eq!(Text64::from("42").to_int().unwrap(), 42);
        assert_eq!(Text64::from(" -7 ").to_long().unwrap(), -7);
        assert_eq!(Text64::from("9000000000").to_long_long().unwrap(), 9_000_000_000);
        assert!((Text64::from("2.5").to_float().unwrap() - 2.5).abs() < f32::EPSILON);
        assert!((Text64::from("1e3").to_double().unwrap() - 1000.0).abs() < f64::EPSILON);

        let err = Text64::from("12ab").to_int().unwrap_err();
        assert!(matches!(err, Error::Parse { kind: "int", .. }));

        assert!(Text64::from("0123").is_number());
        assert!(!Text64::from("-1").is_number());
        assert!(!Text64::new().is_number());
    }

    #[test]
    fn test_text_format_replaces_content() {
        let mut t = Text32::from("old");
        t.format(format_args!("{}-{:04}", "id", 7)).unwrap();
        assert_eq!(t, "id-0007");

        let long = "y".repeat(80);
        t.format(format_args!("{long}!")).unwrap();
        assert_eq!(t.len(), 81);
        assert!(!t.is_inline());

        let mut w = Text64::new();
        write!(w, "{}+{}", 1, 2).unwrap();
        assert_eq!(w, "1+2");

        assert_eq!(Text64::from_display(&123u32), "123");
        assert_eq!(Text64::from_float(1.0 / 3.0, 3), "0.333");
    }

    #[test]
    fn test_text_file_round_trip() {
        let path = std::env::temp_dir().join(format!("alloc_containers_text_{}.bin", std::process::id()));
        let original = Text32::from_bytes(b"line one\nline\0two\n");
        original.to_file(&path).unwrap();
        let loaded = Text32::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.len(), 18);

        assert!(matches!(Text32::from_file(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_text_equality_and_order_across_sizes() {
        let a = Text32::from("apple");
        let b = Text128::from("apple");
        assert_eq!(a, b);
        assert!(Text64::from("apple") < Text64::from("banana"));
        assert!(Text64::from("app") < Text64::from("apple"));
        assert!(a.partial_cmp(&Text64::from("b")) == Some(Ordering::Less));
    }

    #[test]
    fn test_text_concatenation() {
        let a = Text32::from("foo");
        let b = Text64::from("bar");
        let c = a.clone() + &b + b'!' + "?";
        assert_eq!(c, "foobar!?");
        assert_eq!(c.len(), a.len() + b.len() + 2);

        let mut d = Text32::new();
        d += &b"xy"[..];
        assert_eq!(d, "xy");
    }

    #[test]
    fn test_text_hash_matches_bytes() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Text64::from("key"));
        assert!(set.contains(&b"key"[..]));
    }

    #[test]
    fn test_text_with_tracking_allocator() {
        let mut tracker = TrackingAlloc::new();
        {
            let mut t: Text<32, &mut TrackingAlloc> = Text::with_allocator(&mut tracker);
            t.append("short");
            for _ in 0..10 {
                t.append("0123456789");
            }
            assert_eq!(t.len(), 105);
            assert!(!t.is_inline());
        }
        assert_eq!(tracker.live_count(), 0);
        assert!(tracker.total_allocations() >= 1);
    }

    #[test]
    fn test_text_move_keeps_heap_state() {
        let mut t = Text32::new();
        t.append("z".repeat(50));
        let moved = t;
        assert!(!moved.is_inline());
        assert_eq!(moved.len(), 50);
        let boxed = Box::new(moved);
        assert_eq!(boxed.count(b'z'), 50);
    }

    #[test]
    fn test_text_any_text_interop() {
        fn fill<T: AnyText>(t: &mut T) {
            t.append_bytes(b"abc");
            t.truncate(2);
        }
        let mut t = Text64::new();
        let mut v = Vec::new();
        fill(&mut t);
        fill(&mut v);
        assert_eq!(t.as_bytes(), v.as_slice());
    }
}
