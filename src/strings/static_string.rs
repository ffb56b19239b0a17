use super::AnyText;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{AddAssign, Deref};
use std::str::FromStr;

/// A fixed-capacity C string: up to `N - 1` bytes plus a terminating NUL,
/// stored in a `heapless::Vec<u8, N>`.
///
/// Writes never allocate and never fail; whatever does not fit is dropped.
/// Input is read as a C string, so bytes after an embedded NUL are ignored.
#[derive(Clone)]
pub struct StaticString<const N: usize = 32> {
    /// Content followed by exactly one NUL.
    buf: heapless::Vec<u8, N>,
}

#[inline]
fn c_prefix(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

impl<const N: usize> StaticString<N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "StaticString<N> needs room for its terminator") };
        let mut buf = heapless::Vec::new();
        match buf.push(0) {
            Ok(()) => Self { buf },
            Err(_) => unreachable!("N > 0 leaves room for the terminator"),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// Appends the C-string prefix of `bytes`, truncated to the free space.
    /// Returns the number of bytes written.
    pub fn append(&mut self, bytes: impl AsRef<[u8]>) -> usize {
        let bytes = c_prefix(bytes.as_ref());
        let take = bytes.len().min(self.capacity() - self.len());
        self.buf.pop();
        if self.buf.extend_from_slice(&bytes[..take]).is_err() || self.buf.push(0).is_err() {
            unreachable!("StaticString append exceeded the checked free space");
        }
        take
    }

    /// Appends `byte`; returns `false` when full or when `byte` is NUL.
    pub fn push(&mut self, byte: u8) -> bool {
        byte != 0 && self.append([byte]) == 1
    }

    pub fn find(&self, needle: impl AsRef<[u8]>) -> Option<usize> {
        let needle = needle.as_ref();
        if needle.is_empty() {
            return Some(0);
        }
        self.as_bytes().windows(needle.len()).position(|w| w == needle)
    }

    pub fn find_first_of(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().position(|&b| b == byte)
    }

    pub fn find_last_of(&self, byte: u8) -> Option<usize> {
        self.as_bytes().iter().rposition(|&b| b == byte)
    }

    /// Up to `count` bytes from `start`, clamped to the content.
    pub fn substr(&self, start: usize, count: usize) -> Self {
        let bytes = self.as_bytes();
        let start = start.min(bytes.len());
        let end = start + count.min(bytes.len() - start);
        let mut out = Self::new();
        out.append(&bytes[start..end]);
        out
    }

    /// Removes up to `count` bytes from `start`, clamped to the content.
    pub fn erase(&mut self, start: usize, count: usize) {
        let len = self.len();
        let start = start.min(len);
        let count = count.min(len - start);
        // The terminator moves along with the tail.
        self.buf.copy_within(start + count.., start);
        self.buf.truncate(len - count + 1);
    }

    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.buf.truncate(len);
            self.buf.push(0).ok();
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }
}

impl<const N: usize> Default for StaticString<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for StaticString<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> fmt::Display for StaticString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl<const N: usize> fmt::Debug for StaticString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

// Truncation is reported so `write!` callers can tell the output was cut.
impl<const N: usize> fmt::Write for StaticString<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.append(s) == c_prefix(s.as_bytes()).len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

/// Copies as much of `s` as fits.
impl<const N: usize> From<&str> for StaticString<N> {
    fn from(s: &str) -> Self {
        let mut out = Self::new();
        out.append(s);
        out
    }
}

/// Parsing truncates like `From<&str>`, so it never fails.
impl<const N: usize> FromStr for StaticString<N> {
    type Err = Infallible;

    fn from_str(s: &str) -> core::result::Result<Self, Infallible> {
        Ok(Self::from(s))
    }
}

impl<const N: usize> AddAssign<&str> for StaticString<N> {
    fn add_assign(&mut self, rhs: &str) {
        self.append(rhs);
    }
}

impl<const N: usize, const M: usize> AddAssign<&StaticString<M>> for StaticString<N> {
    fn add_assign(&mut self, rhs: &StaticString<M>) {
        self.append(rhs.as_bytes());
    }
}

impl<const N: usize, const M: usize> PartialEq<StaticString<M>> for StaticString<N> {
    fn eq(&self, other: &StaticString<M>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for StaticString<N> {}

impl<const N: usize> PartialEq<str> for StaticString<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<'a, const N: usize> PartialEq<&'a str> for StaticString<N> {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize, const M: usize> PartialOrd<StaticString<M>> for StaticString<N> {
    fn partial_cmp(&self, other: &StaticString<M>) -> Option<Ordering> {
        Some(self.as_bytes().cmp(other.as_bytes()))
    }
}

impl<const N: usize> Ord for StaticString<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl<const N: usize> Hash for StaticString<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl<const N: usize> Borrow<[u8]> for StaticString<N> {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> AsRef<[u8]> for StaticString<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> AnyText for StaticString<N> {
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
        self.truncate(len);
    }
}
