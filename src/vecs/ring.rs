use core::fmt;
use core::mem::MaybeUninit;

/// FIFO ring over caller-supplied storage.
///
/// One slot always stays empty to tell "full" from "empty", so a buffer of
/// `n` slots holds at most `n - 1` values. `push_back` on a full ring hands
/// the value back instead of overwriting. The ring does not own the storage,
/// only the values currently in it, which it drops on `clear` and on drop.
pub struct RingBuffer<'a, T> {
    buffer: &'a mut [MaybeUninit<T>],
    read: usize,
    write: usize,
}

impl<'a, T> RingBuffer<'a, T> {
    pub fn new(buffer: &'a mut [MaybeUninit<T>]) -> Self {
        Self {
            buffer,
            read: 0,
            write: 0,
        }
    }

    /// Values the ring can hold at once.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len().saturating_sub(1)
    }

    #[inline(always)]
    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.buffer.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.write >= self.read {
            self.write - self.read
        } else {
            self.buffer.len() - self.read + self.write
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buffer.is_empty() || self.advance(self.write) == self.read
    }

    /// Appends `value`, or returns it when the ring is full.
    pub fn push_back(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.buffer[self.write].write(value);
        self.write = self.advance(self.write);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = unsafe { self.buffer[self.read].assume_init_read() };
        self.read = self.advance(self.read);
        Some(value)
    }

    pub fn front(&self) -> Option<&T> {
        (!self.is_empty()).then(|| unsafe { self.buffer[self.read].assume_init_ref() })
    }

    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
        self.read = 0;
        self.write = 0;
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (mut at, len) = (self.read, self.len());
        (0..len).map(move |_| {
            let item = unsafe { self.buffer[at].assume_init_ref() };
            at = self.advance(at);
            item
        })
    }
}

impl<T> Drop for RingBuffer<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for RingBuffer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_ring_rejects_when_full() {
        let mut storage = [const { MaybeUninit::<u32>::uninit() }; 4];
        let mut ring = RingBuffer::new(&mut storage);
        assert_eq!(ring.capacity(), 3);
        assert!(ring.push_back(1).is_ok());
        assert!(ring.push_back(2).is_ok());
        assert!(ring.push_back(3).is_ok());
        assert!(ring.is_full());
        assert_eq!(ring.push_back(4), Err(4));
        assert_eq!(ring.pop_front(), Some(1));
        assert!(ring.push_back(4).is_ok());
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_ring_wraps_fifo() {
        let mut storage = [const { MaybeUninit::<usize>::uninit() }; 5];
        let mut ring = RingBuffer::new(&mut storage);
        for i in 0..100 {
            ring.push_back(i).unwrap();
            if i % 3 == 2 {
                assert_eq!(ring.front(), Some(&(i - 2)));
                ring.pop_front();
                ring.pop_front();
                ring.pop_front();
            }
        }
        assert_eq!(ring.pop_front(), Some(99));
        assert!(ring.is_empty());
    }

    #[test]
    fn test_ring_degenerate_storage() {
        let mut none: [MaybeUninit<u8>; 0] = [];
        let mut ring = RingBuffer::new(&mut none);
        assert!(ring.is_full());
        assert_eq!(ring.push_back(1), Err(1));
        assert_eq!(ring.pop_front(), None);
    }

    #[test]
    fn test_ring_drops_remaining_values() {
        let probe = Rc::new(());
        let mut storage = [const { MaybeUninit::<Rc<()>>::uninit() }; 3];
        {
            let mut ring = RingBuffer::new(&mut storage);
            ring.push_back(probe.clone()).unwrap();
            ring.push_back(probe.clone()).unwrap();
            assert_eq!(Rc::strong_count(&probe), 3);
        }
        assert_eq!(Rc::strong_count(&probe), 1);
    }
}
