use std::collections::VecDeque;

use crate::{BowingError, Result};

/// Fixed-capacity, time-ordered buffer. Pushing into a full buffer evicts the
/// oldest element, so `len() <= capacity()` always holds.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Rejects a zero capacity; a buffer that can hold nothing cannot back
    /// any windowed computation.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BowingError::config("ring buffer capacity must be at least 1"));
        }

        Ok(Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends `item`, returning the evicted element if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// The newest `count` elements (or fewer), oldest first.
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(count);
        self.items.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copies the newest `count` elements (or fewer), oldest first.
    pub fn latest_vec(&self, count: usize) -> Vec<T> {
        self.latest(count).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        assert!(RingBuffer::<u8>::new(0).is_err());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut buffer = RingBuffer::new(3).unwrap();
        for value in 0..3 {
            assert_eq!(buffer.push(value), None);
        }

        assert!(buffer.is_full());
        assert_eq!(buffer.push(3), Some(0));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.oldest(), Some(&1));
        assert_eq!(buffer.newest(), Some(&3));
    }

    #[test]
    fn latest_returns_window_in_time_order() {
        let mut buffer = RingBuffer::new(10).unwrap();
        for value in 0..6 {
            buffer.push(value);
        }

        assert_eq!(buffer.latest_vec(3), vec![3, 4, 5]);
        assert_eq!(buffer.latest_vec(20), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut buffer = RingBuffer::new(2).unwrap();
        buffer.push('a');
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 2);
    }
}
