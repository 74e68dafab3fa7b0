//! Fixed-capacity, insertion-ordered buffer with oldest-evict-first semantics.
//!
//! Every bounded store in the engine (packets, traffic samples, alerts) sits on
//! top of [`BoundedSeq`]. Eviction is insert-then-trim: the new element is
//! added first, then a single element is dropped from the old end if the
//! capacity is exceeded.

use std::collections::VecDeque;

/// Bounded sequence backed by a `VecDeque`.
#[derive(Debug, Clone)]
pub struct BoundedSeq<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedSeq<T> {
    /// Create an empty store holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the tail; evicts the head if the capacity is exceeded.
    pub fn append(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    /// Insert at the head (newest first); evicts the tail if the capacity is exceeded.
    pub fn prepend(&mut self, item: T) -> Option<T> {
        self.items.push_front(item);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
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

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }
}

impl<T: Clone> BoundedSeq<T> {
    /// Copy of the current contents in stored order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
