//! Shared primitives for the FinchOS kernel crates.
//!
//! Re-exports the lock and collection types the rest of the tree builds on,
//! plus the fixed-capacity ring buffer used by the pipe layer.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Re-export spin crate types as our lock API.
pub use spin::{Lazy, Once};
pub use spin::{Mutex, MutexGuard};
pub use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// Re-export hashbrown collections.
pub use hashbrown::{HashMap, HashSet};

/// Fixed-capacity FIFO ring buffer.
///
/// `N` is the capacity; the buffer never allocates. Push fails (returns
/// `false`) when full, pop returns `None` when empty.
pub struct RingBuffer<T: Copy, const N: usize> {
    buffer: [T; N],
    head: usize,
    tail: usize,
    full: bool,
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    #[must_use]
    pub const fn new(default_val: T) -> Self {
        Self {
            buffer: [default_val; N],
            head: 0,
            tail: 0,
            full: false,
        }
    }

    /// Push one element; returns `false` when the buffer is full.
    pub fn push(&mut self, item: T) -> bool {
        if self.full {
            return false;
        }

        self.buffer[self.head] = item;
        self.head = (self.head + 1) % N;
        self.full = self.head == self.tail;
        true
    }

    /// Pop the oldest element (FIFO); returns `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        if !self.full && self.head == self.tail {
            return None;
        }

        let item = self.buffer[self.tail];
        self.tail = (self.tail + 1) % N;
        self.full = false;
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Number of elements currently buffered.
    pub fn len(&self) -> usize {
        if self.full {
            N
        } else if self.head >= self.tail {
            self.head - self.tail
        } else {
            N - self.tail + self.head
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
