//! Pipes.
//!
//! A pipe is a shared ring buffer with one read end and one write end. Reads
//! block while the buffer is empty and a writer remains; writes block while
//! the buffer is full and a reader remains. Suspension is a spin-wait on the
//! pipe's own lock and end-state; the wake signal is simply the peer's next
//! write, read or close mutating that state. No timeout is defined.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use fos_utils::{Mutex, RingBuffer};

use crate::error::{FsError, FsResult};

/// Pipe buffer capacity in bytes.
pub const PIPE_SIZE: usize = 512;

/// Shared pipe object; both ends hold a reference.
pub struct Pipe {
    ring: Mutex<RingBuffer<u8, PIPE_SIZE>>,
    readers: AtomicUsize,
    writers: AtomicUsize,
}

/// Counted reference to a pipe.
pub type PipeRef = Arc<Pipe>;

impl Pipe {
    /// New empty pipe with one reader and one writer.
    pub fn new() -> PipeRef {
        Arc::new(Self {
            ring: Mutex::new(RingBuffer::new(0)),
            readers: AtomicUsize::new(1),
            writers: AtomicUsize::new(1),
        })
    }

    /// Read up to `buf.len()` bytes, blocking while the pipe is empty and
    /// the write end is open. Returns 0 only at end-of-file (write end
    /// closed and buffer drained).
    pub fn read(&self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        loop {
            {
                let mut ring = self.ring.lock();
                if !ring.is_empty() {
                    let mut n = 0;
                    while n < buf.len() {
                        match ring.pop() {
                            Some(b) => {
                                buf[n] = b;
                                n += 1;
                            }
                            None => break,
                        }
                    }
                    return n;
                }
                // Empty: EOF only once no writer can refill it.
                if self.writers.load(Ordering::Acquire) == 0 {
                    return 0;
                }
            }
            core::hint::spin_loop();
        }
    }

    /// Write all of `buf`, blocking whenever the buffer is full, as long as
    /// the read end stays open. Fails with `IoError` once no reader remains
    /// (the peer will never drain the buffer).
    pub fn write(&self, buf: &[u8]) -> FsResult<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.readers.load(Ordering::Acquire) == 0 {
                return Err(FsError::IoError);
            }
            {
                let mut ring = self.ring.lock();
                while written < buf.len() && ring.push(buf[written]) {
                    written += 1;
                }
            }
            if written < buf.len() {
                core::hint::spin_loop();
            }
        }
        Ok(written)
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.ring.lock().len()
    }

    /// Drop one reader; blocked writers observe the change and fail.
    pub fn close_read(&self) {
        self.readers.fetch_sub(1, Ordering::AcqRel);
    }

    /// Drop one writer; blocked readers observe EOF once drained.
    pub fn close_write(&self) {
        self.writers.fetch_sub(1, Ordering::AcqRel);
    }
}
