//! Per-process file descriptor table.
//!
//! A small integer names a slot holding one open-file reference. The table
//! lives behind the process's own lock; threads of the process claim slots
//! atomically under it.

use alloc::vec::Vec;

use crate::error::{FsError, FsResult};
use crate::file::FileRef;

/// Maximum number of open file descriptors per process.
pub const NOFILE: usize = 16;

/// Sparse descriptor array (None = unused slot).
pub struct FdTable {
    entries: Vec<Option<FileRef>>,
}

impl FdTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `file` to the lowest free slot and return its number. On failure
    /// the caller keeps its reference and the table is unchanged.
    pub fn alloc(&mut self, file: FileRef) -> FsResult<usize> {
        for (fd, slot) in self.entries.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(file);
                return Ok(fd);
            }
        }
        if self.entries.len() < NOFILE {
            let fd = self.entries.len();
            self.entries.push(Some(file));
            return Ok(fd);
        }
        Err(FsError::NoFreeDescriptors)
    }

    /// Borrow the file behind `fd`.
    pub fn get(&self, fd: usize) -> FsResult<&FileRef> {
        self.entries
            .get(fd)
            .and_then(|slot| slot.as_ref())
            .ok_or(FsError::BadDescriptor)
    }

    /// Clear the slot, returning the reference for the caller to drop.
    pub fn close(&mut self, fd: usize) -> FsResult<FileRef> {
        self.entries
            .get_mut(fd)
            .and_then(|slot| slot.take())
            .ok_or(FsError::BadDescriptor)
    }

    /// Bind the file behind `fd` to a second slot, sharing the reference.
    /// The original descriptor is unaffected even on failure.
    pub fn dup(&mut self, fd: usize) -> FsResult<usize> {
        let file = self.get(fd)?.clone();
        self.alloc(file)
    }

    /// Drop every open descriptor (process exit).
    pub fn close_all(&mut self) {
        for slot in self.entries.iter_mut() {
            slot.take();
        }
    }

    /// Number of occupied slots.
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|s| s.is_some()).count()
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}
