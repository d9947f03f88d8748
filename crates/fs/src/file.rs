//! Open-file objects.
//!
//! A [`File`] is the per-open handle behind a descriptor, abstracting inode,
//! device and pipe endpoints behind one read/write/stat contract. Sharing
//! (via `dup` or multiple descriptor slots) is `Arc` cloning; the underlying
//! resource, inode reference or pipe end, is released exactly once, when
//! the last reference drops.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::device::DeviceDriver;
use crate::error::{FsError, FsResult};
use crate::inode::{InodeRef, Stat};
use crate::pipe::{Pipe, PipeRef};

/// What a file handle is backed by.
pub enum FileKind {
    /// Plain file or directory, with the advancing byte offset.
    Inode { ip: InodeRef, offset: AtomicUsize },
    /// Device node; the driver is captured at open time by major number.
    Device {
        ip: InodeRef,
        driver: Arc<dyn DeviceDriver>,
    },
    /// Read end of a pipe.
    PipeRead(PipeRef),
    /// Write end of a pipe.
    PipeWrite(PipeRef),
}

impl Drop for FileKind {
    fn drop(&mut self) {
        match self {
            FileKind::PipeRead(p) => p.close_read(),
            FileKind::PipeWrite(p) => p.close_write(),
            _ => {}
        }
    }
}

/// Open-file object.
pub struct File {
    pub kind: FileKind,
    pub readable: bool,
    pub writable: bool,
}

/// Counted reference to an open file; `dup` and descriptor slots share it.
pub type FileRef = Arc<File>;

impl File {
    pub fn new(kind: FileKind, readable: bool, writable: bool) -> FileRef {
        Arc::new(Self {
            kind,
            readable,
            writable,
        })
    }

    /// Allocate a connected pipe pair: (read end, write end).
    pub fn pipe_pair() -> (FileRef, FileRef) {
        let pipe = Pipe::new();
        let rf = File::new(FileKind::PipeRead(pipe.clone()), true, false);
        let wf = File::new(FileKind::PipeWrite(pipe), false, true);
        (rf, wf)
    }

    /// Read into `buf`, dispatching on the backing kind. Inode reads advance
    /// the stored offset by the bytes actually transferred.
    pub fn read(&self, buf: &mut [u8]) -> FsResult<usize> {
        if !self.readable {
            return Err(FsError::NotReadable);
        }
        match &self.kind {
            FileKind::Inode { ip, offset } => {
                let guard = ip.lock();
                let off = offset.load(Ordering::Acquire);
                let n = guard.read_at(off, buf);
                offset.fetch_add(n, Ordering::AcqRel);
                Ok(n)
            }
            FileKind::Device { driver, .. } => driver.read(buf),
            FileKind::PipeRead(p) => Ok(p.read(buf)),
            FileKind::PipeWrite(_) => Err(FsError::NotReadable),
        }
    }

    /// Write from `buf`, dispatching on the backing kind.
    pub fn write(&self, buf: &[u8]) -> FsResult<usize> {
        if !self.writable {
            return Err(FsError::NotWritable);
        }
        match &self.kind {
            FileKind::Inode { ip, offset } => {
                let mut guard = ip.lock();
                let off = offset.load(Ordering::Acquire);
                let n = guard.write_at(off, buf);
                offset.fetch_add(n, Ordering::AcqRel);
                Ok(n)
            }
            FileKind::Device { driver, .. } => driver.write(buf),
            FileKind::PipeWrite(p) => p.write(buf),
            FileKind::PipeRead(_) => Err(FsError::NotWritable),
        }
    }

    /// Metadata for inode-backed and device-backed files; pipes have none.
    pub fn stat(&self) -> FsResult<Stat> {
        match &self.kind {
            FileKind::Inode { ip, .. } | FileKind::Device { ip, .. } => {
                let guard = ip.lock();
                Ok(ip.stat(&guard))
            }
            FileKind::PipeRead(_) | FileKind::PipeWrite(_) => Err(FsError::BadDescriptor),
        }
    }
}
