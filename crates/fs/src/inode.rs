//! In-memory inode representation.
//!
//! An [`Inode`] is identified by `(dev, inum)` and carries all mutable state
//! behind its own lock. Holding the guard is the capability required to read
//! or mutate the fields or the directory contents. `Arc` strong counts model
//! the reference counts: every code path that acquired a reference releases
//! it by dropping the `InodeRef`, including error paths.

use alloc::sync::Arc;
use alloc::vec::Vec;
use fos_utils::{Mutex, MutexGuard};

use crate::mode::Perm;

pub type Uid = u32;
pub type Gid = u32;

/// On-"disk" entity type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InodeType {
    Free,
    Dir,
    File,
    Device,
}

impl InodeType {
    /// Numeric code used in `stat` records.
    pub fn code(&self) -> u16 {
        match self {
            InodeType::Free => 0,
            InodeType::Dir => 1,
            InodeType::File => 2,
            InodeType::Device => 3,
        }
    }
}

/// Lock-protected inode state.
pub struct InodeData {
    pub itype: InodeType,
    /// Number of directory entries referencing this inode.
    pub nlink: i16,
    pub owner: Uid,
    pub perm: Perm,
    /// Device major/minor, meaningful only for `InodeType::Device`.
    pub major: u16,
    pub minor: u16,
    /// File or directory contents.
    pub data: Vec<u8>,
}

impl InodeData {
    pub fn new(itype: InodeType) -> Self {
        Self {
            itype,
            nlink: 0,
            owner: 0,
            perm: Perm::FILE_DEFAULT,
            major: 0,
            minor: 0,
            data: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Copy bytes out starting at `off`; returns the count actually copied
    /// (clipped at end of data, 0 when `off` is past the end).
    pub fn read_at(&self, off: usize, buf: &mut [u8]) -> usize {
        if off >= self.data.len() {
            return 0;
        }
        let n = buf.len().min(self.data.len() - off);
        buf[..n].copy_from_slice(&self.data[off..off + n]);
        n
    }

    /// Copy bytes in starting at `off`, growing the data as needed; returns
    /// the count written.
    pub fn write_at(&mut self, off: usize, buf: &[u8]) -> usize {
        let end = off + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[off..end].copy_from_slice(buf);
        buf.len()
    }

    /// Discard all contents.
    pub fn truncate(&mut self) {
        self.data.clear();
    }
}

/// A filesystem entity independent of its name.
pub struct Inode {
    pub dev: u32,
    pub inum: u32,
    locked: Mutex<InodeData>,
}

/// Counted reference to an inode.
pub type InodeRef = Arc<Inode>;

impl Inode {
    pub fn new(dev: u32, inum: u32, data: InodeData) -> Self {
        Self {
            dev,
            inum,
            locked: Mutex::new(data),
        }
    }

    /// Acquire this inode's exclusive lock. When a parent and child are both
    /// needed, the parent must be locked first.
    pub fn lock(&self) -> MutexGuard<'_, InodeData> {
        self.locked.lock()
    }

    /// Build a `stat` record from locked state.
    pub fn stat(&self, data: &InodeData) -> Stat {
        Stat {
            dev: self.dev,
            inum: self.inum,
            itype: data.itype,
            nlink: data.nlink,
            size: data.size() as u64,
            major: data.major,
            minor: data.minor,
        }
    }
}

impl core::fmt::Debug for Inode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Inode")
            .field("dev", &self.dev)
            .field("inum", &self.inum)
            .finish()
    }
}

/// Metadata record reported to callers of `fstat`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stat {
    pub dev: u32,
    pub inum: u32,
    pub itype: InodeType,
    pub nlink: i16,
    pub size: u64,
    pub major: u16,
    pub minor: u16,
}

/// Byte length of the encoded `stat` record.
pub const STAT_SIZE: usize = 24;

impl Stat {
    /// Fixed little-endian wire layout written to the caller's buffer.
    pub fn encode(&self) -> [u8; STAT_SIZE] {
        let mut out = [0u8; STAT_SIZE];
        out[0..2].copy_from_slice(&self.itype.code().to_le_bytes());
        out[2..4].copy_from_slice(&self.nlink.to_le_bytes());
        out[4..8].copy_from_slice(&self.dev.to_le_bytes());
        out[8..12].copy_from_slice(&self.inum.to_le_bytes());
        out[12..20].copy_from_slice(&self.size.to_le_bytes());
        out[20..22].copy_from_slice(&self.major.to_le_bytes());
        out[22..24].copy_from_slice(&self.minor.to_le_bytes());
        out
    }
}
