//! Inode store seam and the in-memory reference store.
//!
//! The syscall layer is generic over [`InodeStore`]; a disk-backed store
//! plugs in behind the same five operations. [`MemStore`] keeps everything
//! in a hash table and backs the unit tests and early boot.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

use fos_utils::{HashMap, Mutex};

use crate::dirent;
use crate::error::{FsError, FsResult};
use crate::inode::{Inode, InodeData, InodeRef, InodeType};

/// Inode number of the root directory.
pub const ROOT_INUM: u32 = 1;

/// Allocation, lookup and persistence operations the layer requires from an
/// inode store.
pub trait InodeStore: Send + Sync {
    /// Device id of this store.
    fn dev(&self) -> u32;

    /// The root directory.
    fn root(&self) -> InodeRef;

    /// Allocate a fresh inode of the given type. The caller fills in the
    /// remaining fields under the inode lock and calls [`update`].
    ///
    /// [`update`]: InodeStore::update
    fn alloc(&self, itype: InodeType) -> FsResult<InodeRef>;

    /// Fetch the inode `(dev, inum)`, acquiring a reference.
    fn get(&self, dev: u32, inum: u32) -> FsResult<InodeRef>;

    /// Persist the locked state of an inode. The caller passes the guard's
    /// contents to prove it holds the lock. This is the point the journal
    /// brackets; the memory store only traces it.
    fn update(&self, ip: &Inode, data: &InodeData);

    /// Drop a zero-link inode from the store. Live references keep the data
    /// alive until they are released; later `get` calls fail with `NotFound`.
    fn free(&self, ip: &Inode);
}

/// Hash-table backed store.
pub struct MemStore {
    dev: u32,
    next_inum: AtomicU32,
    table: Mutex<HashMap<u32, InodeRef>>,
    root: InodeRef,
}

impl MemStore {
    /// Build a store with a root directory whose "." and ".." both refer to
    /// itself.
    pub fn new(dev: u32) -> FsResult<Self> {
        let mut root_data = InodeData::new(InodeType::Dir);
        root_data.nlink = 1;
        root_data.perm = crate::mode::Perm::DIR_DEFAULT;
        dirent::link(&mut root_data, ".", ROOT_INUM)?;
        dirent::link(&mut root_data, "..", ROOT_INUM)?;

        let root: InodeRef = Arc::new(Inode::new(dev, ROOT_INUM, root_data));
        let mut table = HashMap::new();
        table.insert(ROOT_INUM, root.clone());

        Ok(Self {
            dev,
            next_inum: AtomicU32::new(ROOT_INUM + 1),
            table: Mutex::new(table),
            root,
        })
    }
}

impl InodeStore for MemStore {
    fn dev(&self) -> u32 {
        self.dev
    }

    fn root(&self) -> InodeRef {
        self.root.clone()
    }

    fn alloc(&self, itype: InodeType) -> FsResult<InodeRef> {
        let inum = self.next_inum.fetch_add(1, Ordering::Relaxed);
        let ip: InodeRef = Arc::new(Inode::new(self.dev, inum, InodeData::new(itype)));
        self.table.lock().insert(inum, ip.clone());
        Ok(ip)
    }

    fn get(&self, dev: u32, inum: u32) -> FsResult<InodeRef> {
        if dev != self.dev {
            return Err(FsError::IoError);
        }
        self.table
            .lock()
            .get(&inum)
            .cloned()
            .ok_or(FsError::NotFound)
    }

    fn update(&self, ip: &Inode, data: &InodeData) {
        log::trace!(
            "store: update dev {} inum {} nlink {} size {}",
            ip.dev,
            ip.inum,
            data.nlink,
            data.size()
        );
    }

    fn free(&self, ip: &Inode) {
        log::trace!("store: free dev {} inum {}", ip.dev, ip.inum);
        self.table.lock().remove(&ip.inum);
    }
}
