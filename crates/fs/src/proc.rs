//! Per-process state the filesystem layer needs.
//!
//! Every syscall takes its process context explicitly; nothing here is
//! reached through a global current-process pointer.

use fos_utils::Mutex;

use crate::fd_table::FdTable;
use crate::inode::{InodeRef, Uid};

/// Process context: identity, working directory and descriptor table.
pub struct Proc {
    pub uid: Uid,
    cwd: Mutex<InodeRef>,
    fd_table: Mutex<FdTable>,
}

impl Proc {
    pub fn new(uid: Uid, cwd: InodeRef) -> Self {
        Self {
            uid,
            cwd: Mutex::new(cwd),
            fd_table: Mutex::new(FdTable::new()),
        }
    }

    /// Current working directory reference.
    pub fn cwd(&self) -> InodeRef {
        self.cwd.lock().clone()
    }

    /// Swap the working directory, releasing the old reference.
    pub fn set_cwd(&self, dir: InodeRef) {
        *self.cwd.lock() = dir;
    }

    pub fn fd_table(&self) -> fos_utils::MutexGuard<'_, FdTable> {
        self.fd_table.lock()
    }
}
