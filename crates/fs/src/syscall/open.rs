//! open: the path-to-descriptor transition.

use core::sync::atomic::AtomicUsize;

use super::Kernel;
use crate::access;
use crate::create::create;
use crate::error::{FsError, FsResult};
use crate::file::{File, FileKind};
use crate::inode::InodeType;
use crate::mode::OpenMode;
use crate::proc::Proc;
use crate::store::InodeStore;
use crate::usermem::{self, UserMem};

impl<S: InodeStore> Kernel<S> {
    /// Open the entity at the path stored at `path_addr` with `bits`,
    /// returning a fresh descriptor.
    pub fn sys_open(&self, proc: &Proc, mem: &dyn UserMem, path_addr: usize, bits: u32) -> isize {
        match self.open_impl(proc, mem, path_addr, bits) {
            Ok(fd) => fd as isize,
            Err(e) => self.fail("open", e),
        }
    }

    fn open_impl(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        path_addr: usize,
        bits: u32,
    ) -> FsResult<usize> {
        let path = usermem::read_path(mem, path_addr)?;
        let mode = OpenMode::new(bits);
        let _txn = self.journal.begin();
        let cwd = proc.cwd();

        let ip = if mode.is_create() {
            create(&self.store, &cwd, &path, InodeType::File, 0, 0, proc.uid)?
        } else {
            self.resolve_cached(&cwd, &path)?
        };

        let kind = {
            let mut guard = ip.lock();
            // Directories are read-only through descriptors.
            if guard.itype == InodeType::Dir && mode.access_mode() != OpenMode::RDONLY {
                return Err(FsError::PermissionDenied);
            }
            if !access::check(
                &self.policy,
                self.groups.as_ref(),
                &guard,
                mode,
                &path,
                proc.uid,
            ) {
                return Err(FsError::PermissionDenied);
            }
            match guard.itype {
                InodeType::Device => {
                    let driver = self.devices.get(guard.major).ok_or(FsError::IoError)?;
                    FileKind::Device {
                        ip: ip.clone(),
                        driver,
                    }
                }
                _ => {
                    if mode.is_trunc() && guard.itype == InodeType::File {
                        guard.truncate();
                        self.store.update(&ip, &guard);
                    }
                    FileKind::Inode {
                        ip: ip.clone(),
                        offset: AtomicUsize::new(0),
                    }
                }
            }
        };

        let file = File::new(kind, mode.is_readable(), mode.is_writable());
        let fd = proc.fd_table().alloc(file)?;
        Ok(fd)
    }
}
