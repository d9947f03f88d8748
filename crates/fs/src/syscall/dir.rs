//! Directory and device-node calls: mkdir, mknod and chdir.

use super::Kernel;
use crate::create::create;
use crate::error::{FsError, FsResult};
use crate::inode::InodeType;
use crate::proc::Proc;
use crate::store::InodeStore;
use crate::usermem::{self, UserMem};

impl<S: InodeStore> Kernel<S> {
    /// Create a directory at the path stored at `path_addr`.
    pub fn sys_mkdir(&self, proc: &Proc, mem: &dyn UserMem, path_addr: usize) -> isize {
        let res = (|| -> FsResult<()> {
            let path = usermem::read_path(mem, path_addr)?;
            let _txn = self.journal.begin();
            let ip = create(
                &self.store,
                &proc.cwd(),
                &path,
                InodeType::Dir,
                0,
                0,
                proc.uid,
            )?;
            // Only absolute names are indexable; relative creations are
            // still reachable through the walk.
            if path.starts_with('/') {
                self.path_index.insert(&path, ip);
            }
            Ok(())
        })();
        match res {
            Ok(()) => 0,
            Err(e) => self.fail("mkdir", e),
        }
    }

    /// Create a device node bound to `major`/`minor`. Driver presence is
    /// checked at open time, not here.
    pub fn sys_mknod(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        path_addr: usize,
        major: u16,
        minor: u16,
    ) -> isize {
        let res = (|| -> FsResult<()> {
            let path = usermem::read_path(mem, path_addr)?;
            let _txn = self.journal.begin();
            create(
                &self.store,
                &proc.cwd(),
                &path,
                InodeType::Device,
                major,
                minor,
                proc.uid,
            )?;
            Ok(())
        })();
        match res {
            Ok(()) => 0,
            Err(e) => self.fail("mknod", e),
        }
    }

    /// Re-base the process's relative path resolution.
    pub fn sys_chdir(&self, proc: &Proc, mem: &dyn UserMem, path_addr: usize) -> isize {
        let res = (|| -> FsResult<()> {
            let path = usermem::read_path(mem, path_addr)?;
            let _txn = self.journal.begin();
            let ip = self.resolve_cached(&proc.cwd(), &path)?;
            if ip.lock().itype != InodeType::Dir {
                return Err(FsError::NotADirectory);
            }
            proc.set_cwd(ip);
            Ok(())
        })();
        match res {
            Ok(()) => 0,
            Err(e) => self.fail("chdir", e),
        }
    }
}
