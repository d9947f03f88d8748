//! Name management: link and unlink.
//!
//! `link` bumps the target's link count before touching the new parent, so
//! a crash between the two steps over-counts rather than frees a live
//! inode; the failure path takes the lock again and puts the count back.
//! `unlink` holds parent and child locks together (parent first) so the
//! emptiness check and the entry removal are one atomic step.

use super::Kernel;
use crate::dirent;
use crate::error::{FsError, FsResult};
use crate::inode::InodeType;
use crate::namei;
use crate::proc::Proc;
use crate::store::InodeStore;
use crate::usermem::{self, UserMem};

impl<S: InodeStore> Kernel<S> {
    /// Give the file at `old_addr`'s path a second name at `new_addr`'s.
    pub fn sys_link(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        old_addr: usize,
        new_addr: usize,
    ) -> isize {
        match self.link_impl(proc, mem, old_addr, new_addr) {
            Ok(()) => 0,
            Err(e) => self.fail("link", e),
        }
    }

    fn link_impl(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        old_addr: usize,
        new_addr: usize,
    ) -> FsResult<()> {
        let old = usermem::read_path(mem, old_addr)?;
        let new = usermem::read_path(mem, new_addr)?;
        let _txn = self.journal.begin();
        let cwd = proc.cwd();

        let ip = namei::resolve(&self.store, &cwd, &old)?;
        {
            let mut guard = ip.lock();
            // Directories get exactly one parent.
            if guard.itype == InodeType::Dir {
                return Err(FsError::PermissionDenied);
            }
            guard.nlink += 1;
            self.store.update(&ip, &guard);
        }

        let linked = (|| {
            let (dp, name) = namei::resolve_parent(&self.store, &cwd, &new)?;
            if dp.dev != ip.dev {
                return Err(FsError::CrossDeviceLink);
            }
            let mut dguard = dp.lock();
            dirent::link(&mut dguard, name, ip.inum)?;
            self.store.update(&dp, &dguard);
            Ok(())
        })();

        if let Err(e) = linked {
            let mut guard = ip.lock();
            guard.nlink -= 1;
            self.store.update(&ip, &guard);
            return Err(e);
        }
        Ok(())
    }

    /// Remove the name at `path_addr`'s path; the inode itself goes away
    /// only when its last name and last open reference are gone.
    pub fn sys_unlink(&self, proc: &Proc, mem: &dyn UserMem, path_addr: usize) -> isize {
        match self.unlink_impl(proc, mem, path_addr) {
            Ok(()) => 0,
            Err(e) => self.fail("unlink", e),
        }
    }

    fn unlink_impl(&self, proc: &Proc, mem: &dyn UserMem, path_addr: usize) -> FsResult<()> {
        let path = usermem::read_path(mem, path_addr)?;
        let _txn = self.journal.begin();
        let cwd = proc.cwd();

        let (dp, name) = namei::resolve_parent(&self.store, &cwd, &path)?;
        // "." and ".." are structure, not removable names.
        if name == "." || name == ".." {
            return Err(FsError::PermissionDenied);
        }

        let mut dguard = dp.lock();
        let (inum, off) = dirent::lookup(&dguard, name).ok_or(FsError::NotFound)?;
        let ip = self.store.get(dp.dev, inum)?;
        let mut iguard = ip.lock();
        assert!(iguard.nlink >= 1, "unlink: nlink < 1");
        if iguard.itype == InodeType::Dir && !dirent::is_empty(&iguard) {
            return Err(FsError::DirectoryNotEmpty);
        }

        dirent::unlink_at(&mut dguard, off);
        if iguard.itype == InodeType::Dir {
            dguard.nlink -= 1;
        }
        self.store.update(&dp, &dguard);
        drop(dguard);

        iguard.nlink -= 1;
        self.store.update(&ip, &iguard);
        let gone = iguard.nlink == 0;
        let was_dir = iguard.itype == InodeType::Dir;
        drop(iguard);

        if was_dir {
            // By inode identity: the index key may be a different spelling
            // of the removed directory's path.
            self.path_index.remove(&ip);
        }
        if gone {
            self.store.free(&ip);
        }
        Ok(())
    }
}
