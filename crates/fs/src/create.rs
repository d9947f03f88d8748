//! Path entity creation.
//!
//! One routine services open-with-create, mkdir and mknod: resolve the
//! parent, then either return the existing entity (plain-file opens only)
//! or allocate, initialize and link a fresh one. Partial work is undone by
//! a scope guard that owns the half-built inode until the final link lands;
//! any early return drops the guard, which zeroes the link count and frees
//! the inode.

use crate::dirent;
use crate::error::{FsError, FsResult};
use crate::inode::{InodeRef, InodeType, Uid};
use crate::mode::Perm;
use crate::namei;
use crate::store::InodeStore;

/// Frees a freshly allocated inode unless disarmed.
struct Rollback<'a, S: InodeStore> {
    store: &'a S,
    ip: InodeRef,
    armed: bool,
}

impl<'a, S: InodeStore> Rollback<'a, S> {
    fn new(store: &'a S, ip: InodeRef) -> Self {
        Self {
            store,
            ip,
            armed: true,
        }
    }

    fn ip(&self) -> &InodeRef {
        &self.ip
    }

    fn disarm(mut self) -> InodeRef {
        self.armed = false;
        self.ip.clone()
    }
}

impl<S: InodeStore> Drop for Rollback<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            let mut guard = self.ip.lock();
            guard.nlink = 0;
            guard.itype = InodeType::Free;
            self.store.update(&self.ip, &guard);
            drop(guard);
            self.store.free(&self.ip);
        }
    }
}

/// Create the entity named by `path`, returning its inode unlocked.
///
/// When the name already exists: a plain-file request for an existing file
/// or device returns that inode (the open-with-create case); every other
/// combination fails with `AlreadyExists`.
pub fn create<S: InodeStore>(
    store: &S,
    cwd: &InodeRef,
    path: &str,
    itype: InodeType,
    major: u16,
    minor: u16,
    owner: Uid,
) -> FsResult<InodeRef> {
    let (dp, name) = namei::resolve_parent(store, cwd, path)?;

    let mut dguard = dp.lock();
    if let Some((inum, _off)) = dirent::lookup(&dguard, name) {
        drop(dguard);
        let ip = store.get(dp.dev, inum)?;
        let existing = ip.lock().itype;
        if itype == InodeType::File
            && (existing == InodeType::File || existing == InodeType::Device)
        {
            return Ok(ip);
        }
        return Err(FsError::AlreadyExists);
    }

    let guard = Rollback::new(store, store.alloc(itype)?);
    {
        let ip = guard.ip();
        let mut iguard = ip.lock();
        iguard.nlink = 1;
        iguard.owner = owner;
        iguard.major = major;
        iguard.minor = minor;
        iguard.perm = if itype == InodeType::Dir {
            Perm::DIR_DEFAULT
        } else {
            Perm::FILE_DEFAULT
        };
        if itype == InodeType::Dir {
            // ".." does not count toward the parent's nlink until the
            // creation as a whole succeeds.
            dirent::link(&mut iguard, ".", ip.inum)?;
            dirent::link(&mut iguard, "..", dp.inum)?;
        }
        store.update(ip, &iguard);
        dirent::link(&mut dguard, name, ip.inum)?;
    }
    let ip = guard.disarm();

    if itype == InodeType::Dir {
        dguard.nlink += 1;
    }
    store.update(&dp, &dguard);
    Ok(ip)
}
