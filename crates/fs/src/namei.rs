//! Path-to-inode resolution.
//!
//! A path is walked one component at a time through real directory entries;
//! "." and ".." resolve through the entries every directory carries, so the
//! walk needs no special cases for them. Each directory is locked only while
//! it is searched and released before the next component's inode is locked,
//! preserving the parent-before-child order.

use crate::dirent::{self, DIRSIZ};
use crate::error::{FsError, FsResult};
use crate::inode::{InodeRef, InodeType};
use crate::store::InodeStore;

/// Maximum length of a path argument, including the terminator.
pub const MAX_PATH: usize = 128;

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

fn start<S: InodeStore>(store: &S, cwd: &InodeRef, path: &str) -> InodeRef {
    if path.starts_with('/') {
        store.root()
    } else {
        cwd.clone()
    }
}

fn descend<S: InodeStore>(store: &S, dir: &InodeRef, name: &str) -> FsResult<InodeRef> {
    if name.len() > DIRSIZ {
        return Err(FsError::PathTooLong);
    }
    let inum = {
        let guard = dir.lock();
        if guard.itype != InodeType::Dir {
            return Err(FsError::NotADirectory);
        }
        let (inum, _off) = dirent::lookup(&guard, name).ok_or(FsError::NotFound)?;
        inum
    };
    // Directory lock released before the child is fetched/locked.
    store.get(dir.dev, inum)
}

/// Resolve `path` to an inode reference.
pub fn resolve<S: InodeStore>(store: &S, cwd: &InodeRef, path: &str) -> FsResult<InodeRef> {
    if path.is_empty() {
        return Err(FsError::NotFound);
    }
    let mut ip = start(store, cwd, path);
    for comp in components(path) {
        ip = descend(store, &ip, comp)?;
    }
    Ok(ip)
}

/// Resolve the parent directory of `path`; returns the parent inode and the
/// final path component. Fails on "/" or an empty path, which name no entry.
pub fn resolve_parent<'p, S: InodeStore>(
    store: &S,
    cwd: &InodeRef,
    path: &'p str,
) -> FsResult<(InodeRef, &'p str)> {
    let mut comps = components(path).peekable();
    let mut ip = start(store, cwd, path);
    let mut name = match comps.next() {
        Some(first) => first,
        None => return Err(FsError::NotFound),
    };
    for next in comps {
        ip = descend(store, &ip, name)?;
        name = next;
    }
    if name.len() > DIRSIZ {
        return Err(FsError::PathTooLong);
    }
    // The caller expects a directory to link into.
    if ip.lock().itype != InodeType::Dir {
        return Err(FsError::NotADirectory);
    }
    Ok((ip, name))
}
