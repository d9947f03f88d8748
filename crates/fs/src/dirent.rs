//! Directory entry records.
//!
//! Directory contents are a flat array of fixed-width records: a NUL-padded
//! name field followed by a little-endian inode number. Inode number 0 marks
//! a free slot. Slots 0 and 1 hold "." and ".." in every directory.
//!
//! These routines assume the caller holds the directory inode's lock. A
//! directory whose size is not a whole number of records is corrupt; that is
//! an invariant violation and panics rather than returning an error.

use crate::error::{FsError, FsResult};
use crate::inode::{InodeData, InodeType};

/// Maximum directory entry name length, in bytes.
pub const DIRSIZ: usize = 12;

/// Bytes per directory entry record: name field plus inode number.
pub const ENTRY_SIZE: usize = DIRSIZ + 4;

fn entry_inum(slot: &[u8]) -> u32 {
    u32::from_le_bytes([slot[DIRSIZ], slot[DIRSIZ + 1], slot[DIRSIZ + 2], slot[DIRSIZ + 3]])
}

fn entry_name(slot: &[u8]) -> &[u8] {
    let name = &slot[..DIRSIZ];
    let len = name.iter().position(|&b| b == 0).unwrap_or(DIRSIZ);
    &name[..len]
}

fn check_aligned(dir: &InodeData) {
    assert!(
        dir.itype == InodeType::Dir,
        "dirent: operation on non-directory inode"
    );
    assert!(
        dir.data.len() % ENTRY_SIZE == 0,
        "dirent: directory size not a whole number of records"
    );
}

/// Look `name` up in a locked directory. Returns the entry's inode number
/// and its byte offset within the directory data.
pub fn lookup(dir: &InodeData, name: &str) -> Option<(u32, usize)> {
    check_aligned(dir);
    for (i, slot) in dir.data.chunks_exact(ENTRY_SIZE).enumerate() {
        let inum = entry_inum(slot);
        if inum == 0 {
            continue;
        }
        if entry_name(slot) == name.as_bytes() {
            return Some((inum, i * ENTRY_SIZE));
        }
    }
    None
}

/// Write a new entry `(name, inum)` into a locked directory, reusing the
/// first free slot or appending one. Fails with `AlreadyExists` on a name
/// collision.
pub fn link(dir: &mut InodeData, name: &str, inum: u32) -> FsResult<()> {
    if name.is_empty() || name.len() > DIRSIZ {
        return Err(FsError::PathTooLong);
    }
    if lookup(dir, name).is_some() {
        return Err(FsError::AlreadyExists);
    }

    let mut record = [0u8; ENTRY_SIZE];
    record[..name.len()].copy_from_slice(name.as_bytes());
    record[DIRSIZ..].copy_from_slice(&inum.to_le_bytes());

    let off = dir
        .data
        .chunks_exact(ENTRY_SIZE)
        .position(|slot| entry_inum(slot) == 0)
        .map_or(dir.data.len(), |i| i * ENTRY_SIZE);
    dir.write_at(off, &record);
    Ok(())
}

/// Zero the entry at `off` in place, freeing the slot.
pub fn unlink_at(dir: &mut InodeData, off: usize) {
    check_aligned(dir);
    assert!(
        off % ENTRY_SIZE == 0 && off + ENTRY_SIZE <= dir.data.len(),
        "dirent: unlink at bad offset"
    );
    dir.data[off..off + ENTRY_SIZE].fill(0);
}

/// Is the directory empty except for "." and ".."?
pub fn is_empty(dir: &InodeData) -> bool {
    check_aligned(dir);
    dir.data[(2 * ENTRY_SIZE).min(dir.data.len())..]
        .chunks_exact(ENTRY_SIZE)
        .all(|slot| entry_inum(slot) == 0)
}

/// Count occupied entries past "." and "..".
pub fn live_entries(dir: &InodeData) -> usize {
    check_aligned(dir);
    dir.data[(2 * ENTRY_SIZE).min(dir.data.len())..]
        .chunks_exact(ENTRY_SIZE)
        .filter(|slot| entry_inum(slot) != 0)
        .count()
}
