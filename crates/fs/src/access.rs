//! Permission gate evaluated on open.
//!
//! The caller's identity selects one permission triad (owner, group or
//! other) and the requested access mode must be fully covered by it; a
//! read-write request is denied when either half is missing.
//!
//! A small allow-list of trusted path prefixes bypasses the bits entirely:
//! these are the identity/group databases the checks themselves depend on.
//! Group membership derivation sits behind [`GroupResolver`]; the default
//! maps every uid to a same-numbered gid, which is a placeholder rather
//! than a policy commitment.

use crate::inode::{Gid, InodeData, Uid};
use crate::mode::{OpenMode, Perm};

/// Trusted absolute path prefixes, always permitted.
pub const DEFAULT_TRUSTED_PREFIXES: &[&str] = &["/passwd", "/group"];

/// Named allow-list of trusted paths.
pub struct AccessPolicy {
    trusted_prefixes: &'static [&'static str],
}

impl AccessPolicy {
    pub const fn new(trusted_prefixes: &'static [&'static str]) -> Self {
        Self { trusted_prefixes }
    }

    pub fn is_trusted(&self, path: &str) -> bool {
        self.trusted_prefixes.iter().any(|p| path.starts_with(p))
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TRUSTED_PREFIXES)
    }
}

/// Identity-to-group derivation.
pub trait GroupResolver: Send + Sync {
    fn group_of(&self, uid: Uid) -> Gid;
}

/// Placeholder derivation: gid == uid.
pub struct UidAsGid;

impl GroupResolver for UidAsGid {
    fn group_of(&self, uid: Uid) -> Gid {
        uid
    }
}

/// Does `uid` get the requested access to the locked inode at `path`?
pub fn check(
    policy: &AccessPolicy,
    groups: &dyn GroupResolver,
    data: &InodeData,
    mode: OpenMode,
    path: &str,
    uid: Uid,
) -> bool {
    if policy.is_trusted(path) {
        return true;
    }

    let triad = if data.owner == uid {
        (Perm::OWNER_READ, Perm::OWNER_WRITE)
    } else if groups.group_of(uid) == groups.group_of(data.owner) {
        (Perm::GROUP_READ, Perm::GROUP_WRITE)
    } else {
        (Perm::OTHER_READ, Perm::OTHER_WRITE)
    };
    let (read_bit, write_bit) = triad;

    let mut required = Perm::empty();
    if mode.is_readable() {
        required |= read_bit;
    }
    if mode.is_writable() {
        required |= write_bit;
    }
    // Both halves of a read-write request must be granted.
    data.perm.contains(required)
}
