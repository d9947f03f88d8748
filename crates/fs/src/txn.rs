//! Transaction envelope around persistent mutations.
//!
//! Mutating syscalls hold a [`Txn`] guard for their whole body so the
//! external log sees one matched begin/end pair per logical operation, on
//! every exit path. Nesting is allowed: inner brackets (from the store's own
//! operations) just deepen the counter, and the commit point is the return
//! to depth zero.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Commit bracket shared by all operations against one store.
pub struct Journal {
    depth: AtomicUsize,
}

impl Journal {
    pub const fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
        }
    }

    /// Open a bracket. The returned guard closes it when dropped.
    pub fn begin(&self) -> Txn<'_> {
        let d = self.depth.fetch_add(1, Ordering::AcqRel);
        log::trace!("journal: begin (depth {})", d + 1);
        Txn { journal: self }
    }

    /// Number of brackets currently open.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

/// Open transaction bracket; ends (and commits at depth zero) on drop.
pub struct Txn<'a> {
    journal: &'a Journal,
}

impl Drop for Txn<'_> {
    fn drop(&mut self) {
        let prev = self.journal.depth.fetch_sub(1, Ordering::AcqRel);
        if prev == 1 {
            log::trace!("journal: commit");
        }
    }
}
