//! Syscall-facing filesystem layer for FinchOS.
//!
//! Translates descriptors, paths and open modes into operations against the
//! inode store: per-process descriptor tables, open-file objects, the
//! create/link/unlink machinery, the permission gate on open, and the
//! full-path lookup cache filled in by directory creation.
//!
//! Everything here is portable over the [`store::InodeStore`] seam; the
//! in-memory [`store::MemStore`] backs the unit tests and early boot.
//!
//! Locking discipline: every inode carries its own lock, and whenever a
//! parent and child are both needed the parent is locked first. Path walks
//! release each directory before locking the next component.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod access;
pub mod create;
pub mod device;
pub mod dirent;
pub mod error;
pub mod fd_table;
pub mod file;
pub mod inode;
pub mod mode;
pub mod namei;
pub mod pathindex;
pub mod pipe;
pub mod proc;
pub mod store;
pub mod syscall;
pub mod txn;
pub mod usermem;

pub use error::{FsError, FsResult};
pub use inode::{Gid, Inode, InodeData, InodeRef, InodeType, Stat, Uid};
pub use syscall::Kernel;
