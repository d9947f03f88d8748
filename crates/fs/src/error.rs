//! Error type for the filesystem layer.
//!
//! Every recoverable failure is one of these variants; they travel through
//! the layer with `?` and are flattened to the single `-1` syscall sentinel
//! at the boundary, where the detail is logged. Invariant violations
//! (corrupted directory records, a link count going negative) are never
//! represented here; those panic.

use core::fmt;

/// Recoverable filesystem error codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FsError {
    /// Descriptor out of range or slot empty
    BadDescriptor,
    /// Per-process descriptor table is full
    NoFreeDescriptors,
    /// User address not mapped or not decodable
    BadAddress,
    /// Path or component exceeds the fixed bound
    PathTooLong,
    /// No such file or directory
    NotFound,
    /// Entry with that name already exists
    AlreadyExists,
    /// Path component is not a directory
    NotADirectory,
    /// Directory still has entries beyond "." and ".."
    DirectoryNotEmpty,
    /// Hard link would cross device boundaries
    CrossDeviceLink,
    /// Access gate or type rule refused the operation
    PermissionDenied,
    /// Open-file object was not opened for reading
    NotReadable,
    /// Open-file object was not opened for writing
    NotWritable,
    /// Argument vector exceeds the fixed maximum
    ArgumentOverflow,
    /// Inode store has no free inodes
    NoFreeInodes,
    /// Underlying store failure
    IoError,
}

impl FsError {
    /// Short symbolic name, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            FsError::BadDescriptor => "EBADF",
            FsError::NoFreeDescriptors => "EMFILE",
            FsError::BadAddress => "EFAULT",
            FsError::PathTooLong => "ENAMETOOLONG",
            FsError::NotFound => "ENOENT",
            FsError::AlreadyExists => "EEXIST",
            FsError::NotADirectory => "ENOTDIR",
            FsError::DirectoryNotEmpty => "ENOTEMPTY",
            FsError::CrossDeviceLink => "EXDEV",
            FsError::PermissionDenied => "EACCES",
            FsError::NotReadable => "ENOTREAD",
            FsError::NotWritable => "ENOTWRITE",
            FsError::ArgumentOverflow => "E2BIG",
            FsError::NoFreeInodes => "ENOSPC",
            FsError::IoError => "EIO",
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FsError::BadDescriptor => "Bad file descriptor",
            FsError::NoFreeDescriptors => "Too many open files",
            FsError::BadAddress => "Bad address",
            FsError::PathTooLong => "File name too long",
            FsError::NotFound => "No such file or directory",
            FsError::AlreadyExists => "File exists",
            FsError::NotADirectory => "Not a directory",
            FsError::DirectoryNotEmpty => "Directory not empty",
            FsError::CrossDeviceLink => "Invalid cross-device link",
            FsError::PermissionDenied => "Permission denied",
            FsError::NotReadable => "File not open for reading",
            FsError::NotWritable => "File not open for writing",
            FsError::ArgumentOverflow => "Argument list too long",
            FsError::NoFreeInodes => "No free inodes",
            FsError::IoError => "I/O error",
        };
        write!(f, "{} ({})", msg, self.name())
    }
}

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
