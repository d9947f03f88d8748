//! Permission bits and open-mode flags.

use bitflags::bitflags;

bitflags! {
    /// 9-bit owner/group/other permission field.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Perm: u16 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;
    }
}

impl Perm {
    /// Default permissions for a newly created plain file (0644).
    pub const FILE_DEFAULT: Perm = Perm::OWNER_READ
        .union(Perm::OWNER_WRITE)
        .union(Perm::GROUP_READ)
        .union(Perm::OTHER_READ);

    /// Default permissions for a newly created directory or device (0755).
    pub const DIR_DEFAULT: Perm = Perm::FILE_DEFAULT
        .union(Perm::OWNER_EXEC)
        .union(Perm::GROUP_EXEC)
        .union(Perm::OTHER_EXEC);
}

/// Open-mode flag word passed to `open`.
///
/// The low two bits select the access mode; `CREATE` and `TRUNC` only apply
/// to plain files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OpenMode(u32);

impl OpenMode {
    pub const RDONLY: u32 = 0x000;
    pub const WRONLY: u32 = 0x001;
    pub const RDWR: u32 = 0x002;
    pub const CREATE: u32 = 0x200;
    pub const TRUNC: u32 = 0x400;

    const ACCMODE: u32 = 0x003;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Just the read/write selection, with creation flags masked off.
    pub fn access_mode(&self) -> u32 {
        self.0 & Self::ACCMODE
    }

    pub fn is_readable(&self) -> bool {
        self.0 & Self::WRONLY == 0
    }

    pub fn is_writable(&self) -> bool {
        self.0 & (Self::WRONLY | Self::RDWR) != 0
    }

    pub fn is_create(&self) -> bool {
        self.0 & Self::CREATE != 0
    }

    pub fn is_trunc(&self) -> bool {
        self.0 & Self::TRUNC != 0
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self(Self::RDONLY)
    }
}
