//! User-memory access seam.
//!
//! Syscall arguments that are pointers are untrusted; every byte crossing
//! the boundary goes through [`UserMem`], which an MMU-backed implementation
//! can reject per address. Helpers marshal the common shapes (C strings,
//! pointer words, output buffers) on top of the two byte primitives.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{FsError, FsResult};
use crate::namei::MAX_PATH;

/// Byte-granular view of the calling process's address space.
pub trait UserMem {
    fn read_byte(&self, addr: usize) -> FsResult<u8>;
    fn write_byte(&mut self, addr: usize, byte: u8) -> FsResult<()>;
}

/// Fetch a NUL-terminated string of at most `max` bytes (terminator
/// excluded). Overrunning `max` is `PathTooLong`; a byte outside the
/// process's memory is `BadAddress`, as is a non-UTF-8 string.
pub fn read_cstr(mem: &dyn UserMem, addr: usize, max: usize) -> FsResult<String> {
    let mut bytes = Vec::new();
    for i in 0..max {
        let b = mem.read_byte(addr + i)?;
        if b == 0 {
            return String::from_utf8(bytes).map_err(|_| FsError::BadAddress);
        }
        bytes.push(b);
    }
    Err(FsError::PathTooLong)
}

/// Fetch a path argument, bounded by [`MAX_PATH`].
pub fn read_path(mem: &dyn UserMem, addr: usize) -> FsResult<String> {
    read_cstr(mem, addr, MAX_PATH)
}

/// Fetch a little-endian pointer-sized word.
pub fn read_usize(mem: &dyn UserMem, addr: usize) -> FsResult<usize> {
    let mut raw = [0u8; core::mem::size_of::<usize>()];
    for (i, slot) in raw.iter_mut().enumerate() {
        *slot = mem.read_byte(addr + i)?;
    }
    Ok(usize::from_le_bytes(raw))
}

/// Fault-check `len` bytes starting at `addr` without copying anything.
/// The length comes straight from the caller, so the end address is
/// computed with overflow checked and nothing is allocated here.
pub fn check_range(mem: &dyn UserMem, addr: usize, len: usize) -> FsResult<()> {
    if len == 0 {
        return Ok(());
    }
    let last = addr.checked_add(len - 1).ok_or(FsError::BadAddress)?;
    mem.read_byte(addr)?;
    mem.read_byte(last)?;
    Ok(())
}

/// Fetch `len` raw bytes. The range is fault-checked before the buffer is
/// sized, so an absurd length fails instead of aborting the allocator.
pub fn read_bytes(mem: &dyn UserMem, addr: usize, len: usize) -> FsResult<Vec<u8>> {
    check_range(mem, addr, len)?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(mem.read_byte(addr + i)?);
    }
    Ok(out)
}

/// Copy `bytes` out to the caller's buffer.
pub fn write_bytes(mem: &mut dyn UserMem, addr: usize, bytes: &[u8]) -> FsResult<()> {
    for (i, b) in bytes.iter().enumerate() {
        mem.write_byte(addr + i, *b)?;
    }
    Ok(())
}

/// Copy a little-endian `i32` out to the caller.
pub fn write_i32(mem: &mut dyn UserMem, addr: usize, value: i32) -> FsResult<()> {
    write_bytes(mem, addr, &value.to_le_bytes())
}

/// Flat test address space; reads past the end fault like an unmapped page.
#[cfg(test)]
pub(crate) struct VecMem(pub Vec<u8>);

#[cfg(test)]
impl VecMem {
    pub(crate) fn with_size(len: usize) -> Self {
        Self(alloc::vec![0u8; len])
    }

    /// Place `bytes` at `addr`, growing as needed; returns `addr`.
    pub(crate) fn place(&mut self, addr: usize, bytes: &[u8]) -> usize {
        if addr + bytes.len() > self.0.len() {
            self.0.resize(addr + bytes.len(), 0);
        }
        self.0[addr..addr + bytes.len()].copy_from_slice(bytes);
        addr
    }

    /// Place a NUL-terminated string at `addr`; returns `addr`.
    pub(crate) fn place_cstr(&mut self, addr: usize, s: &str) -> usize {
        self.place(addr, s.as_bytes());
        self.place(addr + s.len(), &[0]);
        addr
    }
}

#[cfg(test)]
impl UserMem for VecMem {
    fn read_byte(&self, addr: usize) -> FsResult<u8> {
        self.0.get(addr).copied().ok_or(FsError::BadAddress)
    }

    fn write_byte(&mut self, addr: usize, byte: u8) -> FsResult<()> {
        match self.0.get_mut(addr) {
            Some(slot) => {
                *slot = byte;
                Ok(())
            }
            None => Err(FsError::BadAddress),
        }
    }
}
