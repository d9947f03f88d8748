//! Descriptor-level calls: dup, read, write, close, fstat and pipe.

use alloc::vec;

use super::Kernel;
use crate::error::FsResult;
use crate::file::{File, FileRef};
use crate::proc::Proc;
use crate::store::InodeStore;
use crate::usermem::{self, UserMem};

impl<S: InodeStore> Kernel<S> {
    /// Duplicate `fd` into the lowest free descriptor slot.
    pub fn sys_dup(&self, proc: &Proc, fd: usize) -> isize {
        match proc.fd_table().dup(fd) {
            Ok(new_fd) => new_fd as isize,
            Err(e) => self.fail("dup", e),
        }
    }

    /// Read up to `len` bytes from `fd` into the caller's buffer at `addr`.
    pub fn sys_read(
        &self,
        proc: &Proc,
        mem: &mut dyn UserMem,
        fd: usize,
        addr: usize,
        len: usize,
    ) -> isize {
        match self.read_impl(proc, mem, fd, addr, len) {
            Ok(n) => n as isize,
            Err(e) => self.fail("read", e),
        }
    }

    fn read_impl(
        &self,
        proc: &Proc,
        mem: &mut dyn UserMem,
        fd: usize,
        addr: usize,
        len: usize,
    ) -> FsResult<usize> {
        let file = self.file_for(proc, fd)?;
        // Fault on the buffer before the (possibly blocking) read.
        usermem::check_range(mem, addr, len)?;
        let mut buf = vec![0u8; len];
        let n = file.read(&mut buf)?;
        usermem::write_bytes(mem, addr, &buf[..n])?;
        Ok(n)
    }

    /// Write `len` bytes from the caller's buffer at `addr` to `fd`.
    pub fn sys_write(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        fd: usize,
        addr: usize,
        len: usize,
    ) -> isize {
        match self.write_impl(proc, mem, fd, addr, len) {
            Ok(n) => n as isize,
            Err(e) => self.fail("write", e),
        }
    }

    fn write_impl(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        fd: usize,
        addr: usize,
        len: usize,
    ) -> FsResult<usize> {
        let file = self.file_for(proc, fd)?;
        let buf = usermem::read_bytes(mem, addr, len)?;
        file.write(&buf)
    }

    /// Release `fd`; the open file goes away with its last reference.
    pub fn sys_close(&self, proc: &Proc, fd: usize) -> isize {
        match proc.fd_table().close(fd) {
            Ok(_file) => 0,
            Err(e) => self.fail("close", e),
        }
    }

    /// Write the metadata record for `fd` to the caller's buffer at `addr`.
    pub fn sys_fstat(&self, proc: &Proc, mem: &mut dyn UserMem, fd: usize, addr: usize) -> isize {
        let res = (|| {
            let file = self.file_for(proc, fd)?;
            let stat = file.stat()?;
            usermem::write_bytes(mem, addr, &stat.encode())
        })();
        match res {
            Ok(()) => 0,
            Err(e) => self.fail("fstat", e),
        }
    }

    /// Allocate a connected pipe and write the two descriptors, read end
    /// first, as little-endian `i32`s at `addr`.
    pub fn sys_pipe(&self, proc: &Proc, mem: &mut dyn UserMem, addr: usize) -> isize {
        let res = (|| {
            let (rf, wf) = File::pipe_pair();
            let mut table = proc.fd_table();
            let rfd = table.alloc(rf)?;
            let wfd = match table.alloc(wf) {
                Ok(fd) => fd,
                Err(e) => {
                    let _ = table.close(rfd);
                    return Err(e);
                }
            };
            drop(table);

            // Read end first.
            let copied = usermem::write_i32(mem, addr, rfd as i32)
                .and_then(|()| usermem::write_i32(mem, addr + 4, wfd as i32));
            if let Err(e) = copied {
                let mut table = proc.fd_table();
                let _ = table.close(rfd);
                let _ = table.close(wfd);
                return Err(e);
            }
            Ok(())
        })();
        match res {
            Ok(()) => 0,
            Err(e) => self.fail("pipe", e),
        }
    }

    /// Clone the reference out of the table so its lock is not held across
    /// a blocking file operation.
    fn file_for(&self, proc: &Proc, fd: usize) -> FsResult<FileRef> {
        Ok(proc.fd_table().get(fd)?.clone())
    }
}
