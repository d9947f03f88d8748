//! exec: argument marshaling and image validation.
//!
//! Loading and switching address spaces belongs to the process layer; here
//! the argument vector is fetched and bounds-checked and the target path is
//! validated as an executable file. The marshaled argc is returned so the
//! caller can stage the new user stack.

use alloc::string::String;
use alloc::vec::Vec;

use super::{Kernel, MAXARG};
use crate::error::{FsError, FsResult};
use crate::inode::InodeType;
use crate::namei::{self, MAX_PATH};
use crate::proc::Proc;
use crate::store::InodeStore;
use crate::usermem::{self, UserMem};

impl<S: InodeStore> Kernel<S> {
    /// Validate the exec target at `path_addr` and fetch its argument
    /// vector from `argv_addr`; returns the argument count.
    pub fn sys_exec(&self, proc: &Proc, mem: &dyn UserMem, path_addr: usize, argv_addr: usize) -> isize {
        match self.exec_impl(proc, mem, path_addr, argv_addr) {
            Ok(argc) => argc as isize,
            Err(e) => self.fail("exec", e),
        }
    }

    fn exec_impl(
        &self,
        proc: &Proc,
        mem: &dyn UserMem,
        path_addr: usize,
        argv_addr: usize,
    ) -> FsResult<usize> {
        let path = usermem::read_path(mem, path_addr)?;

        let mut args: Vec<String> = Vec::new();
        loop {
            if args.len() >= MAXARG {
                return Err(FsError::ArgumentOverflow);
            }
            let slot = argv_addr + args.len() * core::mem::size_of::<usize>();
            let ptr = usermem::read_usize(mem, slot)?;
            if ptr == 0 {
                break;
            }
            args.push(usermem::read_cstr(mem, ptr, MAX_PATH)?);
        }

        let ip = namei::resolve(&self.store, &proc.cwd(), &path)?;
        if ip.lock().itype != InodeType::File {
            return Err(FsError::PermissionDenied);
        }
        Ok(args.len())
    }
}
