//! Syscall surface of the filesystem layer.
//!
//! A [`Kernel`] bundles the store, journal, device table, path index and
//! access policy; every entry point takes the calling process and a view of
//! its memory explicitly. Entry points return a non-negative result or
//! [`SYS_FAIL`], logging the reason at the boundary; the typed error never
//! crosses into the caller's register.

mod dir;
mod fd;
mod link;
mod open;
mod process;

use alloc::boxed::Box;

use crate::access::{AccessPolicy, GroupResolver, UidAsGid};
use crate::device::DeviceTable;
use crate::error::{FsError, FsResult};
use crate::inode::InodeRef;
use crate::namei;
use crate::pathindex::PathIndex;
use crate::store::InodeStore;
use crate::txn::Journal;

/// Syscall failure sentinel.
pub const SYS_FAIL: isize = -1;

/// Maximum number of `exec` argument pointers.
pub const MAXARG: usize = 32;

/// The filesystem layer's shared state.
pub struct Kernel<S: InodeStore> {
    store: S,
    journal: Journal,
    path_index: PathIndex,
    devices: DeviceTable,
    policy: AccessPolicy,
    groups: Box<dyn GroupResolver>,
}

impl<S: InodeStore> Kernel<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            journal: Journal::new(),
            path_index: PathIndex::new(),
            devices: DeviceTable::new(),
            policy: AccessPolicy::default(),
            groups: Box::new(UidAsGid),
        }
    }

    /// Swap in a real group database once one exists.
    pub fn set_group_resolver(&mut self, groups: Box<dyn GroupResolver>) {
        self.groups = groups;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    /// Resolve a path, serving absolute directory paths from the index when
    /// possible. Index entries are removed on unlink, so a hit is current.
    fn resolve_cached(&self, cwd: &InodeRef, path: &str) -> FsResult<InodeRef> {
        if path.starts_with('/') {
            if let Some(dir) = self.path_index.lookup(path) {
                return Ok(dir);
            }
        }
        namei::resolve(&self.store, cwd, path)
    }

    /// Report a failed call and produce the sentinel.
    fn fail(&self, call: &str, err: FsError) -> isize {
        log::warn!("sys_{call}: {err}");
        SYS_FAIL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{EchoDev, NDEV};
    use crate::file::FileKind;
    use crate::inode::InodeType;
    use crate::mode::OpenMode;
    use crate::proc::Proc;
    use crate::store::MemStore;
    use crate::usermem::VecMem;
    use alloc::sync::Arc;

    const WORD: usize = core::mem::size_of::<usize>();

    fn setup() -> (Kernel<MemStore>, Proc, VecMem) {
        let kernel = Kernel::new(MemStore::new(1).unwrap());
        let proc = Proc::new(0, kernel.store().root());
        (kernel, proc, VecMem::with_size(4096))
    }

    fn open(
        k: &Kernel<MemStore>,
        p: &Proc,
        mem: &mut VecMem,
        path: &str,
        bits: u32,
    ) -> isize {
        let addr = mem.place_cstr(0, path);
        k.sys_open(p, mem, addr, bits)
    }

    fn mkdir(k: &Kernel<MemStore>, p: &Proc, mem: &mut VecMem, path: &str) -> isize {
        let addr = mem.place_cstr(0, path);
        k.sys_mkdir(p, mem, addr)
    }

    fn unlink(k: &Kernel<MemStore>, p: &Proc, mem: &mut VecMem, path: &str) -> isize {
        let addr = mem.place_cstr(0, path);
        k.sys_unlink(p, mem, addr)
    }

    #[test]
    fn test_open_create_write_read_back() {
        let (k, p, mut mem) = setup();

        let fd = open(&k, &p, &mut mem, "/notes", OpenMode::CREATE | OpenMode::RDWR);
        assert!(fd >= 0);

        let data = mem.place(256, b"first line");
        assert_eq!(k.sys_write(&p, &mut mem, fd as usize, data, 10), 10);
        assert_eq!(k.sys_close(&p, fd as usize), 0);

        let fd = open(&k, &p, &mut mem, "/notes", OpenMode::RDONLY);
        assert!(fd >= 0);
        let out = 512;
        assert_eq!(k.sys_read(&p, &mut mem, fd as usize, out, 64), 10);
        assert_eq!(&mem.0[out..out + 10], b"first line");
    }

    #[test]
    fn test_open_create_existing_preserves_content_and_links() {
        let (k, p, mut mem) = setup();

        let fd = open(&k, &p, &mut mem, "/cfg", OpenMode::CREATE | OpenMode::WRONLY);
        let data = mem.place(256, b"keep");
        k.sys_write(&p, &mut mem, fd as usize, data, 4);
        k.sys_close(&p, fd as usize);

        // Re-open with CREATE but no TRUNC: content and nlink survive
        let fd = open(&k, &p, &mut mem, "/cfg", OpenMode::CREATE | OpenMode::RDONLY);
        assert!(fd >= 0);
        let stat = 1024;
        assert_eq!(k.sys_fstat(&p, &mut mem, fd as usize, stat), 0);
        let nlink = i16::from_le_bytes([mem.0[stat + 2], mem.0[stat + 3]]);
        let size = u64::from_le_bytes(mem.0[stat + 12..stat + 20].try_into().unwrap());
        assert_eq!(nlink, 1);
        assert_eq!(size, 4);
    }

    #[test]
    fn test_open_trunc_discards_content() {
        let (k, p, mut mem) = setup();

        let fd = open(&k, &p, &mut mem, "/log", OpenMode::CREATE | OpenMode::WRONLY);
        let data = mem.place(256, b"old contents");
        k.sys_write(&p, &mut mem, fd as usize, data, 12);
        k.sys_close(&p, fd as usize);

        let fd = open(&k, &p, &mut mem, "/log", OpenMode::WRONLY | OpenMode::TRUNC);
        assert!(fd >= 0);
        let stat = 1024;
        assert_eq!(k.sys_fstat(&p, &mut mem, fd as usize, stat), 0);
        let size = u64::from_le_bytes(mem.0[stat + 12..stat + 20].try_into().unwrap());
        assert_eq!(size, 0);
    }

    #[test]
    fn test_open_directory_read_only() {
        let (k, p, mut mem) = setup();
        assert_eq!(mkdir(&k, &p, &mut mem, "/d"), 0);

        assert!(open(&k, &p, &mut mem, "/d", OpenMode::RDONLY) >= 0);
        assert_eq!(open(&k, &p, &mut mem, "/d", OpenMode::WRONLY), SYS_FAIL);
        assert_eq!(open(&k, &p, &mut mem, "/d", OpenMode::RDWR), SYS_FAIL);
    }

    #[test]
    fn test_mkdir_link_arithmetic() {
        let (k, p, mut mem) = setup();

        mkdir(&k, &p, &mut mem, "/a");
        mkdir(&k, &p, &mut mem, "/a/b");

        let root = k.store().root();
        // Root gained a's ".."
        assert_eq!(root.lock().nlink, 2);
        let a = namei::resolve(k.store(), &root, "/a").unwrap();
        assert_eq!(a.lock().nlink, 2);
        let b = namei::resolve(k.store(), &root, "/a/b").unwrap();
        assert_eq!(b.lock().nlink, 1);
    }

    #[test]
    fn test_link_then_unlink_restores_nlink() {
        let (k, p, mut mem) = setup();

        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDONLY);
        k.sys_close(&p, fd as usize);

        let old = mem.place_cstr(0, "/f");
        let new = mem.place_cstr(64, "/g");
        assert_eq!(k.sys_link(&p, &mem, old, new), 0);

        let root = k.store().root();
        let ip = namei::resolve(k.store(), &root, "/f").unwrap();
        assert_eq!(ip.lock().nlink, 2);
        // Both names reach the same inode
        let via_g = namei::resolve(k.store(), &root, "/g").unwrap();
        assert!(Arc::ptr_eq(&ip, &via_g));

        assert_eq!(unlink(&k, &p, &mut mem, "/g"), 0);
        assert_eq!(ip.lock().nlink, 1);
        assert!(namei::resolve(k.store(), &root, "/f").is_ok());
    }

    #[test]
    fn test_link_directory_refused() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/d");

        let old = mem.place_cstr(0, "/d");
        let new = mem.place_cstr(64, "/d2");
        assert_eq!(k.sys_link(&p, &mem, old, new), SYS_FAIL);

        let root = k.store().root();
        let d = namei::resolve(k.store(), &root, "/d").unwrap();
        assert_eq!(d.lock().nlink, 1);
    }

    #[test]
    fn test_link_to_missing_target_undoes_nlink_bump() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDONLY);
        k.sys_close(&p, fd as usize);

        let old = mem.place_cstr(0, "/f");
        let new = mem.place_cstr(64, "/nodir/g");
        assert_eq!(k.sys_link(&p, &mem, old, new), SYS_FAIL);

        let root = k.store().root();
        let ip = namei::resolve(k.store(), &root, "/f").unwrap();
        assert_eq!(ip.lock().nlink, 1);
    }

    #[test]
    fn test_unlink_last_name_frees_inode() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDONLY);
        k.sys_close(&p, fd as usize);

        let root = k.store().root();
        let inum = namei::resolve(k.store(), &root, "/f").unwrap().inum;

        assert_eq!(unlink(&k, &p, &mut mem, "/f"), 0);
        assert!(matches!(k.store().get(1, inum), Err(FsError::NotFound)));
    }

    #[test]
    fn test_unlink_refuses_nonempty_dir_and_dot_names() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/d");
        mkdir(&k, &p, &mut mem, "/d/sub");

        assert_eq!(unlink(&k, &p, &mut mem, "/d"), SYS_FAIL);
        assert_eq!(unlink(&k, &p, &mut mem, "/d/."), SYS_FAIL);
        assert_eq!(unlink(&k, &p, &mut mem, "/d/.."), SYS_FAIL);

        // Empty subdirectory removal updates the parent's nlink
        assert_eq!(unlink(&k, &p, &mut mem, "/d/sub"), 0);
        let root = k.store().root();
        let d = namei::resolve(k.store(), &root, "/d").unwrap();
        assert_eq!(d.lock().nlink, 1);
        assert_eq!(unlink(&k, &p, &mut mem, "/d"), 0);
    }

    #[test]
    #[should_panic(expected = "unlink")]
    fn test_unlink_zero_nlink_is_fatal() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/d");

        // Corrupt the link count behind the layer's back
        let root = k.store().root();
        let d = namei::resolve(k.store(), &root, "/d").unwrap();
        d.lock().nlink = 0;

        unlink(&k, &p, &mut mem, "/d");
    }

    #[test]
    fn test_dup_shares_offset() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDWR);
        let data = mem.place(256, b"abcdef");
        k.sys_write(&p, &mut mem, fd as usize, data, 6);

        let fd2 = k.sys_dup(&p, fd as usize);
        assert!(fd2 >= 0);
        // The duplicate continues at the shared offset: nothing left to read
        assert_eq!(k.sys_read(&p, &mut mem, fd2 as usize, 1024, 8), 0);
    }

    #[test]
    fn test_descriptor_exhaustion_and_recovery() {
        let (k, p, mut mem) = setup();
        let fd0 = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDONLY);
        assert_eq!(fd0, 0);
        let mut last = fd0;
        loop {
            let fd = k.sys_dup(&p, fd0 as usize);
            if fd == SYS_FAIL {
                break;
            }
            last = fd;
        }
        assert_eq!(last as usize, crate::fd_table::NOFILE - 1);

        // Closing one slot makes alloc succeed again
        assert_eq!(k.sys_close(&p, last as usize), 0);
        assert_eq!(k.sys_dup(&p, fd0 as usize), last);
    }

    #[test]
    fn test_pipe_syscall_round_trip() {
        let (k, p, mut mem) = setup();
        let fds = 2048;
        assert_eq!(k.sys_pipe(&p, &mut mem, fds), 0);
        let rfd = i32::from_le_bytes(mem.0[fds..fds + 4].try_into().unwrap()) as usize;
        let wfd = i32::from_le_bytes(mem.0[fds + 4..fds + 8].try_into().unwrap()) as usize;

        let data = mem.place(256, b"through the pipe");
        assert_eq!(k.sys_write(&p, &mut mem, wfd, data, 16), 16);
        k.sys_close(&p, wfd);

        let out = 512;
        assert_eq!(k.sys_read(&p, &mut mem, rfd, out, 64), 16);
        assert_eq!(&mem.0[out..out + 16], b"through the pipe");
        // Write end closed and drained: EOF
        assert_eq!(k.sys_read(&p, &mut mem, rfd, out, 64), 0);
    }

    #[test]
    fn test_pipe_read_end_not_writable() {
        let (k, p, mut mem) = setup();
        let fds = 2048;
        assert_eq!(k.sys_pipe(&p, &mut mem, fds), 0);
        let rfd = i32::from_le_bytes(mem.0[fds..fds + 4].try_into().unwrap()) as usize;
        let data = mem.place(256, b"x");
        assert_eq!(k.sys_write(&p, &mut mem, rfd, data, 1), SYS_FAIL);
    }

    #[test]
    fn test_chdir_changes_resolution_base() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/home");
        mkdir(&k, &p, &mut mem, "/home/u");

        let addr = mem.place_cstr(0, "/home");
        assert_eq!(k.sys_chdir(&p, &mem, addr), 0);
        // Relative resolution now starts at /home
        let addr = mem.place_cstr(0, "u");
        assert_eq!(k.sys_chdir(&p, &mem, addr), 0);
        let root = k.store().root();
        let u = namei::resolve(k.store(), &root, "/home/u").unwrap();
        assert!(Arc::ptr_eq(&p.cwd(), &u));

        // chdir to a file fails and leaves the cwd alone
        let fd = open(&k, &p, &mut mem, "f", OpenMode::CREATE | OpenMode::RDONLY);
        assert!(fd >= 0);
        let addr = mem.place_cstr(0, "f");
        assert_eq!(k.sys_chdir(&p, &mem, addr), SYS_FAIL);
        assert!(Arc::ptr_eq(&p.cwd(), &u));
    }

    #[test]
    fn test_mknod_then_open_dispatches_to_driver() {
        let (k, p, mut mem) = setup();
        k.devices().register(2, EchoDev::new()).unwrap();

        let path = mem.place_cstr(0, "/console");
        assert_eq!(k.sys_mknod(&p, &mem, path, 2, 0), 0);

        let fd = open(&k, &p, &mut mem, "/console", OpenMode::RDWR);
        assert!(fd >= 0);
        let data = mem.place(256, b"tty");
        assert_eq!(k.sys_write(&p, &mut mem, fd as usize, data, 3), 3);
        let out = 512;
        assert_eq!(k.sys_read(&p, &mut mem, fd as usize, out, 3), 3);
        assert_eq!(&mem.0[out..out + 3], b"tty");
    }

    #[test]
    fn test_open_device_without_driver_fails() {
        let (k, p, mut mem) = setup();
        let path = mem.place_cstr(0, "/null");
        assert_eq!(k.sys_mknod(&p, &mem, path, (NDEV + 1) as u16, 0), 0);
        assert_eq!(open(&k, &p, &mut mem, "/null", OpenMode::RDONLY), SYS_FAIL);
    }

    #[test]
    fn test_access_denied_for_stranger() {
        let (k, _p, mut mem) = setup();
        let owner = Proc::new(100, k.store().root());
        let stranger = Proc::new(200, k.store().root());

        let fd = open(&k, &owner, &mut mem, "/private", OpenMode::CREATE | OpenMode::RDWR);
        assert!(fd >= 0);
        k.sys_close(&owner, fd as usize);

        // Default file bits are 0644: stranger may read, not write
        assert!(open(&k, &stranger, &mut mem, "/private", OpenMode::RDONLY) >= 0);
        assert_eq!(
            open(&k, &stranger, &mut mem, "/private", OpenMode::WRONLY),
            SYS_FAIL
        );
        assert_eq!(
            open(&k, &stranger, &mut mem, "/private", OpenMode::RDWR),
            SYS_FAIL
        );
    }

    #[test]
    fn test_trusted_path_bypasses_access_bits() {
        let (k, _p, mut mem) = setup();
        let owner = Proc::new(0, k.store().root());
        let fd = open(&k, &owner, &mut mem, "/passwd", OpenMode::CREATE | OpenMode::RDWR);
        assert!(fd >= 0);
        k.sys_close(&owner, fd as usize);

        // Any caller gets through on the allow-listed path
        let stranger = Proc::new(999, k.store().root());
        assert!(open(&k, &stranger, &mut mem, "/passwd", OpenMode::RDWR) >= 0);
    }

    #[test]
    fn test_exec_marshals_args_and_returns_argc() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/bin", OpenMode::CREATE | OpenMode::RDONLY);
        k.sys_close(&p, fd as usize);

        let path = mem.place_cstr(0, "/bin");
        let a0 = mem.place_cstr(100, "bin");
        let a1 = mem.place_cstr(120, "-v");
        let argv = 200;
        mem.place(argv, &a0.to_le_bytes());
        mem.place(argv + WORD, &a1.to_le_bytes());
        mem.place(argv + 2 * WORD, &0usize.to_le_bytes());

        assert_eq!(k.sys_exec(&p, &mem, path, argv), 2);
    }

    #[test]
    fn test_exec_rejects_overflow_and_non_files() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/d");
        let fd = open(&k, &p, &mut mem, "/bin", OpenMode::CREATE | OpenMode::RDONLY);
        k.sys_close(&p, fd as usize);

        // Directory target
        let path = mem.place_cstr(0, "/d");
        let argv = 2048;
        mem.place(argv, &0usize.to_le_bytes());
        assert_eq!(k.sys_exec(&p, &mem, path, argv), SYS_FAIL);

        // Too many argument pointers with no terminator
        let path = mem.place_cstr(0, "/bin");
        let a = mem.place_cstr(100, "x");
        for i in 0..=MAXARG {
            mem.place(argv + i * WORD, &a.to_le_bytes());
        }
        assert_eq!(k.sys_exec(&p, &mem, path, argv), SYS_FAIL);
    }

    #[test]
    fn test_fstat_encodes_metadata() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDWR);
        let data = mem.place(256, b"12345");
        k.sys_write(&p, &mut mem, fd as usize, data, 5);

        let stat = 1024;
        assert_eq!(k.sys_fstat(&p, &mut mem, fd as usize, stat), 0);
        let itype = u16::from_le_bytes([mem.0[stat], mem.0[stat + 1]]);
        let size = u64::from_le_bytes(mem.0[stat + 12..stat + 20].try_into().unwrap());
        assert_eq!(itype, InodeType::File.code());
        assert_eq!(size, 5);

        // Pipes have no metadata
        let fds = 2048;
        assert_eq!(k.sys_pipe(&p, &mut mem, fds), 0);
        let rfd = i32::from_le_bytes(mem.0[fds..fds + 4].try_into().unwrap()) as usize;
        assert_eq!(k.sys_fstat(&p, &mut mem, rfd, stat), SYS_FAIL);
    }

    #[test]
    fn test_bad_pointer_arguments_fault_cleanly() {
        let (k, p, mut mem) = setup();
        assert_eq!(k.sys_open(&p, &mem, 1 << 30, OpenMode::RDONLY), SYS_FAIL);
        assert_eq!(k.sys_mkdir(&p, &mem, 1 << 30), SYS_FAIL);

        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDWR);
        assert_eq!(k.sys_write(&p, &mut mem, fd as usize, 1 << 30, 4), SYS_FAIL);
        assert_eq!(k.sys_read(&p, &mut mem, fd as usize, 1 << 30, 4), SYS_FAIL);
    }

    #[test]
    fn test_unlink_evicts_index_entry_under_any_spelling() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/d");
        assert!(k.path_index.lookup("/d").is_some());

        // Removal by a relative name still evicts the absolute entry
        assert_eq!(unlink(&k, &p, &mut mem, "d"), 0);
        assert!(k.path_index.lookup("/d").is_none());
        let addr = mem.place_cstr(0, "/d");
        assert_eq!(k.sys_chdir(&p, &mem, addr), SYS_FAIL);

        // Same for a dot spelling of the removal path
        mkdir(&k, &p, &mut mem, "/home");
        mkdir(&k, &p, &mut mem, "/home/u");
        assert_eq!(unlink(&k, &p, &mut mem, "/home/./u"), 0);
        assert_eq!(open(&k, &p, &mut mem, "/home/u", OpenMode::RDONLY), SYS_FAIL);
    }

    #[test]
    fn test_huge_transfer_lengths_fail_cleanly() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDWR);
        assert!(fd >= 0);
        let fd = fd as usize;

        // Absurd lengths are bad arguments, not a reason to touch the
        // allocator: both calls flatten to the sentinel.
        assert_eq!(k.sys_write(&p, &mut mem, fd, 256, usize::MAX), SYS_FAIL);
        assert_eq!(k.sys_read(&p, &mut mem, fd, 256, usize::MAX), SYS_FAIL);
        assert_eq!(k.sys_write(&p, &mut mem, fd, 256, 1 << 40), SYS_FAIL);

        // The descriptor is still healthy afterwards
        let data = mem.place(256, b"ok");
        assert_eq!(k.sys_write(&p, &mut mem, fd, data, 2), 2);
    }

    #[test]
    fn test_mkdir_populates_path_index() {
        let (k, p, mut mem) = setup();
        mkdir(&k, &p, &mut mem, "/idx");
        assert!(k.path_index.lookup("/idx").is_some());

        unlink(&k, &p, &mut mem, "/idx");
        assert!(k.path_index.lookup("/idx").is_none());
    }

    #[test]
    fn test_closed_fd_rejected_everywhere() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDWR);
        assert_eq!(k.sys_close(&p, fd as usize), 0);

        assert_eq!(k.sys_close(&p, fd as usize), SYS_FAIL);
        assert_eq!(k.sys_dup(&p, fd as usize), SYS_FAIL);
        assert_eq!(k.sys_read(&p, &mut mem, fd as usize, 256, 4), SYS_FAIL);
        assert_eq!(k.sys_write(&p, &mut mem, fd as usize, 256, 4), SYS_FAIL);
        assert_eq!(k.sys_fstat(&p, &mut mem, fd as usize, 256), SYS_FAIL);
    }

    #[test]
    fn test_open_file_kind_matches_backing() {
        let (k, p, mut mem) = setup();
        let fd = open(&k, &p, &mut mem, "/f", OpenMode::CREATE | OpenMode::RDONLY);
        let table = p.fd_table();
        let file = table.get(fd as usize).unwrap();
        assert!(matches!(file.kind, FileKind::Inode { .. }));
    }
}
