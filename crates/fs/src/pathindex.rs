//! Full-path directory index.
//!
//! A bounded cache from normalized absolute paths to directory inode
//! references, refreshed as directories are created and removed. Lookups by
//! full path skip the component walk. The cache is advisory: a miss falls
//! back to [`crate::namei::resolve`], and insertion past capacity evicts the
//! oldest entry rather than failing.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::sync::Arc;

use fos_utils::{HashMap, Mutex};

use crate::inode::InodeRef;

/// Maximum number of indexed directories.
pub const PATH_INDEX_CAPACITY: usize = 100;

/// Normalize a path for use as an index key: collapse repeated separators
/// and drop any trailing one, so every spelling of a path shares one entry.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    if path.starts_with('/') {
        out.push('/');
    }
    for comp in path.split('/').filter(|c| !c.is_empty()) {
        if !out.ends_with('/') && !out.is_empty() {
            out.push('/');
        }
        out.push_str(comp);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

struct Inner {
    map: HashMap<String, InodeRef>,
    // Insertion order for eviction; stale names are skipped on pop.
    order: VecDeque<String>,
}

/// Bounded path-to-directory cache.
pub struct PathIndex {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::with_capacity(PATH_INDEX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Record `path` as naming `dir`. Re-inserting an existing key replaces
    /// the reference in place; a new key past capacity evicts the oldest.
    pub fn insert(&self, path: &str, dir: InodeRef) {
        let key = normalize(path);
        let mut inner = self.inner.lock();
        if inner.map.insert(key.clone(), dir).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.map.len() > self.capacity {
            match inner.order.pop_front() {
                Some(old) => {
                    inner.map.remove(&old);
                }
                None => break,
            }
        }
    }

    /// Directory indexed under `path`, if present.
    pub fn lookup(&self, path: &str) -> Option<InodeRef> {
        let key = normalize(path);
        self.inner.lock().map.get(&key).cloned()
    }

    /// Drop every entry referring to `dir`. Removal goes by inode identity,
    /// not by name: the directory may have been indexed under a different
    /// spelling than the path it was removed by.
    pub fn remove(&self, dir: &InodeRef) {
        let mut inner = self.inner.lock();
        let Inner { map, order } = &mut *inner;
        map.retain(|_, v| !Arc::ptr_eq(v, dir));
        order.retain(|k| map.contains_key(k));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathIndex {
    fn default() -> Self {
        Self::new()
    }
}
