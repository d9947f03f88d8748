//! Device driver dispatch by major number.

use alloc::sync::Arc;

use fos_utils::RwLock;

use crate::error::{FsError, FsResult};

/// Number of device major slots.
pub const NDEV: usize = 10;

/// Read/write entry points a device registers for its major number.
pub trait DeviceDriver: Send + Sync {
    fn read(&self, buf: &mut [u8]) -> FsResult<usize>;
    fn write(&self, buf: &[u8]) -> FsResult<usize>;
}

/// Major-number indexed driver table.
pub struct DeviceTable {
    drivers: RwLock<[Option<Arc<dyn DeviceDriver>>; NDEV]>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self {
            drivers: RwLock::new(core::array::from_fn(|_| None)),
        }
    }

    /// Bind a driver to a major number. Rebinding an occupied slot fails.
    pub fn register(&self, major: u16, driver: Arc<dyn DeviceDriver>) -> FsResult<()> {
        let mut table = self.drivers.write();
        let slot = table
            .get_mut(major as usize)
            .ok_or(FsError::IoError)?;
        if slot.is_some() {
            return Err(FsError::AlreadyExists);
        }
        *slot = Some(driver);
        Ok(())
    }

    /// Driver for `major`, if the number is in range and bound.
    pub fn get(&self, major: u16) -> Option<Arc<dyn DeviceDriver>> {
        self.drivers.read().get(major as usize)?.clone()
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Test driver that records writes and replays them on read.
#[cfg(test)]
pub(crate) struct EchoDev {
    stored: fos_utils::Mutex<alloc::vec::Vec<u8>>,
}

#[cfg(test)]
impl EchoDev {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            stored: fos_utils::Mutex::new(alloc::vec::Vec::new()),
        })
    }
}

#[cfg(test)]
impl DeviceDriver for EchoDev {
    fn read(&self, buf: &mut [u8]) -> FsResult<usize> {
        let stored = self.stored.lock();
        let n = buf.len().min(stored.len());
        buf[..n].copy_from_slice(&stored[..n]);
        Ok(n)
    }

    fn write(&self, buf: &[u8]) -> FsResult<usize> {
        self.stored.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
}
