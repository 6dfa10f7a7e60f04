//! Device Configuration - Device Switch Table
//!
//! Maps major device numbers to character device drivers. The file layer
//! looks up the driver here and hands it the (locked) inode being accessed.

use spin::Mutex;

use crate::error::{ConsoleError, Result};

// ============================================================================
// Major Numbers
// ============================================================================

/// Maximum number of major devices
pub const NDEV: usize = 10;

/// Major device number of the console
pub const CONSOLE: usize = 1;

// ============================================================================
// Driver Contracts
// ============================================================================

/// Inode lock bracketing, provided by the file layer.
///
/// Drivers that may sleep release the inode lock first and retake it before
/// returning, so other users of the inode are not blocked behind a read.
pub trait InodeLock {
    /// Reacquire the inode lock
    fn ilock(&self);

    /// Release the inode lock
    fn iunlock(&self);
}

/// Inode stand-in for kernel-internal callers that hold no inode lock
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInode;

impl InodeLock for NoInode {
    fn ilock(&self) {}

    fn iunlock(&self) {}
}

/// Character device driver entry points
pub trait CharDevice: Sync {
    /// Read into `dst`; returns the number of bytes copied
    fn read(&self, ip: &dyn InodeLock, dst: &mut [u8]) -> Result<usize>;

    /// Write from `src`; returns the number of bytes consumed
    fn write(&self, ip: &dyn InodeLock, src: &[u8]) -> Result<usize>;
}

// ============================================================================
// Device Switch
// ============================================================================

/// Device switch entry
#[derive(Clone, Copy)]
pub struct DevSw<'a> {
    /// Device name
    pub name: &'static str,
    /// Driver
    pub dev: &'a dyn CharDevice,
}

impl<'a> DevSw<'a> {
    pub fn new(name: &'static str, dev: &'a dyn CharDevice) -> Self {
        Self { name, dev }
    }
}

impl core::fmt::Debug for DevSw<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DevSw").field("name", &self.name).finish()
    }
}

/// Device switch table, indexed by major number
pub struct DeviceSwitch<'a> {
    table: Mutex<[Option<DevSw<'a>>; NDEV]>,
}

impl<'a> DeviceSwitch<'a> {
    pub const fn new() -> Self {
        Self {
            table: Mutex::new([None; NDEV]),
        }
    }

    /// Install `entry` as the driver for `major`, replacing any previous one
    pub fn register(&self, major: usize, entry: DevSw<'a>) -> Result<()> {
        let mut table = self.table.lock();
        let slot = table.get_mut(major).ok_or(ConsoleError::BadMajor(major))?;
        *slot = Some(entry);
        Ok(())
    }

    /// Look up the driver for `major`
    pub fn lookup(&self, major: usize) -> Result<DevSw<'a>> {
        let table = self.table.lock();
        table
            .get(major)
            .copied()
            .ok_or(ConsoleError::BadMajor(major))?
            .ok_or(ConsoleError::NoDevice(major))
    }

    /// Dispatch a read. The table lock is not held while the driver runs.
    pub fn read(&self, major: usize, ip: &dyn InodeLock, dst: &mut [u8]) -> Result<usize> {
        let entry = self.lookup(major)?;
        entry.dev.read(ip, dst)
    }

    /// Dispatch a write
    pub fn write(&self, major: usize, ip: &dyn InodeLock, src: &[u8]) -> Result<usize> {
        let entry = self.lookup(major)?;
        entry.dev.write(ip, src)
    }
}

impl Default for DeviceSwitch<'_> {
    fn default() -> Self {
        Self::new()
    }
}
