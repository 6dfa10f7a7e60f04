//! Console serialization lock
//!
//! One spin lock serializes the screen, the serial mirror and the input
//! ring. A `locking` flag sits beside it: once the kernel panics the flag is
//! cleared and formatted output stops taking the lock, so a CPU reporting a
//! fatal error cannot deadlock on a lock some other CPU (or itself) holds.
//! Input handling, `read` and `write` always lock.

use core::sync::atomic::{AtomicBool, Ordering};
use spin::{Mutex, MutexGuard};

/// Spin lock plus the process-wide `locking` switch
pub struct ConsoleLock<T> {
    inner: Mutex<T>,
    locking: AtomicBool,
}

impl<T: core::fmt::Debug> core::fmt::Debug for ConsoleLock<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConsoleLock")
            .field("locked", &self.inner.is_locked())
            .field("locking", &self.is_locking())
            .finish()
    }
}

impl<T> ConsoleLock<T> {
    /// Create a new unlocked console lock; locking starts disabled until init
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            locking: AtomicBool::new(false),
        }
    }

    /// Acquire the lock unconditionally, spinning until available
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Acquire the lock only while locking is enabled.
    ///
    /// Used by formatted output; `None` means the caller proceeds unlocked.
    pub fn lock_if_enabled(&self) -> Option<MutexGuard<'_, T>> {
        if self.is_locking() {
            Some(self.inner.lock())
        } else {
            None
        }
    }

    /// Underlying mutex, for handing to `Scheduler::suspend`
    pub fn mutex(&self) -> &Mutex<T> {
        &self.inner
    }

    /// Turn output serialization on (done once at init)
    pub fn enable(&self) {
        self.locking.store(true, Ordering::Release);
    }

    /// Turn output serialization off for good (panic path)
    pub fn disable(&self) {
        self.locking.store(false, Ordering::Release);
    }

    /// Is output serialization in force?
    pub fn is_locking(&self) -> bool {
        self.locking.load(Ordering::Acquire)
    }

    /// Check if the lock is held
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}
