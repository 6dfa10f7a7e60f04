//! Scheduling Primitives - Wait/Wakeup contract
//!
//! The console does not schedule anything itself. It consumes the kernel's
//! sleep/wakeup primitives through the [`Scheduler`] trait, keyed by a typed
//! [`WaitChannel`] rather than a raw address.

use core::sync::atomic::{AtomicU64, Ordering};
use spin::{Mutex, MutexGuard};

// ============================================================================
// Wait Results
// ============================================================================

/// Result of a wait operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum WaitResult {
    /// Thread was awakened normally
    Normal = 0,
    /// Thread was interrupted (killed while asleep)
    Interrupted = 2,
}

// ============================================================================
// Wait Channel
// ============================================================================

/// Rendezvous key for sleepers and wakers.
///
/// Each channel gets a unique id at creation; two channels never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaitChannel(u64);

impl WaitChannel {
    /// Create a new wait channel with a unique auto-incremented id
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        WaitChannel(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw channel id, for schedulers that key their sleep queues by integer
    pub const fn id(&self) -> u64 {
        self.0
    }
}

// ============================================================================
// Scheduler Contract
// ============================================================================

/// Kernel scheduling services used by the console
pub trait Scheduler: Sync {
    /// Put the calling thread to sleep on `chan`.
    ///
    /// `guard` must be a guard of `lock`. The implementation releases it
    /// atomically with going to sleep, so a `notify` issued under the same
    /// lock cannot be missed, and reacquires `lock` before returning.
    fn suspend<'a, T>(
        &self,
        chan: &WaitChannel,
        lock: &'a Mutex<T>,
        guard: MutexGuard<'a, T>,
    ) -> MutexGuard<'a, T>;

    /// Wake every thread sleeping on `chan`
    fn notify(&self, chan: &WaitChannel);

    /// Has the calling thread been marked for termination?
    fn killed(&self) -> bool;

    /// Print the process table. Called without the console lock held.
    fn dump(&self);
}

/// Sleep on `chan` unless the caller has been killed.
///
/// Returns the reacquired guard and whether the wait completed normally.
pub fn sleep_interruptible<'a, S: Scheduler, T>(
    sched: &S,
    chan: &WaitChannel,
    lock: &'a Mutex<T>,
    guard: MutexGuard<'a, T>,
) -> (MutexGuard<'a, T>, WaitResult) {
    if sched.killed() {
        return (guard, WaitResult::Interrupted);
    }
    let guard = sched.suspend(chan, lock, guard);
    (guard, WaitResult::Normal)
}
