//! Kern subsystem - Core kernel primitives
//!
//! Contains the console serialization lock and the scheduling contract the
//! console sleeps and wakes through.

pub mod lock;
pub mod sched_prim;

pub use lock::ConsoleLock;
pub use sched_prim::{sleep_interruptible, Scheduler, WaitChannel, WaitResult};
