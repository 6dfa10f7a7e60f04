//! Recoverable console errors
//!
//! Fatal conditions never surface here; they go through
//! [`Console::panic`](crate::Console::panic) and halt the machine.

use thiserror::Error;

/// Console and device switch errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("process killed while waiting for console input")]
    Killed,

    #[error("no device registered for major {0}")]
    NoDevice(usize),

    #[error("device major {0} out of range")]
    BadMajor(usize),
}

pub type Result<T> = core::result::Result<T, ConsoleError>;
