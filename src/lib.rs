//! cons_r - console driver for the Mach_R kernel
//!
//! The console is the single choke point for keyboard input and textual
//! output. Output goes to the CGA text screen and is mirrored to the serial
//! port; input is line-edited in interrupt context and handed to blocking
//! readers a whole line at a time.
//!
//! Everything the driver does not own (scheduling, interrupt routing,
//! the UART, the file layer) is consumed through the narrow traits in
//! [`arch`], [`kern::sched_prim`], [`drivers::uart`] and [`device::conf`].

#![cfg_attr(not(test), no_std)]
// Kernel-appropriate clippy configuration
// Many kernel types have specialized initialization that doesn't fit Default
#![allow(clippy::new_without_default)]
// Hardware register code often uses explicit bit shifts for documentation
#![allow(clippy::identity_op)]

pub mod arch;
pub mod config;
pub mod console;
pub mod device;
pub mod drivers;
pub mod error;
pub mod kern;
pub mod panic;

#[cfg(test)]
mod test_support;

pub use config::ConsoleConfig;
pub use console::{Console, Deferred};
pub use error::{ConsoleError, Result};

/// Driver version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Driver name, as registered in the device switch
pub const NAME: &str = "console";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "console");
    }
}
