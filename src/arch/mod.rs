//! Architecture-specific code for the console
//!
//! The driver never touches the CPU directly; it goes through the
//! [`Architecture`] trait so the same code runs on hardware and under the
//! host test harness.

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

use crate::config::MAX_FRAMES;

/// Return addresses captured for a panic backtrace
pub type CallerPcs = heapless::Vec<usize, MAX_FRAMES>;

/// CPU services the console needs
pub trait Architecture: Sync {
    /// Read from an I/O port
    fn inb(&self, port: u16) -> u8;

    /// Write to an I/O port
    fn outb(&self, port: u16, value: u8);

    /// Disable interrupts on the calling CPU
    fn disable_interrupts(&self);

    /// Halt the calling CPU forever
    fn halt(&self) -> !;

    /// Identifier of the calling CPU (local APIC id on x86)
    fn cpu_id(&self) -> usize;

    /// Capture up to [`MAX_FRAMES`] return addresses from the caller's stack.
    ///
    /// Frame pointers below `kernbase` terminate the walk.
    fn caller_pcs(&self, kernbase: usize) -> CallerPcs;
}

/// Interrupt routing, as needed by console init
pub trait InterruptController {
    /// Route `irq` to `cpu` and unmask it
    fn enable(&self, irq: u32, cpu: usize);
}
