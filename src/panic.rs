//! Panic handler
//!
//! The fatal path: stop interrupts, stop taking the console lock, print the
//! message and a short backtrace, mark the console panicked and halt. Other
//! CPUs that try to print afterwards halt in `Console::putc`.

use core::fmt;
use core::panic::PanicInfo;

use crate::arch::Architecture;
use crate::config::MAX_FRAMES;
use crate::console::{Console, Hardware};
use crate::kern::Scheduler;

impl<H: Hardware, S: Scheduler> Console<H, S> {
    /// Report a fatal error and halt this CPU
    pub fn panic(&self, msg: &str) -> ! {
        self.panic_fmt(format_args!("{}", msg))
    }

    /// [`Console::panic`] with a formatted message
    pub fn panic_fmt(&self, msg: fmt::Arguments<'_>) -> ! {
        let hw = self.hardware();
        hw.disable_interrupts();
        self.lock().disable();

        crate::cprintf!(self, "lapicid %d: panic: ", hw.cpu_id());
        self.print(msg);
        crate::cprintf!(self, "\n");

        let pcs = hw.caller_pcs(self.config().kernbase);
        for i in 0..MAX_FRAMES {
            let pc = pcs.get(i).copied().unwrap_or(0);
            crate::cprintf!(self, " %p", pc);
        }

        self.set_panicked();
        hw.halt()
    }
}

/// Route a Rust panic through the console fatal path.
///
/// Meant to be called from the kernel's `#[panic_handler]`.
pub fn kernel_panic<H: Hardware, S: Scheduler>(console: &Console<H, S>, info: &PanicInfo<'_>) -> ! {
    match info.location() {
        Some(location) => console.panic_fmt(format_args!(
            "{} at {}:{}",
            info.message(),
            location.file(),
            location.line()
        )),
        None => console.panic_fmt(format_args!("{}", info.message())),
    }
}
