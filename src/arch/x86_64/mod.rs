//! x86_64 architecture support for the console
//!
//! Port I/O, interrupt control and frame-pointer backtraces on Intel/AMD
//! 64-bit CPUs.

use crate::arch::{Architecture, CallerPcs};
use core::arch::asm;

/// x86_64 implementation of the Architecture trait
#[derive(Debug, Clone, Copy, Default)]
pub struct X86_64;

impl X86_64 {
    pub const fn new() -> Self {
        Self
    }

    /// Read the current frame pointer
    #[inline(always)]
    fn frame_pointer() -> usize {
        let rbp: usize;
        unsafe {
            asm!("mov {}, rbp", out(reg) rbp, options(nomem, nostack, preserves_flags));
        }
        rbp
    }
}

impl Architecture for X86_64 {
    fn inb(&self, port: u16) -> u8 {
        let value: u8;
        unsafe {
            asm!("in al, dx", out("al") value, in("dx") port, options(nomem, nostack, preserves_flags));
        }
        value
    }

    fn outb(&self, port: u16, value: u8) {
        unsafe {
            asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack, preserves_flags));
        }
    }

    fn disable_interrupts(&self) {
        unsafe {
            asm!("cli", options(nomem, nostack));
        }
    }

    fn halt(&self) -> ! {
        loop {
            unsafe {
                asm!("hlt", options(nomem, nostack));
            }
        }
    }

    fn cpu_id(&self) -> usize {
        // CPUID leaf 1: initial local APIC id in EBX[31:24].
        // The intrinsic takes care of the EBX clobber LLVM reserves.
        let leaf = unsafe { core::arch::x86_64::__cpuid(1) };
        (leaf.ebx >> 24) as usize
    }

    fn caller_pcs(&self, kernbase: usize) -> CallerPcs {
        let mut pcs = CallerPcs::new();
        let mut rbp = Self::frame_pointer();

        while pcs.len() < pcs.capacity() {
            if rbp == 0 || rbp < kernbase || rbp == usize::MAX || rbp % 8 != 0 {
                break;
            }
            // Frame layout: [rbp] = saved rbp, [rbp + 8] = return address
            let (saved, ret) = unsafe {
                let frame = rbp as *const usize;
                (frame.read_volatile(), frame.add(1).read_volatile())
            };
            if pcs.push(ret).is_err() {
                break;
            }
            rbp = saved;
        }
        pcs
    }
}
