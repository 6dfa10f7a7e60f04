//! Host-side stand-ins for the hardware and kernel services the console uses

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;

use spin::{Mutex, MutexGuard};

use crate::arch::{Architecture, CallerPcs, InterruptController};
use crate::config::{
    CELLS, COLS, CRTPORT, CRT_CURSOR_HIGH, CRT_CURSOR_LOW, KBDATAP, KBSTATP, KBS_DIB, MAX_FRAMES,
};
use crate::console::cga::TextMemory;
use crate::device::InodeLock;
use crate::drivers::SerialPort;
use crate::kern::{Scheduler, WaitChannel};

// ============================================================================
// Hardware
// ============================================================================

struct Crt {
    index: u8,
    high: u8,
    low: u8,
}

/// CGA text memory, CRT cursor registers, keyboard controller and a UART
/// that records everything written to it
pub struct MockHardware {
    cells: Mutex<Vec<u16>>,
    crt: Mutex<Crt>,
    serial: Mutex<Vec<u8>>,
    scancodes: Mutex<VecDeque<u8>>,
    pcs: Mutex<Vec<usize>>,
    cpu: AtomicUsize,
    cli: AtomicBool,
    halted: AtomicBool,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(vec![0; CELLS]),
            crt: Mutex::new(Crt { index: 0, high: 0, low: 0 }),
            serial: Mutex::new(Vec::new()),
            scancodes: Mutex::new(VecDeque::new()),
            pcs: Mutex::new(Vec::new()),
            cpu: AtomicUsize::new(0),
            cli: AtomicBool::new(false),
            halted: AtomicBool::new(false),
        }
    }

    /// Load the cursor registers directly, bypassing the driver
    pub fn set_cursor(&self, pos: usize) {
        let mut crt = self.crt.lock();
        crt.high = (pos >> 8) as u8;
        crt.low = pos as u8;
    }

    pub fn cursor(&self) -> usize {
        let crt = self.crt.lock();
        ((crt.high as usize) << 8) | crt.low as usize
    }

    pub fn cell(&self, idx: usize) -> u16 {
        self.cells.lock()[idx]
    }

    /// Characters of one row with the attribute stripped and trailing
    /// blanks removed
    pub fn row_text(&self, row: usize) -> String {
        let cells = self.cells.lock();
        let text: String = cells[row * COLS..(row + 1) * COLS]
            .iter()
            .map(|&cell| match (cell & 0xFF) as u8 {
                0 => ' ',
                c => c as char,
            })
            .collect();
        text.trim_end().to_string()
    }

    pub fn serial_output(&self) -> Vec<u8> {
        self.serial.lock().clone()
    }

    pub fn push_scancodes(&self, codes: &[u8]) {
        self.scancodes.lock().extend(codes.iter().copied());
    }

    pub fn set_cpu_id(&self, cpu: usize) {
        self.cpu.store(cpu, Ordering::Relaxed);
    }

    pub fn set_caller_pcs(&self, pcs: &[usize]) {
        *self.pcs.lock() = pcs.to_vec();
    }

    pub fn halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub fn interrupts_disabled(&self) -> bool {
        self.cli.load(Ordering::Acquire)
    }
}

impl Architecture for MockHardware {
    fn inb(&self, port: u16) -> u8 {
        match port {
            KBSTATP => {
                if self.scancodes.lock().is_empty() {
                    0
                } else {
                    KBS_DIB
                }
            }
            KBDATAP => self.scancodes.lock().pop_front().unwrap_or(0),
            p if p == CRTPORT + 1 => {
                let crt = self.crt.lock();
                match crt.index {
                    CRT_CURSOR_HIGH => crt.high,
                    CRT_CURSOR_LOW => crt.low,
                    _ => 0,
                }
            }
            _ => 0,
        }
    }

    fn outb(&self, port: u16, value: u8) {
        let mut crt = self.crt.lock();
        if port == CRTPORT {
            crt.index = value;
        } else if port == CRTPORT + 1 {
            match crt.index {
                CRT_CURSOR_HIGH => crt.high = value,
                CRT_CURSOR_LOW => crt.low = value,
                _ => {}
            }
        }
    }

    fn disable_interrupts(&self) {
        self.cli.store(true, Ordering::Release);
    }

    fn halt(&self) -> ! {
        self.halted.store(true, Ordering::Release);
        panic!("cpu halted");
    }

    fn cpu_id(&self) -> usize {
        self.cpu.load(Ordering::Relaxed)
    }

    fn caller_pcs(&self, _kernbase: usize) -> CallerPcs {
        self.pcs.lock().iter().copied().take(MAX_FRAMES).collect()
    }
}

impl TextMemory for MockHardware {
    fn read_cell(&self, idx: usize) -> u16 {
        self.cells.lock()[idx]
    }

    fn write_cell(&self, idx: usize, value: u16) {
        self.cells.lock()[idx] = value;
    }
}

impl SerialPort for MockHardware {
    fn putc(&self, c: u8) {
        self.serial.lock().push(c);
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Condition-variable style scheduler for host threads.
///
/// `suspend` samples a wakeup generation while the caller still holds the
/// lock, so a `notify` issued under that lock after the sleeper released it
/// is always observed.
pub struct MockScheduler {
    generation: AtomicU64,
    sleepers: AtomicUsize,
    suspends: AtomicUsize,
    killed: AtomicBool,
    dumps: AtomicUsize,
    notified: Mutex<Vec<u64>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            sleepers: AtomicUsize::new(0),
            suspends: AtomicUsize::new(0),
            killed: AtomicBool::new(false),
            dumps: AtomicUsize::new(0),
            notified: Mutex::new(Vec::new()),
        }
    }

    /// Mark the calling thread (every thread, here) for termination
    pub fn kill(&self) {
        self.killed.store(true, Ordering::Release);
    }

    pub fn suspend_count(&self) -> usize {
        self.suspends.load(Ordering::Acquire)
    }

    /// Threads currently inside `suspend`
    pub fn sleepers(&self) -> usize {
        self.sleepers.load(Ordering::Acquire)
    }

    pub fn dump_count(&self) -> usize {
        self.dumps.load(Ordering::Acquire)
    }

    /// Channel ids passed to `notify`, in order
    pub fn notified(&self) -> Vec<u64> {
        self.notified.lock().clone()
    }
}

impl Scheduler for MockScheduler {
    fn suspend<'a, T>(
        &self,
        _chan: &WaitChannel,
        lock: &'a Mutex<T>,
        guard: MutexGuard<'a, T>,
    ) -> MutexGuard<'a, T> {
        let seen = self.generation.load(Ordering::Acquire);
        self.suspends.fetch_add(1, Ordering::AcqRel);
        self.sleepers.fetch_add(1, Ordering::AcqRel);
        drop(guard);

        while self.generation.load(Ordering::Acquire) == seen && !self.killed.load(Ordering::Acquire) {
            thread::yield_now();
        }

        self.sleepers.fetch_sub(1, Ordering::AcqRel);
        lock.lock()
    }

    fn notify(&self, chan: &WaitChannel) {
        self.notified.lock().push(chan.id());
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    fn dump(&self) {
        self.dumps.fetch_add(1, Ordering::AcqRel);
    }
}

// ============================================================================
// Interrupt controller and inode
// ============================================================================

/// Records every IRQ routing request
pub struct MockPic {
    enabled: Mutex<Vec<(u32, usize)>>,
}

impl MockPic {
    pub fn new() -> Self {
        Self {
            enabled: Mutex::new(Vec::new()),
        }
    }

    pub fn enabled(&self) -> Vec<(u32, usize)> {
        self.enabled.lock().clone()
    }
}

impl InterruptController for MockPic {
    fn enable(&self, irq: u32, cpu: usize) {
        self.enabled.lock().push((irq, cpu));
    }
}

/// Counts lock bracketing by the driver
pub struct MockInode {
    ilocks: AtomicUsize,
    iunlocks: AtomicUsize,
}

impl MockInode {
    pub fn new() -> Self {
        Self {
            ilocks: AtomicUsize::new(0),
            iunlocks: AtomicUsize::new(0),
        }
    }

    /// `(iunlock calls, ilock calls)`
    pub fn counts(&self) -> (usize, usize) {
        (self.iunlocks.load(Ordering::Acquire), self.ilocks.load(Ordering::Acquire))
    }
}

impl InodeLock for MockInode {
    fn ilock(&self) {
        self.ilocks.fetch_add(1, Ordering::AcqRel);
    }

    fn iunlock(&self) {
        self.iunlocks.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_crt_registers() {
        let hw = MockHardware::new();
        hw.outb(CRTPORT, CRT_CURSOR_HIGH);
        hw.outb(CRTPORT + 1, 0x07);
        hw.outb(CRTPORT, CRT_CURSOR_LOW);
        hw.outb(CRTPORT + 1, 0xD0);
        assert_eq!(hw.cursor(), 2000);
    }

    #[test]
    fn test_mock_notify_wakes_sleeper() {
        let sched = MockScheduler::new();
        let lock = Mutex::new(0u32);
        let chan = WaitChannel::new();

        thread::scope(|s| {
            let sleeper = s.spawn(|| {
                let guard = lock.lock();
                let guard = sched.suspend(&chan, &lock, guard);
                *guard
            });
            while sched.sleepers() == 0 {
                thread::yield_now();
            }
            *lock.lock() = 9;
            sched.notify(&chan);
            assert_eq!(sleeper.join().unwrap(), 9);
        });
        assert_eq!(sched.notified(), [chan.id()]);
    }
}
