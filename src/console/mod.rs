//! Console device
//!
//! [`Console`] owns everything the console needs at runtime: the input ring
//! behind the console lock, the panic flag, the reader wait channel and the
//! keyboard decoder state. It is created once at boot and handed by
//! reference to the device switch, the interrupt path and the panic path.

pub mod cga;
pub mod input;
pub mod kbd;
pub mod printf;

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use spin::Mutex;

use crate::arch::{Architecture, InterruptController};
use crate::config::ConsoleConfig;
use crate::device::{CharDevice, DevSw, DeviceSwitch, InodeLock, CONSOLE};
use crate::drivers::SerialPort;
use crate::error::{ConsoleError, Result};
use crate::kern::{sleep_interruptible, ConsoleLock, Scheduler, WaitChannel, WaitResult};

use self::cga::{Screen, TextMemory};
use self::input::{Edit, InputRing, BACKSPACE, C_D, KEY_DN, KEY_LF, KEY_RT, KEY_UP};
use self::kbd::Keyboard;

/// Everything the console drives: CPU, text memory and serial line
pub trait Hardware: Architecture + TextMemory + SerialPort {}

impl<T: Architecture + TextMemory + SerialPort> Hardware for T {}

/// Work left over from a locked input batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    Nothing,
    /// ^P was typed; dump the process table
    ProcDump,
}

/// Console device context
pub struct Console<H, S> {
    cons: ConsoleLock<InputRing>,
    panicked: AtomicBool,
    input_ready: WaitChannel,
    kbd: Mutex<Keyboard>,
    config: ConsoleConfig,
    hw: H,
    sched: S,
}

impl<H: Hardware, S: Scheduler> Console<H, S> {
    pub fn new(hw: H, sched: S, config: ConsoleConfig) -> Self {
        Self {
            cons: ConsoleLock::new(InputRing::new()),
            panicked: AtomicBool::new(false),
            input_ready: WaitChannel::new(),
            kbd: Mutex::new(Keyboard::new()),
            config,
            hw,
            sched,
        }
    }

    /// Register with the device switch and route the keyboard interrupt
    pub fn init<'a>(
        &'a self,
        devsw: &DeviceSwitch<'a>,
        pic: &dyn InterruptController,
    ) -> Result<()>
    where
        H: 'a,
        S: 'a,
    {
        devsw.register(CONSOLE, DevSw::new(crate::NAME, self))?;
        self.cons.enable();
        pic.enable(self.config.kbd_irq, 0);
        info!(
            "console: major {} registered, irq {} enabled",
            CONSOLE, self.config.kbd_irq
        );
        Ok(())
    }

    /// Install this console as the `log` backend
    pub fn init_logger(
        &'static self,
        level: log::LevelFilter,
    ) -> core::result::Result<(), log::SetLoggerError>
    where
        H: Send,
        S: Send,
    {
        log::set_logger(self)?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn scheduler(&self) -> &S {
        &self.sched
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Has this console taken the fatal path?
    pub fn is_panicked(&self) -> bool {
        self.panicked.load(Ordering::Acquire)
    }

    pub(crate) fn set_panicked(&self) {
        self.panicked.store(true, Ordering::Release);
    }

    pub(crate) fn lock(&self) -> &ConsoleLock<InputRing> {
        &self.cons
    }

    /// Stop this CPU for good if another path already panicked
    pub(crate) fn halt_if_panicked(&self) {
        if self.is_panicked() {
            self.hw.disable_interrupts();
            self.hw.halt();
        }
    }

    fn screen(&self) -> Screen<'_, H> {
        Screen::new(&self.hw, &self.config)
    }

    /// Emit one output code to the serial line and the screen.
    ///
    /// Once the console has panicked every caller stops here for good.
    pub fn putc(&self, c: u16) {
        self.halt_if_panicked();
        debug_assert!(c <= 0xFF || c == BACKSPACE, "bad output code {c:#x}");

        match c {
            BACKSPACE => {
                self.hw.putc(0x08);
                self.hw.putc(b' ');
                self.hw.putc(0x08);
            }
            c if is_arrow(c) => {}
            c => self.hw.putc(c as u8),
        }

        let screen = self.screen();
        if screen.putc(c).is_err() {
            // The fatal path prints through here too; give it a sane cursor
            screen.set_cursor(0);
            self.panic("pos under/overflow");
        }
    }

    /// Locked phase of input handling.
    ///
    /// Feeds every code `next` yields to the line editor under the console
    /// lock, echoing and waking readers as lines complete. Anything that must
    /// not run under the lock is returned instead.
    pub fn drain_input<F: FnMut() -> Option<u8>>(&self, mut next: F) -> Deferred {
        let mut deferred = Deferred::Nothing;
        let mut ring = self.cons.lock();
        while let Some(c) = next() {
            match ring.edit(c, |code| self.putc(code)) {
                Edit::Continue => {}
                Edit::Released => self.sched.notify(&self.input_ready),
                Edit::ProcDump => deferred = Deferred::ProcDump,
            }
        }
        deferred
    }

    /// Unlocked phase of input handling
    pub fn run_deferred(&self, deferred: Deferred) {
        if deferred == Deferred::ProcDump {
            debug!("console: process dump requested");
            self.sched.dump();
        }
    }

    /// Input interrupt entry: drain `next`, then run any deferred work
    pub fn handle_input<F: FnMut() -> Option<u8>>(&self, next: F) -> Deferred {
        let deferred = self.drain_input(next);
        self.run_deferred(deferred);
        deferred
    }

    /// Keyboard interrupt handler
    pub fn keyboard_intr(&self) -> Deferred {
        let deferred = {
            let mut kbd = self.kbd.lock();
            self.drain_input(|| kbd.getc(&self.hw))
        };
        self.run_deferred(deferred);
        deferred
    }

    /// Copy released input into `dst`, sleeping until some is available.
    ///
    /// Stops after a newline or when `dst` is full. ^D ends the read; if
    /// bytes were already copied it is left in the ring so the next read
    /// returns 0.
    fn read_line(&self, dst: &mut [u8]) -> Result<usize> {
        let lock = self.cons.mutex();
        let mut ring = lock.lock();
        let mut n = 0;

        while n < dst.len() {
            while !ring.has_released() {
                let (guard, result) = sleep_interruptible(&self.sched, &self.input_ready, lock, ring);
                ring = guard;
                if result == WaitResult::Interrupted {
                    return Err(ConsoleError::Killed);
                }
            }

            let Some(c) = ring.getc() else {
                continue;
            };
            if c == C_D {
                if n > 0 {
                    ring.ungetc();
                }
                break;
            }
            dst[n] = c;
            n += 1;
            if c == b'\n' {
                break;
            }
        }
        Ok(n)
    }

    /// Write formatted Rust output, under the console lock while locking is on
    pub fn print(&self, args: fmt::Arguments<'_>) {
        self.halt_if_panicked();
        let _guard = self.cons.lock_if_enabled();
        let _ = fmt::Write::write_fmt(&mut printf::ConsoleWriter::new(self), args);
    }
}

fn is_arrow(c: u16) -> bool {
    [KEY_UP, KEY_DN, KEY_LF, KEY_RT]
        .iter()
        .any(|&key| key as u16 == c)
}

impl<H: Hardware, S: Scheduler> CharDevice for Console<H, S> {
    fn read(&self, ip: &dyn InodeLock, dst: &mut [u8]) -> Result<usize> {
        ip.iunlock();
        let result = self.read_line(dst);
        ip.ilock();
        if let Err(err) = result {
            warn!("console: read aborted: {}", err);
        }
        result
    }

    fn write(&self, ip: &dyn InodeLock, src: &[u8]) -> Result<usize> {
        ip.iunlock();
        {
            let _guard = self.cons.lock();
            for &b in src {
                self.putc(b as u16);
            }
        }
        ip.ilock();
        Ok(src.len())
    }
}

impl<H: Hardware + Send, S: Scheduler + Send> log::Log for Console<H, S> {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.print(format_args!(
                "[{}] {}: {}\n",
                record.level(),
                record.target(),
                record.args()
            ));
        }
    }

    fn flush(&self) {}
}

impl<H, S> fmt::Debug for Console<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("cons", &self.cons)
            .field("panicked", &self.panicked.load(Ordering::Relaxed))
            .field("input_ready", &self.input_ready)
            .finish()
    }
}
