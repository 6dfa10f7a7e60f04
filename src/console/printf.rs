//! Formatted console output
//!
//! `cprintf` understands `%d`, `%x`, `%p`, `%s` and `%%`. Anything else after
//! a `%` is printed as-is so a bad format string shows up on the screen.
//! Arguments are passed as a slice of [`Arg`], usually built by the
//! [`cprintf!`](crate::cprintf) macro.

use core::fmt;

use super::{Console, Hardware};
use crate::kern::Scheduler;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Worst case: 64 binary digits plus a sign
const INT_BUF: usize = u64::BITS as usize + 1;

/// One `cprintf` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    /// C `int`; `%x` prints its 32-bit pattern
    Int32(i32),
    Int(i64),
    Uint(u64),
    /// `None` prints as `(null)`
    Str(Option<&'a str>),
}

impl From<i32> for Arg<'_> {
    fn from(v: i32) -> Self {
        Arg::Int32(v)
    }
}

impl From<i64> for Arg<'_> {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<u32> for Arg<'_> {
    fn from(v: u32) -> Self {
        Arg::Uint(v as u64)
    }
}

impl From<u64> for Arg<'_> {
    fn from(v: u64) -> Self {
        Arg::Uint(v)
    }
}

impl From<usize> for Arg<'_> {
    fn from(v: usize) -> Self {
        Arg::Uint(v as u64)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(Some(s))
    }
}

impl<'a> From<Option<&'a str>> for Arg<'a> {
    fn from(s: Option<&'a str>) -> Self {
        Arg::Str(s)
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(p: *const T) -> Self {
        Arg::Uint(p as usize as u64)
    }
}

/// Render `value` in `base` (2..=16), most significant digit first.
///
/// The digits are built backwards from the end of `buf`; the returned slice
/// is the rendered text.
pub fn format_int(value: u64, base: u32, negative: bool, buf: &mut [u8; INT_BUF]) -> &[u8] {
    debug_assert!((2..=16).contains(&base));
    let base = base as u64;
    let mut x = value;
    let mut i = buf.len();

    loop {
        i -= 1;
        buf[i] = DIGITS[(x % base) as usize];
        x /= base;
        if x == 0 {
            break;
        }
    }
    if negative {
        i -= 1;
        buf[i] = b'-';
    }
    &buf[i..]
}

impl<H: Hardware, S: Scheduler> Console<H, S> {
    /// Print an integer; the sign is only honored when `sign` is set
    pub fn printint(&self, xx: i64, base: u32, sign: bool) {
        if sign && xx < 0 {
            self.print_digits(xx.unsigned_abs(), base, true);
        } else {
            self.print_digits(xx as u64, base, false);
        }
    }

    fn print_digits(&self, value: u64, base: u32, negative: bool) {
        let mut buf = [0u8; INT_BUF];
        for &b in format_int(value, base, negative, &mut buf) {
            self.putc(b as u16);
        }
    }

    fn print_str(&self, s: &str) {
        for b in s.bytes() {
            self.putc(b as u16);
        }
    }

    /// Print to the console; see the module docs for the directives.
    ///
    /// A missing format string is fatal. Output is serialized by the console
    /// lock while locking is on.
    pub fn cprintf(&self, fmt: Option<&str>, args: &[Arg<'_>]) {
        self.halt_if_panicked();
        let _guard = self.lock().lock_if_enabled();

        let Some(fmt) = fmt else {
            self.panic("null fmt");
        };

        let mut args = args.iter();
        let mut bytes = fmt.bytes().take_while(|&b| b != 0);
        while let Some(b) = bytes.next() {
            if b != b'%' {
                self.putc(b as u16);
                continue;
            }
            let Some(c) = bytes.next() else {
                break;
            };
            match c {
                b'd' | b'x' | b'p' | b's' => match (c, args.next()) {
                    (b'd', Some(&Arg::Int32(v))) => self.printint(v as i64, 10, true),
                    (b'd', Some(&Arg::Int(v))) => self.printint(v, 10, true),
                    (b'd', Some(&Arg::Uint(v))) => self.print_digits(v, 10, false),
                    (b'x' | b'p', Some(&Arg::Int32(v))) => self.print_digits(v as u32 as u64, 16, false),
                    (b'x' | b'p', Some(&Arg::Int(v))) => self.print_digits(v as u64, 16, false),
                    (b'x' | b'p', Some(&Arg::Uint(v))) => self.print_digits(v, 16, false),
                    (b's', Some(&Arg::Str(s))) => self.print_str(s.unwrap_or("(null)")),
                    _ => {
                        self.putc(b'%' as u16);
                        self.putc(c as u16);
                    }
                },
                b'%' => self.putc(b'%' as u16),
                _ => {
                    self.putc(b'%' as u16);
                    self.putc(c as u16);
                }
            }
        }
    }
}

/// [`fmt::Write`] adapter that pushes every byte through [`Console::putc`].
///
/// Takes no lock itself; callers decide the locking.
pub struct ConsoleWriter<'a, H, S> {
    console: &'a Console<H, S>,
}

impl<'a, H: Hardware, S: Scheduler> ConsoleWriter<'a, H, S> {
    pub fn new(console: &'a Console<H, S>) -> Self {
        Self { console }
    }
}

impl<H: Hardware, S: Scheduler> fmt::Write for ConsoleWriter<'_, H, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.print_str(s);
        Ok(())
    }
}

/// `cprintf!(console, "pid %d: %s\n", pid, name)`
#[macro_export]
macro_rules! cprintf {
    ($console:expr, $fmt:expr $(,)?) => {
        $console.cprintf(::core::option::Option::Some($fmt), &[])
    };
    ($console:expr, $fmt:expr, $($arg:expr),+ $(,)?) => {
        $console.cprintf(
            ::core::option::Option::Some($fmt),
            &[$($crate::console::printf::Arg::from($arg)),+],
        )
    };
}
