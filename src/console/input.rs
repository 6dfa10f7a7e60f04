//! Console input ring and line editor
//!
//! Input arrives one code at a time from interrupt context. The ring keeps
//! four monotonically increasing cursors, compared without wrapping and
//! reduced modulo [`INPUT_BUF`] only to index the array:
//!
//! ```text
//!   r <= w <= e <= max <= r + INPUT_BUF
//!
//!   r    next byte a reader consumes
//!   w    start of the line still being edited (everything before it is released)
//!   e    edit cursor inside the unreleased line
//!   max  one past the last byte typed on the unreleased line
//! ```

use crate::config::INPUT_BUF;

/// Control-x
pub const fn ctrl(x: u8) -> u8 {
    x - b'@'
}

/// Process listing
pub const C_P: u8 = ctrl(b'P');
/// Kill line
pub const C_U: u8 = ctrl(b'U');
/// Backspace
pub const C_H: u8 = ctrl(b'H');
/// End of file
pub const C_D: u8 = ctrl(b'D');
/// Delete key
pub const DEL: u8 = 0x7F;

// Special keys, as produced by the keyboard decoder
pub const KEY_HOME: u8 = 0xE0;
pub const KEY_END: u8 = 0xE1;
pub const KEY_UP: u8 = 0xE2;
pub const KEY_DN: u8 = 0xE3;
pub const KEY_LF: u8 = 0xE4;
pub const KEY_RT: u8 = 0xE5;
pub const KEY_PGUP: u8 = 0xE6;
pub const KEY_PGDN: u8 = 0xE7;
pub const KEY_INS: u8 = 0xE8;
pub const KEY_DEL: u8 = 0xE9;

/// Output marker: erase the character before the cursor
pub const BACKSPACE: u16 = 0x100;

/// What the caller must do after feeding one code to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Nothing beyond the echo already emitted
    Continue,
    /// A line was released; wake readers
    Released,
    /// A process dump was requested; run it once the console lock is dropped
    ProcDump,
}

/// Fixed-capacity line-edited input buffer
#[derive(Debug, Clone)]
pub struct InputRing {
    buf: [u8; INPUT_BUF],
    r: usize,
    w: usize,
    e: usize,
    max: usize,
}

impl InputRing {
    pub const fn new() -> Self {
        Self {
            buf: [0; INPUT_BUF],
            r: 0,
            w: 0,
            e: 0,
            max: 0,
        }
    }

    /// Read cursor
    pub fn r(&self) -> usize {
        self.r
    }

    /// Line-start cursor
    pub fn w(&self) -> usize {
        self.w
    }

    /// Edit cursor
    pub fn e(&self) -> usize {
        self.e
    }

    /// Write-frontier cursor
    pub fn max(&self) -> usize {
        self.max
    }

    /// `r <= w <= e <= max <= r + INPUT_BUF`
    pub fn invariant_holds(&self) -> bool {
        self.r <= self.w && self.w <= self.e && self.e <= self.max && self.max <= self.r + INPUT_BUF
    }

    /// Is there released input a reader can consume?
    pub fn has_released(&self) -> bool {
        self.r != self.w
    }

    /// Bytes of the line still being edited
    #[cfg(test)]
    pub fn pending_line(&self) -> heapless::Vec<u8, INPUT_BUF> {
        (self.w..self.max).map(|i| self.buf[i % INPUT_BUF]).collect()
    }

    /// Feed one input code, echoing through `echo`.
    pub fn edit<F: FnMut(u16)>(&mut self, c: u8, mut echo: F) -> Edit {
        match c {
            C_P => return Edit::ProcDump,
            C_U => self.kill_line(&mut echo),
            C_H | DEL => {
                self.backspace(&mut echo);
            }
            KEY_UP | KEY_DN => echo(c as u16),
            KEY_LF => {
                self.cursor_left(&mut echo);
            }
            KEY_RT => {
                self.cursor_right(&mut echo);
            }
            _ => return self.insert(c, &mut echo),
        }
        Edit::Continue
    }

    /// Discard the unreleased line.
    ///
    /// The edit cursor is first walked to the end of the line so that each
    /// backspace echo erases one character on the screen.
    pub fn kill_line<F: FnMut(u16)>(&mut self, echo: &mut F) {
        while self.e < self.max {
            self.e += 1;
            echo(KEY_RT as u16);
        }
        while self.max != self.w && self.buf[(self.max - 1) % INPUT_BUF] != b'\n' {
            self.max -= 1;
            self.e -= 1;
            echo(BACKSPACE);
        }
    }

    /// Erase the character before the edit cursor; false if there is none
    pub fn backspace<F: FnMut(u16)>(&mut self, echo: &mut F) -> bool {
        if self.e == self.w {
            return false;
        }
        self.e -= 1;
        self.max -= 1;
        for i in self.e..self.max {
            self.buf[i % INPUT_BUF] = self.buf[(i + 1) % INPUT_BUF];
        }
        echo(BACKSPACE);
        true
    }

    /// Move the edit cursor left; false at the start of the line
    pub fn cursor_left<F: FnMut(u16)>(&mut self, echo: &mut F) -> bool {
        if self.e == self.w {
            return false;
        }
        self.e -= 1;
        echo(KEY_LF as u16);
        true
    }

    /// Move the edit cursor right; false at the end of the line
    pub fn cursor_right<F: FnMut(u16)>(&mut self, echo: &mut F) -> bool {
        if self.e >= self.max {
            return false;
        }
        self.e += 1;
        echo(KEY_RT as u16);
        true
    }

    /// Insert a data byte.
    ///
    /// Ordinary characters go in at the edit cursor; a newline is appended at
    /// the frontier. A newline, ^D or a full ring releases the line.
    pub fn insert<F: FnMut(u16)>(&mut self, c: u8, echo: &mut F) -> Edit {
        if c == 0 || self.max - self.r >= INPUT_BUF {
            return Edit::Continue;
        }
        let c = if c == b'\r' { b'\n' } else { c };

        if c != b'\n' {
            let mut i = self.max;
            while i > self.e {
                self.buf[i % INPUT_BUF] = self.buf[(i - 1) % INPUT_BUF];
                i -= 1;
            }
            self.buf[self.e % INPUT_BUF] = c;
            self.e += 1;
        } else {
            self.buf[self.max % INPUT_BUF] = c;
        }
        self.max += 1;
        echo(c as u16);

        if c == b'\n' || c == C_D || self.max == self.r + INPUT_BUF {
            self.w = self.max;
            self.e = self.max;
            return Edit::Released;
        }
        Edit::Continue
    }

    /// Consume the next released byte
    pub fn getc(&mut self) -> Option<u8> {
        if self.r == self.w {
            return None;
        }
        let c = self.buf[self.r % INPUT_BUF];
        self.r += 1;
        Some(c)
    }

    /// Push the last consumed byte back for the next reader
    pub fn ungetc(&mut self) {
        if self.r > 0 {
            self.r -= 1;
        }
    }
}

impl Default for InputRing {
    fn default() -> Self {
        Self::new()
    }
}
