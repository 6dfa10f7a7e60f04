//! CGA text-mode screen
//!
//! 80x25 cells of (attribute << 8 | character) in memory-mapped video RAM.
//! The cursor offset is not cached; it is read back from the CRT controller
//! on every character and written back afterwards, so the hardware cursor is
//! the single source of truth.

use crate::arch::Architecture;
use crate::config::{ConsoleConfig, CELLS, COLS, CRT_CURSOR_HIGH, CRT_CURSOR_LOW, ROWS};
use crate::console::input::{BACKSPACE, KEY_DN, KEY_LF, KEY_RT, KEY_UP};

/// Cells above the last row; insertion and deletion shift within this span
const VISIBLE: usize = (ROWS - 1) * COLS;

/// Memory-mapped text buffer
pub trait TextMemory: Sync {
    /// Read one cell
    fn read_cell(&self, idx: usize) -> u16;

    /// Write one cell
    fn write_cell(&self, idx: usize, value: u16);

    /// Copy `count` cells from `src` to `dst`; the ranges may overlap
    fn copy_cells(&self, src: usize, dst: usize, count: usize) {
        if dst < src {
            for i in 0..count {
                self.write_cell(dst + i, self.read_cell(src + i));
            }
        } else {
            for i in (0..count).rev() {
                self.write_cell(dst + i, self.read_cell(src + i));
            }
        }
    }

    /// Fill `count` cells starting at `start` with `value`
    fn fill_cells(&self, start: usize, count: usize, value: u16) {
        for i in start..start + count {
            self.write_cell(i, value);
        }
    }
}

/// CGA video memory at a fixed kernel virtual address
#[derive(Debug, Clone, Copy)]
pub struct CgaMemory {
    base: usize,
}

impl CgaMemory {
    /// # Safety
    /// `base` must be the kernel virtual address of the CGA text buffer
    /// (physical [`CGA_PHYS`](crate::config::CGA_PHYS)), mapped for at least
    /// [`CELLS`] 16-bit cells.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }
}

impl TextMemory for CgaMemory {
    fn read_cell(&self, idx: usize) -> u16 {
        debug_assert!(idx < CELLS);
        unsafe { (self.base as *const u16).add(idx).read_volatile() }
    }

    fn write_cell(&self, idx: usize, value: u16) {
        debug_assert!(idx < CELLS);
        unsafe { (self.base as *mut u16).add(idx).write_volatile(value) }
    }
}

/// Cursor offset outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorFault {
    pub pos: usize,
}

/// Screen driver over a text buffer and the CRT cursor registers
pub struct Screen<'a, H> {
    hw: &'a H,
    crt_port: u16,
    attribute: u16,
}

impl<'a, H: Architecture + TextMemory> Screen<'a, H> {
    pub fn new(hw: &'a H, config: &ConsoleConfig) -> Self {
        Self {
            hw,
            crt_port: config.crt_port,
            attribute: config.attribute,
        }
    }

    /// Cursor position: col + 80*row
    pub fn cursor(&self) -> usize {
        self.hw.outb(self.crt_port, CRT_CURSOR_HIGH);
        let high = self.hw.inb(self.crt_port + 1) as usize;
        self.hw.outb(self.crt_port, CRT_CURSOR_LOW);
        let low = self.hw.inb(self.crt_port + 1) as usize;
        (high << 8) | low
    }

    /// Move the hardware cursor
    pub fn set_cursor(&self, pos: usize) {
        self.hw.outb(self.crt_port, CRT_CURSOR_HIGH);
        self.hw.outb(self.crt_port + 1, (pos >> 8) as u8);
        self.hw.outb(self.crt_port, CRT_CURSOR_LOW);
        self.hw.outb(self.crt_port + 1, pos as u8);
    }

    /// Put one output code on the screen.
    ///
    /// Returns the offending offset if the cursor ends up (or already was)
    /// outside the grid; the cursor registers are left untouched then.
    pub fn putc(&self, c: u16) -> Result<(), CursorFault> {
        let mut pos = self.cursor();
        if pos >= CELLS {
            return Err(CursorFault { pos });
        }

        match c {
            c if c == b'\n' as u16 => pos += COLS - pos % COLS,
            BACKSPACE => {
                if pos > 0 {
                    pos -= 1;
                    self.hw.copy_cells(pos + 1, pos, VISIBLE.saturating_sub(pos));
                }
            }
            c if c == KEY_LF as u16 => pos = pos.saturating_sub(1),
            // Not clamped: stepping off the last visible row scrolls like any other write
            c if c == KEY_RT as u16 => pos += 1,
            c if c == KEY_UP as u16 || c == KEY_DN as u16 => {}
            _ => {
                self.hw.copy_cells(pos, pos + 1, VISIBLE.saturating_sub(pos));
                self.hw.write_cell(pos, (c & 0xFF) | self.attribute);
                pos += 1;
            }
        }

        if pos > CELLS {
            return Err(CursorFault { pos });
        }

        if pos / COLS >= ROWS - 1 {
            self.scroll();
            pos -= COLS;
            self.hw.fill_cells(pos, CELLS - pos, 0);
        }

        self.set_cursor(pos);
        Ok(())
    }

    /// Move every row up by one and blank the last
    fn scroll(&self) {
        self.hw.copy_cells(COLS, 0, CELLS - COLS);
        self.hw.fill_cells(CELLS - COLS, COLS, 0);
    }
}
