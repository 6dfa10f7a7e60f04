//! Console configuration
//!
//! Hardware constants for the PC text console and the small set of knobs a
//! board port may want to change.

/// Screen width in character cells
pub const COLS: usize = 80;
/// Screen height in character cells
pub const ROWS: usize = 25;
/// Total number of cells in the text grid
pub const CELLS: usize = COLS * ROWS;

/// Capacity of the console input ring
pub const INPUT_BUF: usize = 128;

/// Number of return addresses printed by the panic backtrace
pub const MAX_FRAMES: usize = 10;

/// Physical address of CGA text memory
pub const CGA_PHYS: usize = 0xB8000;

/// CRT controller index port
pub const CRTPORT: u16 = 0x3D4;
/// CRT register holding the high byte of the cursor offset
pub const CRT_CURSOR_HIGH: u8 = 14;
/// CRT register holding the low byte of the cursor offset
pub const CRT_CURSOR_LOW: u8 = 15;

/// Keyboard controller status port
pub const KBSTATP: u16 = 0x64;
/// Keyboard data port
pub const KBDATAP: u16 = 0x60;
/// Status bit: keyboard data in buffer
pub const KBS_DIB: u8 = 0x01;

/// Keyboard IRQ line
pub const IRQ_KBD: u32 = 1;

/// Light grey on black
pub const DEFAULT_ATTRIBUTE: u16 = 0x0700;

/// Lowest kernel virtual address (x86_64 higher-half default)
pub const KERNBASE: usize = 0xFFFF_8000_0000_0000;

/// Console configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// CRT controller index port; the data port is `crt_port + 1`
    pub crt_port: u16,
    /// Color attribute OR'ed into every character written to the screen
    pub attribute: u16,
    /// IRQ line routed to the keyboard handler at init
    pub kbd_irq: u32,
    /// Frame pointers below this address end the backtrace walk
    pub kernbase: usize,
}

impl ConsoleConfig {
    /// Standard PC configuration
    pub const fn new() -> Self {
        Self {
            crt_port: CRTPORT,
            attribute: DEFAULT_ATTRIBUTE,
            kbd_irq: IRQ_KBD,
            kernbase: KERNBASE,
        }
    }

    /// Override the color attribute
    pub const fn with_attribute(mut self, attribute: u16) -> Self {
        self.attribute = attribute;
        self
    }

    /// Override the kernel base used to validate frame pointers
    pub const fn with_kernbase(mut self, kernbase: usize) -> Self {
        self.kernbase = kernbase;
        self
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new()
    }
}
