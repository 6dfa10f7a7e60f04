//! Serial byte transport contract

/// Polled serial output
///
/// This is a blocking operation. The implementation should wait for the
/// transmitter to be ready before writing, and must be callable from
/// interrupt context with the console lock held.
pub trait SerialPort: Sync {
    /// Write a single byte to the serial line
    fn putc(&self, c: u8);
}
