//! Device driver contracts the console consumes
//!
//! The UART itself lives outside this crate; the console only needs a way
//! to push bytes at it.

pub mod uart;

pub use uart::SerialPort;
