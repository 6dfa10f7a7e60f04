//! Device Subsystem
//!
//! The device switch routes file-layer `read`/`write` calls to character
//! device drivers by major number. The console registers itself here at init.

pub mod conf;

pub use conf::{CharDevice, DevSw, DeviceSwitch, InodeLock, NoInode, CONSOLE, NDEV};
