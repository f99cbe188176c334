//! Async tasks for the collar firmware.
//!
//! - `gnss`: UART line assembly and RMC decoding, forwarding fixes to the main loop

pub mod gnss;

pub use gnss::{FIXES, gnss_task};
