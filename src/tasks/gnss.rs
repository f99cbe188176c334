//! GNSS receiver task.
//!
//! Reads the receiver UART in small chunks, assembles lines and forwards every
//! decoded RMC fix to the main loop. The task never touches metrics or render
//! state; the main loop drains [`FIXES`] before each frame.

use defmt::{debug, info, warn};
use embassy_rp::uart::BufferedUartRx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_io_async::Read;

use crate::gnss::{Fix, LineAssembler, parse_rmc};

/// Fixes buffered between two frames (receivers emit at most a few per second).
const FIX_QUEUE_DEPTH: usize = 4;

/// Decoded fixes, oldest first.
pub static FIXES: Channel<CriticalSectionRawMutex, Fix, FIX_QUEUE_DEPTH> = Channel::new();

/// UART read granularity.
const READ_CHUNK: usize = 32;

#[embassy_executor::task]
pub async fn gnss_task(mut rx: BufferedUartRx) {
    info!("GNSS task started");

    let mut assembler = LineAssembler::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match rx.read(&mut chunk).await {
            Ok(n) => n,
            Err(err) => {
                warn!("GNSS UART read error: {}", err);
                continue;
            }
        };

        for &byte in &chunk[..n] {
            let overflows = assembler.overflows();
            let fix = assembler.push(byte).and_then(parse_rmc);
            if assembler.overflows() != overflows {
                warn!("GNSS line overflow, buffer reset ({} total)", assembler.overflows());
            }

            if let Some(fix) = fix {
                debug!("fix {}", fix);
                FIXES.send(fix).await;
            }
        }
    }
}
