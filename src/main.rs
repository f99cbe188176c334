//! Dog Collar Firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Tracks daily activity from a GNSS receiver and drives two APA102 LED strips
//! that show connectivity, fix state and a speed-mapped animation.
//!
//! # Architecture
//!
//! - GNSS task: reads the receiver UART, assembles and decodes RMC sentences,
//!   pushes fixes into a bounded channel
//! - Main task: every `LED_UPDATE_MS` drains fixes into the metrics aggregator,
//!   persists on schedule, renders a frame and clocks it out over SPI DMA
//!
//! # Wiring
//!
//! - GNSS TX -> GP1 (UART0 RX), 9600 8N1
//! - LED chain: CLK GP18, DATA GP19 (SPI0), strip A then strip B
//! - On-board LED GP25: 1 Hz heartbeat

#![no_std]
#![no_main]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// Modules only used in the binary (not testable on host)
mod flash_store;
mod tasks;

// Re-export testable modules from library for local use
// (These are defined in lib.rs with host-testable code)
mod apa102 {
    pub use dog_collar::apa102::*;
}
mod config {
    pub use dog_collar::config::*;
}
mod connectivity {
    pub use dog_collar::connectivity::*;
}
mod gnss {
    pub use dog_collar::gnss::*;
}
mod metrics {
    pub use dog_collar::metrics::*;
}
mod render {
    pub use dog_collar::render::*;
}
mod storage {
    pub use dog_collar::storage::*;
}
mod summary {
    pub use dog_collar::summary::*;
}

use defmt::{debug, info, warn};
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::Flash;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::{self, Spi};
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUartRx};
use embassy_time::{Duration, Instant, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::apa102::{MAX_ENCODED_LEN, encode_chain};
use crate::config::{
    ConfigSource,
    ConfigStore,
    FIX_STALE_MS,
    GPS_BAUD,
    HEARTBEAT_MS,
    LED_UPDATE_MS,
    StripLayout,
};
use crate::connectivity::RadioOff;
use crate::flash_store::FlashStore;
use crate::gnss::Fix;
use crate::metrics::{MetricsAggregator, MetricsSource};
use crate::render::{FrameInputs, RenderEngine};
use crate::summary::SummaryPayload;
use crate::tasks::{FIXES, gnss_task};

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Program metadata for `picotool info`
#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"dog-collar"),
    embassy_rp::binary_info::rp_program_description!(c"GNSS activity tracker with APA102 status strips"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

/// LED chain clock. APA102 clones stay reliable well above this.
const LED_SPI_HZ: u32 = 4_000_000;

/// UART receive ring size.
const GNSS_RX_BUFFER: usize = 256;

fn led_spi_config() -> spi::Config {
    let mut config = spi::Config::default();
    config.frequency = LED_SPI_HZ;
    config
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Dog collar starting...");

    let p = embassy_rp::init(Default::default());

    // On-board LED (heartbeat)
    let mut led = Output::new(p.PIN_25, Level::Low);

    // Persistent storage on the top flash sectors
    let mut store = FlashStore::new(Flash::new_blocking(p.FLASH));

    let (config_store, source) = ConfigStore::load(&mut store);
    match source {
        ConfigSource::Stored => info!("Config loaded from flash"),
        ConfigSource::Defaulted { reason, persisted } => {
            warn!("Config defaulted: {}", reason);
            if let Err(err) = persisted {
                warn!("Default config not persisted: {}", err);
            }
        }
    }

    let (mut aggregator, metrics_source) = MetricsAggregator::restore(&mut store);
    match metrics_source {
        MetricsSource::Stored => info!(
            "Metrics restored: date={} distance_m={}",
            aggregator.metrics().date,
            aggregator.metrics().distance_m
        ),
        MetricsSource::Fresh(err) => info!("Metrics start empty: {}", err),
        MetricsSource::Reset { reason, persisted } => {
            warn!("Metrics reset: {}", reason);
            if let Err(err) = persisted {
                warn!("Zeroed metrics not persisted: {}", err);
            }
        }
    }

    // GNSS receiver on UART0 (RX only)
    static GNSS_RX_BUF: StaticCell<[u8; GNSS_RX_BUFFER]> = StaticCell::new();
    let mut uart_config = uart::Config::default();
    uart_config.baudrate = GPS_BAUD;
    let rx = BufferedUartRx::new(p.UART0, Irqs, p.PIN_1, GNSS_RX_BUF.init([0; GNSS_RX_BUFFER]), uart_config);

    spawner.spawn(gnss_task(rx)).unwrap();
    info!("GNSS task spawned");

    // LED chain on SPI0 with DMA (TX-only, strips have no data out)
    let mut spi = Spi::new_txonly(p.SPI0, p.PIN_18, p.PIN_19, p.DMA_CH0, led_spi_config());

    let mut engine = RenderEngine::new(StripLayout::DEFAULT, Instant::now().as_ticks());
    info!("LED layout: {}", engine.layout());

    let mut tx_buf = [0u8; MAX_ENCODED_LEN];
    let mut ticker = Ticker::every(Duration::from_millis(LED_UPDATE_MS));

    let link = RadioOff;
    let mut fix = Fix::default();
    let mut last_fix_ms: Option<u64> = None;
    let mut last_heartbeat_ms = 0u64;

    info!("Main loop starting");

    loop {
        let now_ms = Instant::now().as_millis();

        // Drain fixes decoded since the last frame
        while let Ok(new_fix) = FIXES.try_receive() {
            let update = aggregator.ingest(&new_fix, now_ms, &mut store);
            if update.rolled_over {
                info!("Day rollover: date={}", aggregator.metrics().date);
            }
            if let Some(Err(err)) = update.persist {
                warn!("Rollover save failed: {}", err);
            }
            debug!("sample {} accepted={}", update.sample, update.sample.accepted());
            fix = new_fix;
            last_fix_ms = Some(now_ms);
        }

        let fresh = last_fix_ms.is_some_and(|t| now_ms.saturating_sub(t) <= FIX_STALE_MS);
        let fix_valid = fix.valid && fresh;
        let speed_kph = if fix_valid { fix.speed_kph } else { 0.0 };

        match aggregator.tick(now_ms, &mut store) {
            Some(Ok(())) => debug!("Metrics saved"),
            Some(Err(err)) => warn!("Metrics save failed: {}", err),
            None => {}
        }

        let inputs = FrameInputs::sample(now_ms, fix_valid, speed_kph, &link);
        let frame = engine.render(&inputs, config_store.active());
        if let Some(len) = encode_chain(frame, &mut tx_buf)
            && let Err(err) = spi.write(&tx_buf[..len]).await
        {
            warn!("LED SPI write failed: {}", err);
        }

        if now_ms.saturating_sub(last_heartbeat_ms) >= HEARTBEAT_MS {
            last_heartbeat_ms = now_ms;
            led.toggle();
            let summary = SummaryPayload::from_metrics(aggregator.metrics(), fix_valid);
            info!(
                "heartbeat | gps_fix={} | speed_kph={} | distance_m={} | tier={}",
                fix_valid,
                speed_kph,
                summary.distance_m,
                engine.tier()
            );
        }

        ticker.next().await;
    }
}
