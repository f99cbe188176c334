//! GNSS serial input: line assembly and navigation sentence decoding.
//!
//! Bytes from the receiver UART pass through [`LineAssembler`] and each
//! completed line is offered to [`parse_rmc`]. Anything that is not a
//! well-formed RMC sentence is dropped silently.

mod line;
mod rmc;

pub use line::{LINE_CAPACITY, LINE_MAX, LINE_MIN, LineAssembler};
pub use rmc::{FIELD_MAX, RMC_PREFIXES, parse_rmc};

/// One decoded navigation fix.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fix {
    /// Latitude in decimal degrees, south negative.
    pub lat: f64,
    /// Longitude in decimal degrees, west negative.
    pub lon: f64,
    /// Speed over ground in km/h.
    pub speed_kph: f32,
    /// Receiver reported a valid fix and both coordinates decoded.
    pub valid: bool,
    /// Minutes since local midnight, seconds discarded (0 when absent).
    pub time_min: u16,
    /// Calendar date as `YYYYMMDD` (0 when absent or out of range).
    pub date: u32,
}
