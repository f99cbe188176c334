//! GNSS and activity-tracking constants.
//!
//! These tune the metrics aggregator: how often samples are integrated,
//! which speeds count as movement, and which readings are treated as noise.

// =============================================================================
// GNSS Receiver
// =============================================================================

/// GNSS UART baud rate.
pub const GPS_BAUD: u32 = 9_600;

/// Knots to km/h.
pub const KNOTS_TO_KPH: f32 = 1.852;

/// A fix older than this is considered lost by the render loop.
pub const FIX_STALE_MS: u64 = 5_000;

// =============================================================================
// Sampling
// =============================================================================

/// Minimum wall-clock spacing between accumulated samples.
pub const GPS_SAMPLE_MS: u64 = 1_000;

/// Speed above which time counts as active.
pub const SPEED_ACTIVE_KPH: f32 = 0.7;

/// Speeds above this are GNSS spikes and never accumulated.
pub const SPEED_MAX_VALID_KPH: f32 = 40.0;

/// Segments at or above this length are treated as position jumps.
pub const MAX_SEGMENT_M: f64 = 50.0;

/// Mean Earth radius used for great-circle distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const _: () = assert!(SPEED_ACTIVE_KPH < SPEED_MAX_VALID_KPH);
const _: () = assert!(GPS_SAMPLE_MS < FIX_STALE_MS);

// =============================================================================
// Persistence / Housekeeping
// =============================================================================

/// Interval between timed metrics saves.
pub const SAVE_INTERVAL_MS: u64 = 60_000;

/// Heartbeat log and on-board LED toggle interval.
pub const HEARTBEAT_MS: u64 = 1_000;

const _: () = assert!(GPS_SAMPLE_MS < SAVE_INTERVAL_MS);
