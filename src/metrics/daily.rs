//! Per-day activity totals and their persisted record.

use crate::storage::{RecordReader, RecordWriter, StorageError, verify_checksum};

/// High nibble of the metrics record header.
const METRICS_MAGIC: u8 = 0xD0;

/// Layout version in the low nibble of the header.
pub const METRICS_VERSION: u8 = 1;

/// Encoded record length: header, date, distance, active, max speed, last update, checksum.
pub const METRICS_RECORD_LEN: usize = 1 + 4 + 8 + 4 + 4 + 2 + 1;

/// Rolling totals for one calendar day.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DailyMetrics {
    /// Day the totals belong to, `YYYYMMDD` (0 before the first dated fix).
    pub date: u32,
    /// Accumulated ground distance in meters.
    pub distance_m: f64,
    /// Accumulated time spent moving, in milliseconds.
    pub active_ms: u32,
    /// Highest accepted speed in km/h.
    pub max_speed_kph: f32,
    /// Minutes since midnight of the last timestamped fix.
    pub last_update_min: u16,
}

impl DailyMetrics {
    pub const fn new() -> Self {
        Self {
            date: 0,
            distance_m: 0.0,
            active_ms: 0,
            max_speed_kph: 0.0,
            last_update_min: 0,
        }
    }

    /// Fresh totals for `date`.
    pub const fn for_date(date: u32) -> Self {
        Self {
            date,
            ..Self::new()
        }
    }

    /// Average speed over active time in km/h, 0 when never active.
    pub fn average_speed_kph(&self) -> f32 {
        if self.active_ms == 0 {
            return 0.0;
        }
        let active_s = f64::from(self.active_ms) / 1000.0;
        (self.distance_m / active_s * 3.6) as f32
    }

    /// Whether anything was recorded for the day.
    #[inline]
    pub fn has_data(&self) -> bool { self.distance_m > 0.0 || self.active_ms > 0 }

    /// Serialize into `buf`, returning the record length.
    pub fn encode(
        &self,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        let mut w = RecordWriter::new(buf);
        w.u8(METRICS_MAGIC | METRICS_VERSION)?;
        w.u32(self.date)?;
        w.f64(self.distance_m)?;
        w.u32(self.active_ms)?;
        w.f32(self.max_speed_kph)?;
        w.u16(self.last_update_min)?;
        w.finish()
    }

    /// Parse a stored record, rejecting foreign, stale or damaged data.
    pub fn decode(record: &[u8]) -> Result<Self, StorageError> {
        let body = verify_checksum(record)?;
        let mut r = RecordReader::new(body);

        let header = r.u8()?;
        if header & 0xF0 != METRICS_MAGIC {
            return Err(StorageError::Corrupt);
        }
        if header & 0x0F != METRICS_VERSION {
            return Err(StorageError::VersionMismatch);
        }

        let metrics = Self {
            date: r.u32()?,
            distance_m: r.f64()?,
            active_ms: r.u32()?,
            max_speed_kph: r.f32()?,
            last_update_min: r.u16()?,
        };
        r.finish()?;

        if !metrics.distance_m.is_finite() || metrics.distance_m < 0.0 || !metrics.max_speed_kph.is_finite() {
            return Err(StorageError::Corrupt);
        }
        Ok(metrics)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
