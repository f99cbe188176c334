//! Fixed 16-byte activity summary for the beacon collaborator.
//!
//! ```text
//! offset  size  field
//!  0      4     date YYYYMMDD (LE u32)
//!  4      4     distance, whole meters (LE u32)
//!  8      2     average speed, cm/s (LE u16)
//! 10      2     max speed, cm/s (LE u16)
//! 12      2     last update, minutes since midnight (LE u16)
//! 14      1     flags: bit0 fix valid, bit1 has data
//! 15      1     XOR of bytes 0..15
//! ```
//!
//! Numeric fields saturate at their width instead of wrapping.

use crate::metrics::DailyMetrics;
use crate::storage::xor_checksum;

/// Encoded payload length.
pub const SUMMARY_LEN: usize = 16;

/// Flag bit: the receiver currently has a valid fix.
pub const FLAG_FIX_VALID: u8 = 1 << 0;

/// Flag bit: distance or active time recorded today.
pub const FLAG_HAS_DATA: u8 = 1 << 1;

/// Decoded view of a summary payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryPayload {
    pub date: u32,
    pub distance_m: u32,
    pub avg_speed_cms: u16,
    pub max_speed_cms: u16,
    pub last_update_min: u16,
    pub flags: u8,
}

impl SummaryPayload {
    /// Summarize the day's metrics.
    pub fn from_metrics(
        metrics: &DailyMetrics,
        fix_valid: bool,
    ) -> Self {
        let mut flags = 0;
        if fix_valid {
            flags |= FLAG_FIX_VALID;
        }
        if metrics.has_data() {
            flags |= FLAG_HAS_DATA;
        }
        Self {
            date: metrics.date,
            distance_m: metrics.distance_m as u32,
            avg_speed_cms: kph_to_cms(metrics.average_speed_kph()),
            max_speed_cms: kph_to_cms(metrics.max_speed_kph),
            last_update_min: metrics.last_update_min,
            flags,
        }
    }

    /// Build the wire payload directly from metrics.
    pub fn build(
        metrics: &DailyMetrics,
        fix_valid: bool,
    ) -> [u8; SUMMARY_LEN] {
        Self::from_metrics(metrics, fix_valid).encode()
    }

    pub fn encode(&self) -> [u8; SUMMARY_LEN] {
        let mut out = [0u8; SUMMARY_LEN];
        out[0..4].copy_from_slice(&self.date.to_le_bytes());
        out[4..8].copy_from_slice(&self.distance_m.to_le_bytes());
        out[8..10].copy_from_slice(&self.avg_speed_cms.to_le_bytes());
        out[10..12].copy_from_slice(&self.max_speed_cms.to_le_bytes());
        out[12..14].copy_from_slice(&self.last_update_min.to_le_bytes());
        out[14] = self.flags;
        out[15] = xor_checksum(&out[..15]);
        out
    }

    /// Decode a payload, rejecting it when the checksum does not match.
    pub fn parse(bytes: &[u8; SUMMARY_LEN]) -> Option<Self> {
        if xor_checksum(&bytes[..15]) != bytes[15] {
            return None;
        }
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Some(Self {
            date: u32_at(0),
            distance_m: u32_at(4),
            avg_speed_cms: u16_at(8),
            max_speed_cms: u16_at(10),
            last_update_min: u16_at(12),
            flags: bytes[14],
        })
    }

    #[inline]
    pub const fn fix_valid(&self) -> bool { self.flags & FLAG_FIX_VALID != 0 }

    #[inline]
    pub const fn has_data(&self) -> bool { self.flags & FLAG_HAS_DATA != 0 }
}

/// km/h to cm/s rounded to nearest, saturating at `u16::MAX` (float casts saturate, NaN maps to 0).
#[inline]
fn kph_to_cms(kph: f32) -> u16 { (kph / 3.6 * 100.0 + 0.5) as u16 }

// =============================================================================
// Unit Tests
// =============================================================================
