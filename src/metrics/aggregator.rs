//! Stateful integration of GNSS fixes into [`DailyMetrics`].
//!
//! # Sample Gating
//!
//! Every fix may update the day key and the last-update time, but only
//! **valid** fixes at a **plausible** speed (at most `SPEED_MAX_VALID_KPH`)
//! contribute distance, active time and max speed, and only one such sample
//! is integrated per `GPS_SAMPLE_MS` of wall clock time. The very first
//! sample after start-up or a rollover is accepted immediately.
//!
//! # Jump Rejection
//!
//! The distance between consecutive accepted samples is added only when it is
//! shorter than `MAX_SEGMENT_M`. Longer segments are receiver jumps: they
//! add nothing, but the new position still replaces the old one so tracking
//! resumes from there.
//!
//! # Persistence
//!
//! Totals are written on day rollover and every `SAVE_INTERVAL_MS` via
//! [`MetricsAggregator::tick`]. A failed write is reported to the caller and
//! never alters the in-memory totals. A damaged or foreign record found at
//! boot is overwritten with zeroed totals straight away.

use super::daily::{DailyMetrics, METRICS_RECORD_LEN};
use super::geo::haversine_m;
use crate::config::{GPS_SAMPLE_MS, MAX_SEGMENT_M, SAVE_INTERVAL_MS, SPEED_ACTIVE_KPH, SPEED_MAX_VALID_KPH};
use crate::gnss::Fix;
use crate::storage::{KeyValueStore, RecordKey, StorageError};

/// What happened to the speed/position part of a fix.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum SampleOutcome {
    /// Fix not valid; only day/time bookkeeping applied.
    NoFix,
    /// Speed above the plausibility limit.
    SpeedRejected,
    /// Less than one sample interval since the previous accepted sample.
    Throttled,
    /// First accepted sample of the day; establishes the start position.
    First,
    /// Segment added to the distance.
    Segment { meters: f64 },
    /// Segment too long to be real movement; position reset without distance.
    JumpRejected { meters: f64 },
}

impl SampleOutcome {
    /// Whether the sample updated position and totals.
    #[inline]
    pub const fn accepted(&self) -> bool {
        matches!(self, Self::First | Self::Segment { .. } | Self::JumpRejected { .. })
    }
}

/// Result of ingesting one fix.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct MetricsUpdate {
    /// The fix started a new day and the totals were reset.
    pub rolled_over: bool,
    pub sample: SampleOutcome,
    /// Outcome of the immediate save that follows a rollover.
    pub persist: Option<Result<(), StorageError>>,
}

/// Where the totals came from at boot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum MetricsSource {
    Stored,
    /// Nothing restored and nothing overwritten (no record, or the medium failed).
    Fresh(StorageError),
    /// Damaged or foreign record replaced by zeroed totals.
    Reset {
        reason: StorageError,
        /// Result of writing the zeroed record back.
        persisted: Result<(), StorageError>,
    },
}

/// Owner of the day's totals.
#[derive(Debug)]
pub struct MetricsAggregator {
    metrics: DailyMetrics,
    last_position: Option<(f64, f64)>,
    last_sample_ms: Option<u64>,
    last_save_ms: u64,
}

impl MetricsAggregator {
    /// Aggregator starting from zeroed totals.
    pub const fn new() -> Self { Self::with_metrics(DailyMetrics::new()) }

    pub const fn with_metrics(metrics: DailyMetrics) -> Self {
        Self {
            metrics,
            last_position: None,
            last_sample_ms: None,
            last_save_ms: 0,
        }
    }

    /// Restore persisted totals, falling back to zero on any storage error.
    ///
    /// A corrupt or version-mismatched record is rewritten with the zeroed
    /// totals; a missing record or a failing medium is left alone.
    pub fn restore(kv: &mut impl KeyValueStore) -> (Self, MetricsSource) {
        match load_metrics(kv) {
            Ok(metrics) => (Self::with_metrics(metrics), MetricsSource::Stored),
            Err(reason @ (StorageError::Corrupt | StorageError::VersionMismatch)) => {
                let mut agg = Self::new();
                let persisted = agg.save(0, kv);
                (agg, MetricsSource::Reset { reason, persisted })
            }
            Err(err) => (Self::new(), MetricsSource::Fresh(err)),
        }
    }

    /// Integrate one fix.
    pub fn ingest(
        &mut self,
        fix: &Fix,
        now_ms: u64,
        kv: &mut impl KeyValueStore,
    ) -> MetricsUpdate {
        let mut rolled_over = false;
        let mut persist = None;

        if fix.date != 0 && fix.date != self.metrics.date {
            self.metrics = DailyMetrics::for_date(fix.date);
            self.last_position = None;
            self.last_sample_ms = None;
            rolled_over = true;
            persist = Some(self.save(now_ms, kv));
        }

        if fix.time_min > 0 {
            self.metrics.last_update_min = fix.time_min;
        }

        MetricsUpdate {
            rolled_over,
            sample: self.accumulate(fix, now_ms),
            persist,
        }
    }

    fn accumulate(
        &mut self,
        fix: &Fix,
        now_ms: u64,
    ) -> SampleOutcome {
        if !fix.valid {
            return SampleOutcome::NoFix;
        }
        if fix.speed_kph.is_nan() || fix.speed_kph > SPEED_MAX_VALID_KPH {
            return SampleOutcome::SpeedRejected;
        }
        if let Some(last) = self.last_sample_ms {
            if now_ms.saturating_sub(last) < GPS_SAMPLE_MS {
                return SampleOutcome::Throttled;
            }
        }
        self.last_sample_ms = Some(now_ms);

        let outcome = match self.last_position {
            None => SampleOutcome::First,
            Some((lat, lon)) => {
                let meters = haversine_m(lat, lon, fix.lat, fix.lon);
                if meters < MAX_SEGMENT_M {
                    self.metrics.distance_m += meters;
                    SampleOutcome::Segment { meters }
                } else {
                    SampleOutcome::JumpRejected { meters }
                }
            }
        };
        self.last_position = Some((fix.lat, fix.lon));

        if fix.speed_kph > SPEED_ACTIVE_KPH {
            self.metrics.active_ms = self.metrics.active_ms.saturating_add(GPS_SAMPLE_MS as u32);
        }
        if fix.speed_kph > self.metrics.max_speed_kph {
            self.metrics.max_speed_kph = fix.speed_kph;
        }
        outcome
    }

    /// Timed persistence; `None` while the save interval has not elapsed.
    pub fn tick(
        &mut self,
        now_ms: u64,
        kv: &mut impl KeyValueStore,
    ) -> Option<Result<(), StorageError>> {
        if now_ms.saturating_sub(self.last_save_ms) < SAVE_INTERVAL_MS {
            return None;
        }
        Some(self.save(now_ms, kv))
    }

    fn save(
        &mut self,
        now_ms: u64,
        kv: &mut impl KeyValueStore,
    ) -> Result<(), StorageError> {
        self.last_save_ms = now_ms;
        let mut buf = [0u8; METRICS_RECORD_LEN];
        let len = self.metrics.encode(&mut buf)?;
        kv.write(RecordKey::Metrics, &buf[..len])
    }

    #[inline]
    pub const fn metrics(&self) -> &DailyMetrics { &self.metrics }

    /// Position of the last accepted sample of the current day.
    #[inline]
    pub const fn last_position(&self) -> Option<(f64, f64)> { self.last_position }
}

impl Default for MetricsAggregator {
    fn default() -> Self { Self::new() }
}

fn load_metrics(kv: &mut impl KeyValueStore) -> Result<DailyMetrics, StorageError> {
    let mut buf = [0u8; METRICS_RECORD_LEN];
    let len = kv.read(RecordKey::Metrics, &mut buf)?;
    DailyMetrics::decode(&buf[..len])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnss::parse_rmc;
    use crate::metrics::geo::METERS_PER_DEG_LAT;
    use crate::storage::{MemoryStore, xor_checksum};

    const DAY1: u32 = 20_240_315;
    const DAY2: u32 = 20_240_316;

    fn fix_at(
        lat: f64,
        speed_kph: f32,
        date: u32,
    ) -> Fix {
        Fix {
            lat,
            lon: 11.0,
            speed_kph,
            valid: true,
            time_min: 600,
            date,
        }
    }

    fn north(meters: f64) -> f64 { 48.0 + meters / METERS_PER_DEG_LAT }

    #[test]
    fn test_first_sample_accepted_immediately() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        let update = agg.ingest(&fix_at(48.0, 5.0, DAY1), 0, &mut kv);
        assert_eq!(update.sample, SampleOutcome::First);
        assert_eq!(agg.last_position(), Some((48.0, 11.0)));
        assert_eq!(agg.metrics().active_ms, 1000);
        assert_eq!(agg.metrics().max_speed_kph, 5.0);
    }

    #[test]
    fn test_ten_meter_step_accumulates() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv);
        let update = agg.ingest(&fix_at(north(10.0), 3.0, DAY1), 1000, &mut kv);
        assert!(matches!(update.sample, SampleOutcome::Segment { .. }));
        assert!((agg.metrics().distance_m - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_jump_discarded_but_position_updated() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv);
        let update = agg.ingest(&fix_at(north(80.0), 3.0, DAY1), 1000, &mut kv);
        assert!(matches!(update.sample, SampleOutcome::JumpRejected { meters } if (meters - 80.0).abs() < 0.01));
        assert_eq!(agg.metrics().distance_m, 0.0);
        assert_eq!(agg.last_position(), Some((north(80.0), 11.0)));

        // Tracking resumes from the jumped-to position.
        agg.ingest(&fix_at(north(90.0), 3.0, DAY1), 2000, &mut kv);
        assert!((agg.metrics().distance_m - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_samples_throttled_to_interval() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv);
        let update = agg.ingest(&fix_at(north(5.0), 3.0, DAY1), 999, &mut kv);
        assert_eq!(update.sample, SampleOutcome::Throttled);
        assert_eq!(agg.metrics().distance_m, 0.0);
        assert_eq!(agg.metrics().active_ms, 1000);
    }

    #[test]
    fn test_speed_spike_rejected() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        let update = agg.ingest(&fix_at(48.0, 41.0, DAY1), 0, &mut kv);
        assert_eq!(update.sample, SampleOutcome::SpeedRejected);
        assert_eq!(agg.metrics().max_speed_kph, 0.0);
        assert_eq!(agg.last_position(), None);

        let update = agg.ingest(&fix_at(48.0, 40.0, DAY1), 10, &mut kv);
        assert_eq!(update.sample, SampleOutcome::First);
    }

    #[test]
    fn test_sample_outcome_accepted() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        assert!(agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv).sample.accepted());
        assert!(!agg.ingest(&fix_at(north(5.0), 3.0, DAY1), 500, &mut kv).sample.accepted());
        assert!(!agg.ingest(&fix_at(north(5.0), 45.0, DAY1), 1000, &mut kv).sample.accepted());
        assert!(agg.ingest(&fix_at(north(200.0), 3.0, DAY1), 1000, &mut kv).sample.accepted());
    }

    #[test]
    fn test_slow_samples_not_active() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(48.0, 0.7, DAY1), 0, &mut kv);
        assert_eq!(agg.metrics().active_ms, 0);
    }

    #[test]
    fn test_invalid_fix_updates_only_bookkeeping() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        let mut fix = fix_at(48.0, 5.0, DAY1);
        fix.valid = false;
        fix.time_min = 615;
        let update = agg.ingest(&fix, 0, &mut kv);
        assert_eq!(update.sample, SampleOutcome::NoFix);
        assert!(update.rolled_over);
        assert_eq!(agg.metrics().date, DAY1);
        assert_eq!(agg.metrics().last_update_min, 615);
        assert_eq!(agg.metrics().active_ms, 0);
    }

    #[test]
    fn test_unrecognized_lines_leave_state_unchanged() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv);
        let before = *agg.metrics();
        let writes = kv.writes();

        for line in ["$GPGGA,101530,4807.038,N,01131.000,E,1,08", "garbage", "$GNRMC,1,A,bad"] {
            if let Some(fix) = parse_rmc(line) {
                agg.ingest(&fix, 5000, &mut kv);
            }
        }
        assert_eq!(*agg.metrics(), before);
        assert_eq!(kv.writes(), writes);
    }

    #[test]
    fn test_day_rollover_resets_totals() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 8.0, DAY1), 0, &mut kv);
        agg.ingest(&fix_at(north(10.0), 8.0, DAY1), 1000, &mut kv);
        assert!(agg.metrics().distance_m > 0.0);
        let writes = kv.writes();

        let mut next = fix_at(north(20.0), 2.0, DAY2);
        next.valid = false;
        let update = agg.ingest(&next, 1500, &mut kv);
        assert!(update.rolled_over);
        assert_eq!(update.persist, Some(Ok(())));
        assert_eq!(kv.writes(), writes + 1);

        let m = agg.metrics();
        assert_eq!(m.date, DAY2);
        assert_eq!(m.distance_m, 0.0);
        assert_eq!(m.active_ms, 0);
        assert_eq!(m.max_speed_kph, 0.0);
        assert_eq!(agg.last_position(), None);
    }

    #[test]
    fn test_undated_fix_does_not_roll_over() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv);
        let update = agg.ingest(&fix_at(north(10.0), 3.0, 0), 1000, &mut kv);
        assert!(!update.rolled_over);
        assert_eq!(agg.metrics().date, DAY1);
        assert!(agg.metrics().distance_m > 9.9);
    }

    #[test]
    fn test_timed_persistence() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(48.0, 3.0, 0), 0, &mut kv);

        assert_eq!(agg.tick(59_999, &mut kv), None);
        assert_eq!(agg.tick(60_000, &mut kv), Some(Ok(())));
        assert_eq!(agg.tick(60_050, &mut kv), None);
        assert_eq!(agg.tick(120_000, &mut kv), Some(Ok(())));
        assert_eq!(kv.writes(), 2);
    }

    #[test]
    fn test_persist_failure_keeps_totals() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 3.0, DAY1), 0, &mut kv);
        agg.ingest(&fix_at(north(10.0), 3.0, DAY1), 1000, &mut kv);
        let before = *agg.metrics();

        kv.set_fail_writes(true);
        assert_eq!(agg.tick(60_000, &mut kv), Some(Err(StorageError::Backend)));
        assert_eq!(*agg.metrics(), before);
    }

    #[test]
    fn test_restore_roundtrip_and_corruption() {
        let mut kv = MemoryStore::new();
        let mut agg = MetricsAggregator::new();
        agg.ingest(&fix_at(north(0.0), 6.0, DAY1), 0, &mut kv);
        agg.ingest(&fix_at(north(12.0), 6.0, DAY1), 1000, &mut kv);
        agg.tick(60_000, &mut kv).unwrap().unwrap();

        let (restored, source) = MetricsAggregator::restore(&mut kv);
        assert_eq!(source, MetricsSource::Stored);
        assert_eq!(restored.metrics(), agg.metrics());
        assert_eq!(restored.last_position(), None);

        kv.raw_mut(RecordKey::Metrics).unwrap()[3] ^= 0xFF;
        let writes = kv.writes();
        let (restored, source) = MetricsAggregator::restore(&mut kv);
        assert_eq!(
            source,
            MetricsSource::Reset {
                reason: StorageError::Corrupt,
                persisted: Ok(()),
            }
        );
        assert_eq!(*restored.metrics(), DailyMetrics::new());

        // The zeroed record replaced the damaged one.
        assert_eq!(kv.writes(), writes + 1);
        let (again, source) = MetricsAggregator::restore(&mut kv);
        assert_eq!(source, MetricsSource::Stored);
        assert_eq!(*again.metrics(), DailyMetrics::new());
    }

    #[test]
    fn test_restore_rewrites_foreign_version() {
        let mut kv = MemoryStore::new();
        let mut buf = [0u8; METRICS_RECORD_LEN];
        let len = DailyMetrics::for_date(DAY1).encode(&mut buf).unwrap();
        buf[0] = (buf[0] & 0xF0) | ((buf[0] + 1) & 0x0F);
        buf[len - 1] = xor_checksum(&buf[..len - 1]);
        kv.write(RecordKey::Metrics, &buf[..len]).unwrap();

        let (agg, source) = MetricsAggregator::restore(&mut kv);
        assert_eq!(
            source,
            MetricsSource::Reset {
                reason: StorageError::VersionMismatch,
                persisted: Ok(()),
            }
        );
        assert_eq!(agg.metrics().date, 0);
        assert_eq!(MetricsAggregator::restore(&mut kv).1, MetricsSource::Stored);
    }

    #[test]
    fn test_restore_reports_failed_rewrite() {
        let mut kv = MemoryStore::new();
        kv.write(RecordKey::Metrics, &[0x00, 0x00]).unwrap();
        kv.set_fail_writes(true);

        let (agg, source) = MetricsAggregator::restore(&mut kv);
        assert_eq!(
            source,
            MetricsSource::Reset {
                reason: StorageError::Corrupt,
                persisted: Err(StorageError::Backend),
            }
        );
        assert_eq!(*agg.metrics(), DailyMetrics::new());
    }

    #[test]
    fn test_restore_without_record() {
        let mut kv = MemoryStore::new();
        let (agg, source) = MetricsAggregator::restore(&mut kv);
        assert_eq!(source, MetricsSource::Fresh(StorageError::NotFound));
        assert_eq!(*agg.metrics(), DailyMetrics::new());
        assert_eq!(kv.writes(), 0);
    }
}
