//! Runtime-tunable parameters shared by the renderer and the configuration surface.
//!
//! [`RuntimeConfig`] is the validated parameter set: global brightness, the
//! five speed thresholds that split motion into six buckets, one
//! [`EffectParams`] record per bucket, and the network identity strings handed
//! to the connectivity collaborator.
//!
//! # Validation
//!
//! A configuration is only ever published whole. [`RuntimeConfig::validate`]
//! checks every invariant and reports the first failing rule as a
//! [`ConfigError`] with a stable numeric code:
//!
//! | Rule | Error |
//! |------|-------|
//! | brightness >= 1 | `BrightnessZero` |
//! | thresholds finite and >= 0 | `ThresholdInvalid` |
//! | thresholds strictly increasing | `ThresholdsNotIncreasing` |
//! | effect ids within the catalog | `EffectIdOutOfRange` |
//! | AP name 1..=32 bytes | `SsidEmpty` / `SsidTooLong` |
//! | passphrase empty or 8..=63 bytes | `PassphraseTooShort` / `PassphraseTooLong` |
//! | hostname 1..=32 of `[A-Za-z0-9-]`, no edge hyphen | `HostnameInvalid` |

use heapless::String;

use super::layout::LED_BRIGHTNESS;

// =============================================================================
// Limits
// =============================================================================

/// Number of speed thresholds.
pub const THRESHOLD_COUNT: usize = 5;

/// Number of speed buckets (one more than thresholds).
pub const BUCKET_COUNT: usize = THRESHOLD_COUNT + 1;

/// Highest valid effect id (catalog is `0..=EFFECT_ID_MAX`).
pub const EFFECT_ID_MAX: u8 = 11;

/// Current persisted layout version.
pub const CONFIG_VERSION: u16 = 1;

/// Maximum access point name length in bytes.
pub const SSID_MAX_LEN: usize = 32;

/// Minimum length of a non-empty passphrase.
pub const PASSPHRASE_MIN_LEN: usize = 8;

/// Maximum passphrase length in bytes.
pub const PASSPHRASE_MAX_LEN: usize = 63;

/// Maximum hostname length in bytes.
pub const HOSTNAME_MAX_LEN: usize = 32;

// =============================================================================
// Defaults
// =============================================================================

/// Default access point name.
pub const DEFAULT_AP_SSID: &str = "dog";

/// Default access point passphrase.
pub const DEFAULT_AP_PASS: &str = "Dog123456789";

/// Default resolvable hostname.
pub const DEFAULT_HOSTNAME: &str = "dog-collar";

/// Default speed thresholds in km/h (inclusive upper bounds of buckets 1..=5).
pub const DEFAULT_THRESHOLDS: [f32; THRESHOLD_COUNT] = [1.5, 4.0, 7.0, 12.0, 18.0];

/// Default per-bucket effects, calm at rest and energetic at a sprint.
pub const DEFAULT_EFFECTS: [EffectParams; BUCKET_COUNT] = [
    EffectParams::new(2, 2, 40, 128),   // resting: Breath
    EffectParams::new(1, 5, 70, 128),   // walking: Pulse / Sinelon
    EffectParams::new(3, 4, 110, 160),  // trotting: Chase / Comet
    EffectParams::new(7, 6, 150, 180),  // running: Juggle / Confetti
    EffectParams::new(9, 11, 190, 200), // fast: Rainbow / Gradient wave
    EffectParams::new(10, 10, 230, 220), // sprint: Fire
];

const _: () = assert!(DEFAULT_AP_SSID.len() <= SSID_MAX_LEN);
const _: () = assert!(DEFAULT_AP_PASS.len() >= PASSPHRASE_MIN_LEN);
const _: () = assert!(DEFAULT_AP_PASS.len() <= PASSPHRASE_MAX_LEN);
const _: () = assert!(DEFAULT_HOSTNAME.len() <= HOSTNAME_MAX_LEN);

// =============================================================================
// Effect Parameters
// =============================================================================

/// Animation parameters for one speed bucket.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectParams {
    /// Effect id rendered on strip A.
    pub primary: u8,
    /// Effect id rendered on strip B (dual-strip mode only).
    pub secondary: u8,
    /// Animation rate parameter.
    pub speed: u8,
    /// Fade / density / flame parameter.
    pub intensity: u8,
}

impl EffectParams {
    pub const fn new(
        primary: u8,
        secondary: u8,
        speed: u8,
        intensity: u8,
    ) -> Self {
        Self {
            primary,
            secondary,
            speed,
            intensity,
        }
    }

    /// Both effect ids are inside the catalog.
    #[inline]
    pub const fn ids_valid(&self) -> bool { self.primary <= EFFECT_ID_MAX && self.secondary <= EFFECT_ID_MAX }
}

// =============================================================================
// Speed Buckets
// =============================================================================

/// One of the six speed ranges, numbered 1..=6.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct SpeedBucket(u8);

impl SpeedBucket {
    /// Slowest bucket.
    pub const FIRST: Self = Self(1);
    /// Fastest bucket.
    pub const LAST: Self = Self(BUCKET_COUNT as u8);

    /// Bucket number, 1..=6.
    #[inline]
    pub const fn number(self) -> u8 { self.0 }

    /// Zero-based index into per-bucket tables.
    #[inline]
    pub const fn index(self) -> usize { (self.0 - 1) as usize }

    /// Bucket for a speed given ascending thresholds (inclusive upper bounds).
    ///
    /// `speed <= thresholds[0]` is bucket 1, anything above `thresholds[4]` is
    /// bucket 6. NaN falls through every comparison and lands in bucket 6.
    pub fn classify(
        speed_kph: f32,
        thresholds: &[f32; THRESHOLD_COUNT],
    ) -> Self {
        for (i, limit) in thresholds.iter().enumerate() {
            if speed_kph <= *limit {
                return Self(i as u8 + 1);
            }
        }
        Self::LAST
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Reason a configuration was rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[repr(u8)]
pub enum ConfigError {
    /// Brightness of 0 would blank the display permanently.
    #[error("brightness must be at least 1")]
    BrightnessZero = 1,
    /// A threshold is NaN, infinite or negative.
    #[error("speed threshold is not a finite non-negative number")]
    ThresholdInvalid = 2,
    /// Thresholds are not strictly increasing.
    #[error("speed thresholds are not strictly increasing")]
    ThresholdsNotIncreasing = 3,
    /// An effect id is outside the catalog.
    #[error("effect id out of range")]
    EffectIdOutOfRange = 4,
    /// Access point name is empty.
    #[error("access point name is empty")]
    SsidEmpty = 5,
    /// Access point name exceeds 32 bytes.
    #[error("access point name exceeds 32 bytes")]
    SsidTooLong = 6,
    /// Non-empty passphrase shorter than 8 bytes.
    #[error("passphrase shorter than 8 bytes")]
    PassphraseTooShort = 7,
    /// Passphrase exceeds 63 bytes.
    #[error("passphrase exceeds 63 bytes")]
    PassphraseTooLong = 8,
    /// Hostname empty, too long, or containing invalid characters.
    #[error("hostname invalid")]
    HostnameInvalid = 9,
    /// The new configuration is active but could not be written to storage.
    #[error("configuration applied but not persisted")]
    PersistFailed = 10,
}

impl ConfigError {
    /// Stable reason code reported to the configuration surface.
    #[inline]
    pub const fn code(self) -> u8 { self as u8 }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Validated, versioned parameter set.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuntimeConfig {
    pub version: u16,
    pub brightness: u8,
    pub thresholds: [f32; THRESHOLD_COUNT],
    pub effects: [EffectParams; BUCKET_COUNT],
    pub ap_ssid: String<SSID_MAX_LEN>,
    pub ap_pass: String<PASSPHRASE_MAX_LEN>,
    pub hostname: String<HOSTNAME_MAX_LEN>,
}

impl RuntimeConfig {
    /// Check every invariant, reporting the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brightness == 0 {
            return Err(ConfigError::BrightnessZero);
        }

        if self.thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::ThresholdInvalid);
        }
        if self.thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::ThresholdsNotIncreasing);
        }

        if !self.effects.iter().all(EffectParams::ids_valid) {
            return Err(ConfigError::EffectIdOutOfRange);
        }

        validate_ssid(&self.ap_ssid)?;
        validate_passphrase(&self.ap_pass)?;
        validate_hostname(&self.hostname)
    }

    /// Speed bucket for the current thresholds.
    #[inline]
    pub fn bucket_for_speed(
        &self,
        speed_kph: f32,
    ) -> SpeedBucket {
        SpeedBucket::classify(speed_kph, &self.thresholds)
    }

    /// Effect parameters for a bucket.
    #[inline]
    pub const fn effect_for(
        &self,
        bucket: SpeedBucket,
    ) -> EffectParams {
        self.effects[bucket.index()]
    }

    /// Whether the access point runs without a passphrase.
    #[inline]
    pub fn is_open_network(&self) -> bool { self.ap_pass.is_empty() }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            brightness: LED_BRIGHTNESS,
            thresholds: DEFAULT_THRESHOLDS,
            effects: DEFAULT_EFFECTS,
            ap_ssid: bounded(DEFAULT_AP_SSID),
            ap_pass: bounded(DEFAULT_AP_PASS),
            hostname: bounded(DEFAULT_HOSTNAME),
        }
    }
}

/// Copy a string that is known to fit (checked by the const asserts above).
fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    out.push_str(s).ok();
    out
}

/// Copy `s` into a bounded string, failing with `err` when it does not fit.
pub(crate) fn copy_bounded<const N: usize>(
    s: &str,
    err: ConfigError,
) -> Result<String<N>, ConfigError> {
    let mut out = String::new();
    out.push_str(s).map_err(|_| err)?;
    Ok(out)
}

fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() {
        Err(ConfigError::SsidEmpty)
    } else if ssid.len() > SSID_MAX_LEN {
        Err(ConfigError::SsidTooLong)
    } else {
        Ok(())
    }
}

fn validate_passphrase(pass: &str) -> Result<(), ConfigError> {
    match pass.len() {
        0 => Ok(()),
        n if n < PASSPHRASE_MIN_LEN => Err(ConfigError::PassphraseTooShort),
        n if n > PASSPHRASE_MAX_LEN => Err(ConfigError::PassphraseTooLong),
        _ => Ok(()),
    }
}

fn validate_hostname(hostname: &str) -> Result<(), ConfigError> {
    let bytes = hostname.as_bytes();
    let valid = !bytes.is_empty()
        && bytes.len() <= HOSTNAME_MAX_LEN
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        && bytes.first() != Some(&b'-')
        && bytes.last() != Some(&b'-');
    if valid { Ok(()) } else { Err(ConfigError::HostnameInvalid) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.brightness, 77);
        assert_eq!(config.ap_ssid.as_str(), "dog");
        assert_eq!(config.hostname.as_str(), "dog-collar");
        assert!(!config.is_open_network());
    }

    #[test]
    fn test_bucket_inclusive_upper_bounds() {
        let config = RuntimeConfig::default();
        assert_eq!(config.bucket_for_speed(0.0).number(), 1);
        assert_eq!(config.bucket_for_speed(1.5).number(), 1);
        assert_eq!(config.bucket_for_speed(4.0).number(), 2);
        assert_eq!(config.bucket_for_speed(4.01).number(), 3);
        assert_eq!(config.bucket_for_speed(18.0).number(), 5);
        assert_eq!(config.bucket_for_speed(18.01).number(), 6);
        assert_eq!(config.bucket_for_speed(100.0).number(), 6);
    }

    #[test]
    fn test_bucket_index_matches_effect_table() {
        let config = RuntimeConfig::default();
        let bucket = config.bucket_for_speed(100.0);
        assert_eq!(bucket.index(), BUCKET_COUNT - 1);
        assert_eq!(config.effect_for(bucket), DEFAULT_EFFECTS[5]);
        assert_eq!(config.effect_for(SpeedBucket::FIRST), DEFAULT_EFFECTS[0]);
    }

    #[test]
    fn test_rejects_decreasing_thresholds() {
        let mut config = RuntimeConfig::default();
        config.thresholds = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert_eq!(config.validate(), Err(ConfigError::ThresholdsNotIncreasing));
    }

    #[test]
    fn test_rejects_equal_thresholds() {
        let mut config = RuntimeConfig::default();
        config.thresholds = [1.0, 2.0, 2.0, 3.0, 4.0];
        assert_eq!(config.validate(), Err(ConfigError::ThresholdsNotIncreasing));
    }

    #[test]
    fn test_rejects_non_finite_threshold() {
        let mut config = RuntimeConfig::default();
        config.thresholds[2] = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::ThresholdInvalid));
        config.thresholds[2] = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::ThresholdInvalid));
    }

    #[test]
    fn test_rejects_effect_id_outside_catalog() {
        let mut config = RuntimeConfig::default();
        config.effects[3].secondary = 12;
        assert_eq!(config.validate(), Err(ConfigError::EffectIdOutOfRange));
        config.effects[3].secondary = EFFECT_ID_MAX;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_passphrase_rules() {
        let mut config = RuntimeConfig::default();
        config.ap_pass = bounded("abcde");
        assert_eq!(config.validate(), Err(ConfigError::PassphraseTooShort));

        config.ap_pass.clear();
        assert_eq!(config.validate(), Ok(()));
        assert!(config.is_open_network());

        config.ap_pass = bounded("12345678");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_brightness() {
        let mut config = RuntimeConfig::default();
        config.brightness = 0;
        assert_eq!(config.validate(), Err(ConfigError::BrightnessZero));
    }

    #[test]
    fn test_identity_rules() {
        let mut config = RuntimeConfig::default();
        config.ap_ssid.clear();
        assert_eq!(config.validate(), Err(ConfigError::SsidEmpty));

        let mut config = RuntimeConfig::default();
        config.hostname = bounded("-collar");
        assert_eq!(config.validate(), Err(ConfigError::HostnameInvalid));
        config.hostname = bounded("dog collar");
        assert_eq!(config.validate(), Err(ConfigError::HostnameInvalid));
        config.hostname = bounded("rex-2");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_copy_bounded_reports_overflow() {
        let long = "x".repeat(SSID_MAX_LEN + 1);
        let result: Result<String<SSID_MAX_LEN>, _> = copy_bounded(&long, ConfigError::SsidTooLong);
        assert_eq!(result, Err(ConfigError::SsidTooLong));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(ConfigError::BrightnessZero.to_string(), "brightness must be at least 1");
        assert_eq!(ConfigError::PassphraseTooShort.to_string(), "passphrase shorter than 8 bytes");
        assert_eq!(ConfigError::PersistFailed.to_string(), "configuration applied but not persisted");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_records_derive_serde() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}

        assert_serde::<RuntimeConfig>();
        assert_serde::<EffectParams>();
        assert_serde::<crate::gnss::Fix>();
        assert_serde::<crate::metrics::DailyMetrics>();
        assert_serde::<crate::summary::SummaryPayload>();
        assert_serde::<crate::connectivity::ConnectivityState>();
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ConfigError::BrightnessZero.code(), 1);
        assert_eq!(ConfigError::ThresholdsNotIncreasing.code(), 3);
        assert_eq!(ConfigError::EffectIdOutOfRange.code(), 4);
        assert_eq!(ConfigError::PassphraseTooShort.code(), 7);
        assert_eq!(ConfigError::PersistFailed.code(), 10);
    }
}
