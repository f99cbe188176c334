//! Owner of the active [`RuntimeConfig`]: load, validate, swap, persist.
//!
//! The configuration surface never edits the active record in place. Every
//! change builds a complete candidate, validates it, publishes it with a single
//! assignment and only then writes it to storage. A rejected candidate leaves
//! the active configuration untouched.

use super::runtime::{
    BUCKET_COUNT,
    CONFIG_VERSION,
    ConfigError,
    EffectParams,
    RuntimeConfig,
    THRESHOLD_COUNT,
    copy_bounded,
};
use crate::storage::{KeyValueStore, RecordKey, RecordReader, RecordWriter, StorageError, verify_checksum};

// =============================================================================
// Record Codec
// =============================================================================

/// First byte of every config record.
const CONFIG_MAGIC: u8 = 0xCF;

/// Upper bound of an encoded config record.
pub const CONFIG_RECORD_MAX: usize = 1 // magic
    + 2 // version
    + 1 // brightness
    + THRESHOLD_COUNT * 4
    + BUCKET_COUNT * 4
    + (1 + super::runtime::SSID_MAX_LEN)
    + (1 + super::runtime::PASSPHRASE_MAX_LEN)
    + (1 + super::runtime::HOSTNAME_MAX_LEN)
    + 1; // checksum

const _: () = assert!(CONFIG_RECORD_MAX <= crate::storage::RECORD_MAX);

/// Serialize a configuration into `buf`, returning the record length.
pub fn encode_config(
    config: &RuntimeConfig,
    buf: &mut [u8],
) -> Result<usize, StorageError> {
    let mut w = RecordWriter::new(buf);
    w.u8(CONFIG_MAGIC)?;
    w.u16(config.version)?;
    w.u8(config.brightness)?;
    for t in config.thresholds {
        w.f32(t)?;
    }
    for e in &config.effects {
        w.bytes(&[e.primary, e.secondary, e.speed, e.intensity])?;
    }
    w.str(&config.ap_ssid)?;
    w.str(&config.ap_pass)?;
    w.str(&config.hostname)?;
    w.finish()
}

/// Parse a stored configuration record.
///
/// Only framing is checked here; semantic rules are applied by
/// [`RuntimeConfig::validate`].
pub fn decode_config(record: &[u8]) -> Result<RuntimeConfig, StorageError> {
    let body = verify_checksum(record)?;
    let mut r = RecordReader::new(body);

    if r.u8()? != CONFIG_MAGIC {
        return Err(StorageError::Corrupt);
    }
    let version = r.u16()?;
    if version != CONFIG_VERSION {
        return Err(StorageError::VersionMismatch);
    }
    let brightness = r.u8()?;

    let mut thresholds = [0.0f32; THRESHOLD_COUNT];
    for t in &mut thresholds {
        *t = r.f32()?;
    }

    let mut effects = [EffectParams::new(0, 0, 0, 0); BUCKET_COUNT];
    for e in &mut effects {
        let raw = r.take(4)?;
        *e = EffectParams::new(raw[0], raw[1], raw[2], raw[3]);
    }

    let corrupt = |_| StorageError::Corrupt;
    let ap_ssid = copy_bounded(r.str()?, ConfigError::SsidTooLong).map_err(corrupt)?;
    let ap_pass = copy_bounded(r.str()?, ConfigError::PassphraseTooLong).map_err(corrupt)?;
    let hostname = copy_bounded(r.str()?, ConfigError::HostnameInvalid).map_err(corrupt)?;
    r.finish()?;

    Ok(RuntimeConfig {
        version,
        brightness,
        thresholds,
        effects,
        ap_ssid,
        ap_pass,
        hostname,
    })
}

// =============================================================================
// Configuration Surface
// =============================================================================

/// Partial write from the configuration surface. `None` keeps the current value.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ConfigUpdate<'a> {
    pub brightness: Option<u8>,
    pub thresholds: Option<[f32; THRESHOLD_COUNT]>,
    /// Per-bucket replacement, indexed by bucket number minus one.
    pub effects: [Option<EffectParams>; BUCKET_COUNT],
    pub ap_ssid: Option<&'a str>,
    pub ap_pass: Option<&'a str>,
    pub hostname: Option<&'a str>,
}

impl ConfigUpdate<'_> {
    /// Overlay this update onto `base`, producing an unvalidated candidate.
    pub fn merge(
        &self,
        base: &RuntimeConfig,
    ) -> Result<RuntimeConfig, ConfigError> {
        let mut next = base.clone();
        if let Some(b) = self.brightness {
            next.brightness = b;
        }
        if let Some(t) = self.thresholds {
            next.thresholds = t;
        }
        for (slot, update) in next.effects.iter_mut().zip(self.effects) {
            if let Some(e) = update {
                *slot = e;
            }
        }
        if let Some(s) = self.ap_ssid {
            next.ap_ssid = copy_bounded(s, ConfigError::SsidTooLong)?;
        }
        if let Some(s) = self.ap_pass {
            next.ap_pass = copy_bounded(s, ConfigError::PassphraseTooLong)?;
        }
        if let Some(s) = self.hostname {
            next.hostname = copy_bounded(s, ConfigError::HostnameInvalid)?;
        }
        Ok(next)
    }
}

/// Why the stored configuration was not used at boot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum DefaultReason {
    /// Missing, damaged or from another layout version.
    Storage(StorageError),
    /// Decoded fine but broke a validation rule.
    Invalid(ConfigError),
}

/// Where the active configuration came from at boot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum ConfigSource {
    Stored,
    Defaulted {
        reason: DefaultReason,
        /// Result of writing the defaults back.
        persisted: Result<(), StorageError>,
    },
}

/// Single owner of the active configuration.
#[derive(Debug)]
pub struct ConfigStore {
    active: RuntimeConfig,
    generation: u32,
}

impl ConfigStore {
    /// Store holding `config` without touching storage.
    pub const fn with_config(config: RuntimeConfig) -> Self {
        Self {
            active: config,
            generation: 0,
        }
    }

    /// Load the stored configuration, replacing anything unusable by defaults
    /// and writing those back.
    pub fn load(kv: &mut impl KeyValueStore) -> (Self, ConfigSource) {
        let reason = match read_config(kv) {
            Ok(config) => match config.validate() {
                Ok(()) => return (Self::with_config(config), ConfigSource::Stored),
                Err(err) => DefaultReason::Invalid(err),
            },
            Err(err) => DefaultReason::Storage(err),
        };

        let store = Self::with_config(RuntimeConfig::default());
        let persisted = store.persist(kv);
        (store, ConfigSource::Defaulted { reason, persisted })
    }

    /// Apply a partial update: merge, validate, swap, persist.
    pub fn apply(
        &mut self,
        update: &ConfigUpdate<'_>,
        kv: &mut impl KeyValueStore,
    ) -> Result<(), ConfigError> {
        let candidate = update.merge(&self.active)?;
        self.replace(candidate, kv)
    }

    /// Replace the whole configuration: validate, swap, persist.
    ///
    /// On [`ConfigError::PersistFailed`] the new configuration is already active.
    pub fn replace(
        &mut self,
        mut candidate: RuntimeConfig,
        kv: &mut impl KeyValueStore,
    ) -> Result<(), ConfigError> {
        candidate.version = CONFIG_VERSION;
        candidate.validate()?;

        self.active = candidate;
        self.generation = self.generation.wrapping_add(1);

        self.persist(kv).map_err(|_| ConfigError::PersistFailed)
    }

    /// Currently published configuration.
    #[inline]
    pub const fn active(&self) -> &RuntimeConfig { &self.active }

    /// Incremented on every successful swap.
    #[inline]
    pub const fn generation(&self) -> u32 { self.generation }

    fn persist(
        &self,
        kv: &mut impl KeyValueStore,
    ) -> Result<(), StorageError> {
        let mut buf = [0u8; CONFIG_RECORD_MAX];
        let len = encode_config(&self.active, &mut buf)?;
        kv.write(RecordKey::Config, &buf[..len])
    }
}

impl Default for ConfigStore {
    fn default() -> Self { Self::with_config(RuntimeConfig::default()) }
}

fn read_config(kv: &mut impl KeyValueStore) -> Result<RuntimeConfig, StorageError> {
    let mut buf = [0u8; CONFIG_RECORD_MAX];
    let len = kv.read(RecordKey::Config, &mut buf)?;
    decode_config(&buf[..len])
}

// =============================================================================
// Unit Tests
// =============================================================================
