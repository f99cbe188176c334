//! Device configuration.
//!
//! - [`layout`]: LED strip geometry and render timing constants
//! - [`tracking`]: GNSS sampling, activity and persistence constants
//! - [`runtime`]: the runtime-tunable [`RuntimeConfig`] and its validation rules
//! - [`store`]: the [`ConfigStore`] that owns, swaps and persists the active config

pub mod layout;
pub mod runtime;
pub mod store;
pub mod tracking;

pub use layout::*;
pub use runtime::{
    BUCKET_COUNT,
    CONFIG_VERSION,
    ConfigError,
    EFFECT_ID_MAX,
    EffectParams,
    RuntimeConfig,
    SpeedBucket,
    THRESHOLD_COUNT,
};
pub use store::{ConfigSource, ConfigStore, ConfigUpdate, DefaultReason};
pub use tracking::*;
