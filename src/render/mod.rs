//! LED rendering: tier resolution, status colors and body effects.
//!
//! - [`tier`]: per-frame priority (critical / access point warning / normal)
//! - [`effects`]: the 12-entry effect catalog and per-strip animation state
//! - [`fire`]: heat-diffusion flame simulation
//! - [`engine`]: composes both strips into a [`Frame`]
//! - [`colors`], [`math8`]: palettes and 8-bit color math

pub mod colors;
pub mod effects;
pub mod engine;
pub mod fire;
pub mod math8;
pub mod tier;

pub use effects::{Effect, StripState};
pub use engine::{Frame, RenderEngine};
pub use tier::{FrameInputs, RenderTier, StatusIndication, resolve_tier};
