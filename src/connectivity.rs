//! Read-only view of the wireless connectivity collaborator.
//!
//! The radio stack itself lives outside this crate. The renderer only needs
//! the coarse link state and whether station credentials exist, sampled once
//! per frame.

/// Coarse link state reported by the connectivity manager.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectivityState {
    /// Joined to the configured station network.
    StationConnected,
    /// Attempting to join the station network.
    StationConnecting,
    /// Broadcasting the fallback access point.
    AccessPoint,
    /// No radio active.
    Offline,
}

/// Source of connectivity status for the render loop.
pub trait Connectivity {
    fn state(&self) -> ConnectivityState;

    /// Whether station credentials are configured.
    fn station_configured(&self) -> bool;
}

/// Connectivity for builds without a radio.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadioOff;

impl Connectivity for RadioOff {
    #[inline]
    fn state(&self) -> ConnectivityState { ConnectivityState::Offline }

    #[inline]
    fn station_configured(&self) -> bool { false }
}

/// Fixed connectivity snapshot, handy for tests and bench setups.
#[derive(Clone, Copy, Debug)]
pub struct StaticLink {
    pub state: ConnectivityState,
    pub station_configured: bool,
}

impl Connectivity for StaticLink {
    #[inline]
    fn state(&self) -> ConnectivityState { self.state }

    #[inline]
    fn station_configured(&self) -> bool { self.station_configured }
}

// =============================================================================
// Unit Tests
// =============================================================================
