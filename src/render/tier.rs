//! Per-frame priority resolution.
//!
//! Exactly one tier owns each frame; lower tiers are never blended in:
//!
//! 1. [`RenderTier::Critical`]: no valid fix and no station link for longer
//!    than `CRITICAL_NO_OK_MS`.
//! 2. [`RenderTier::AccessPointWarning`]: station credentials exist but the
//!    device fell back to broadcasting its own access point.
//! 3. [`RenderTier::Normal`]: status color plus the speed-mapped body effect.

use smart_leds::RGB8;

use super::colors::{AMBER, BLUE, GREEN};
use super::math8::{pulse_level, scale_color};
use crate::config::{CONNECTING_PULSE_MS, CRITICAL_NO_OK_MS, NO_FIX_PULSE_MS};
use crate::connectivity::{Connectivity, ConnectivityState};

/// Floor of the status pulses so the segment never goes fully dark.
const STATUS_PULSE_MIN: u8 = 20;

/// Everything the renderer looks at for one frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FrameInputs {
    pub now_ms: u64,
    pub fix_valid: bool,
    pub speed_kph: f32,
    pub connectivity: ConnectivityState,
    pub station_configured: bool,
}

impl FrameInputs {
    /// Build inputs, sampling the connectivity collaborator.
    pub fn sample(
        now_ms: u64,
        fix_valid: bool,
        speed_kph: f32,
        link: &impl Connectivity,
    ) -> Self {
        Self {
            now_ms,
            fix_valid,
            speed_kph,
            connectivity: link.state(),
            station_configured: link.station_configured(),
        }
    }

    /// Valid fix or station link.
    #[inline]
    pub fn is_healthy(&self) -> bool { self.fix_valid || self.connectivity == ConnectivityState::StationConnected }
}

/// Which rule owns the frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum RenderTier {
    Critical,
    AccessPointWarning,
    Normal,
}

/// Pick the tier for a frame, given how long the device has been unhealthy.
pub fn resolve_tier(
    inputs: &FrameInputs,
    ms_since_healthy: u64,
) -> RenderTier {
    if ms_since_healthy > CRITICAL_NO_OK_MS {
        RenderTier::Critical
    } else if inputs.station_configured && inputs.connectivity == ConnectivityState::AccessPoint {
        RenderTier::AccessPointWarning
    } else {
        RenderTier::Normal
    }
}

/// Meaning of the status segment in the normal tier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum StatusIndication {
    /// Solid green.
    Connected,
    /// Pulsing green.
    Connecting,
    /// Solid amber: access point up, no station credential.
    AccessPoint,
    /// Solid blue.
    FixValid,
    /// Pulsing blue.
    NoFix,
}

impl StatusIndication {
    /// Network states take precedence over fix state.
    pub fn resolve(inputs: &FrameInputs) -> Self {
        match inputs.connectivity {
            ConnectivityState::StationConnected => Self::Connected,
            ConnectivityState::StationConnecting => Self::Connecting,
            ConnectivityState::AccessPoint => Self::AccessPoint,
            ConnectivityState::Offline if inputs.fix_valid => Self::FixValid,
            ConnectivityState::Offline => Self::NoFix,
        }
    }

    /// Unscaled status color at `now_ms`.
    pub fn color(
        self,
        now_ms: u64,
    ) -> RGB8 {
        match self {
            Self::Connected => GREEN,
            Self::Connecting => scale_color(GREEN, pulse_level(now_ms, CONNECTING_PULSE_MS, STATUS_PULSE_MIN, 255)),
            Self::AccessPoint => AMBER,
            Self::FixValid => BLUE,
            Self::NoFix => scale_color(BLUE, pulse_level(now_ms, NO_FIX_PULSE_MS, STATUS_PULSE_MIN, 255)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{RadioOff, StaticLink};

    fn inputs(
        connectivity: ConnectivityState,
        station_configured: bool,
        fix_valid: bool,
    ) -> FrameInputs {
        FrameInputs {
            now_ms: 0,
            fix_valid,
            speed_kph: 0.0,
            connectivity,
            station_configured,
        }
    }

    #[test]
    fn test_critical_wins_over_everything() {
        let ap = inputs(ConnectivityState::AccessPoint, true, false);
        assert_eq!(resolve_tier(&ap, CRITICAL_NO_OK_MS + 1), RenderTier::Critical);
        assert_eq!(resolve_tier(&ap, CRITICAL_NO_OK_MS), RenderTier::AccessPointWarning);
    }

    #[test]
    fn test_ap_warning_requires_station_credentials() {
        let ap_only = inputs(ConnectivityState::AccessPoint, false, true);
        assert_eq!(resolve_tier(&ap_only, 0), RenderTier::Normal);
        assert_eq!(StatusIndication::resolve(&ap_only), StatusIndication::AccessPoint);

        let connecting = inputs(ConnectivityState::StationConnecting, true, false);
        assert_eq!(resolve_tier(&connecting, 0), RenderTier::Normal);
    }

    #[test]
    fn test_status_precedence() {
        use ConnectivityState::*;
        assert_eq!(StatusIndication::resolve(&inputs(StationConnected, true, false)), StatusIndication::Connected);
        assert_eq!(StatusIndication::resolve(&inputs(StationConnecting, true, true)), StatusIndication::Connecting);
        assert_eq!(StatusIndication::resolve(&inputs(Offline, false, true)), StatusIndication::FixValid);
        assert_eq!(StatusIndication::resolve(&inputs(Offline, false, false)), StatusIndication::NoFix);
    }

    #[test]
    fn test_health() {
        assert!(inputs(ConnectivityState::StationConnected, true, false).is_healthy());
        assert!(inputs(ConnectivityState::Offline, false, true).is_healthy());
        assert!(!inputs(ConnectivityState::AccessPoint, true, false).is_healthy());
    }

    #[test]
    fn test_pulsing_status_varies() {
        let low = StatusIndication::NoFix.color(0);
        let high = StatusIndication::NoFix.color(NO_FIX_PULSE_MS / 2);
        assert!(low.b < high.b);
        assert_eq!(StatusIndication::FixValid.color(123), BLUE);
        let c = StatusIndication::Connecting.color(CONNECTING_PULSE_MS / 2);
        assert!(c.g > 240);
    }

    #[test]
    fn test_sample_reads_link() {
        let f = FrameInputs::sample(5, true, 3.0, &RadioOff);
        assert_eq!(f.connectivity, ConnectivityState::Offline);
        let link = StaticLink {
            state: ConnectivityState::StationConnecting,
            station_configured: true,
        };
        let f = FrameInputs::sample(5, false, 0.0, &link);
        assert!(f.station_configured);
        assert_eq!(f.connectivity, ConnectivityState::StationConnecting);
    }
}
