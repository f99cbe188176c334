//! LED strip layout and render timing constants.
//!
//! Each strip starts with a short **status segment** (connectivity / fix
//! indication) followed by the **body segment** driven by the speed-mapped
//! effect. Two strips are daisy-chained on a single clocked data line; in
//! single-strip mode the second buffer mirrors the first.

// =============================================================================
// Strip Geometry
// =============================================================================

/// Number of strips driven (1 = single strip, 2 = dual strips).
pub const LED_STRIP_MODE: u8 = 2;

/// LEDs per strip.
pub const LED_STRIP_COUNT: usize = 20;

/// Smallest supported strip length.
pub const LED_STRIP_MIN: usize = 10;

/// Largest supported strip length. Sizes every pixel and heat buffer.
pub const LED_STRIP_MAX: usize = 50;

/// First N LEDs of each strip reserved for status.
pub const LED_STATUS_COUNT: usize = 3;

/// Upper bound on body pixels for any valid layout.
pub const MAX_BODY_LEDS: usize = LED_STRIP_MAX - 1;

/// Default global brightness (~30%).
pub const LED_BRIGHTNESS: u8 = 77;

const _: () = assert!(LED_STRIP_MODE == 1 || LED_STRIP_MODE == 2);
const _: () = assert!(LED_STRIP_MIN <= LED_STRIP_COUNT);
const _: () = assert!(LED_STRIP_COUNT <= LED_STRIP_MAX);
const _: () = assert!(LED_STATUS_COUNT >= 1);
const _: () = assert!(LED_STATUS_COUNT < LED_STRIP_MIN);

// =============================================================================
// Render Timing
// =============================================================================

/// Frame cadence of the render loop.
pub const LED_UPDATE_MS: u64 = 50;

/// Time without a valid fix or station link before the critical blink takes over.
pub const CRITICAL_NO_OK_MS: u64 = 600_000;

/// Half period of the critical red blink (~2.5 Hz, 50% duty).
pub const CRITICAL_BLINK_HALF_MS: u64 = 200;

/// Period of the green "station connecting" pulse.
pub const CONNECTING_PULSE_MS: u64 = 1_500;

/// Period of the blue "waiting for fix" pulse.
pub const NO_FIX_PULSE_MS: u64 = 2_000;

/// Master switch for the LED UI. When false the loop still runs but strips stay dark.
pub const LED_UI_ENABLED: bool = true;

const _: () = assert!(LED_UPDATE_MS < CRITICAL_BLINK_HALF_MS);
const _: () = assert!(CRITICAL_BLINK_HALF_MS < CONNECTING_PULSE_MS);

// =============================================================================
// Strip Layout
// =============================================================================

/// How the two pixel buffers relate to each other.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum StripMode {
    /// One logical strip; the second buffer mirrors the first.
    Single,
    /// Two independent strips (primary effect on A, secondary on B).
    Dual,
}

impl StripMode {
    /// Map the numeric strip mode (1 or 2) to a variant.
    pub const fn from_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(Self::Single),
            2 => Some(Self::Dual),
            _ => None,
        }
    }
}

/// Validated strip geometry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct StripLayout {
    mode: StripMode,
    leds_per_strip: usize,
    status_count: usize,
}

impl StripLayout {
    /// Layout built from the compile-time constants above.
    pub const DEFAULT: Self = match Self::new(LED_STRIP_MODE, LED_STRIP_COUNT, LED_STATUS_COUNT) {
        Some(layout) => layout,
        None => panic!("invalid LED layout constants"),
    };

    /// Build a layout, rejecting unsupported geometry.
    ///
    /// The strip length must be within `LED_STRIP_MIN..=LED_STRIP_MAX` and
    /// leave at least one body pixel after the status segment.
    pub const fn new(
        mode: u8,
        leds_per_strip: usize,
        status_count: usize,
    ) -> Option<Self> {
        let Some(mode) = StripMode::from_count(mode) else {
            return None;
        };
        if leds_per_strip < LED_STRIP_MIN || leds_per_strip > LED_STRIP_MAX {
            return None;
        }
        if status_count == 0 || status_count >= leds_per_strip {
            return None;
        }
        Some(Self {
            mode,
            leds_per_strip,
            status_count,
        })
    }

    #[inline]
    pub const fn mode(&self) -> StripMode { self.mode }

    #[inline]
    pub const fn leds_per_strip(&self) -> usize { self.leds_per_strip }

    #[inline]
    pub const fn status_count(&self) -> usize { self.status_count }

    /// Pixels left for the effect pipeline.
    #[inline]
    pub const fn body_count(&self) -> usize { self.leds_per_strip - self.status_count }

    /// Total LEDs on the daisy chain (always both strip buffers).
    #[inline]
    pub const fn chain_len(&self) -> usize { self.leds_per_strip * 2 }
}

impl Default for StripLayout {
    fn default() -> Self { Self::DEFAULT }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_constants() {
        let layout = StripLayout::default();
        assert_eq!(layout.mode(), StripMode::Dual);
        assert_eq!(layout.leds_per_strip(), LED_STRIP_COUNT);
        assert_eq!(layout.status_count(), LED_STATUS_COUNT);
        assert_eq!(layout.body_count(), 17);
        assert_eq!(layout.chain_len(), 40);
    }

    #[test]
    fn test_layout_rejects_bad_geometry() {
        assert!(StripLayout::new(3, 20, 3).is_none());
        assert!(StripLayout::new(1, 9, 3).is_none());
        assert!(StripLayout::new(1, 51, 3).is_none());
        assert!(StripLayout::new(1, 10, 10).is_none());
        assert!(StripLayout::new(1, 10, 0).is_none());
        assert!(StripLayout::new(1, 10, 9).is_some());
        assert!(StripLayout::new(2, 50, 3).is_some());
    }

    #[test]
    fn test_body_buffer_covers_largest_layout() {
        let largest = StripLayout::new(2, LED_STRIP_MAX, 1).unwrap();
        assert!(largest.body_count() <= MAX_BODY_LEDS);
    }

    #[test]
    fn test_timing_ordering() {
        assert!(LED_UPDATE_MS < CRITICAL_BLINK_HALF_MS);
        assert!(CRITICAL_NO_OK_MS > 60_000);
    }
}
