//! Byte-level frame encoding for clocked APA102-style LED chains.
//!
//! ```text
//! start frame   4 x 0x00
//! LED frame     [0xE0 | global, blue, green, red] per LED
//! end frame     ceil(n / 16) x 0xFF   (one clock edge per two LEDs)
//! ```
//!
//! The per-LED 5-bit global current is kept at maximum; brightness is already
//! baked into the RGB values by the renderer.

use smart_leds::RGB8;

use crate::config::LED_STRIP_MAX;
use crate::render::Frame;

/// Start-of-frame marker length.
pub const START_FRAME_LEN: usize = 4;

/// Bytes per LED frame.
pub const LED_FRAME_LEN: usize = 4;

/// Per-LED header: three marker bits plus full global current.
pub const LED_HEADER: u8 = 0xE0 | 0x1F;

/// End-of-frame length for a chain of `leds`.
#[inline]
pub const fn end_frame_len(leds: usize) -> usize { leds.div_ceil(16) }

/// Encoded length for a chain of `leds`.
#[inline]
pub const fn encoded_len(leds: usize) -> usize { START_FRAME_LEN + leds * LED_FRAME_LEN + end_frame_len(leds) }

/// Buffer size for the longest supported chain (two full strips).
pub const MAX_ENCODED_LEN: usize = encoded_len(LED_STRIP_MAX * 2);

/// Encode `leds` pixels into `out`, returning the byte count, or `None` when
/// `out` is too small.
fn encode_leds<'a>(
    pixels: impl Iterator<Item = &'a RGB8>,
    leds: usize,
    out: &mut [u8],
) -> Option<usize> {
    let total = encoded_len(leds);
    let out = out.get_mut(..total)?;
    let body_end = START_FRAME_LEN + leds * LED_FRAME_LEN;

    out[..START_FRAME_LEN].fill(0x00);
    for (chunk, px) in out[START_FRAME_LEN..body_end].chunks_exact_mut(LED_FRAME_LEN).zip(pixels) {
        chunk.copy_from_slice(&[LED_HEADER, px.b, px.g, px.r]);
    }
    out[body_end..].fill(0xFF);
    Some(total)
}

/// Encode a single pixel slice.
pub fn encode_pixels(
    pixels: &[RGB8],
    out: &mut [u8],
) -> Option<usize> {
    encode_leds(pixels.iter(), pixels.len(), out)
}

/// Encode both strips of a frame as one daisy chain, strip A first.
pub fn encode_chain(
    frame: &Frame,
    out: &mut [u8],
) -> Option<usize> {
    encode_leds(frame.chain(), frame.leds_per_strip() * 2, out)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuntimeConfig, StripLayout};
    use crate::connectivity::ConnectivityState;
    use crate::render::{FrameInputs, RenderEngine};

    #[test]
    fn test_lengths() {
        assert_eq!(end_frame_len(0), 0);
        assert_eq!(end_frame_len(1), 1);
        assert_eq!(end_frame_len(16), 1);
        assert_eq!(end_frame_len(17), 2);
        assert_eq!(encoded_len(40), 4 + 160 + 3);
        assert_eq!(MAX_ENCODED_LEN, 4 + 400 + 7);
    }

    #[test]
    fn test_single_pixel_layout() {
        let px = [RGB8::new(1, 2, 3)];
        let mut out = [0xAAu8; 16];
        let n = encode_pixels(&px, &mut out).unwrap();
        assert_eq!(n, 9);
        assert_eq!(&out[..n], &[0, 0, 0, 0, 0xFF, 3, 2, 1, 0xFF]);
    }

    #[test]
    fn test_buffer_too_small() {
        let px = [RGB8::new(1, 2, 3); 4];
        let mut out = [0u8; 20];
        assert_eq!(encode_pixels(&px, &mut out), None);
    }

    #[test]
    fn test_chain_order_a_then_b() {
        let layout = StripLayout::new(2, 10, 3).unwrap();
        let mut engine = RenderEngine::new(layout, 1);
        let config = RuntimeConfig {
            brightness: 255,
            ..RuntimeConfig::default()
        };
        let inputs = FrameInputs {
            now_ms: 0,
            fix_valid: false,
            speed_kph: 0.0,
            connectivity: ConnectivityState::StationConnected,
            station_configured: true,
        };
        let frame = engine.render(&inputs, &config);

        let mut out = [0u8; MAX_ENCODED_LEN];
        let n = encode_chain(frame, &mut out).unwrap();
        assert_eq!(n, encoded_len(20));
        // First LED of A is green status, LED 3 of A is dark body, first LED of B green again.
        assert_eq!(&out[4..8], &[LED_HEADER, 0, 255, 0]);
        assert_eq!(&out[16..20], &[LED_HEADER, 0, 0, 0]);
        assert_eq!(&out[44..48], &[LED_HEADER, 0, 255, 0]);
        assert!(out[4 + 80..n].iter().all(|b| *b == 0xFF));
    }
}
