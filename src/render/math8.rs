//! 8-bit color and waveform helpers for LED animation.
//!
//! Brightness scaling uses `c * level / 255`, so a level of 255 is the
//! identity and 0 is black. Oscillators are driven by wall-clock milliseconds
//! so animation speed does not depend on the frame rate.

use core::f32::consts::TAU;

#[cfg(not(test))]
use micromath::F32Ext;
use smart_leds::RGB8;

/// Scale `value` by `scale / 255`.
#[inline]
pub const fn scale8(
    value: u8,
    scale: u8,
) -> u8 {
    ((value as u16 * scale as u16) / 255) as u8
}

/// Scale every channel of a pixel by `level / 255`.
pub fn scale_color(
    color: RGB8,
    level: u8,
) -> RGB8 {
    match level {
        0 => RGB8::default(),
        255 => color,
        _ => RGB8::new(scale8(color.r, level), scale8(color.g, level), scale8(color.b, level)),
    }
}

/// Dim a run of pixels toward black by `amount / 255`.
pub fn fade_to_black_by(
    pixels: &mut [RGB8],
    amount: u8,
) {
    let keep = 255 - amount;
    for px in pixels {
        *px = scale_color(*px, keep);
    }
}

/// Channel-wise saturating add.
#[inline]
pub fn add_saturating(
    a: RGB8,
    b: RGB8,
) -> RGB8 {
    RGB8::new(a.r.saturating_add(b.r), a.g.saturating_add(b.g), a.b.saturating_add(b.b))
}

/// Sine of an 8-bit angle (256 = full turn), mapped to `1..=255`.
pub fn sin8(theta: u8) -> u8 {
    let rad = f32::from(theta) * (TAU / 256.0);
    (128.0 + 127.0 * rad.sin()) as u8
}

/// Sine oscillator between `low` and `high` at `bpm` beats per minute.
///
/// `phase` shifts the wave by a fraction of a beat (256 = one full beat).
pub fn beatsin8(
    bpm: u8,
    low: u8,
    high: u8,
    now_ms: u64,
    phase: u8,
) -> u8 {
    let beat = ((now_ms * u64::from(bpm) * 256) / 60_000) as u8;
    let wave = sin8(beat.wrapping_add(phase));
    let span = high.saturating_sub(low);
    low + scale8(wave, span)
}

/// Smooth pulse between `min` and `max` with the given period, starting at `min`.
pub fn pulse_level(
    now_ms: u64,
    period_ms: u64,
    min: u8,
    max: u8,
) -> u8 {
    let period = period_ms.max(1);
    let angle = ((now_ms % period) * 256 / period) as u8;
    let wave = sin8(angle.wrapping_sub(64));
    min + scale8(wave, max.saturating_sub(min))
}

// =============================================================================
// Unit Tests
// =============================================================================
