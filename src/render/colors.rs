//! Named colors, the per-bucket base color ramp and the fire heat ramp.

use smart_leds::RGB8;

use crate::config::{BUCKET_COUNT, SpeedBucket};

// =============================================================================
// Status Colors
// =============================================================================

pub const BLACK: RGB8 = RGB8::new(0, 0, 0);
pub const RED: RGB8 = RGB8::new(255, 0, 0);
pub const GREEN: RGB8 = RGB8::new(0, 255, 0);
pub const BLUE: RGB8 = RGB8::new(0, 0, 255);
/// Access point indication and fallback warning.
pub const AMBER: RGB8 = RGB8::new(255, 120, 0);

// =============================================================================
// Speed Ramp
// =============================================================================

/// Base color per speed bucket, blue at rest through violet and magenta to red at a sprint.
pub const BUCKET_COLORS: [RGB8; BUCKET_COUNT] = [
    RGB8::new(0, 64, 255),  // blue
    RGB8::new(96, 0, 255),  // violet
    RGB8::new(200, 0, 200), // magenta
    RGB8::new(255, 0, 96),  // rose
    RGB8::new(255, 48, 0),  // orange-red
    RGB8::new(255, 0, 0),   // red
];

/// Base color for a speed bucket.
#[inline]
pub const fn bucket_color(bucket: SpeedBucket) -> RGB8 { BUCKET_COLORS[bucket.index()] }

// =============================================================================
// Heat Ramp
// =============================================================================

/// Map a heat value to black → red → yellow → white.
///
/// The scaled temperature is split in three thirds; within each third the
/// next channel ramps up in steps of four.
pub fn heat_color(temperature: u8) -> RGB8 {
    let t192 = ((u16::from(temperature) * 191) / 255) as u8;
    let ramp = (t192 & 0x3F) << 2;

    if t192 & 0x80 != 0 {
        RGB8::new(255, 255, ramp)
    } else if t192 & 0x40 != 0 {
        RGB8::new(255, ramp, 0)
    } else {
        RGB8::new(ramp, 0, 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
