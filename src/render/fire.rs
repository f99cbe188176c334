//! Heat-diffusion fire simulation.
//!
//! One heat byte per body pixel, updated once per frame in four steps:
//!
//! 1. **Cool**: every cell loses a random amount, more when intensity is low.
//! 2. **Drift**: heat moves away from the base via a weighted average of the
//!    two cells below (`(h[k-1] + 2 * h[k-2]) / 3`).
//! 3. **Spark**: with probability `intensity / 256` a cell near the base is
//!    reignited with a large heat value.
//! 4. **Map**: each cell's heat becomes a color through [`heat_color`].
//!
//! All heat arithmetic saturates, so values stay in `0..=255` whatever the
//! parameters or frame count.

use fastrand::Rng;
use smart_leds::RGB8;

use super::colors::heat_color;

/// Sparks land within this many cells of the base.
pub const SPARK_ZONE: usize = 7;

/// Minimum heat of a new spark.
pub const SPARK_MIN_HEAT: u8 = 160;

/// Cooling factor for an intensity setting; low intensity cools faster.
#[inline]
pub const fn cooling_for(intensity: u8) -> u8 { 20 + (255 - intensity) / 3 }

/// Advance the simulation by one frame and paint `out` from the heat buffer.
///
/// `heat` and `out` must have the same length (the body segment).
pub fn step_fire(
    heat: &mut [u8],
    out: &mut [RGB8],
    intensity: u8,
    rng: &mut Rng,
) {
    let len = heat.len();
    if len == 0 {
        return;
    }

    let cooling = u16::from(cooling_for(intensity));
    let max_cool = ((cooling * 10) / len as u16 + 2).min(255) as u8;
    for cell in heat.iter_mut() {
        *cell = cell.saturating_sub(rng.u8(0..=max_cool));
    }

    for k in (2..len).rev() {
        let sum = u16::from(heat[k - 1]) + 2 * u16::from(heat[k - 2]);
        heat[k] = (sum / 3) as u8;
    }

    if rng.u8(..) < intensity {
        let y = rng.usize(0..SPARK_ZONE.min(len));
        heat[y] = heat[y].saturating_add(rng.u8(SPARK_MIN_HEAT..=255));
    }

    for (px, cell) in out.iter_mut().zip(heat.iter()) {
        *px = heat_color(*cell);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
