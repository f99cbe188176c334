//! Body-segment effect catalog and per-strip animation state.
//!
//! Effects are selected per speed bucket by numeric id (see [`Effect`]). Every
//! effect draws into the strip's unscaled canvas so trail-based effects can
//! fade the previous frame; global brightness is applied afterwards by the
//! engine.
//!
//! | Id | Effect | Speed parameter | Intensity parameter |
//! |----|--------|-----------------|---------------------|
//! | 0 | Solid | - | - |
//! | 1 | Pulse | oscillator rate | - |
//! | 2 | Breath | oscillator rate | - |
//! | 3 | Chase | step (/64) | trail length |
//! | 4 | Comet | step (/32) | trail length |
//! | 5 | Sinelon | sweep rate | trail length |
//! | 6 | Confetti | - | trail length |
//! | 7 | Juggle | sweep rates | trail length |
//! | 8 | Bpm | oscillator rate | - |
//! | 9 | Rainbow | hue step | - |
//! | 10 | Fire | - | flame height |
//! | 11 | Gradient wave | hue step | - |

use fastrand::Rng;
use smart_leds::RGB8;
use smart_leds::hsv::{Hsv, hsv2rgb};

use super::fire::step_fire;
use super::math8::{add_saturating, beatsin8, fade_to_black_by, scale_color};
use crate::config::{EffectParams, MAX_BODY_LEDS};

// =============================================================================
// Catalog
// =============================================================================

/// Body animation, numbered as stored in the configuration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[repr(u8)]
pub enum Effect {
    Solid = 0,
    Pulse = 1,
    Breath = 2,
    Chase = 3,
    Comet = 4,
    Sinelon = 5,
    Confetti = 6,
    Juggle = 7,
    Bpm = 8,
    Rainbow = 9,
    Fire = 10,
    GradientWave = 11,
}

impl Effect {
    /// Effect for a stored id; ids outside the catalog fall back to `Solid`.
    pub const fn from_id(id: u8) -> Self {
        match id {
            1 => Self::Pulse,
            2 => Self::Breath,
            3 => Self::Chase,
            4 => Self::Comet,
            5 => Self::Sinelon,
            6 => Self::Confetti,
            7 => Self::Juggle,
            8 => Self::Bpm,
            9 => Self::Rainbow,
            10 => Self::Fire,
            11 => Self::GradientWave,
            _ => Self::Solid,
        }
    }

    #[inline]
    pub const fn id(self) -> u8 { self as u8 }
}

// =============================================================================
// Parameter Mapping
// =============================================================================

/// Pulse brightness range (~4% to 100%).
const PULSE_RANGE: (u8, u8) = (10, 255);
/// Breath brightness range (~8% to 78%).
const BREATH_RANGE: (u8, u8) = (20, 200);
/// Bpm brightness range; the higher floor gives a shallower dip than Pulse.
const BPM_RANGE: (u8, u8) = (96, 255);

/// Step divisor for Chase.
const CHASE_DIVISOR: u8 = 64;
/// Step divisor for Comet (faster for the same speed parameter).
const COMET_DIVISOR: u8 = 32;
/// Step divisor for hue counters.
const HUE_DIVISOR: u8 = 32;

/// Hue offset between neighbouring pixels of the gradient wave.
const GRADIENT_HUE_OFFSET: u8 = 8;

/// Dots in the Juggle effect.
const JUGGLE_DOTS: u8 = 4;

/// Per-frame advance derived from the speed parameter, never zero.
#[inline]
pub const fn speed_step(
    speed: u8,
    divisor: u8,
) -> u8 {
    let step = speed / divisor;
    if step == 0 { 1 } else { step }
}

/// Oscillator rate in beats per minute for a speed parameter.
#[inline]
pub const fn speed_bpm(speed: u8) -> u8 { 6 + speed / 4 }

/// Per-frame fade amount; higher intensity leaves longer trails.
#[inline]
pub const fn trail_fade(intensity: u8) -> u8 { (255 - intensity) / 4 + 8 }

// =============================================================================
// Strip State
// =============================================================================

/// Animation state owned by one strip, persistent across frames.
#[derive(Clone, Debug)]
pub struct StripState {
    hue: u8,
    position: u16,
    heat: [u8; MAX_BODY_LEDS],
    canvas: [RGB8; MAX_BODY_LEDS],
    rng: Rng,
}

impl StripState {
    pub fn new(seed: u64) -> Self {
        Self {
            hue: 0,
            position: 0,
            heat: [0; MAX_BODY_LEDS],
            canvas: [RGB8::default(); MAX_BODY_LEDS],
            rng: Rng::with_seed(seed),
        }
    }

    #[inline]
    pub const fn hue(&self) -> u8 { self.hue }

    #[inline]
    pub const fn position(&self) -> u16 { self.position }

    #[inline]
    pub fn heat(&self) -> &[u8] { &self.heat }

    /// Last rendered body pixels before brightness scaling.
    #[inline]
    pub fn canvas(
        &self,
        len: usize,
    ) -> &[RGB8] {
        &self.canvas[..len.min(MAX_BODY_LEDS)]
    }

    /// Render one frame of `effect` over `len` body pixels.
    pub fn render(
        &mut self,
        effect: Effect,
        params: &EffectParams,
        base: RGB8,
        now_ms: u64,
        len: usize,
    ) -> &[RGB8] {
        let len = len.min(MAX_BODY_LEDS);
        if len == 0 {
            return &[];
        }
        let bpm = speed_bpm(params.speed);

        match effect {
            Effect::Solid => self.fill(len, base),
            Effect::Pulse => self.oscillate(len, base, bpm, PULSE_RANGE, now_ms),
            Effect::Breath => self.oscillate(len, base, bpm / 2, BREATH_RANGE, now_ms),
            Effect::Bpm => self.oscillate(len, base, bpm, BPM_RANGE, now_ms),
            Effect::Chase => self.travel(len, base, params, CHASE_DIVISOR),
            Effect::Comet => self.travel(len, base, params, COMET_DIVISOR),
            Effect::Sinelon => {
                fade_to_black_by(&mut self.canvas[..len], trail_fade(params.intensity));
                let pos = usize::from(beatsin8(bpm, 0, (len - 1).min(255) as u8, now_ms, 0));
                self.canvas[pos] = add_saturating(self.canvas[pos], base);
            }
            Effect::Confetti => {
                fade_to_black_by(&mut self.canvas[..len], trail_fade(params.intensity));
                let pos = self.rng.usize(0..len);
                self.canvas[pos] = add_saturating(self.canvas[pos], base);
            }
            Effect::Juggle => {
                fade_to_black_by(&mut self.canvas[..len], trail_fade(params.intensity));
                let top = (len - 1).min(255) as u8;
                for dot in 0..JUGGLE_DOTS {
                    let pos = usize::from(beatsin8(bpm + dot * 3, 0, top, now_ms, dot * 64));
                    self.canvas[pos] = add_saturating(self.canvas[pos], base);
                }
            }
            Effect::Rainbow => {
                self.hue = self.hue.wrapping_add(speed_step(params.speed, HUE_DIVISOR));
                let delta = (256 / len).clamp(1, 255) as u8;
                self.hue_gradient(len, delta);
            }
            Effect::GradientWave => {
                self.hue = self.hue.wrapping_add(speed_step(params.speed, HUE_DIVISOR));
                self.hue_gradient(len, GRADIENT_HUE_OFFSET);
            }
            Effect::Fire => {
                step_fire(&mut self.heat[..len], &mut self.canvas[..len], params.intensity, &mut self.rng);
            }
        }

        &self.canvas[..len]
    }

    fn fill(
        &mut self,
        len: usize,
        color: RGB8,
    ) {
        self.canvas[..len].fill(color);
    }

    fn oscillate(
        &mut self,
        len: usize,
        base: RGB8,
        bpm: u8,
        (low, high): (u8, u8),
        now_ms: u64,
    ) {
        let level = beatsin8(bpm.max(1), low, high, now_ms, 0);
        self.fill(len, scale_color(base, level));
    }

    /// Fade, then move a single lit pixel forward, wrapping at the segment end.
    fn travel(
        &mut self,
        len: usize,
        base: RGB8,
        params: &EffectParams,
        divisor: u8,
    ) {
        fade_to_black_by(&mut self.canvas[..len], trail_fade(params.intensity));
        let step = u16::from(speed_step(params.speed, divisor));
        self.position = (self.position % len as u16 + step) % len as u16;
        self.canvas[usize::from(self.position)] = base;
    }

    fn hue_gradient(
        &mut self,
        len: usize,
        delta: u8,
    ) {
        let mut hue = self.hue;
        for px in &mut self.canvas[..len] {
            *px = hsv2rgb(Hsv {
                hue,
                sat: 255,
                val: 255,
            });
            hue = hue.wrapping_add(delta);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
