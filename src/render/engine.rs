//! Frame composition for both strips.
//!
//! The engine is called every `LED_UPDATE_MS`. It resolves the frame's
//! [`RenderTier`], paints status and body segments accordingly and keeps the
//! per-strip animation state alive between calls.
//!
//! # Strip Layout
//!
//! ```text
//! strip A: [S S S | B B B B B B B B B B B B B B B B B]
//! strip B: [S S S | B B B B B B B B B B B B B B B B B]
//!           status   body (effect pipeline)
//! ```
//!
//! In dual mode strip A runs the bucket's primary effect and strip B the
//! secondary one; in single mode strip B is a copy of strip A.

use smart_leds::RGB8;

use super::colors::{AMBER, BLACK, RED, bucket_color};
use super::effects::{Effect, StripState};
use super::math8::scale_color;
use super::tier::{FrameInputs, RenderTier, StatusIndication, resolve_tier};
use crate::config::{CRITICAL_BLINK_HALF_MS, LED_STRIP_MAX, LED_UI_ENABLED, RuntimeConfig, StripLayout, StripMode};

/// Both strip buffers for one frame.
#[derive(Clone, PartialEq, Debug)]
pub struct Frame {
    strips: [[RGB8; LED_STRIP_MAX]; 2],
    leds_per_strip: usize,
}

impl Frame {
    pub const fn new(leds_per_strip: usize) -> Self {
        Self {
            strips: [[BLACK; LED_STRIP_MAX]; 2],
            leds_per_strip,
        }
    }

    /// Pixels of strip `index` (0 = A, 1 = B).
    pub fn strip(
        &self,
        index: usize,
    ) -> &[RGB8] {
        &self.strips[index.min(1)][..self.leds_per_strip]
    }

    #[inline]
    pub fn strip_a(&self) -> &[RGB8] { self.strip(0) }

    #[inline]
    pub fn strip_b(&self) -> &[RGB8] { self.strip(1) }

    #[inline]
    pub const fn leds_per_strip(&self) -> usize { self.leds_per_strip }

    /// Every pixel, strip A first, in chain order.
    pub fn chain(&self) -> impl Iterator<Item = &RGB8> { self.strip_a().iter().chain(self.strip_b()) }

    fn clear(&mut self) {
        for strip in &mut self.strips {
            strip.fill(BLACK);
        }
    }

    fn fill(
        &mut self,
        range: core::ops::Range<usize>,
        color: RGB8,
    ) {
        for strip in &mut self.strips {
            strip[range.clone()].fill(color);
        }
    }
}

/// Owner of animation state and the output frame.
#[derive(Debug)]
pub struct RenderEngine {
    layout: StripLayout,
    strips: [StripState; 2],
    frame: Frame,
    last_healthy_ms: Option<u64>,
    tier: RenderTier,
}

impl RenderEngine {
    /// `seed` initializes the random sources of Confetti and Fire.
    pub fn new(
        layout: StripLayout,
        seed: u64,
    ) -> Self {
        Self {
            layout,
            strips: [StripState::new(seed), StripState::new(seed.rotate_left(17) ^ 0x5A5A)],
            frame: Frame::new(layout.leds_per_strip()),
            last_healthy_ms: None,
            tier: RenderTier::Normal,
        }
    }

    /// Compute the next frame.
    pub fn render(
        &mut self,
        inputs: &FrameInputs,
        config: &RuntimeConfig,
    ) -> &Frame {
        let now = inputs.now_ms;
        if inputs.is_healthy() || self.last_healthy_ms.is_none() {
            self.last_healthy_ms = Some(now);
        }
        let since_healthy = now.saturating_sub(self.last_healthy_ms.unwrap_or(now));

        self.tier = resolve_tier(inputs, since_healthy);
        self.frame.clear();
        if !LED_UI_ENABLED {
            return &self.frame;
        }

        match self.tier {
            RenderTier::Critical => self.draw_critical(now),
            RenderTier::AccessPointWarning => {
                let amber = scale_color(AMBER, config.brightness);
                self.frame.fill(0..self.layout.leds_per_strip(), amber);
            }
            RenderTier::Normal => self.draw_normal(inputs, config),
        }
        &self.frame
    }

    /// Red status blink at full brightness, body dark.
    fn draw_critical(
        &mut self,
        now_ms: u64,
    ) {
        if (now_ms / CRITICAL_BLINK_HALF_MS) % 2 == 0 {
            self.frame.fill(0..self.layout.status_count(), RED);
        }
    }

    fn draw_normal(
        &mut self,
        inputs: &FrameInputs,
        config: &RuntimeConfig,
    ) {
        let status = StatusIndication::resolve(inputs).color(inputs.now_ms);
        let status_end = self.layout.status_count();
        self.frame.fill(0..status_end, scale_color(status, config.brightness));

        if !inputs.fix_valid {
            return;
        }

        let bucket = config.bucket_for_speed(inputs.speed_kph);
        let params = config.effect_for(bucket);
        let base = bucket_color(bucket);
        let body = self.layout.body_count();
        let end = self.layout.leds_per_strip();

        let outputs = match self.layout.mode() {
            StripMode::Single => 1,
            StripMode::Dual => 2,
        };
        for index in 0..outputs {
            let id = if index == 0 { params.primary } else { params.secondary };
            let pixels = self.strips[index].render(Effect::from_id(id), &params, base, inputs.now_ms, body);
            for (dst, src) in self.frame.strips[index][status_end..end].iter_mut().zip(pixels) {
                *dst = scale_color(*src, config.brightness);
            }
        }

        if self.layout.mode() == StripMode::Single {
            self.frame.strips[1] = self.frame.strips[0];
        }
    }

    #[inline]
    pub const fn frame(&self) -> &Frame { &self.frame }

    /// Tier chosen for the most recent frame.
    #[inline]
    pub const fn tier(&self) -> RenderTier { self.tier }

    #[inline]
    pub const fn layout(&self) -> StripLayout { self.layout }

    /// Animation state of strip `index`.
    #[inline]
    pub fn strip_state(
        &self,
        index: usize,
    ) -> &StripState {
        &self.strips[index.min(1)]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CRITICAL_NO_OK_MS, EffectParams, LED_UPDATE_MS};
    use crate::connectivity::ConnectivityState;
    use crate::render::colors::{BLUE, GREEN};

    fn dual() -> StripLayout { StripLayout::new(2, 20, 3).unwrap() }

    fn single() -> StripLayout { StripLayout::new(1, 12, 3).unwrap() }

    fn full_bright() -> RuntimeConfig {
        RuntimeConfig {
            brightness: 255,
            ..RuntimeConfig::default()
        }
    }

    fn frame_inputs(
        now_ms: u64,
        fix_valid: bool,
        speed_kph: f32,
        connectivity: ConnectivityState,
        station_configured: bool,
    ) -> FrameInputs {
        FrameInputs {
            now_ms,
            fix_valid,
            speed_kph,
            connectivity,
            station_configured,
        }
    }

    fn offline(
        now_ms: u64,
        fix_valid: bool,
        speed_kph: f32,
    ) -> FrameInputs {
        frame_inputs(now_ms, fix_valid, speed_kph, ConnectivityState::Offline, false)
    }

    #[test]
    fn test_critical_after_long_unhealthy_period() {
        let mut engine = RenderEngine::new(dual(), 1);
        let config = full_bright();

        engine.render(&offline(0, false, 0.0), &config);
        assert_eq!(engine.tier(), RenderTier::Normal);

        let ap = frame_inputs(CRITICAL_NO_OK_MS + 1, false, 25.0, ConnectivityState::AccessPoint, true);
        let frame = engine.render(&ap, &config);
        // 600_001 / 200 = 3000 → even → blink on.
        for strip in [frame.strip_a(), frame.strip_b()] {
            assert!(strip[..3].iter().all(|p| *p == RED));
            assert!(strip[3..].iter().all(|p| *p == BLACK));
        }
        assert_eq!(engine.tier(), RenderTier::Critical);

        let frame = engine.render(&frame_inputs(CRITICAL_NO_OK_MS + 201, false, 25.0, ConnectivityState::AccessPoint, true), &config);
        assert!(frame.chain().all(|p| *p == BLACK));
    }

    #[test]
    fn test_critical_ignores_brightness() {
        let mut engine = RenderEngine::new(dual(), 1);
        let dim = RuntimeConfig::default();
        engine.render(&offline(0, false, 0.0), &dim);
        let frame = engine.render(&offline(CRITICAL_NO_OK_MS + 1, false, 0.0), &dim);
        assert_eq!(frame.strip_a()[0], RED);
    }

    #[test]
    fn test_healthy_frame_resets_latch() {
        let mut engine = RenderEngine::new(dual(), 1);
        let config = full_bright();
        engine.render(&offline(0, false, 0.0), &config);
        engine.render(&offline(CRITICAL_NO_OK_MS - 10, true, 1.0), &config);
        engine.render(&offline(CRITICAL_NO_OK_MS + 100, false, 0.0), &config);
        assert_eq!(engine.tier(), RenderTier::Normal);

        let link_up = frame_inputs(2 * CRITICAL_NO_OK_MS, false, 0.0, ConnectivityState::StationConnected, true);
        engine.render(&link_up, &config);
        assert_eq!(engine.tier(), RenderTier::Normal);
    }

    #[test]
    fn test_ap_warning_is_solid_amber() {
        let mut engine = RenderEngine::new(dual(), 1);
        let config = full_bright();
        let frame = engine.render(&frame_inputs(10, true, 30.0, ConnectivityState::AccessPoint, true), &config);
        assert!(frame.chain().all(|p| *p == AMBER));
        assert_eq!(frame.chain().count(), 40);
    }

    #[test]
    fn test_normal_without_fix_has_dark_body() {
        let mut engine = RenderEngine::new(dual(), 1);
        let config = full_bright();
        let connected = frame_inputs(10, false, 5.0, ConnectivityState::StationConnected, true);
        let frame = engine.render(&connected, &config);
        assert!(frame.strip_a()[..3].iter().all(|p| *p == GREEN));
        assert!(frame.strip_a()[3..].iter().all(|p| *p == BLACK));
    }

    #[test]
    fn test_body_uses_bucket_effects_per_strip() {
        let mut engine = RenderEngine::new(dual(), 1);
        let mut config = full_bright();
        config.effects[1] = EffectParams::new(0, 9, 64, 0);

        let frame = engine.render(&offline(0, true, 3.0), &config);
        assert!(frame.strip_a()[..3].iter().all(|p| *p == BLUE));
        // Bucket 2 base color on strip A (Solid), rainbow on strip B.
        assert!(frame.strip_a()[3..].iter().all(|p| *p == RGB8::new(96, 0, 255)));
        assert_ne!(frame.strip_b()[3], frame.strip_b()[10]);
        assert_eq!(engine.strip_state(1).hue(), 2);
        assert_eq!(engine.strip_state(0).hue(), 0);
    }

    #[test]
    fn test_brightness_scales_normal_tier() {
        let mut engine = RenderEngine::new(dual(), 1);
        let mut config = RuntimeConfig::default();
        config.effects[0] = EffectParams::new(0, 0, 0, 0);
        let frame = engine.render(&offline(0, true, 0.0), &config);
        assert_eq!(frame.strip_a()[0], scale_color(BLUE, 77));
        assert_eq!(frame.strip_a()[5], scale_color(RGB8::new(0, 64, 255), 77));
    }

    #[test]
    fn test_single_mode_mirrors_strip_a() {
        let mut engine = RenderEngine::new(single(), 5);
        assert_eq!(engine.layout().mode(), StripMode::Single);
        let config = full_bright();
        for frame_no in 0..40u64 {
            let frame = engine.render(&offline(frame_no * LED_UPDATE_MS, true, 30.0), &config);
            assert_eq!(frame.strip_a(), frame.strip_b());
            assert_eq!(frame.strip_a().len(), 12);
        }
    }

    #[test]
    fn test_unknown_effect_id_renders_solid() {
        let mut engine = RenderEngine::new(dual(), 1);
        let mut config = full_bright();
        config.effects[5] = EffectParams::new(200, 200, 10, 10);
        let frame = engine.render(&offline(0, true, 30.0), &config);
        assert!(frame.strip_a()[3..].iter().all(|p| *p == RED));
        assert!(frame.strip_b()[3..].iter().all(|p| *p == RED));
    }

    #[test]
    fn test_fire_heat_bounded_through_engine() {
        let mut engine = RenderEngine::new(StripLayout::new(2, 50, 3).unwrap(), 99);
        let config = full_bright();
        for frame_no in 0..3_000u64 {
            engine.render(&offline(frame_no * LED_UPDATE_MS, true, 30.0), &config);
        }
        assert!(engine.strip_state(0).heat()[..47].iter().any(|h| *h > 0));
    }
}
