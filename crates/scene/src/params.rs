use portal_common::{Color, HexColor};

/// Upper bound on the device pixel ratio used for rendering.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

pub const PORTAL_COLOR_START: HexColor = HexColor::from_u32(0xe8db33);
pub const PORTAL_COLOR_END: HexColor = HexColor::from_u32(0x3c2caa);
pub const CLEAR_COLOR: HexColor = HexColor::from_u32(0x313125);

/// `min(ratio, 2)`.
pub fn clamp_pixel_ratio(device_ratio: f32) -> f32 {
    device_ratio.min(MAX_PIXEL_RATIO)
}

/// Uniforms of the portal shader (`uTime`, `uColorStart`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalUniforms {
    /// Seconds since start.
    pub time: f32,
    pub color_start: Color,
    pub color_end: Color,
    pub effect_speed: f32,
    pub outer_glow: f32,
    pub displaced_uv: f32,
    pub strength: f32,
    pub strength_step: f32,
}

impl Default for PortalUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            color_start: Color::from_hex(PORTAL_COLOR_START),
            color_end: Color::from_hex(PORTAL_COLOR_END),
            effect_speed: 0.2,
            outer_glow: 4.8,
            displaced_uv: 5.0,
            strength: 5.0,
            strength_step: 0.6,
        }
    }
}

/// Uniforms of the fireflies shader (`uTime`, `uPixelRatio`, `uSize`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirefliesUniforms {
    pub time: f32,
    /// Always already clamped to [`MAX_PIXEL_RATIO`].
    pub pixel_ratio: f32,
    pub size: f32,
}

impl Default for FirefliesUniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            pixel_ratio: 1.0,
            size: 100.0,
        }
    }
}

/// Display-side colors the panel edits. Uniform colors are derived from
/// these in linear space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugColors {
    pub portal_color_start: HexColor,
    pub portal_color_end: HexColor,
    pub clear_color: HexColor,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            portal_color_start: PORTAL_COLOR_START,
            portal_color_end: PORTAL_COLOR_END,
            clear_color: CLEAR_COLOR,
        }
    }
}

/// All tunable state of the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneParams {
    pub portal: PortalUniforms,
    pub fireflies: FirefliesUniforms,
    pub debug: DebugColors,
}

impl SceneParams {
    pub fn new(device_pixel_ratio: f32) -> Self {
        let mut params = Self::default();
        params.set_pixel_ratio(device_pixel_ratio);
        params
    }

    /// Write `elapsed` into every time-based uniform.
    pub fn set_time(&mut self, elapsed: f32) {
        self.portal.time = elapsed;
        self.fireflies.time = elapsed;
    }

    pub fn set_pixel_ratio(&mut self, device_pixel_ratio: f32) {
        self.fireflies.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
    }

    pub fn clear_color(&self) -> Color {
        Color::from_hex(self.debug.clear_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped_to_two() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(2.0), 2.0);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
        assert_eq!(clamp_pixel_ratio(4.25), 2.0);
    }

    #[test]
    fn defaults_match_shader_contract() {
        let params = SceneParams::new(3.0);
        assert_eq!(params.portal.effect_speed, 0.2);
        assert_eq!(params.portal.outer_glow, 4.8);
        assert_eq!(params.portal.displaced_uv, 5.0);
        assert_eq!(params.portal.strength, 5.0);
        assert_eq!(params.portal.strength_step, 0.6);
        assert_eq!(params.fireflies.size, 100.0);
        assert_eq!(params.fireflies.pixel_ratio, 2.0);
        assert_eq!(params.debug.portal_color_start.to_string(), "#e8db33");
        assert_eq!(params.debug.portal_color_end.to_string(), "#3c2caa");
        assert_eq!(params.debug.clear_color.to_string(), "#313125");
    }

    #[test]
    fn set_time_updates_both_programs() {
        let mut params = SceneParams::default();
        params.set_time(2.0);
        assert_eq!(params.portal.time, 2.0);
        assert_eq!(params.fireflies.time, 2.0);
    }
}
