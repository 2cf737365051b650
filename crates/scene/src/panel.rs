use crate::params::SceneParams;
use portal_common::Color;
use portal_tools::{ColorBinding, Control, DebugPanel, Folder, SliderBinding};

pub const PANEL_WIDTH: f32 = 400.0;
pub const PORTAL_FOLDER: &str = "Portal shader";

/// Side effects a panel change asks the host to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEffect {
    /// Forward to the renderer's clear-color setter.
    ClearColor(Color),
}

pub type ScenePanel = DebugPanel<SceneParams, SceneEffect>;

/// The scene's debug panel: a closed "Portal shader" folder, then the
/// fireflies size and background color.
pub fn scene_panel() -> ScenePanel {
    let portal = Folder::new(PORTAL_FOLDER)
        .close()
        .add(Control::Color(
            ColorBinding::new(
                "portalColorStart",
                |p: &SceneParams| p.debug.portal_color_start,
                |p: &mut SceneParams, v| p.debug.portal_color_start = v,
            )
            .on_change(|p: &mut SceneParams| {
                p.portal.color_start = Color::from_hex(p.debug.portal_color_start);
                None
            }),
        ))
        .add(Control::Color(
            ColorBinding::new(
                "portalColorEnd",
                |p: &SceneParams| p.debug.portal_color_end,
                |p: &mut SceneParams, v| p.debug.portal_color_end = v,
            )
            .on_change(|p: &mut SceneParams| {
                p.portal.color_end = Color::from_hex(p.debug.portal_color_end);
                None
            }),
        ))
        .add(Control::Slider(
            SliderBinding::new(
                "Effect Speed",
                |p: &SceneParams| p.portal.effect_speed,
                |p: &mut SceneParams, v| p.portal.effect_speed = v,
            )
            .range(0.2, 2.0)
            .step(0.01),
        ))
        .add(Control::Slider(
            SliderBinding::new(
                "Outer Glow",
                |p: &SceneParams| p.portal.outer_glow,
                |p: &mut SceneParams, v| p.portal.outer_glow = v,
            )
            .range(1.0, 12.0)
            .step(0.01),
        ))
        .add(Control::Slider(
            SliderBinding::new(
                "DisplacedUv",
                |p: &SceneParams| p.portal.displaced_uv,
                |p: &mut SceneParams, v| p.portal.displaced_uv = v,
            )
            .range(1.0, 20.0)
            .step(0.01),
        ))
        .add(Control::Slider(
            SliderBinding::new(
                "Strength",
                |p: &SceneParams| p.portal.strength,
                |p: &mut SceneParams, v| p.portal.strength = v,
            )
            .range(1.0, 20.0)
            .step(0.01),
        ))
        .add(Control::Slider(
            SliderBinding::new(
                "Strength Step",
                |p: &SceneParams| p.portal.strength_step,
                |p: &mut SceneParams, v| p.portal.strength_step = v,
            )
            .range(0.0, 1.0)
            .step(0.01),
        ));

    DebugPanel::new("Debug", PANEL_WIDTH)
        .add_folder(portal)
        .add(Control::Slider(
            SliderBinding::new(
                "firefliesSize",
                |p: &SceneParams| p.fireflies.size,
                |p: &mut SceneParams, v| p.fireflies.size = v,
            )
            .range(0.0, 500.0)
            .step(1.0),
        ))
        .add(Control::Color(
            ColorBinding::new(
                "clearColor",
                |p: &SceneParams| p.debug.clear_color,
                |p: &mut SceneParams, v| p.debug.clear_color = v,
            )
            .on_change(|p: &mut SceneParams| Some(SceneEffect::ClearColor(p.clear_color()))),
        ))
}
