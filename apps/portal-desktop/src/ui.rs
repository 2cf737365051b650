use portal_common::HexColor;
use portal_scene::panel::ScenePanel;
use portal_scene::{SceneEffect, SceneParams};
use portal_tools::{Control, PanelEntry};

/// Draw the debug panel over `params`. Returns the effects requested by
/// controls that changed this frame.
pub fn debug_panel(
    ctx: &egui::Context,
    panel: &ScenePanel,
    params: &mut SceneParams,
) -> Vec<SceneEffect> {
    let mut effects = Vec::new();

    egui::Window::new(panel.title)
        .default_width(panel.width)
        .resizable(false)
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .show(ctx, |ui| {
            ui.set_width(panel.width);
            for entry in &panel.entries {
                match entry {
                    PanelEntry::Control(c) => control(ui, c, params, &mut effects),
                    PanelEntry::Folder(folder) => {
                        egui::CollapsingHeader::new(folder.title)
                            .default_open(folder.open)
                            .show(ui, |ui| {
                                for c in &folder.controls {
                                    control(ui, c, params, &mut effects);
                                }
                            });
                    }
                }
            }
        });

    effects
}

fn control(
    ui: &mut egui::Ui,
    control: &Control<SceneParams, SceneEffect>,
    params: &mut SceneParams,
    effects: &mut Vec<SceneEffect>,
) {
    match control {
        Control::Slider(slider) => {
            let mut value = slider.get(params);
            let response = ui.add(
                egui::Slider::new(&mut value, slider.min..=slider.max)
                    .step_by(slider.step as f64)
                    .text(slider.label),
            );
            if response.changed() {
                slider.set(params, value);
            }
        }
        Control::Color(color) => {
            ui.horizontal(|ui| {
                let mut rgb = color.get(params).0;
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    effects.extend(color.set(params, HexColor(rgb)));
                }
                ui.label(color.label);
            });
        }
    }
}

/// Load and assembly failures, shown until dismissed.
pub fn error_window(ctx: &egui::Context, errors: &mut Vec<String>) {
    if errors.is_empty() {
        return;
    }
    let mut dismissed = false;
    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            for message in errors.iter() {
                ui.colored_label(egui::Color32::LIGHT_RED, message);
            }
            ui.separator();
            dismissed = ui.button("Dismiss").clicked();
        });
    if dismissed {
        errors.clear();
    }
}
