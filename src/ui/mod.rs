//! User interface using egui.
//!
//! Side panel with terrain info, display settings, fly speed and OBJ export.

use egui::Context;

use crate::input::InputConfig;
use crate::renderer::{LightingConfig, RenderMode};
use crate::scene::Scene;
use crate::terrain::ColorScheme;

/// UI state and rendering.
pub struct Ui {
    /// Whether the side panel is visible
    pub panel_visible: bool,
    /// Outcome of the last export, shown under the export button
    pub export_status: Option<String>,
}

impl Ui {
    pub fn new() -> Self {
        Self {
            panel_visible: true,
            export_status: None,
        }
    }

    /// Render the UI and report which actions were requested.
    pub fn render(
        &mut self,
        ctx: &Context,
        scene: &mut Scene,
        render_mode: &mut RenderMode,
        lighting: &mut LightingConfig,
        input: &mut InputConfig,
        fps: f32,
    ) -> UiResponse {
        let mut response = UiResponse::default();

        // Toggle panel with Tab key
        if ctx.input(|i| i.key_pressed(egui::Key::Tab)) {
            self.panel_visible = !self.panel_visible;
        }

        if !self.panel_visible {
            return response;
        }

        egui::SidePanel::left("controls")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("heightscape");
                ui.separator();

                ui.label(format!("FPS: {:.1}", fps));
                let (columns, rows) = scene.terrain.grid;
                ui.label(format!("Grid: {} x {}", columns, rows));
                ui.label(format!(
                    "Elevation: {:.1} .. {:.1}",
                    scene.terrain.elevation.min, scene.terrain.elevation.max
                ));
                ui.separator();

                ui.collapsing("Display", |ui| {
                    egui::ComboBox::from_label("Mode")
                        .selected_text(format!("{:?}", render_mode))
                        .show_ui(ui, |ui| {
                            ui.selectable_value(render_mode, RenderMode::Solid, "Solid");
                            ui.selectable_value(render_mode, RenderMode::Wireframe, "Wireframe");
                            ui.selectable_value(render_mode, RenderMode::Both, "Both");
                        });

                    egui::ComboBox::from_label("Colors")
                        .selected_text(scene.color_scheme.label())
                        .show_ui(ui, |ui| {
                            for scheme in ColorScheme::ALL {
                                ui.selectable_value(&mut scene.color_scheme, scheme, scheme.label());
                            }
                        });

                    ui.horizontal(|ui| {
                        ui.label("Ambient:");
                        ui.add(egui::Slider::new(&mut lighting.ambient, 0.0..=1.0));
                    });
                });

                ui.collapsing("Camera", |ui| {
                    let camera = &mut scene.camera;
                    ui.label(format!(
                        "Position: {:.0}, {:.0}, {:.0}",
                        camera.position.x, camera.position.y, camera.position.z
                    ));

                    ui.horizontal(|ui| {
                        ui.label("FOV:");
                        ui.add(
                            egui::DragValue::new(&mut camera.fov)
                                .speed(1.0)
                                .suffix("°")
                                .range(10.0..=120.0),
                        );
                    });

                    ui.horizontal(|ui| {
                        ui.label("Speed:");
                        ui.add(
                            egui::DragValue::new(&mut input.movement_speed)
                                .speed(5.0)
                                .range(10.0..=5000.0),
                        );
                    });

                    ui.checkbox(&mut input.enable_damping, "Damping");

                    if ui.button("Reset Camera").clicked() {
                        response.reset_camera = true;
                    }
                });

                ui.separator();

                if ui.button("Export OBJ").clicked() {
                    response.export_obj = true;
                }
                if let Some(status) = &self.export_status {
                    ui.label(status.as_str());
                }

                ui.separator();

                ui.collapsing("Controls", |ui| {
                    ui.label("W/S: Forward/Back");
                    ui.label("A/D: Left/Right");
                    ui.label("R/F: Up/Down");
                    ui.label("Arrows: Pitch/Yaw");
                    ui.label("Q/E: Roll");
                    ui.label("Drag: Look");
                    ui.label("Shift: Slow");
                    ui.label("Home: Reset Camera");
                    ui.label("Ctrl+S: Export OBJ");
                    ui.label("Tab: Toggle Panel");
                    ui.label("ESC: Quit");
                });
            });

        response
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from UI indicating what actions to take.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UiResponse {
    pub reset_camera: bool,
    pub export_obj: bool,
}
