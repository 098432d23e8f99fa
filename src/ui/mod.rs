mod gizmo;

pub use gizmo::ViewportGizmo;

use crate::controller::{
    FrameController, FrameEdits, GizmoOperation, PointerDrag, SceneRequest, MOUSE_SENSITIVITY_RANGE,
};
use crate::render::{DragMode, FrameBuffer, RendererFactory};
use crate::scene::material::AT_DISTANCE_RANGE;
use crate::scene::{Material, SceneLoader, TransformComponents};
use std::ops::RangeInclusive;

const FOV_RANGE: RangeInclusive<f32> = 10.0..=90.0;
/// Aperture is edited in thousandths of a scene unit.
const APERTURE_UI_SCALE: f32 = 1000.0;
const APERTURE_UI_RANGE: RangeInclusive<f32> = 0.0..=10.8;
const FOCAL_DIST_RANGE: RangeInclusive<f32> = 0.01..=50.0;
const DEPTH_RANGE: RangeInclusive<u32> = 1..=10;
const HDR_MULTIPLIER_RANGE: RangeInclusive<f32> = 0.1..=10.0;

/// Actions the panels ask the application to perform after the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Screenshot,
    Denoise,
    OpenScene,
    SaveScene,
}

/// What one UI pass produced for the frame controller.
#[derive(Debug, Default)]
pub struct UiFrame {
    pub edits: FrameEdits,
    pub commands: Vec<UiCommand>,
    pub viewport: Option<[u32; 2]>,
    pub drag: Option<PointerDrag>,
}

impl UiFrame {
    /// Folds a later egui pass of the same frame into this one. The later
    /// pass owns the final layout; pointer drags only carry a delta on the
    /// pass that consumed the input, so the first one is kept.
    pub fn merge(mut self, later: UiFrame) -> UiFrame {
        self.edits.merge(later.edits);
        self.commands.extend(later.commands);
        self.viewport = later.viewport.or(self.viewport);
        self.drag = self.drag.or(later.drag);
        self
    }
}

pub struct UiState {
    show_denoiser: bool,
    status: String,
    viewport_texture: Option<egui::TextureHandle>,
    denoiser_texture: Option<egui::TextureHandle>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            show_denoiser: false,
            status: String::new(),
            viewport_texture: None,
            denoiser_texture: None,
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn open_denoiser(&mut self) {
        self.show_denoiser = true;
    }

    /// Draws every panel against the controller's working state.
    pub fn show<F, L>(&mut self, ctx: &egui::Context, controller: &mut FrameController<F, L>) -> UiFrame
    where
        F: RendererFactory,
        L: SceneLoader,
    {
        let mut frame = UiFrame::default();

        if !ctx.wants_keyboard_input() {
            let operation = ctx.input(|input| {
                if input.key_pressed(egui::Key::Z) {
                    Some(GizmoOperation::Translate)
                } else if input.key_pressed(egui::Key::E) {
                    Some(GizmoOperation::Rotate)
                } else if input.key_pressed(egui::Key::R) {
                    Some(GizmoOperation::Scale)
                } else {
                    None
                }
            });
            if let Some(operation) = operation {
                controller.set_gizmo_operation(operation);
            }
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.settings_section(ui, controller, &mut frame);
                    render_settings_section(ui, controller, &mut frame);
                    objects_section(ui, controller, &mut frame);
                });
            });

        if self.show_denoiser {
            self.denoiser_window(ctx, controller);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.viewport(ui, controller, &mut frame));

        frame
    }

    fn settings_section<F, L>(
        &mut self,
        ui: &mut egui::Ui,
        controller: &mut FrameController<F, L>,
        frame: &mut UiFrame,
    ) where
        F: RendererFactory,
        L: SceneLoader,
    {
        egui::CollapsingHeader::new("Settings")
            .default_open(true)
            .show(ui, |ui| {
                ui.label(format!("Samples: {}", controller.sample_count()));

                let mut sensitivity = controller.mouse_sensitivity();
                if ui
                    .add(egui::Slider::new(&mut sensitivity, MOUSE_SENSITIVITY_RANGE).text("Mouse Sensitivity"))
                    .changed()
                {
                    controller.set_mouse_sensitivity(sensitivity);
                }

                ui.horizontal(|ui| {
                    if ui.button("Screenshot").clicked() {
                        frame.commands.push(UiCommand::Screenshot);
                    }
                    if ui.button("Open Scene...").clicked() {
                        frame.commands.push(UiCommand::OpenScene);
                    }
                    if ui.button("Save Scene...").clicked() {
                        frame.commands.push(UiCommand::SaveScene);
                    }
                });

                let names = controller.catalog().display_names();
                if !names.is_empty() {
                    let current = controller.current_catalog_index();
                    let selected_text = current
                        .and_then(|index| names.get(index).cloned())
                        .unwrap_or_else(|| controller.scene_path().display().to_string());
                    let mut choice = current;
                    egui::ComboBox::from_label("Scenes")
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            for (index, name) in names.iter().enumerate() {
                                ui.selectable_value(&mut choice, Some(index), name.as_str());
                            }
                        });
                    if let Some(index) = choice.filter(|&index| Some(index) != current) {
                        controller.request_scene(SceneRequest::Catalog(index));
                    }
                }

                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(self.status.as_str());
                }
            });
    }

    fn denoiser_window<F, L>(&mut self, ctx: &egui::Context, controller: &FrameController<F, L>)
    where
        F: RendererFactory,
        L: SceneLoader,
    {
        let Some(image) = controller.denoised_image() else {
            return;
        };
        let texture = upload(ctx, &mut self.denoiser_texture, "denoised", image);
        let mut open = self.show_denoiser;
        egui::Window::new("Denoiser")
            .open(&mut open)
            .default_width(480.0)
            .show(ctx, |ui| {
                let width = ui.available_width().max(1.0);
                let aspect = image.height.max(1) as f32 / image.width.max(1) as f32;
                ui.image((texture, egui::vec2(width, width * aspect)));
            });
        self.show_denoiser = open;
    }

    fn viewport<F, L>(&mut self, ui: &mut egui::Ui, controller: &mut FrameController<F, L>, frame: &mut UiFrame)
    where
        F: RendererFactory,
        L: SceneLoader,
    {
        let size = ui.available_size();
        let pixels_per_point = ui.ctx().pixels_per_point();
        let viewport = [
            (size.x * pixels_per_point).round().max(1.0) as u32,
            (size.y * pixels_per_point).round().max(1.0) as u32,
        ];
        frame.viewport = Some(viewport);

        let texture = upload(ui.ctx(), &mut self.viewport_texture, "viewport", controller.presentable_image());
        let response = ui.add(
            egui::Image::new((texture, size)).sense(egui::Sense::click_and_drag()),
        );

        let delta = response.drag_delta() * pixels_per_point;
        if delta == egui::Vec2::ZERO {
            return;
        }
        let manipulating = ui.input(|input| input.modifiers.ctrl);
        if manipulating && response.dragged_by(egui::PointerButton::Primary) {
            let mut gizmo = ViewportGizmo::new(controller.scene().camera(), viewport[1] as f32, delta.x, delta.y);
            frame.edits.transform_changed |= controller.edit_selected_transform(&mut gizmo);
            return;
        }

        let mode = if response.dragged_by(egui::PointerButton::Primary) {
            Some(DragMode::Orbit)
        } else if response.dragged_by(egui::PointerButton::Secondary) {
            Some(DragMode::Dolly)
        } else if response.dragged_by(egui::PointerButton::Middle) {
            Some(DragMode::Pan)
        } else {
            None
        };
        frame.drag = mode.map(|mode| PointerDrag {
            mode,
            dx: delta.x,
            dy: delta.y,
        });
    }
}

fn render_settings_section<F, L>(ui: &mut egui::Ui, controller: &mut FrameController<F, L>, frame: &mut UiFrame)
where
    F: RendererFactory,
    L: SceneLoader,
{
    egui::CollapsingHeader::new("Render Settings")
        .default_open(true)
        .show(ui, |ui| {
            // Soft/structural classification happens in the controller by
            // diffing these against the applied options.
            let options = controller.options_mut();
            ui.add(egui::Slider::new(&mut options.max_depth, DEPTH_RANGE).text("Max Depth"));
            ui.checkbox(&mut options.use_env_map, "Use Environment Map");
            ui.add_enabled(
                options.use_env_map,
                egui::Slider::new(&mut options.hdr_multiplier, HDR_MULTIPLIER_RANGE).text("HDR multiplier"),
            );
            ui.checkbox(&mut options.enable_rr, "Enable Russian Roulette");
            ui.add_enabled(
                options.enable_rr,
                egui::Slider::new(&mut options.rr_depth, DEPTH_RANGE).text("Russian Roulette Depth"),
            );
            ui.checkbox(&mut options.use_constant_bg, "Use Constant Background");
            ui.horizontal(|ui| {
                ui.color_edit_button_rgb(&mut options.background_color);
                ui.label("Background Color");
            });
            ui.horizontal(|ui| {
                ui.checkbox(&mut options.enable_denoiser, "Enable Denoiser");
                if ui.button("Denoise").clicked() {
                    frame.commands.push(UiCommand::Denoise);
                }
            });

            egui::CollapsingHeader::new("Camera")
                .default_open(true)
                .show(ui, |ui| {
                    frame.edits.soft_options_changed |= camera_editor(ui, controller);
                });
        });
}

fn camera_editor<F, L>(ui: &mut egui::Ui, controller: &mut FrameController<F, L>) -> bool
where
    F: RendererFactory,
    L: SceneLoader,
{
    let camera = controller.scene_mut().camera_mut();
    let mut changed = false;

    let mut fov = camera.fov_degrees();
    if ui.add(egui::Slider::new(&mut fov, FOV_RANGE).text("Fov")).changed() {
        camera.set_fov_degrees(fov);
        changed = true;
    }

    let mut aperture = camera.aperture * APERTURE_UI_SCALE;
    if ui
        .add(egui::Slider::new(&mut aperture, APERTURE_UI_RANGE).text("Aperture"))
        .changed()
    {
        camera.aperture = aperture / APERTURE_UI_SCALE;
        changed = true;
    }

    changed |= ui
        .add(egui::Slider::new(&mut camera.focal_dist, FOCAL_DIST_RANGE).text("Focal Distance"))
        .changed();

    let position = camera.position();
    ui.label(format!("Pos: {:.2}, {:.2}, {:.2}", position.x, position.y, position.z));
    ui.label(format!(
        "Yaw: {:.1}  Pitch: {:.1}",
        camera.yaw().to_degrees(),
        camera.pitch().to_degrees()
    ));
    changed
}

fn objects_section<F, L>(ui: &mut egui::Ui, controller: &mut FrameController<F, L>, frame: &mut UiFrame)
where
    F: RendererFactory,
    L: SceneLoader,
{
    egui::CollapsingHeader::new("Objects")
        .default_open(true)
        .show(ui, |ui| {
            let names: Vec<String> = controller
                .scene()
                .instance_names()
                .into_iter()
                .map(str::to_owned)
                .collect();
            if names.is_empty() {
                ui.label("Scene has no mesh instances");
                return;
            }

            let selected = controller.session().selected();
            egui::ScrollArea::vertical()
                .id_salt("instances")
                .max_height(160.0)
                .show(ui, |ui| {
                    for (index, name) in names.iter().enumerate() {
                        if ui.selectable_label(selected == Some(index), name.as_str()).clicked() {
                            controller.select_instance(index);
                        }
                    }
                });

            ui.separator();
            ui.horizontal(|ui| {
                let mut operation = controller.session().operation();
                for candidate in GizmoOperation::ALL {
                    ui.radio_value(&mut operation, candidate, candidate.label());
                }
                controller.set_gizmo_operation(operation);
            });
            ui.small("Ctrl + drag in the viewport to manipulate");

            let mut editor = |_: GizmoOperation, components: &mut TransformComponents| {
                transform_editor(ui, components);
            };
            frame.edits.transform_changed |= controller.edit_selected_transform(&mut editor);

            let Some(index) = controller.session().selected() else {
                return;
            };
            if let Some(material) = controller.scene_mut().material_for_instance_mut(index) {
                ui.separator();
                frame.edits.material_changed |= material_editor(ui, material);
            }
        });
}

fn transform_editor(ui: &mut egui::Ui, components: &mut TransformComponents) {
    let defaults = TransformComponents::default();
    vector_row(ui, "Position", &mut components.translation, defaults.translation, 0.01);
    vector_row(ui, "Rotation", &mut components.rotation_deg, defaults.rotation_deg, 0.5);
    vector_row(ui, "Scale", &mut components.scale, defaults.scale, 0.01);
}

fn vector_row(ui: &mut egui::Ui, label: &str, values: &mut [f32; 3], reset: [f32; 3], speed: f64) {
    ui.horizontal(|ui| {
        ui.label(label);
        for (axis, (value, default)) in ["X", "Y", "Z"].iter().zip(values.iter_mut().zip(reset)) {
            if ui.small_button(*axis).clicked() {
                *value = default;
            }
            ui.add(egui::DragValue::new(value).speed(speed));
        }
    });
}

/// Returns true when any field was edited.
fn material_editor(ui: &mut egui::Ui, material: &mut Material) -> bool {
    let mut changed = false;
    ui.label(format!("Material: {}", material.name));
    for (label, color) in [
        ("Albedo", &mut material.albedo),
        ("Extinction", &mut material.extinction),
    ] {
        ui.horizontal(|ui| {
            changed |= ui.color_edit_button_rgb(color).changed();
            ui.label(label);
        });
    }
    ui.horizontal(|ui| {
        ui.label("Emission");
        for channel in material.emission.iter_mut() {
            changed |= ui
                .add(egui::DragValue::new(channel).speed(0.1).range(0.0..=f32::MAX))
                .changed();
        }
    });
    for param in material.scalar_params_mut() {
        let logarithmic = param.range == AT_DISTANCE_RANGE;
        changed |= ui
            .add(
                egui::Slider::new(param.value, param.range)
                    .logarithmic(logarithmic)
                    .text(param.label),
            )
            .changed();
    }
    changed
}

fn upload(
    ctx: &egui::Context,
    slot: &mut Option<egui::TextureHandle>,
    name: &str,
    image: &FrameBuffer,
) -> egui::TextureId {
    let color_image = egui::ColorImage::from_rgb(
        [image.width as usize, image.height as usize],
        &image.pixels,
    );
    if let Some(texture) = slot.as_mut() {
        texture.set(color_image, egui::TextureOptions::LINEAR);
        return texture.id();
    }
    let texture = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);
    let id = texture.id();
    *slot = Some(texture);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_passes_keep_edits_commands_and_first_drag() {
        let first = UiFrame {
            edits: FrameEdits { material_changed: true, ..Default::default() },
            commands: vec![UiCommand::Screenshot],
            viewport: Some([640, 480]),
            drag: Some(PointerDrag { mode: DragMode::Orbit, dx: 4.0, dy: 1.0 }),
        };
        let second = UiFrame {
            edits: FrameEdits { transform_changed: true, ..Default::default() },
            commands: vec![],
            viewport: Some([600, 480]),
            drag: Some(PointerDrag { mode: DragMode::Orbit, dx: 0.0, dy: 0.0 }),
        };

        let merged = first.merge(second);
        assert!(merged.edits.material_changed);
        assert!(merged.edits.transform_changed);
        assert_eq!(merged.commands, vec![UiCommand::Screenshot]);
        assert_eq!(merged.viewport, Some([600, 480]));
        assert_eq!(merged.drag.map(|drag| drag.dx), Some(4.0));
    }

    #[test]
    fn empty_later_pass_keeps_layout() {
        let first = UiFrame { viewport: Some([320, 200]), ..Default::default() };
        let merged = first.merge(UiFrame::default());
        assert_eq!(merged.viewport, Some([320, 200]));
        assert!(merged.drag.is_none());
    }
}
