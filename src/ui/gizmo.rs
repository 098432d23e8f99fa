//! Viewport manipulation of the selected instance (Ctrl + primary drag).

use crate::controller::{GizmoOperation, TransformManipulator};
use crate::render::Camera;
use crate::scene::TransformComponents;
use glam::Vec3;

const ROTATE_DEG_PER_PIXEL: f32 = 0.5;
const SCALE_PER_PIXEL: f32 = 0.01;
const MIN_SCALE: f32 = 0.001;

/// One frame of pointer drag applied with the active gizmo operation.
pub struct ViewportGizmo {
    right: Vec3,
    up: Vec3,
    world_per_pixel: f32,
    dx: f32,
    dy: f32,
}

impl ViewportGizmo {
    /// `viewport_height` in the same pixel units as `dx`/`dy`.
    pub fn new(camera: &Camera, viewport_height: f32, dx: f32, dy: f32) -> Self {
        let (_, right, up) = camera.basis();
        let height = viewport_height.max(1.0);
        let world_per_pixel = 2.0 * camera.radius() * (camera.fov * 0.5).tan() / height;
        Self {
            right,
            up,
            world_per_pixel,
            dx,
            dy,
        }
    }
}

impl TransformManipulator for ViewportGizmo {
    fn manipulate(&mut self, operation: GizmoOperation, components: &mut TransformComponents) {
        if self.dx == 0.0 && self.dy == 0.0 {
            return;
        }
        match operation {
            GizmoOperation::Translate => {
                // Screen y grows downwards.
                let offset = (self.right * self.dx - self.up * self.dy) * self.world_per_pixel;
                let translation = Vec3::from(components.translation) + offset;
                components.translation = translation.to_array();
            }
            GizmoOperation::Rotate => {
                components.rotation_deg[1] += self.dx * ROTATE_DEG_PER_PIXEL;
                components.rotation_deg[0] += self.dy * ROTATE_DEG_PER_PIXEL;
            }
            GizmoOperation::Scale => {
                let factor = (1.0 - self.dy * SCALE_PER_PIXEL).max(0.0);
                for axis in components.scale.iter_mut() {
                    let scaled = *axis * factor;
                    *axis = if scaled.abs() < MIN_SCALE {
                        MIN_SCALE.copysign(*axis)
                    } else {
                        scaled
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_follows_camera_plane() {
        let camera = Camera::default();
        let mut gizmo = ViewportGizmo::new(&camera, 100.0, 10.0, 0.0);
        let mut components = TransformComponents::default();
        gizmo.manipulate(GizmoOperation::Translate, &mut components);
        // Default camera looks down -Z, so screen right is +X.
        assert!(components.translation[0] > 0.0);
        assert!(components.translation[1].abs() < 1e-6);
        assert!(components.translation[2].abs() < 1e-6);
    }

    #[test]
    fn drag_up_scales_up_and_never_collapses() {
        let camera = Camera::default();
        let mut components = TransformComponents::default();
        ViewportGizmo::new(&camera, 100.0, 0.0, -20.0).manipulate(GizmoOperation::Scale, &mut components);
        assert!((components.scale[0] - 1.2).abs() < 1e-5);

        ViewportGizmo::new(&camera, 100.0, 0.0, 1000.0).manipulate(GizmoOperation::Scale, &mut components);
        assert_eq!(components.scale, [MIN_SCALE; 3]);
    }

    #[test]
    fn rotate_maps_axes_and_zero_drag_is_inert() {
        let camera = Camera::default();
        let mut components = TransformComponents::default();
        ViewportGizmo::new(&camera, 100.0, 4.0, 2.0).manipulate(GizmoOperation::Rotate, &mut components);
        assert_eq!(components.rotation_deg, [1.0, 2.0, 0.0]);

        let before = components;
        ViewportGizmo::new(&camera, 100.0, 0.0, 0.0).manipulate(GizmoOperation::Scale, &mut components);
        assert_eq!(components, before);
    }
}
