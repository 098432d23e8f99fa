use glam::{Mat4, Vec3};

/// Pitch never reaches the poles, otherwise the basis flips.
pub const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;
pub const MIN_RADIUS: f32 = 0.01;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1000.0;

const WORLD_UP: Vec3 = Vec3::Y;

/// Which pointer interaction drives the camera this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Orbit,
    Dolly,
    Pan,
}

/// Orbiting thin-lens camera.
///
/// The camera circles `pivot` at distance `radius`; `yaw`/`pitch` are radians.
/// `position` and the basis vectors are derived and refreshed after every
/// mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pivot: Vec3,
    radius: f32,
    yaw: f32,
    pitch: f32,
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aperture: f32,
    pub focal_dist: f32,
    pub is_moving: bool,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, fov_deg: f32) -> Self {
        let offset = target - eye;
        let radius = offset.length().max(MIN_RADIUS);
        let forward = if offset.length_squared() > 1e-12 {
            offset.normalize()
        } else {
            Vec3::NEG_Z
        };
        let pitch = forward.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let yaw = forward.z.atan2(forward.x);
        let mut camera = Self {
            pivot: target,
            radius,
            yaw,
            pitch,
            position: eye,
            forward,
            right: Vec3::X,
            up: Vec3::Y,
            fov: fov_deg.to_radians(),
            aperture: 0.0,
            focal_dist: 1.0,
            is_moving: false,
        };
        camera.update_basis();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.forward, self.right, self.up)
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    pub fn set_fov_degrees(&mut self, fov_deg: f32) {
        self.fov = fov_deg.clamp(1.0, 179.0).to_radians();
    }

    /// Applies a pointer drag of `(dx, dy)` pixels in the given mode.
    pub fn drag(&mut self, mode: DragMode, dx: f32, dy: f32, sensitivity: f32) {
        match mode {
            DragMode::Orbit => self.offset_orientation(dx * sensitivity, dy * sensitivity),
            DragMode::Dolly => self.offset_radius(dy * sensitivity),
            DragMode::Pan => self.strafe(dx * sensitivity, dy * sensitivity),
        }
        self.is_moving = true;
    }

    /// Yaw is unbounded, pitch stays inside [`PITCH_LIMIT`].
    pub fn offset_orientation(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_basis();
    }

    pub fn offset_radius(&mut self, delta: f32) {
        self.radius = (self.radius + delta).max(MIN_RADIUS);
        self.update_basis();
    }

    pub fn strafe(&mut self, dx: f32, dy: f32) {
        self.pivot += self.right * -dx + self.up * dy;
        self.update_basis();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.pivot, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov, aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self, aspect: f32) -> (Mat4, Mat4) {
        (self.view_matrix(), self.projection_matrix(aspect))
    }

    fn update_basis(&mut self) {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.forward = Vec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
        self.position = self.pivot - self.forward * self.radius;
        self.right = self.forward.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 45.0)
    }
}
