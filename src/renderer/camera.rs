use glam::{Mat4, Quat, Vec3};

/// Starting distance from the origin along +Z.
pub const START_DISTANCE: f32 = 1800.0;

/// Free-flying perspective camera.
///
/// Looks down its local -Z axis with +Y up, like a scene-graph camera node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, START_DISTANCE),
            orientation: Quat::IDENTITY,
            fov: 20.0,
            near: 1.0,
            far: 10_000.0,
        };
        camera.look_at(Vec3::ZERO);
        camera
    }

    /// Turn the camera to face `target`, keeping +Y as up.
    ///
    /// Leaves the orientation unchanged when the target coincides with the
    /// camera or sits straight above or below it.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(dir) = (target - self.position).try_normalize() else {
            return;
        };
        if dir.cross(Vec3::Y).length_squared() < 1e-8 {
            return;
        }
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        self.orientation = Quat::from_mat4(&view).inverse().normalize();
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// Move along the camera's own axes.
    pub fn translate_local(&mut self, offset: Vec3) {
        self.position += self.orientation * offset;
    }

    /// Apply a rotation expressed in the camera's own frame.
    pub fn rotate_local(&mut self, rotation: Quat) {
        self.orientation = (self.orientation * rotation).normalize();
    }

    /// Build view matrix (inverse of the camera transform)
    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    /// Build perspective projection matrix
    pub fn build_projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn build_view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.build_projection_matrix(aspect) * self.build_view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
