//! Viewer session state.
//!
//! [`Scene`] owns everything the render loop, input handlers and exporter
//! share: the terrain mesh, its placement, the camera and display settings.

use std::f32::consts::PI;

use glam::{Mat3, Mat4, Vec3};

use crate::renderer::camera::Camera;
use crate::terrain::{ColorScheme, ElevationRange, TerrainMesh};

/// Vertical offset of the terrain below the origin.
pub const TERRAIN_OFFSET_Y: f32 = -50.0;
/// Tilt around X applied first (radians).
pub const TERRAIN_TILT_X: f32 = PI / 1.6;
/// Turn around Y applied after the tilt (radians).
pub const TERRAIN_TURN_Y: f32 = PI;

pub struct Scene {
    pub terrain: TerrainMesh,
    /// Terrain model transform; fixed once the scene is built
    pub model: Mat4,
    pub camera: Camera,
    /// Clear color (linear RGB)
    pub background: [f32; 3],
    pub color_scheme: ColorScheme,
}

impl Scene {
    pub fn new(terrain: TerrainMesh) -> Self {
        Self {
            terrain,
            model: terrain_transform(),
            camera: Camera::new(),
            background: [1.0, 1.0, 1.0],
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn with_color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.color_scheme = color_scheme;
        self
    }

    pub fn reset_camera(&mut self) {
        self.camera = Camera::new();
    }

    pub fn elevation(&self) -> ElevationRange {
        self.terrain.elevation
    }

    /// Inverse-transpose of the model matrix, for transforming normals.
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.model).inverse().transpose()
    }

    /// Vertex position in world space.
    pub fn world_position(&self, index: usize) -> Vec3 {
        self.model
            .transform_point3(Vec3::from(self.terrain.vertices[index].position))
    }
}

/// Translation, then X-Y-Z Euler rotation (tilt around X, turn around Y).
pub fn terrain_transform() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, TERRAIN_OFFSET_Y, 0.0))
        * Mat4::from_rotation_x(TERRAIN_TILT_X)
        * Mat4::from_rotation_y(TERRAIN_TURN_Y)
}
