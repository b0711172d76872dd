//! Scene camera

use crate::foundation::math::{constants, Mat4, Mat4Ext, Vec3};

/// Perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position
    pub position: Vec3,
    /// Point looked at
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip distance
    pub near_z: f32,
    /// Far clip distance
    pub far_z: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -10.0),
            target: Vec3::zeros(),
            up: Vec3::y(),
            fov_y: 60.0 * constants::DEG_TO_RAD,
            aspect: 16.0 / 9.0,
            near_z: 0.1,
            far_z: 1000.0,
        }
    }
}

impl Camera {
    /// Camera at `position` looking at `target`
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    /// View matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Projection matrix mapping depth to [0, 1]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov_y, self.aspect, self.near_z, self.far_z)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Euclidean distance from the eye to a world point
    ///
    /// Used to sort render jobs within a pass.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        (point - self.position).norm()
    }
}
