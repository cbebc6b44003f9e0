//! Camera projection and per-frame view state
//!
//! Camera control and input handling live with the application; the core
//! only needs a projection and the camera node's composed transform.

use crate::foundation::math::{Mat4, Vec3};

/// Perspective projection parameters carried by a camera node
#[derive(Debug, Clone, PartialEq)]
pub struct Lens {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport aspect ratio (width / height)
    pub aspect: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
}

impl Lens {
    /// Create a perspective lens from a field of view in degrees
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// Projection matrix for this lens
    pub fn projection_matrix(&self) -> Mat4 {
        nalgebra::Perspective3::new(self.aspect, self.fov_y, self.near, self.far).to_homogeneous()
    }
}

impl Default for Lens {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// Snapshot of the active camera for one frame's draw calls
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    /// Camera's global position (the translucent-sort reference point)
    pub position: Vec3,
    /// View matrix (inverse of the camera node's global transform)
    pub view: Mat4,
    /// Projection matrix from the camera's lens
    pub projection: Mat4,
}

impl CameraView {
    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}
