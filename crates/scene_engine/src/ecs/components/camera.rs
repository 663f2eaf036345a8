//! # Camera component
//!
//! A camera takes its placement from the owning entity's [`Transform`](super::Transform)
//! and only stores projection parameters. The scene keeps a registry of cameras and
//! at most one main camera that render passes draw through.
//!
//! ## Coordinate System
//! Right-handed, Y-up. A camera with identity rotation looks down -Z.

use crate::ecs::{Component, OrderTag};
use crate::foundation::math::{utils, Mat4, Pose, Vec3};

/// Projection model of a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Half of the visible height in world units
        half_height: f32,
    },
}

/// Camera component
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection model
    pub projection: Projection,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Component for Camera {
    fn order_tag(&self) -> OrderTag {
        OrderTag::Camera
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective {
                fov: utils::deg_to_rad(fov_degrees),
            },
            aspect,
            near,
            far,
        }
    }

    /// Create an orthographic camera showing `height` world units vertically
    pub fn orthographic(height: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic {
                half_height: height * 0.5,
            },
            aspect,
            near,
            far,
        }
    }

    /// Update the aspect ratio after a viewport change
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Projection matrix (camera space to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov } => Mat4::new_perspective(self.aspect, fov, self.near, self.far),
            Projection::Orthographic { half_height } => {
                let half_width = half_height * self.aspect;
                Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, self.near, self.far)
            }
        }
    }

    /// View matrix for a camera placed at `world` (world space to camera space)
    ///
    /// Scale of the owning transform is ignored.
    pub fn view_matrix(world: &Pose) -> Mat4 {
        Pose::new(world.position, world.rotation, Vec3::new(1.0, 1.0, 1.0))
            .inverse()
            .to_matrix()
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self, world: &Pose) -> Mat4 {
        self.projection_matrix() * Self::view_matrix(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let world = Pose::new(Vec3::new(0.0, 2.0, 5.0), Default::default(), Vec3::new(3.0, 3.0, 3.0));

        let view = Camera::view_matrix(&world);
        let eye = view.transform_point(&Point3::new(0.0, 2.0, 5.0));

        assert_relative_eq!(eye, Point3::origin(), epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_maps_edges_to_ndc() {
        let camera = Camera::orthographic(10.0, 2.0, 0.1, 100.0);

        let corner = camera.projection_matrix().transform_point(&Point3::new(10.0, 5.0, -1.0));

        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_camera_runs_after_behaviors() {
        let camera = Camera::default();

        assert_eq!(camera.order_tag(), OrderTag::Camera);
        assert!(matches!(camera.projection, Projection::Perspective { .. }));
    }
}
