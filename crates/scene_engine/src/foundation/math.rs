//! Math utilities and types
//!
//! Provides the vector, quaternion and pose types used by the transform hierarchy.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Position, rotation and scale of a node, either relative to its parent or in world space
///
/// Composition follows the scene convention: scale is applied first (component-wise),
/// then rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Pose {
    /// Create a new identity pose
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a pose with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a pose with position, rotation and scale
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this pose to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3::from(self.position + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Compose a child pose expressed relative to `self` into the space `self` lives in
    ///
    /// `self` plays the parent role: the result is the child's pose in the parent's space.
    pub fn combine(&self, child: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Express `self` relative to `parent`, the exact inverse of [`Pose::combine`]
    ///
    /// `parent.combine(&self.relative_to(parent))` reproduces `self`. Zero parent
    /// scale axes cannot be inverted and yield zero on that axis.
    pub fn relative_to(&self, parent: &Pose) -> Pose {
        let inv_rotation = parent.rotation.inverse();
        Pose {
            position: safe_component_div(&(inv_rotation * (self.position - parent.position)), &parent.scale),
            rotation: inv_rotation * self.rotation,
            scale: safe_component_div(&self.scale, &parent.scale),
        }
    }

    /// Get the inverse pose
    pub fn inverse(&self) -> Pose {
        Pose::identity().relative_to(self)
    }
}

/// Component-wise division that maps division by zero to zero
pub fn safe_component_div(value: &Vec3, divisor: &Vec3) -> Vec3 {
    Vec3::new(
        safe_div(value.x, divisor.x),
        safe_div(value.y, divisor.y),
        safe_div(value.z, divisor.z),
    )
}

fn safe_div(value: f32, divisor: f32) -> f32 {
    if divisor.abs() <= f32::EPSILON {
        0.0
    } else {
        value / divisor
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Rotation of `angle` radians about an arbitrary (not necessarily normalized) axis
    pub fn axis_angle(axis: Vec3, angle: f32) -> Quat {
        Quat::from_axis_angle(&Unit::new_normalize(axis), angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_pose_combine_rotates_and_scales_child_offset() {
        let parent = Pose::new(
            Vec3::new(1.0, 0.0, 0.0),
            utils::axis_angle(Vec3::y(), constants::HALF_PI),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let child = Pose::from_position(Vec3::new(0.0, 0.0, 1.0));

        let world = parent.combine(&child);

        // (0,0,2) rotated 90 degrees about Y lands on +X
        assert_relative_eq!(world.position, Vec3::new(3.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(world.scale, Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_relative_to_inverts_combine_with_nonuniform_scale() {
        let parent = Pose::new(
            Vec3::new(-3.0, 4.0, 1.5),
            utils::axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7),
            Vec3::new(2.0, 0.5, 3.0),
        );
        let world = Pose::new(
            Vec3::new(2.0, -1.0, 7.0),
            utils::axis_angle(Vec3::z(), 1.2),
            Vec3::new(1.0, 4.0, 0.25),
        );

        let local = world.relative_to(&parent);
        let recomposed = parent.combine(&local);

        assert_relative_eq!(recomposed.position, world.position, epsilon = 1e-4);
        assert_relative_eq!(recomposed.scale, world.scale, epsilon = 1e-4);
        assert!(recomposed.rotation.angle_to(&world.rotation) < 1e-4);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let pose = Pose::new(
            Vec3::new(2.0, 3.0, 1.0),
            utils::axis_angle(Vec3::y(), 0.785),
            Vec3::new(2.0, 2.0, 2.0),
        );

        let should_be_identity = pose.combine(&pose.inverse());

        assert_relative_eq!(should_be_identity.position, Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(should_be_identity.scale, Vec3::new(1.0, 1.0, 1.0), epsilon = EPSILON);
        assert!(should_be_identity.rotation.angle() < 1e-4);
    }

    #[test]
    fn test_matrix_agrees_with_transform_point() {
        let pose = Pose::new(
            Vec3::new(1.0, 2.0, 3.0),
            utils::axis_angle(Vec3::new(1.0, 1.0, 1.0), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );
        let point = Point3::new(0.3, -1.0, 2.0);

        let by_matrix = pose.to_matrix().transform_point(&point);
        let direct = pose.transform_point(point);

        assert_relative_eq!(by_matrix, direct, epsilon = EPSILON);
    }

    #[test]
    fn test_zero_scale_axis_does_not_produce_nan() {
        let parent = Pose::new(Vec3::zeros(), Quat::identity(), Vec3::new(0.0, 1.0, 1.0));
        let world = Pose::from_position(Vec3::new(5.0, 5.0, 5.0));

        let local = world.relative_to(&parent);

        assert!(local.position.iter().all(|v| v.is_finite()));
        assert_eq!(local.position.x, 0.0);
    }
}
