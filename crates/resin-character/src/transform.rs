//! Euler-angle transform for bone-local space.

use glam::{Mat4, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3D transform with Euler-angle rotation.
///
/// Rotation is stored as radians about X, Y and Z and composed in that order,
/// so the matrix is `T * Rx * Ry * Rz * S`. Interpolating two of these is a
/// plain component-wise lerp and is subject to gimbal lock.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EulerTransform {
    /// Position offset.
    pub translation: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    /// Scale factors per axis.
    pub scale: Vec3,
}

impl Default for EulerTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl EulerTransform {
    /// Identity transform (no translation, rotation, or scale).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Creates a new transform.
    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Creates a transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Creates a transform with only rotation.
    pub fn from_rotation(rotation: Vec3) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Converts to a 4x4 matrix (translate, rotate X, Y, Z, then scale).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_scale(self.scale)
    }

    /// Transforms a point.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.to_matrix().transform_point3(point)
    }

    /// Linearly interpolates every component, including the Euler angles.
    pub fn lerp(&self, other: &EulerTransform, t: f32) -> EulerTransform {
        EulerTransform {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.lerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

impl From<EulerTransform> for Mat4 {
    fn from(t: EulerTransform) -> Self {
        t.to_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let t = EulerTransform::IDENTITY;
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(p), p);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translation() {
        let t = EulerTransform::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(p), Vec3::new(11.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_z() {
        let t = EulerTransform::from_rotation(Vec3::new(0.0, 0.0, FRAC_PI_2));
        let result = t.transform_point(Vec3::X);
        assert!(result.x.abs() < 0.0001);
        assert!((result.y - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_rotation_order_is_x_then_y_then_z() {
        let rotation = Vec3::new(0.3, -0.7, 1.1);
        let t = EulerTransform::from_rotation(rotation);
        let expected = Mat4::from_rotation_x(rotation.x)
            * Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_z(rotation.z);
        assert!(t.to_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_scale_applied_before_translation() {
        let t = EulerTransform::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::splat(2.0));
        assert_eq!(t.transform_point(Vec3::ONE), Vec3::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn test_lerp_is_componentwise() {
        let a = EulerTransform::from_rotation(Vec3::ZERO);
        let b = EulerTransform::from_rotation(Vec3::new(1.0, -2.0, 4.0));
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.rotation, Vec3::new(0.5, -1.0, 2.0));
        assert_eq!(mid.scale, Vec3::ONE);
    }
}
