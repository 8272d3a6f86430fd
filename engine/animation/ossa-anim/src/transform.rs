//! Scale/rotate/translate transforms
//!
//! A [`Transform`] keeps its three components separate so that poses can be
//! interpolated component-wise. Matrices are only produced at the very end of
//! the pipeline, when a palette is built for skinning.

use glam::{Mat4, Quat, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Scale components smaller than this invert to zero instead of infinity
pub const SCALE_EPSILON: f32 = 1.0e-6;

/// Squared quaternion lengths below this are treated as degenerate
pub(crate) const QUAT_EPSILON: f32 = 1.0e-12;

/// A scale/rotate/translate transform
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The transform that changes nothing
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Pure translation
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Pure rotation
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Express `child` in the space `self` lives in
    ///
    /// `self` is the parent. Scales multiply, rotations compose as
    /// `parent * child` and the child's position is scaled, rotated and then
    /// offset by the parent.
    pub fn combine(&self, child: &Self) -> Self {
        Self {
            position: self.position + self.rotation * (self.scale * child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// The transform that undoes this one
    ///
    /// An axis with (near) zero scale inverts to zero scale.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.conjugate();
        let scale = Vec3::new(
            recip_or_zero(self.scale.x),
            recip_or_zero(self.scale.y),
            recip_or_zero(self.scale.z),
        );
        let position = rotation * (scale * -self.position);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Interpolate between two transforms
    ///
    /// Position and scale are linearly interpolated; rotation uses a
    /// normalized lerp along the shorter arc.
    pub fn mix(a: &Self, b: &Self, t: f32) -> Self {
        Self {
            position: a.position.lerp(b.position, t),
            rotation: nlerp(a.rotation, b.rotation, t),
            scale: a.scale.lerp(b.scale, t),
        }
    }

    /// Bake into a column-major matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decompose an affine matrix
    ///
    /// Shear cannot be represented and is discarded.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation: normalize_rotation(rotation),
            scale,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Transform a direction; translation does not apply
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (self.scale * vector)
    }

    /// Component-wise comparison within `max_abs_diff`
    ///
    /// `q` and `-q` describe the same rotation and compare equal.
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

impl std::ops::Mul for Transform {
    type Output = Self;

    /// `parent * child`, same as [`Transform::combine`]
    fn mul(self, rhs: Self) -> Self::Output {
        self.combine(&rhs)
    }
}

fn recip_or_zero(value: f32) -> f32 {
    if value.abs() < SCALE_EPSILON {
        0.0
    } else {
        1.0 / value
    }
}

/// Normalize a quaternion, falling back to identity for a zero quaternion
pub fn normalize_rotation(rotation: Quat) -> Quat {
    let length_squared = rotation.length_squared();
    if length_squared < QUAT_EPSILON {
        Quat::IDENTITY
    } else {
        rotation / length_squared.sqrt()
    }
}

/// Normalized lerp with neighborhood correction
pub fn nlerp(from: Quat, to: Quat, t: f32) -> Quat {
    let to = if from.dot(to) < 0.0 { -to } else { to };
    normalize_rotation(from * (1.0 - t) + to * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn sample() -> Transform {
        Transform::new(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3),
            Vec3::new(2.0, 0.5, 1.5),
        )
    }

    #[test]
    fn test_identity_default() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
        let t = sample();
        assert!(Transform::IDENTITY.combine(&t).abs_diff_eq(&t, 1e-6));
        assert!(t.combine(&Transform::IDENTITY).abs_diff_eq(&t, 1e-6));
    }

    #[test]
    fn test_combine_offsets_child() {
        let parent = Transform::new(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::splat(2.0),
        );
        let child = Transform::from_position(Vec3::X);

        let world = parent.combine(&child);
        // X rotated 90° about Z is Y, scaled by two
        assert!(world.position.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));
        assert_eq!(world.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_inverse_cancels() {
        let t = sample();
        let round = t.inverse().combine(&t);
        assert!(round.abs_diff_eq(&Transform::IDENTITY, 1e-5));
    }

    #[test]
    fn test_inverse_zero_scale() {
        let t = Transform::new(Vec3::ONE, Quat::IDENTITY, Vec3::new(0.0, 2.0, 1.0));
        let inv = t.inverse();
        assert_eq!(inv.scale, Vec3::new(0.0, 0.5, 1.0));
        assert!(inv.position.is_finite());
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Transform::IDENTITY;
        let b = sample();
        assert!(Transform::mix(&a, &b, 0.0).abs_diff_eq(&a, 1e-6));
        assert!(Transform::mix(&a, &b, 1.0).abs_diff_eq(&b, 1e-6));
    }

    #[test]
    fn test_mix_takes_short_arc() {
        let a = Transform::from_rotation(Quat::from_rotation_y(0.2));
        let b = Transform::from_rotation(-Quat::from_rotation_y(0.4));
        let mid = Transform::mix(&a, &b, 0.5);
        let expected = Quat::from_rotation_y(0.3);
        assert!(mid.rotation.abs_diff_eq(expected, 1e-3));
    }

    #[test]
    fn test_matrix_round_trip() {
        let t = sample();
        let back = Transform::from_matrix(&t.to_matrix());
        assert!(back.abs_diff_eq(&t, 1e-4));
    }

    #[test]
    fn test_point_matches_matrix() {
        let t = sample();
        let p = Vec3::new(0.3, 4.0, -1.0);
        let expected = t.to_matrix().transform_point3(p);
        assert!(t.transform_point(p).abs_diff_eq(expected, 1e-4));
        assert!(
            t.transform_vector(p)
                .abs_diff_eq(t.to_matrix().transform_vector3(p), 1e-4)
        );
    }

    #[test]
    fn test_normalize_zero_quat() {
        let q = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
        assert_eq!(normalize_rotation(q), Quat::IDENTITY);
    }
}
