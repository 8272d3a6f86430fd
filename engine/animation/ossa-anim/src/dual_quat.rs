//! Dual quaternions for rigid skinning
//!
//! A dual quaternion carries rotation and translation only. Scale is dropped
//! on conversion from a [`Transform`].

use glam::{Quat, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::transform::{QUAT_EPSILON, Transform};

/// Rigid transform stored as `real + ε·dual`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct DualQuat {
    /// Rotation part
    pub real: Quat,
    /// Half the translation, premultiplied onto the rotation
    pub dual: Quat,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl DualQuat {
    pub const IDENTITY: Self = Self {
        real: Quat::IDENTITY,
        dual: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
    };

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let t = Quat::from_xyzw(translation.x, translation.y, translation.z, 0.0);
        Self {
            real: rotation,
            dual: (t * rotation) * 0.5,
        }
    }

    pub fn translation(&self) -> Vec3 {
        let t = (self.dual * 2.0) * self.real.conjugate();
        Vec3::new(t.x, t.y, t.z)
    }

    /// Back to a transform with unit scale
    pub fn to_transform(&self) -> Transform {
        Transform::new(self.translation(), self.real, Vec3::ONE)
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.real.dot(other.real)
    }

    /// Scale both parts so the real part has unit length
    pub fn normalize(&self) -> Self {
        let length_squared = self.real.length_squared();
        if length_squared < QUAT_EPSILON {
            return Self::IDENTITY;
        }
        let inv_length = 1.0 / length_squared.sqrt();
        Self {
            real: self.real * inv_length,
            dual: self.dual * inv_length,
        }
    }

    /// Inverse of a unit dual quaternion
    pub fn inverse(&self) -> Self {
        Self {
            real: self.real.conjugate(),
            dual: self.dual.conjugate(),
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.real * point + self.translation()
    }

    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.real * vector
    }

    /// Flattened `[real.xyzw, dual.xyzw]` for uniform upload
    pub fn to_array(&self) -> [f32; 8] {
        let r = self.real;
        let d = self.dual;
        [r.x, r.y, r.z, r.w, d.x, d.y, d.z, d.w]
    }
}

impl From<Transform> for DualQuat {
    fn from(transform: Transform) -> Self {
        Self::from_rotation_translation(transform.rotation, transform.position)
    }
}

impl std::ops::Mul for DualQuat {
    type Output = Self;

    /// `parent * child`: applies `rhs` first, then `self`
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            real: self.real * rhs.real,
            dual: self.real * rhs.dual + self.dual * rhs.real,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rigid(x: f32, angle: f32) -> Transform {
        Transform::new(Vec3::new(x, 1.0, -2.0), Quat::from_rotation_z(angle), Vec3::ONE)
    }

    #[test]
    fn test_identity() {
        let dq = DualQuat::IDENTITY;
        assert_eq!(dq.transform_point(Vec3::X), Vec3::X);
        assert_eq!(dq.translation(), Vec3::ZERO);
    }

    #[test]
    fn test_round_trip() {
        let t = rigid(3.0, 0.8);
        let back = DualQuat::from(t).to_transform();
        assert!(back.abs_diff_eq(&t, 1e-5));
    }

    #[test]
    fn test_composition_matches_transform() {
        let parent = rigid(1.0, 0.5);
        let child = rigid(-2.0, 1.1);

        let dq = DualQuat::from(parent) * DualQuat::from(child);
        let expected = parent.combine(&child);
        assert!(dq.to_transform().abs_diff_eq(&expected, 1e-5));

        let p = Vec3::new(0.5, 0.25, 2.0);
        assert!(
            dq.transform_point(p)
                .abs_diff_eq(expected.transform_point(p), 1e-5)
        );
    }

    #[test]
    fn test_inverse() {
        let dq = DualQuat::from(rigid(4.0, -0.6));
        let round = dq * dq.inverse();
        assert!(round.real.abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert!(round.translation().abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn test_normalize() {
        let dq = DualQuat::from(rigid(1.0, 0.3));
        let scaled = DualQuat {
            real: dq.real * 3.0,
            dual: dq.dual * 3.0,
        };
        let n = scaled.normalize();
        assert!((n.real.length() - 1.0).abs() < 1e-6);
        assert!(n.translation().abs_diff_eq(dq.translation(), 1e-5));
    }
}
