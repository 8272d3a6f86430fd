//! Keyframes and the values they can carry

use std::fmt::Debug;
use std::ops::{Add, Mul};

use glam::{Quat, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::transform::{nlerp, normalize_rotation};

/// How values between two keyframes are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum Interpolation {
    /// Hold the earlier keyframe until the next one
    Constant,
    /// Straight line between keyframes
    #[default]
    Linear,
    /// Cubic Hermite spline using the stored tangents
    Cubic,
}

/// A value that can be stored in a keyframe track
///
/// Implemented for scalars, vectors and rotations. Rotations are stored as
/// raw quaternion components and only normalized on the way out of a sample.
pub trait TrackValue: Copy + PartialEq + Debug + Add<Output = Self> + Mul<f32, Output = Self> {
    /// Returned when a track cannot be sampled
    const DEFAULT: Self;

    /// All components zero, used for flat tangents
    const ZERO: Self;

    /// Type-specific cleanup applied to every sampled value
    fn finalize(self) -> Self {
        self
    }

    /// Flip `self` onto the same hemisphere as `reference` where that matters
    fn neighborhood(self, reference: Self) -> Self {
        let _ = reference;
        self
    }

    /// Blend two values, `t` being the weight toward `b`
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a * (1.0 - t) + b * t
    }
}

impl TrackValue for f32 {
    const DEFAULT: Self = 0.0;
    const ZERO: Self = 0.0;
}

impl TrackValue for Vec3 {
    const DEFAULT: Self = Vec3::ZERO;
    const ZERO: Self = Vec3::ZERO;
}

impl TrackValue for Quat {
    const DEFAULT: Self = Quat::IDENTITY;
    const ZERO: Self = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);

    fn finalize(self) -> Self {
        normalize_rotation(self)
    }

    fn neighborhood(self, reference: Self) -> Self {
        if reference.dot(self) < 0.0 { -self } else { self }
    }

    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        nlerp(a, b, t)
    }
}

/// A timestamped sample with Hermite tangents
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
    pub in_tangent: T,
    pub out_tangent: T,
}

impl<T: TrackValue> Keyframe<T> {
    /// Keyframe with flat tangents
    pub fn new(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            in_tangent: T::ZERO,
            out_tangent: T::ZERO,
        }
    }

    pub fn with_tangents(time: f32, value: T, in_tangent: T, out_tangent: T) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Evaluate the cubic Hermite basis
///
/// `s1` and `s2` are slopes already scaled by the frame span.
pub(crate) fn hermite<T: TrackValue>(t: f32, p1: T, s1: T, p2: T, s2: T) -> T {
    let tt = t * t;
    let ttt = tt * t;

    let p2 = p2.neighborhood(p1);

    let h1 = 2.0 * ttt - 3.0 * tt + 1.0;
    let h2 = -2.0 * ttt + 3.0 * tt;
    let h3 = ttt - 2.0 * tt + t;
    let h4 = ttt - tt;

    (p1 * h1 + p2 * h2 + s1 * h3 + s2 * h4).finalize()
}
