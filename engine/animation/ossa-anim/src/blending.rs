//! Pose blending and additive layering
//!
//! Every function takes an optional root bone. With `Some(root)` only that
//! bone and its descendants are touched; `None` affects the whole pose.
//! Poses of different sizes are processed up to the shortest one.

use glam::{Quat, Vec3};

use crate::clip::Clip;
use crate::pose::Pose;
use crate::track::TrackSampler;
use crate::transform::{Transform, normalize_rotation};

/// `bone` is `root` or one of its descendants in `pose`
pub fn is_in_hierarchy(pose: &Pose, root: usize, bone: usize) -> bool {
    let mut current = Some(bone);
    while let Some(index) = current {
        if index == root {
            return true;
        }
        current = pose.parent(index);
    }
    false
}

fn affects(pose: &Pose, root: Option<usize>, bone: usize) -> bool {
    root.is_none_or(|root| is_in_hierarchy(pose, root, bone))
}

/// Mix `a` toward `b` by `t` into `out`
///
/// The hierarchy used for root filtering is `out`'s, so `out` should start
/// as a copy of one of the inputs.
pub fn blend(out: &mut Pose, a: &Pose, b: &Pose, t: f32, root: Option<usize>) {
    let count = out.len().min(a.len()).min(b.len());
    for bone in 0..count {
        if !affects(out, root, bone) {
            continue;
        }
        let mixed = Transform::mix(&a.local_transform(bone), &b.local_transform(bone), t);
        out.set_local_transform(bone, mixed);
    }
}

/// Mix `pose` toward `other` by `t`
pub fn blend_in_place(pose: &mut Pose, other: &Pose, t: f32, root: Option<usize>) {
    let count = pose.len().min(other.len());
    for bone in 0..count {
        if !affects(pose, root, bone) {
            continue;
        }
        let mixed = Transform::mix(&pose.local_transform(bone), &other.local_transform(bone), t);
        pose.set_local_transform(bone, mixed);
    }
}

/// Reference pose for an additive clip: the clip's first frame on top of
/// the rest pose
pub fn make_additive_base<V, Q>(rest_pose: &Pose, clip: &Clip<V, Q>) -> Pose
where
    V: TrackSampler<Vec3>,
    Q: TrackSampler<Quat>,
{
    let mut base = rest_pose.clone();
    clip.sample(&mut base, clip.start_time());
    base
}

fn add_transform(input: &Transform, additive: &Transform, base: &Transform) -> Transform {
    let delta_rotation = base.rotation.conjugate() * additive.rotation;
    Transform {
        position: input.position + (additive.position - base.position),
        rotation: normalize_rotation(input.rotation * delta_rotation),
        scale: input.scale + (additive.scale - base.scale),
    }
}

/// Layer the difference between `additive` and `base` onto `input`
///
/// Positions and scales add the component difference. Rotations apply
/// `inverse(base) * additive` after the input rotation.
pub fn add_to_pose(
    out: &mut Pose,
    input: &Pose,
    additive: &Pose,
    base: &Pose,
    root: Option<usize>,
) {
    let count = out
        .len()
        .min(input.len())
        .min(additive.len())
        .min(base.len());
    for bone in 0..count {
        if !affects(out, root, bone) {
            continue;
        }
        let result = add_transform(
            &input.local_transform(bone),
            &additive.local_transform(bone),
            &base.local_transform(bone),
        );
        out.set_local_transform(bone, result);
    }
}

/// [`add_to_pose`] writing back into `pose`
pub fn add_in_place(pose: &mut Pose, additive: &Pose, base: &Pose, root: Option<usize>) {
    let count = pose.len().min(additive.len()).min(base.len());
    for bone in 0..count {
        if !affects(pose, root, bone) {
            continue;
        }
        let result = add_transform(
            &pose.local_transform(bone),
            &additive.local_transform(bone),
            &base.local_transform(bone),
        );
        pose.set_local_transform(bone, result);
    }
}
