//! Bone chains handed to the solvers

use glam::{Quat, Vec3};
use ossa_anim::Pose;
use ossa_anim::transform::{Transform, normalize_rotation};

use crate::error::{IkError, Result};

pub(crate) const PARALLEL_EPSILON: f32 = 1e-6;

/// Vectors shorter than this have no usable direction
pub(crate) const LENGTH_EPSILON: f32 = 1e-6;

/// A linear run of bones
///
/// The first transform is in model space, every following one is relative
/// to the bone before it.
#[derive(Debug, Clone, PartialEq)]
pub struct IkChain {
    locals: Vec<Transform>,
}

impl IkChain {
    pub fn new(locals: Vec<Transform>) -> Result<Self> {
        if locals.len() < 2 {
            return Err(IkError::ChainTooShort(locals.len()));
        }
        Ok(Self { locals })
    }

    /// `bone_count` identity transforms
    pub fn with_len(bone_count: usize) -> Result<Self> {
        Self::new(vec![Transform::IDENTITY; bone_count])
    }

    /// Copy a parent-to-child path of bones out of `pose`
    ///
    /// The first bone is lifted into model space.
    pub fn from_pose(pose: &Pose, bones: &[usize]) -> Result<Self> {
        validate_path(pose, bones)?;
        let locals = bones
            .iter()
            .enumerate()
            .map(|(i, &bone)| {
                if i == 0 {
                    pose.world_transform(bone)
                } else {
                    pose.local_transform(bone)
                }
            })
            .collect();
        Self::new(locals)
    }

    /// Write the chain back into the bones it was taken from
    pub fn apply_to_pose(&self, pose: &mut Pose, bones: &[usize]) -> Result<()> {
        if bones.len() != self.locals.len() {
            return Err(IkError::LengthMismatch {
                expected: self.locals.len(),
                found: bones.len(),
            });
        }
        validate_path(pose, bones)?;

        let root = bones[0];
        let root_local = match pose.parent(root) {
            Some(parent) => pose.world_transform(parent).inverse().combine(&self.locals[0]),
            None => self.locals[0],
        };
        pose.set_local_transform(root, root_local);
        for (&bone, local) in bones.iter().zip(&self.locals).skip(1) {
            pose.set_local_transform(bone, *local);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn local(&self, index: usize) -> Transform {
        self.locals[index]
    }

    pub fn set_local(&mut self, index: usize, transform: Transform) {
        self.locals[index] = transform;
    }

    pub fn locals(&self) -> &[Transform] {
        &self.locals
    }

    pub(crate) fn set_local_rotation(&mut self, index: usize, rotation: Quat) {
        self.locals[index].rotation = normalize_rotation(rotation);
    }

    /// Model space transform of bone `index`
    pub fn model_transform(&self, index: usize) -> Transform {
        self.locals[..=index]
            .iter()
            .rev()
            .skip(1)
            .fold(self.locals[index], |child, parent| parent.combine(&child))
    }

    /// Model space position of the last bone
    pub fn effector(&self) -> Vec3 {
        self.model_transform(self.locals.len() - 1).position
    }

    /// Model space positions of every bone
    pub fn positions(&self) -> Vec<Vec3> {
        (0..self.locals.len())
            .map(|index| self.model_transform(index).position)
            .collect()
    }
}

fn validate_path(pose: &Pose, bones: &[usize]) -> Result<()> {
    if bones.len() < 2 {
        return Err(IkError::ChainTooShort(bones.len()));
    }
    let count = pose.len();
    if let Some(&index) = bones.iter().find(|&&bone| bone >= count) {
        return Err(IkError::BoneOutOfRange { index, count });
    }
    for pair in bones.windows(2) {
        if pose.parent(pair[1]) != Some(pair[0]) {
            return Err(IkError::NotAChain {
                bone: pair[1],
                expected_parent: pair[0],
            });
        }
    }
    Ok(())
}

/// Shortest-arc rotation taking the direction of `from` onto `to`
///
/// Exact for small angles. Opposite directions turn half way around an
/// arbitrary perpendicular axis; a zero vector gives identity.
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let (Some(from), Some(to)) = (from.try_normalize(), to.try_normalize()) else {
        return Quat::IDENTITY;
    };

    let dot = from.dot(to);
    if dot < -1.0 + PARALLEL_EPSILON {
        return Quat::from_axis_angle(from.any_orthonormal_vector(), std::f32::consts::PI);
    }

    let axis = from.cross(to);
    normalize_rotation(Quat::from_xyzw(axis.x, axis.y, axis.z, 1.0 + dot))
}
