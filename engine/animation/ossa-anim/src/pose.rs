//! Bone hierarchies and their resolution to world space

use glam::Mat4;

use crate::dual_quat::DualQuat;
use crate::error::{AnimError, Result};
use crate::transform::Transform;

/// Local transforms for every bone plus the parent of each bone
///
/// Parents are signed indices; a negative parent marks a root. The hierarchy
/// is checked for cycles whenever it is built or re-parented, so walking up
/// from any bone always terminates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    locals: Vec<Transform>,
    parents: Vec<i32>,
}

impl Pose {
    /// `bone_count` identity roots
    pub fn new(bone_count: usize) -> Self {
        Self {
            locals: vec![Transform::IDENTITY; bone_count],
            parents: vec![-1; bone_count],
        }
    }

    /// Build a pose from asset data, rejecting broken hierarchies
    pub fn from_parts(locals: Vec<Transform>, parents: Vec<i32>) -> Result<Self> {
        if locals.len() != parents.len() {
            return Err(AnimError::LengthMismatch {
                what: "pose parents",
                expected: locals.len(),
                found: parents.len(),
            });
        }
        validate_hierarchy(&parents)?;
        Ok(Self { locals, parents })
    }

    /// Grow or shrink the pose
    ///
    /// New bones are identity roots. Shrinking detaches bones whose parent
    /// was removed.
    pub fn resize(&mut self, bone_count: usize) {
        self.locals.resize(bone_count, Transform::IDENTITY);
        self.parents.resize(bone_count, -1);
        for parent in &mut self.parents {
            if *parent >= bone_count as i32 {
                *parent = -1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn local_transform(&self, bone: usize) -> Transform {
        self.locals[bone]
    }

    pub fn set_local_transform(&mut self, bone: usize, transform: Transform) {
        self.locals[bone] = transform;
    }

    pub fn locals(&self) -> &[Transform] {
        &self.locals
    }

    pub fn parents(&self) -> &[i32] {
        &self.parents
    }

    /// Raw parent index, negative for roots
    pub fn parent_index(&self, bone: usize) -> i32 {
        self.parents[bone]
    }

    pub fn parent(&self, bone: usize) -> Option<usize> {
        usize::try_from(self.parents[bone]).ok()
    }

    /// Re-parent a bone
    ///
    /// Fails when `parent` is out of range or is `bone` itself or one of its
    /// descendants.
    pub fn set_parent(&mut self, bone: usize, parent: Option<usize>) -> Result<()> {
        let count = self.len();
        if bone >= count {
            return Err(AnimError::BoneOutOfRange { index: bone, count });
        }

        let Some(parent) = parent else {
            self.parents[bone] = -1;
            return Ok(());
        };

        if parent >= count {
            return Err(AnimError::ParentOutOfRange {
                bone,
                parent: parent as i32,
                count,
            });
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == bone {
                return Err(AnimError::CyclicHierarchy(bone));
            }
            ancestor = self.parent(current);
        }

        self.parents[bone] = parent as i32;
        Ok(())
    }

    /// Walk up to the root composing local transforms
    pub fn world_transform(&self, bone: usize) -> Transform {
        let mut result = self.locals[bone];
        let mut parent = self.parent(bone);
        while let Some(index) = parent {
            result = self.locals[index].combine(&result);
            parent = self.parent(index);
        }
        result
    }

    /// World matrix of one bone, resolved recursively through its ancestors
    pub fn world_matrix(&self, bone: usize) -> Mat4 {
        let local = self.locals[bone].to_matrix();
        match self.parent(bone) {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// World dual quaternion of one bone, resolved recursively
    pub fn world_dual_quat(&self, bone: usize) -> DualQuat {
        let local = DualQuat::from(self.locals[bone]);
        match self.parent(bone) {
            Some(parent) => self.world_dual_quat(parent) * local,
            None => local,
        }
    }

    /// Every parent precedes its children
    pub fn is_ascending(&self) -> bool {
        self.parents
            .iter()
            .enumerate()
            .all(|(bone, &parent)| parent < bone as i32)
    }

    /// Fill `out` with one world matrix per bone
    ///
    /// Bones are resolved left to right reusing the parent's matrix for as
    /// long as parents precede children; anything after the first
    /// out-of-order bone is resolved recursively.
    pub fn matrix_palette(&self, out: &mut Vec<Mat4>) {
        let count = self.len();
        out.resize(count, Mat4::IDENTITY);

        let mut bone = 0;
        while bone < count {
            let parent = self.parents[bone];
            if parent >= bone as i32 {
                break;
            }
            let local = self.locals[bone].to_matrix();
            out[bone] = match usize::try_from(parent) {
                Ok(parent) => out[parent] * local,
                Err(_) => local,
            };
            bone += 1;
        }

        for index in bone..count {
            out[index] = self.world_matrix(index);
        }
    }

    /// Fill `out` with one world dual quaternion per bone
    ///
    /// Same traversal as [`Pose::matrix_palette`]. Scale is ignored.
    pub fn dual_quat_palette(&self, out: &mut Vec<DualQuat>) {
        let count = self.len();
        out.resize(count, DualQuat::IDENTITY);

        let mut bone = 0;
        while bone < count {
            let parent = self.parents[bone];
            if parent >= bone as i32 {
                break;
            }
            let local = DualQuat::from(self.locals[bone]);
            out[bone] = match usize::try_from(parent) {
                Ok(parent) => out[parent] * local,
                Err(_) => local,
            };
            bone += 1;
        }

        for index in bone..count {
            out[index] = self.world_dual_quat(index);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Done,
}

/// Check that every parent is in range and no bone is its own ancestor
pub fn validate_hierarchy(parents: &[i32]) -> Result<()> {
    let count = parents.len();
    for (bone, &parent) in parents.iter().enumerate() {
        if parent >= 0 && parent as usize >= count {
            return Err(AnimError::ParentOutOfRange {
                bone,
                parent,
                count,
            });
        }
    }

    let mut state = vec![Visit::Unvisited; count];
    let mut path = Vec::new();
    for start in 0..count {
        let mut bone = start;
        loop {
            match state[bone] {
                Visit::Done => break,
                Visit::OnPath => return Err(AnimError::CyclicHierarchy(bone)),
                Visit::Unvisited => {
                    state[bone] = Visit::OnPath;
                    path.push(bone);
                    match usize::try_from(parents[bone]) {
                        Ok(parent) => bone = parent,
                        Err(_) => break,
                    }
                }
            }
        }
        for visited in path.drain(..) {
            state[visited] = Visit::Done;
        }
    }

    Ok(())
}
