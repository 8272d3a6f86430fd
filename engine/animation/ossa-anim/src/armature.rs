//! Skeleton description shared by every animated instance

use glam::Mat4;
use log::debug;

use crate::dual_quat::DualQuat;
use crate::error::{AnimError, Result};
use crate::pose::Pose;
use crate::transform::Transform;

/// Rest pose, bind pose and bone names for one skeleton
///
/// Inverse bind matrices and dual quaternions are derived from the bind pose
/// when the armature is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Armature {
    rest_pose: Pose,
    bind_pose: Pose,
    bone_names: Vec<String>,
    inverse_bind_matrices: Vec<Mat4>,
    inverse_bind_dual_quats: Vec<DualQuat>,
}

impl Armature {
    /// Validate and assemble an armature
    ///
    /// The rest pose, bind pose and name list must describe the same bones
    /// with the same parents.
    pub fn new(rest_pose: Pose, bind_pose: Pose, bone_names: Vec<String>) -> Result<Self> {
        let count = rest_pose.len();
        if bind_pose.len() != count {
            return Err(AnimError::LengthMismatch {
                what: "bind pose",
                expected: count,
                found: bind_pose.len(),
            });
        }
        if bone_names.len() != count {
            return Err(AnimError::LengthMismatch {
                what: "bone names",
                expected: count,
                found: bone_names.len(),
            });
        }
        if let Some(bone) =
            (0..count).find(|&bone| rest_pose.parent(bone) != bind_pose.parent(bone))
        {
            return Err(AnimError::HierarchyMismatch(bone));
        }

        let mut armature = Self {
            rest_pose,
            bind_pose,
            bone_names,
            inverse_bind_matrices: Vec::new(),
            inverse_bind_dual_quats: Vec::new(),
        };
        armature.recalculate_inverse_bind_pose();

        debug!(
            "Built armature with {} bones ({} roots)",
            count,
            (0..count)
                .filter(|&bone| armature.rest_pose.parent(bone).is_none())
                .count()
        );
        Ok(armature)
    }

    fn recalculate_inverse_bind_pose(&mut self) {
        let count = self.bind_pose.len();
        self.inverse_bind_matrices.clear();
        self.inverse_bind_dual_quats.clear();
        for bone in 0..count {
            let world = self.bind_pose.world_transform(bone);
            self.inverse_bind_matrices.push(world.to_matrix().inverse());
            self.inverse_bind_dual_quats
                .push(DualQuat::from(world).normalize().inverse());
        }
    }

    pub fn rest_pose(&self) -> &Pose {
        &self.rest_pose
    }

    pub fn bind_pose(&self) -> &Pose {
        &self.bind_pose
    }

    pub fn bone_names(&self) -> &[String] {
        &self.bone_names
    }

    pub fn bone_count(&self) -> usize {
        self.rest_pose.len()
    }

    pub fn bone_name(&self, bone: usize) -> Option<&str> {
        self.bone_names.get(bone).map(String::as_str)
    }

    /// Index of the first bone with the given name
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_names.iter().position(|bone| bone == name)
    }

    /// Like [`Armature::bone_index`] but failing on unknown names
    pub fn find_bone(&self, name: &str) -> Result<usize> {
        self.bone_index(name)
            .ok_or_else(|| AnimError::UnknownBone(name.to_string()))
    }

    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    pub fn inverse_bind_dual_quats(&self) -> &[DualQuat] {
        &self.inverse_bind_dual_quats
    }

    /// World matrices of `pose` premultiplied onto each inverse bind matrix
    pub fn skin_matrix_palette(&self, pose: &Pose, out: &mut Vec<Mat4>) {
        pose.matrix_palette(out);
        for (matrix, inverse_bind) in out.iter_mut().zip(&self.inverse_bind_matrices) {
            *matrix *= *inverse_bind;
        }
    }

    /// World dual quaternions of `pose` composed with each inverse bind
    pub fn skin_dual_quat_palette(&self, pose: &Pose, out: &mut Vec<DualQuat>) {
        pose.dual_quat_palette(out);
        for (dq, inverse_bind) in out.iter_mut().zip(&self.inverse_bind_dual_quats) {
            *dq = *dq * *inverse_bind;
        }
    }
}

/// Convert per-bone inverse bind matrices into a parent-relative bind pose
///
/// Bones without a matrix keep their rest pose world transform.
pub fn bind_pose_from_inverse_bind_matrices(
    rest_pose: &Pose,
    inverse_bind_matrices: &[Option<Mat4>],
) -> Result<Pose> {
    let count = rest_pose.len();
    if inverse_bind_matrices.len() != count {
        return Err(AnimError::LengthMismatch {
            what: "inverse bind matrices",
            expected: count,
            found: inverse_bind_matrices.len(),
        });
    }

    let world: Vec<Transform> = inverse_bind_matrices
        .iter()
        .enumerate()
        .map(|(bone, matrix)| match matrix {
            Some(matrix) => Transform::from_matrix(&matrix.inverse()),
            None => rest_pose.world_transform(bone),
        })
        .collect();

    let locals = (0..count)
        .map(|bone| match rest_pose.parent(bone) {
            Some(parent) => world[parent].inverse().combine(&world[bone]),
            None => world[bone],
        })
        .collect();

    Pose::from_parts(locals, rest_pose.parents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn arm() -> (Pose, Vec<String>) {
        let locals = vec![
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
            Transform::new(Vec3::X, Quat::from_rotation_z(0.5), Vec3::ONE),
            Transform::from_position(Vec3::X),
        ];
        let pose = Pose::from_parts(locals, vec![-1, 0, 1]).unwrap();
        let names = ["shoulder", "elbow", "wrist"].map(String::from).to_vec();
        (pose, names)
    }

    #[test]
    fn test_rejects_mismatched_parts() {
        let (pose, names) = arm();
        let err = Armature::new(pose.clone(), Pose::new(2), names.clone()).unwrap_err();
        assert!(matches!(err, AnimError::LengthMismatch { .. }));

        let err = Armature::new(pose.clone(), Pose::new(3), names).unwrap_err();
        assert_eq!(err, AnimError::HierarchyMismatch(1));

        let err = Armature::new(pose.clone(), pose, vec!["a".into()]).unwrap_err();
        assert!(matches!(err, AnimError::LengthMismatch { what: "bone names", .. }));
    }

    #[test]
    fn test_bone_lookup() {
        let (pose, names) = arm();
        let armature = Armature::new(pose.clone(), pose, names).unwrap();
        assert_eq!(armature.bone_count(), 3);
        assert_eq!(armature.bone_index("elbow"), Some(1));
        assert_eq!(armature.bone_index("knee"), None);
        assert_eq!(armature.bone_name(2), Some("wrist"));
        assert_eq!(armature.bone_name(9), None);
        assert_eq!(armature.find_bone("wrist"), Ok(2));
        assert_eq!(
            armature.find_bone("tail"),
            Err(AnimError::UnknownBone("tail".into()))
        );
    }

    #[test]
    fn test_bind_pose_skins_to_identity() {
        let (pose, names) = arm();
        let armature = Armature::new(pose.clone(), pose.clone(), names).unwrap();

        let mut matrices = Vec::new();
        armature.skin_matrix_palette(&pose, &mut matrices);
        for matrix in &matrices {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }

        let mut dual = Vec::new();
        armature.skin_dual_quat_palette(&pose, &mut dual);
        let point = Vec3::new(1.0, 2.0, 3.0);
        for dq in &dual {
            assert!(dq.transform_point(point).abs_diff_eq(point, 1e-5));
        }
    }

    #[test]
    fn test_bind_pose_from_inverse_bind() {
        let (pose, _) = arm();
        let matrices: Vec<Option<Mat4>> = (0..pose.len())
            .map(|bone| Some(pose.world_transform(bone).to_matrix().inverse()))
            .collect();

        let bind = bind_pose_from_inverse_bind_matrices(&pose, &matrices).unwrap();
        for bone in 0..pose.len() {
            assert!(
                bind.local_transform(bone)
                    .abs_diff_eq(&pose.local_transform(bone), 1e-4),
                "bone {bone}"
            );
        }

        // a missing matrix falls back to the rest pose
        let partial = vec![matrices[0], None, matrices[2]];
        let bind = bind_pose_from_inverse_bind_matrices(&pose, &partial).unwrap();
        assert!(bind.world_transform(1).abs_diff_eq(&pose.world_transform(1), 1e-4));

        assert!(bind_pose_from_inverse_bind_matrices(&pose, &matrices[..2]).is_err());
    }
}
