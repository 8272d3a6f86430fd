//! Reordering skeletons so parents precede children
//!
//! Palettes are cheapest to build when every parent is stored before its
//! children. Assets are not always authored that way, so an armature can be
//! rewritten in breadth-first order and its clips retargeted to match.

use std::collections::VecDeque;

use log::debug;

use crate::armature::Armature;
use crate::clip::Clip;
use crate::error::Result;
use crate::pose::Pose;

/// Old and new bone indices after a rearrangement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoneMap {
    old_to_new: Vec<usize>,
    new_to_old: Vec<usize>,
}

impl BoneMap {
    pub fn new_index(&self, old: usize) -> Option<usize> {
        self.old_to_new.get(old).copied()
    }

    pub fn old_index(&self, new: usize) -> Option<usize> {
        self.new_to_old.get(new).copied()
    }

    pub fn len(&self) -> usize {
        self.new_to_old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_to_old.is_empty()
    }

    /// No bone moved
    pub fn is_identity(&self) -> bool {
        self.new_to_old
            .iter()
            .enumerate()
            .all(|(new, &old)| new == old)
    }

    fn breadth_first(pose: &Pose) -> Self {
        let count = pose.len();
        let mut children = vec![Vec::new(); count];
        let mut queue = VecDeque::new();
        for bone in 0..count {
            match pose.parent(bone) {
                Some(parent) => children[parent].push(bone),
                None => queue.push_back(bone),
            }
        }

        let mut new_to_old = Vec::with_capacity(count);
        while let Some(bone) = queue.pop_front() {
            new_to_old.push(bone);
            queue.extend(children[bone].iter().copied());
        }

        let mut old_to_new = vec![0; count];
        for (new, &old) in new_to_old.iter().enumerate() {
            old_to_new[old] = new;
        }

        Self {
            old_to_new,
            new_to_old,
        }
    }

    fn remap_pose(&self, pose: &Pose) -> Result<Pose> {
        let locals = self
            .new_to_old
            .iter()
            .map(|&old| pose.local_transform(old))
            .collect();
        let parents = self
            .new_to_old
            .iter()
            .map(|&old| {
                pose.parent(old)
                    .map_or(-1, |parent| self.old_to_new[parent] as i32)
            })
            .collect();
        Pose::from_parts(locals, parents)
    }
}

/// Copy `armature` with bones in breadth-first order
///
/// Roots keep their relative order, and siblings keep theirs.
pub fn rearrange_armature(armature: &Armature) -> Result<(Armature, BoneMap)> {
    let map = BoneMap::breadth_first(armature.rest_pose());

    let rest_pose = map.remap_pose(armature.rest_pose())?;
    let bind_pose = map.remap_pose(armature.bind_pose())?;
    let bone_names = map
        .new_to_old
        .iter()
        .map(|&old| armature.bone_names()[old].clone())
        .collect();

    let moved = map
        .new_to_old
        .iter()
        .enumerate()
        .filter(|(new, old)| new != *old)
        .count();
    debug!("Rearranged armature: {} of {} bones moved", moved, map.len());

    Ok((Armature::new(rest_pose, bind_pose, bone_names)?, map))
}

/// Point every track of `clip` at the bone's new index
///
/// Tracks for bones outside the map are left alone.
pub fn rearrange_clip<V, Q>(clip: &mut Clip<V, Q>, map: &BoneMap) {
    for track in clip.tracks_mut() {
        if let Some(new) = map.new_index(track.bone_id as usize) {
            track.bone_id = new as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Keyframe;
    use crate::transform::Transform;
    use glam::{Quat, Vec3};

    /// pelvis(1) -> spine(2) -> neck(0) -> head(3)
    fn shuffled() -> Armature {
        let locals = vec![
            Transform::new(Vec3::Y, Quat::from_rotation_z(0.2), Vec3::ONE),
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
            Transform::new(Vec3::Y, Quat::from_rotation_x(0.4), Vec3::splat(1.1)),
            Transform::from_position(Vec3::new(0.0, 0.3, 0.1)),
        ];
        let pose = Pose::from_parts(locals, vec![2, -1, 1, 0]).unwrap();
        let names = ["neck", "pelvis", "spine", "head"]
            .map(String::from)
            .to_vec();
        Armature::new(pose.clone(), pose, names).unwrap()
    }

    #[test]
    fn test_parents_first() {
        let armature = shuffled();
        assert!(!armature.rest_pose().is_ascending());

        let (sorted, map) = rearrange_armature(&armature).unwrap();
        assert!(sorted.rest_pose().is_ascending());
        assert!(sorted.bind_pose().is_ascending());
        assert_eq!(sorted.bone_names(), ["pelvis", "spine", "neck", "head"]);
        assert_eq!(map.new_index(0), Some(2));
        assert_eq!(map.old_index(0), Some(1));
        assert!(!map.is_identity());

        for old in 0..armature.bone_count() {
            let new = map.new_index(old).unwrap();
            assert!(
                sorted
                    .rest_pose()
                    .world_transform(new)
                    .abs_diff_eq(&armature.rest_pose().world_transform(old), 1e-6)
            );
        }
    }

    #[test]
    fn test_sorted_armature_unchanged() {
        let (sorted, _) = rearrange_armature(&shuffled()).unwrap();
        let (again, map) = rearrange_armature(&sorted).unwrap();
        assert!(map.is_identity());
        assert_eq!(again, sorted);
    }

    #[test]
    fn test_clip_follows_bones() {
        let (_, map) = rearrange_armature(&shuffled()).unwrap();
        let mut clip = Clip::new("nod");
        let track = clip.track_for_bone_mut(0);
        track.rotation.push(Keyframe::new(0.0, Quat::IDENTITY));
        track.rotation.push(Keyframe::new(1.0, Quat::from_rotation_x(0.3)));
        clip.track_for_bone_mut(9);

        rearrange_clip(&mut clip, &map);
        assert_eq!(clip.bone_id(0), Some(2));
        assert_eq!(clip.bone_id(1), Some(9));
    }
}
