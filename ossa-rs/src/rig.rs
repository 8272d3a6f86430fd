//! JSON rig files
//!
//! A rig file lists bones by name with parent-relative rest transforms and
//! any number of clips whose tracks refer to bones by name. Quaternions are
//! written `[x, y, z, w]`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use ossa_anim::{
    Armature, Clip, Interpolation, Keyframe, Pose, Track, TrackSampler, TrackValue, Transform,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems in an otherwise well-formed rig file
#[derive(Error, Debug)]
pub enum RigError {
    #[error("Bone name '{0}' is used more than once")]
    DuplicateBone(String),

    #[error("Bone '{bone}' has unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },

    #[error("Clip '{clip}' animates unknown bone '{bone}'")]
    UnknownTrackBone { clip: String, bone: String },

    #[error("{channel} keyframe at {time} in clip '{clip}' has {found} values, expected {expected}")]
    ValueLength {
        clip: String,
        channel: &'static str,
        time: f32,
        expected: usize,
        found: usize,
    },

    #[error("No clip named '{0}'")]
    UnknownClip(String),
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

fn default_looping() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDef {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

impl From<&TransformDef> for Transform {
    fn from(def: &TransformDef) -> Self {
        Self::new(
            Vec3::from_array(def.position),
            ossa_anim::transform::normalize_rotation(Quat::from_array(def.rotation)),
            Vec3::from_array(def.scale),
        )
    }
}

impl From<Transform> for TransformDef {
    fn from(transform: Transform) -> Self {
        Self {
            position: transform.position.to_array(),
            rotation: transform.rotation.to_array(),
            scale: transform.scale.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub rest: TransformDef,
    /// Defaults to the rest transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<TransformDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDef {
    pub time: f32,
    pub value: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_tangent: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_tangent: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDef {
    #[serde(default)]
    pub interpolation: Interpolation,
    pub frames: Vec<FrameDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDef {
    pub bone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ChannelDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ChannelDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDef {
    pub name: String,
    #[serde(default = "default_looping")]
    pub looping: bool,
    #[serde(default)]
    pub tracks: Vec<TrackDef>,
}

/// On-disk form of a rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFile {
    pub bones: Vec<BoneDef>,
    #[serde(default)]
    pub clips: Vec<ClipDef>,
}

/// A rig ready for sampling
#[derive(Debug, Clone)]
pub struct Rig {
    pub armature: Armature,
    pub clips: Vec<Clip>,
}

impl Rig {
    pub fn load(path: &Path) -> Result<Self> {
        RigFile::load(path)?
            .build()
            .with_context(|| format!("Invalid rig in {}", path.display()))
    }

    pub fn clip(&self, name: &str) -> Result<&Clip> {
        self.clips
            .iter()
            .find(|clip| clip.name() == name)
            .ok_or_else(|| RigError::UnknownClip(name.to_string()).into())
    }

    /// Bone indices for a list of names
    pub fn bone_indices(&self, names: &[String]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| Ok(self.armature.find_bone(name)?))
            .collect()
    }
}

impl RigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rig file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse rig file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Failed to serialize rig")?;
        fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn build(&self) -> Result<Rig> {
        let mut indices = HashMap::new();
        for (index, bone) in self.bones.iter().enumerate() {
            if indices.insert(bone.name.as_str(), index).is_some() {
                return Err(RigError::DuplicateBone(bone.name.clone()).into());
            }
        }

        let parents = self
            .bones
            .iter()
            .map(|bone| match &bone.parent {
                None => Ok(-1),
                Some(parent) => indices.get(parent.as_str()).map(|&i| i as i32).ok_or_else(|| {
                    RigError::UnknownParent {
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    }
                }),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let rest: Vec<Transform> = self.bones.iter().map(|b| Transform::from(&b.rest)).collect();
        let bind = self
            .bones
            .iter()
            .zip(&rest)
            .map(|(bone, rest)| bone.bind.as_ref().map_or(*rest, Transform::from))
            .collect();

        let rest_pose = Pose::from_parts(rest, parents.clone()).context("Invalid rest pose")?;
        let bind_pose = Pose::from_parts(bind, parents).context("Invalid bind pose")?;
        let names = self.bones.iter().map(|bone| bone.name.clone()).collect();
        let armature = Armature::new(rest_pose, bind_pose, names)?;

        let clips = self
            .clips
            .iter()
            .map(|clip| build_clip(clip, &indices))
            .collect::<Result<Vec<_>>>()?;

        Ok(Rig { armature, clips })
    }

    /// Inverse of [`RigFile::build`]
    pub fn from_rig(armature: &Armature, clips: &[Clip]) -> Self {
        let names = armature.bone_names();
        let bones = (0..armature.bone_count())
            .map(|bone| {
                let rest = armature.rest_pose().local_transform(bone);
                let bind = armature.bind_pose().local_transform(bone);
                BoneDef {
                    name: names[bone].clone(),
                    parent: armature
                        .rest_pose()
                        .parent(bone)
                        .map(|parent| names[parent].clone()),
                    rest: rest.into(),
                    bind: (bind != rest).then(|| bind.into()),
                }
            })
            .collect();

        let clips = clips
            .iter()
            .map(|clip| ClipDef {
                name: clip.name().to_string(),
                looping: clip.is_looping(),
                tracks: clip
                    .tracks()
                    .iter()
                    .filter_map(|track| {
                        let bone = names.get(track.bone_id as usize)?;
                        Some(TrackDef {
                            bone: bone.clone(),
                            position: channel_def(&track.position, Vec3::to_array),
                            rotation: channel_def(&track.rotation, Quat::to_array),
                            scale: channel_def(&track.scale, Vec3::to_array),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self { bones, clips }
    }
}

fn build_clip(def: &ClipDef, indices: &HashMap<&str, usize>) -> Result<Clip> {
    let mut clip = Clip::new(def.name.clone());
    clip.set_looping(def.looping);

    for track_def in &def.tracks {
        let bone = indices
            .get(track_def.bone.as_str())
            .ok_or_else(|| RigError::UnknownTrackBone {
                clip: def.name.clone(),
                bone: track_def.bone.clone(),
            })?;
        let track = clip.track_for_bone_mut(*bone as u32);
        if let Some(channel) = &track_def.position {
            track.position = build_track(channel, &def.name, "position", Vec3::from_slice)?;
        }
        if let Some(channel) = &track_def.rotation {
            track.rotation = build_track(channel, &def.name, "rotation", Quat::from_slice)?;
        }
        if let Some(channel) = &track_def.scale {
            track.scale = build_track(channel, &def.name, "scale", Vec3::from_slice)?;
        }
    }

    clip.recalculate_duration();
    log::debug!(
        "Loaded clip '{}' with {} tracks over {}s",
        clip.name(),
        clip.track_count(),
        clip.duration()
    );
    Ok(clip)
}

/// Component count of a keyframe value
trait Components: TrackValue {
    const COUNT: usize;
}

impl Components for Vec3 {
    const COUNT: usize = 3;
}

impl Components for Quat {
    const COUNT: usize = 4;
}

fn build_track<T: Components>(
    channel: &ChannelDef,
    clip: &str,
    name: &'static str,
    from_slice: fn(&[f32]) -> T,
) -> Result<Track<T>> {
    let value = |time: f32, values: Option<&Vec<f32>>| -> Result<T> {
        let Some(values) = values else {
            return Ok(T::ZERO);
        };
        if values.len() != T::COUNT {
            return Err(RigError::ValueLength {
                clip: clip.to_string(),
                channel: name,
                time,
                expected: T::COUNT,
                found: values.len(),
            }
            .into());
        }
        Ok(from_slice(values))
    };

    let mut frames = channel
        .frames
        .iter()
        .map(|frame| {
            Ok(Keyframe::with_tangents(
                frame.time,
                value(frame.time, Some(&frame.value))?,
                value(frame.time, frame.in_tangent.as_ref())?,
                value(frame.time, frame.out_tangent.as_ref())?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    frames.sort_by(|a, b| a.time.total_cmp(&b.time));

    Ok(Track::from_keyframes(channel.interpolation, frames))
}

fn channel_def<T: TrackValue, const N: usize>(
    track: &Track<T>,
    to_array: fn(&T) -> [f32; N],
) -> Option<ChannelDef> {
    if track.keyframes().is_empty() {
        return None;
    }
    let tangent = |value: &T| (*value != T::ZERO).then(|| to_array(value).to_vec());
    Some(ChannelDef {
        interpolation: track.interpolation(),
        frames: track
            .keyframes()
            .iter()
            .map(|frame| FrameDef {
                time: frame.time,
                value: to_array(&frame.value).to_vec(),
                in_tangent: tangent(&frame.in_tangent),
                out_tangent: tangent(&frame.out_tangent),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM: &str = r#"{
        "bones": [
            { "name": "hand", "parent": "forearm", "rest": { "position": [1, 0, 0] } },
            { "name": "shoulder", "rest": { "position": [0, 2, 0] } },
            { "name": "forearm", "parent": "shoulder", "rest": { "position": [1, 0, 0] } }
        ],
        "clips": [
            {
                "name": "wave",
                "tracks": [
                    {
                        "bone": "forearm",
                        "rotation": {
                            "interpolation": "Linear",
                            "frames": [
                                { "time": 1.0, "value": [0, 0, 0.3826834, 0.9238795] },
                                { "time": 0.0, "value": [0, 0, 0, 1] }
                            ]
                        }
                    }
                ]
            }
        ]
    }"#;

    fn parse(text: &str) -> RigFile {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_build_rig() {
        let rig = parse(ARM).build().unwrap();
        assert_eq!(rig.armature.bone_count(), 3);
        assert_eq!(rig.armature.rest_pose().parent(0), Some(2));
        assert_eq!(rig.armature.rest_pose().parent(1), None);

        let wave = rig.clip("wave").unwrap();
        assert!(wave.is_looping());
        assert_eq!(wave.duration(), 1.0);
        // frames are sorted on load
        let track = wave.track_for_bone(2).unwrap();
        assert_eq!(track.rotation.keyframes()[0].time, 0.0);
        assert!(rig.clip("jump").is_err());
    }

    #[test]
    fn test_rejects_bad_rigs() {
        let mut file = parse(ARM);
        file.bones[0].parent = Some("elbow".into());
        assert!(file.build().is_err());

        let mut file = parse(ARM);
        file.bones[2].name = "hand".into();
        assert!(file.build().is_err());

        let mut file = parse(ARM);
        let channel = file.clips[0].tracks[0].rotation.as_mut().unwrap();
        channel.frames[0].value.pop();
        let err = file.build().unwrap_err();
        assert!(err.to_string().contains("expected 4"), "{err}");

        let mut file = parse(ARM);
        file.clips[0].tracks[0].bone = "tail".into();
        assert!(file.build().is_err());
    }

    #[test]
    fn test_round_trip() {
        let file = parse(ARM);
        let rig = file.build().unwrap();
        let written = RigFile::from_rig(&rig.armature, &rig.clips);
        let rebuilt = written.build().unwrap();

        assert_eq!(rebuilt.armature, rig.armature);
        assert_eq!(rebuilt.clips, rig.clips);
        assert!(written.bones.iter().all(|bone| bone.bind.is_none()));
    }
}
