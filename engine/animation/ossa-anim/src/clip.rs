//! Animation clips

use glam::{Quat, Vec3};
use log::{debug, warn};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::error::{AnimError, Result};
use crate::pose::Pose;
use crate::track::{
    CachedQuatTrack, CachedVectorTrack, QuatTrack, TrackSampler, TransformTrack, VectorTrack,
    wrap_time,
};

/// Name given to clips that were never named
pub const DEFAULT_CLIP_NAME: &str = "Unnamed animation clip";

/// A named set of per-bone tracks sharing one time range
///
/// The time range is derived from the tracks; call
/// [`Clip::recalculate_duration`] after editing them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Clip<V = VectorTrack, Q = QuatTrack> {
    name: String,
    tracks: Vec<TransformTrack<V, Q>>,
    start_time: f32,
    end_time: f32,
    looping: bool,
}

/// [`Clip`] backed by lookup-table tracks
pub type CachedClip = Clip<CachedVectorTrack, CachedQuatTrack>;

impl<V, Q> Default for Clip<V, Q> {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIP_NAME.to_string(),
            tracks: Vec::new(),
            start_time: 0.0,
            end_time: 0.0,
            looping: true,
        }
    }
}

impl Clip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy every track into lookup-table form
    pub fn to_cached(&self, samples_per_second: f32) -> CachedClip {
        let tracks = self
            .tracks
            .iter()
            .map(|track| track.to_cached(samples_per_second))
            .collect();
        debug!(
            "Cached clip '{}' ({} tracks) at {} samples/s",
            self.name,
            self.tracks.len(),
            samples_per_second
        );
        Clip {
            name: self.name.clone(),
            tracks,
            start_time: self.start_time,
            end_time: self.end_time,
            looping: self.looping,
        }
    }
}

impl<V, Q> Clip<V, Q> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[TransformTrack<V, Q>] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [TransformTrack<V, Q>] {
        &mut self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&TransformTrack<V, Q>> {
        self.tracks.get(index)
    }

    /// Bone driven by the track at `index`
    pub fn bone_id(&self, index: usize) -> Option<u32> {
        self.tracks.get(index).map(|track| track.bone_id)
    }

    /// Retarget the track at `index` to another bone
    pub fn set_bone_id(&mut self, index: usize, bone_id: u32) -> Result<()> {
        let count = self.tracks.len();
        let track = self
            .tracks
            .get_mut(index)
            .ok_or(AnimError::BoneOutOfRange { index, count })?;
        track.bone_id = bone_id;
        Ok(())
    }

    pub fn track_for_bone(&self, bone_id: u32) -> Option<&TransformTrack<V, Q>> {
        self.tracks.iter().find(|track| track.bone_id == bone_id)
    }

    /// Add a track, replacing any existing track for the same bone
    pub fn insert_track(&mut self, track: TransformTrack<V, Q>) {
        match self.tracks.iter_mut().find(|t| t.bone_id == track.bone_id) {
            Some(existing) => *existing = track,
            None => self.tracks.push(track),
        }
    }
}

impl<V: Default, Q: Default> Clip<V, Q> {
    /// Track for `bone_id`, created empty if the clip has none yet
    pub fn track_for_bone_mut(&mut self, bone_id: u32) -> &mut TransformTrack<V, Q> {
        let index = match self.tracks.iter().position(|t| t.bone_id == bone_id) {
            Some(index) => index,
            None => {
                self.tracks.push(TransformTrack::new(bone_id));
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[index]
    }
}

impl<V, Q> Clip<V, Q>
where
    V: TrackSampler<Vec3>,
    Q: TrackSampler<Quat>,
{
    /// Derive the clip range from its valid tracks
    pub fn recalculate_duration(&mut self) {
        let mut range: Option<(f32, f32)> = None;
        for track in self.tracks.iter().filter(|track| track.is_valid()) {
            let (start, end) = (track.start_time(), track.end_time());
            range = Some(match range {
                Some((lo, hi)) => (lo.min(start), hi.max(end)),
                None => (start, end),
            });
        }

        let (start, end) = range.unwrap_or_else(|| {
            warn!("Clip '{}' has no track with two or more keyframes", self.name);
            (0.0, 0.0)
        });
        self.start_time = start;
        self.end_time = end;
    }

    /// Remap `time` into the clip's range using its loop flag
    pub fn adjust_time(&self, time: f32) -> f32 {
        if self.duration() <= 0.0 {
            return 0.0;
        }
        wrap_time(time, self.start_time, self.end_time, self.looping)
    }

    /// Sample every track onto `pose` and return the time actually used
    ///
    /// Components without animation keep whatever the pose held. Tracks for
    /// bones the pose does not have are skipped.
    pub fn sample(&self, pose: &mut Pose, time: f32) -> f32 {
        if self.duration() == 0.0 {
            return 0.0;
        }

        let time = self.adjust_time(time);
        for track in &self.tracks {
            let bone = track.bone_id as usize;
            if bone >= pose.len() {
                continue;
            }
            let local = pose.local_transform(bone);
            pose.set_local_transform(bone, track.sample(&local, time, self.looping));
        }
        time
    }
}
