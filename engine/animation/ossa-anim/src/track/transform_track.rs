//! Per-bone bundle of position, rotation and scale tracks

use glam::{Quat, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::cached::{CachedQuatTrack, CachedTrack, CachedVectorTrack};
use super::keyframe_track::{QuatTrack, VectorTrack};
use super::sampler::TrackSampler;
use crate::transform::Transform;

/// Animation for one bone
///
/// Generic over the track implementation so that the same clip code drives
/// both searched and cached tracks.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct TransformTrack<V = VectorTrack, Q = QuatTrack> {
    pub bone_id: u32,
    pub position: V,
    pub rotation: Q,
    pub scale: V,
}

/// [`TransformTrack`] backed by lookup-table tracks
pub type CachedTransformTrack = TransformTrack<CachedVectorTrack, CachedQuatTrack>;

impl<V: Default, Q: Default> TransformTrack<V, Q> {
    pub fn new(bone_id: u32) -> Self {
        Self {
            bone_id,
            position: V::default(),
            rotation: Q::default(),
            scale: V::default(),
        }
    }
}

impl<V, Q> TransformTrack<V, Q>
where
    V: TrackSampler<Vec3>,
    Q: TrackSampler<Quat>,
{
    /// At least one component has enough keyframes to animate
    pub fn is_valid(&self) -> bool {
        self.position.is_valid() || self.rotation.is_valid() || self.scale.is_valid()
    }

    /// Earliest start among the valid components, zero if none are valid
    pub fn start_time(&self) -> f32 {
        self.valid_ranges()
            .map(|(start, _)| start)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    /// Latest end among the valid components, zero if none are valid
    pub fn end_time(&self) -> f32 {
        self.valid_ranges()
            .map(|(_, end)| end)
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    fn valid_ranges(&self) -> impl Iterator<Item = (f32, f32)> {
        let position = self
            .position
            .is_valid()
            .then(|| (self.position.start_time(), self.position.end_time()));
        let rotation = self
            .rotation
            .is_valid()
            .then(|| (self.rotation.start_time(), self.rotation.end_time()));
        let scale = self
            .scale
            .is_valid()
            .then(|| (self.scale.start_time(), self.scale.end_time()));
        [position, rotation, scale].into_iter().flatten()
    }

    /// Sample onto `reference`, keeping its components where a track is
    /// invalid
    pub fn sample(&self, reference: &Transform, time: f32, looping: bool) -> Transform {
        let mut result = *reference;
        if self.position.is_valid() {
            result.position = self.position.sample(time, looping);
        }
        if self.rotation.is_valid() {
            result.rotation = self.rotation.sample(time, looping);
        }
        if self.scale.is_valid() {
            result.scale = self.scale.sample(time, looping);
        }
        result
    }
}

impl TransformTrack {
    /// Copy into lookup-table tracks at the given rate
    pub fn to_cached(&self, samples_per_second: f32) -> CachedTransformTrack {
        TransformTrack {
            bone_id: self.bone_id,
            position: CachedTrack::from_track(self.position.clone(), samples_per_second),
            rotation: CachedTrack::from_track(self.rotation.clone(), samples_per_second),
            scale: CachedTrack::from_track(self.scale.clone(), samples_per_second),
        }
    }
}
