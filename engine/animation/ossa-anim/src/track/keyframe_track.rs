//! Keyframe track with a binary-search frame lookup

use glam::{Quat, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use super::keyframe::{Interpolation, Keyframe, TrackValue};
use super::sampler::{TrackSampler, search_frame_index};

/// Keyframes sorted by time plus an interpolation mode
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Track<T> {
    keyframes: Vec<Keyframe<T>>,
    interpolation: Interpolation,
}

pub type ScalarTrack = Track<f32>;
pub type VectorTrack = Track<Vec3>;
pub type QuatTrack = Track<Quat>;

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self {
            keyframes: Vec::new(),
            interpolation: Interpolation::default(),
        }
    }
}

impl<T: TrackValue> Track<T> {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            keyframes: Vec::new(),
            interpolation,
        }
    }

    /// Build a track from keyframes that are already sorted by time
    pub fn from_keyframes(interpolation: Interpolation, keyframes: Vec<Keyframe<T>>) -> Self {
        Self {
            keyframes,
            interpolation,
        }
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn keyframe(&self, index: usize) -> Option<&Keyframe<T>> {
        self.keyframes.get(index)
    }

    /// Mutable access to the keyframes
    ///
    /// Callers are responsible for keeping timestamps ascending.
    pub fn keyframes_mut(&mut self) -> &mut Vec<Keyframe<T>> {
        &mut self.keyframes
    }

    /// Append a keyframe at the end of the track
    pub fn push(&mut self, keyframe: Keyframe<T>) {
        self.keyframes.push(keyframe);
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }
}

impl<T: TrackValue> TrackSampler<T> for Track<T> {
    fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    fn frame_index(&self, time: f32) -> usize {
        search_frame_index(&self.keyframes, time)
    }
}
