//! Keyframe track with a precomputed frame lookup table

use glam::{Quat, Vec3};

use super::keyframe::{Interpolation, Keyframe, TrackValue};
use super::keyframe_track::Track;
use super::sampler::{TrackSampler, search_frame_index};

/// Lookup table resolution used when none is given
pub const DEFAULT_SAMPLE_RATE: f32 = 60.0;

/// A [`Track`] that answers frame lookups from a fixed-rate table
///
/// The table maps evenly spaced times across the track to the keyframe in
/// effect at that time, so a lookup costs one division plus a short local
/// correction. The table is not kept in sync automatically: after editing
/// keyframes through [`CachedTrack::track_mut`], call
/// [`CachedTrack::rebuild_cache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTrack<T> {
    track: Track<T>,
    samples_per_second: f32,
    frame_cache: Vec<usize>,
}

pub type CachedScalarTrack = CachedTrack<f32>;
pub type CachedVectorTrack = CachedTrack<Vec3>;
pub type CachedQuatTrack = CachedTrack<Quat>;

impl<T> Default for CachedTrack<T> {
    fn default() -> Self {
        Self {
            track: Track::default(),
            samples_per_second: DEFAULT_SAMPLE_RATE,
            frame_cache: Vec::new(),
        }
    }
}

impl<T: TrackValue> CachedTrack<T> {
    /// Wrap a track and build its lookup table
    ///
    /// A rate of zero or below is treated as one sample per second.
    pub fn from_track(track: Track<T>, samples_per_second: f32) -> Self {
        let mut cached = Self {
            track,
            samples_per_second,
            frame_cache: Vec::new(),
        };
        cached.rebuild_cache();
        cached
    }

    pub fn new(interpolation: Interpolation) -> Self {
        Self::from_track(Track::new(interpolation), DEFAULT_SAMPLE_RATE)
    }

    pub fn track(&self) -> &Track<T> {
        &self.track
    }

    /// Edit the underlying track; the lookup table goes stale until rebuilt
    pub fn track_mut(&mut self) -> &mut Track<T> {
        &mut self.track
    }

    pub fn into_track(self) -> Track<T> {
        self.track
    }

    pub fn samples_per_second(&self) -> f32 {
        self.samples_per_second
    }

    /// Change the table resolution; takes effect on the next rebuild
    pub fn set_samples_per_second(&mut self, samples_per_second: f32) {
        self.samples_per_second = samples_per_second;
    }

    /// Number of entries in the lookup table
    pub fn cache_len(&self) -> usize {
        self.frame_cache.len()
    }

    /// Recompute the lookup table from the current keyframes
    ///
    /// Assumes ascending timestamps.
    pub fn rebuild_cache(&mut self) {
        self.frame_cache.clear();

        let keyframes = self.track.keyframes();
        if keyframes.len() < 2 {
            return;
        }

        let start = self.track.start_time();
        let duration = self.track.duration();
        if duration <= 0.0 {
            return;
        }

        let rate = if self.samples_per_second <= 0.0 {
            1.0
        } else {
            self.samples_per_second
        };
        let sample_count = ((duration * rate).ceil() as usize).max(1) + 1;
        let last = keyframes.len() - 2;
        let step = duration / (sample_count - 1) as f32;

        self.frame_cache.reserve(sample_count);
        let mut frame = 0;
        for sample in 0..sample_count {
            let time = start + step * sample as f32;
            while frame < last && keyframes[frame + 1].time <= time {
                frame += 1;
            }
            self.frame_cache.push(frame);
        }
    }
}

impl<T: TrackValue> From<Track<T>> for CachedTrack<T> {
    fn from(track: Track<T>) -> Self {
        Self::from_track(track, DEFAULT_SAMPLE_RATE)
    }
}

impl<T: TrackValue> TrackSampler<T> for CachedTrack<T> {
    fn keyframes(&self) -> &[Keyframe<T>] {
        self.track.keyframes()
    }

    fn interpolation(&self) -> Interpolation {
        self.track.interpolation()
    }

    fn frame_index(&self, time: f32) -> usize {
        let keyframes = self.track.keyframes();
        if self.frame_cache.is_empty() {
            return search_frame_index(keyframes, time);
        }

        let start = self.track.start_time();
        let duration = self.track.duration();
        let slots = self.frame_cache.len() - 1;
        let slot = (((time - start) / duration) * slots as f32) as usize;

        let last = keyframes.len().saturating_sub(2);
        let mut index = self.frame_cache[slot.min(slots)].min(last);

        // A keyframe may sit between two table entries
        while index < last && keyframes[index + 1].time <= time {
            index += 1;
        }
        while index > 0 && keyframes[index].time > time {
            index -= 1;
        }
        index
    }
}
