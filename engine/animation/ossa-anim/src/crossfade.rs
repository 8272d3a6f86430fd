//! Crossfading between clips
//!
//! The controller plays one clip and fades toward any number of queued
//! clips. Once a fade has run for its full duration the faded-to clip
//! becomes the current clip and every other pending fade is dropped.

use std::sync::Arc;

use glam::{Quat, Vec3};
use log::trace;

use crate::armature::Armature;
use crate::blending::blend_in_place;
use crate::clip::Clip;
use crate::pose::Pose;
use crate::track::{QuatTrack, TrackSampler, VectorTrack};

/// A clip being faded in
#[derive(Debug, Clone)]
pub struct CrossFadeTarget<V = VectorTrack, Q = QuatTrack> {
    pub clip: Arc<Clip<V, Q>>,
    pub pose: Pose,
    pub time: f32,
    pub duration: f32,
    pub elapsed: f32,
}

impl<V, Q> CrossFadeTarget<V, Q> {
    /// Blend weight toward this target
    pub fn weight(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).min(1.0)
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Debug, Clone)]
pub struct CrossFadeController<V = VectorTrack, Q = QuatTrack> {
    rest_pose: Pose,
    clip: Option<Arc<Clip<V, Q>>>,
    time: f32,
    pose: Pose,
    targets: Vec<CrossFadeTarget<V, Q>>,
}

impl<V, Q> CrossFadeController<V, Q> {
    pub fn new(rest_pose: Pose) -> Self {
        Self {
            pose: rest_pose.clone(),
            rest_pose,
            clip: None,
            time: 0.0,
            targets: Vec::new(),
        }
    }

    pub fn from_armature(armature: &Armature) -> Self {
        Self::new(armature.rest_pose().clone())
    }

    /// Replace the pose every update starts from
    pub fn set_rest_pose(&mut self, rest_pose: Pose) {
        self.pose = rest_pose.clone();
        self.rest_pose = rest_pose;
    }

    pub fn current_clip(&self) -> Option<&Arc<Clip<V, Q>>> {
        self.clip.as_ref()
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Result of the last update
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Pending fades, oldest first
    pub fn targets(&self) -> &[CrossFadeTarget<V, Q>] {
        &self.targets
    }

    pub fn is_playing(&self) -> bool {
        self.clip.is_some()
    }

    /// Switch to `clip` immediately, dropping any pending fades
    pub fn play(&mut self, clip: Arc<Clip<V, Q>>) {
        self.targets.clear();
        self.time = clip.start_time();
        self.pose = self.rest_pose.clone();
        self.clip = Some(clip);
    }

    /// Queue a fade to `clip` over `duration` seconds
    ///
    /// Starts playback directly when nothing is playing. Fading to the clip
    /// that is already the latest destination does nothing.
    pub fn fade_to(&mut self, clip: Arc<Clip<V, Q>>, duration: f32) {
        let Some(current) = &self.clip else {
            self.play(clip);
            return;
        };

        let latest = self.targets.last().map_or(current, |target| &target.clip);
        if Arc::ptr_eq(latest, &clip) {
            return;
        }

        self.targets.push(CrossFadeTarget {
            pose: self.rest_pose.clone(),
            time: clip.start_time(),
            clip,
            duration,
            elapsed: 0.0,
        });
    }
}

impl<V, Q> CrossFadeController<V, Q>
where
    V: TrackSampler<Vec3>,
    Q: TrackSampler<Quat>,
{
    /// Advance playback by `dt` seconds and rebuild the output pose
    pub fn update(&mut self, dt: f32) {
        let Some(clip) = self.clip.clone() else {
            return;
        };

        let clip = match self.targets.iter().position(CrossFadeTarget::is_complete) {
            Some(index) => {
                let target = self.targets.swap_remove(index);
                trace!(
                    "Fade to '{}' complete, dropping {} other pending fades",
                    target.clip.name(),
                    self.targets.len()
                );
                self.targets.clear();
                self.time = target.time;
                self.pose = target.pose;
                self.clip = Some(Arc::clone(&target.clip));
                target.clip
            }
            None => clip,
        };

        self.advance(&clip, dt);
    }

    fn advance(&mut self, clip: &Clip<V, Q>, dt: f32) {
        self.pose.clone_from(&self.rest_pose);
        self.time = clip.sample(&mut self.pose, self.time + dt);

        for target in &mut self.targets {
            target.time = target.clip.sample(&mut target.pose, target.time + dt);
            target.elapsed += dt;
            blend_in_place(&mut self.pose, &target.pose, target.weight(), None);
        }
    }
}
