//! Keyframe tracks
//!
//! A track is a time-sorted list of [`Keyframe`]s for one value type
//! (`f32`, `Vec3` or `Quat`) with an [`Interpolation`] mode. Two
//! implementations share the [`TrackSampler`] trait:
//!
//! - [`Track`] finds the active keyframe with a binary search
//! - [`CachedTrack`] reads it from a table built once at load time
//!
//! Both produce identical samples for the same keyframes.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use ossa_anim::track::{Interpolation, Keyframe, TrackSampler, VectorTrack};
//!
//! let track = VectorTrack::from_keyframes(
//!     Interpolation::Linear,
//!     vec![
//!         Keyframe::new(0.0, Vec3::ZERO),
//!         Keyframe::new(2.0, Vec3::new(4.0, 0.0, 0.0)),
//!     ],
//! );
//! assert_eq!(track.sample(1.0, false), Vec3::new(2.0, 0.0, 0.0));
//! ```

mod cached;
mod keyframe;
mod keyframe_track;
mod sampler;
mod transform_track;

pub use cached::{
    CachedQuatTrack, CachedScalarTrack, CachedTrack, CachedVectorTrack, DEFAULT_SAMPLE_RATE,
};
pub use keyframe::{Interpolation, Keyframe, TrackValue};
pub use keyframe_track::{QuatTrack, ScalarTrack, Track, VectorTrack};
pub use sampler::{TrackSampler, search_frame_index, wrap_time};
pub use transform_track::{CachedTransformTrack, TransformTrack};
