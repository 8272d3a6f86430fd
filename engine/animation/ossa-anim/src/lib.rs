//! Skeletal animation core
//!
//! Bones are stored in a [`Pose`] as parent-relative [`Transform`]s
//! addressed by index. [`Clip`]s sample keyframe tracks onto a pose, the
//! [`blending`] functions mix and layer poses, and a
//! [`CrossFadeController`] drives transitions between clips. Resolved poses
//! turn into matrix or dual quaternion palettes for skinning.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ossa_anim::{Armature, CrossFadeController};
//!
//! let armature: Armature = load_armature()?;
//! let mut controller = CrossFadeController::from_armature(&armature);
//! controller.play(Arc::new(idle));
//! controller.fade_to(Arc::new(walk), 0.3);
//!
//! let mut palette = Vec::new();
//! loop {
//!     controller.update(frame_time);
//!     armature.skin_matrix_palette(controller.pose(), &mut palette);
//!     upload(&palette);
//! }
//! ```

pub mod armature;
pub mod blending;
pub mod clip;
pub mod crossfade;
pub mod dual_quat;
pub mod error;
pub mod pose;
pub mod rearrange;
pub mod track;
pub mod transform;

pub use armature::{Armature, bind_pose_from_inverse_bind_matrices};
pub use blending::{
    add_in_place, add_to_pose, blend, blend_in_place, is_in_hierarchy, make_additive_base,
};
pub use clip::{CachedClip, Clip, DEFAULT_CLIP_NAME};
pub use crossfade::{CrossFadeController, CrossFadeTarget};
pub use dual_quat::DualQuat;
pub use error::{AnimError, Result};
pub use pose::{Pose, validate_hierarchy};
pub use rearrange::{BoneMap, rearrange_armature, rearrange_clip};
pub use track::{
    CachedQuatTrack, CachedScalarTrack, CachedTrack, CachedTransformTrack, CachedVectorTrack,
    DEFAULT_SAMPLE_RATE, Interpolation, Keyframe, QuatTrack, ScalarTrack, Track, TrackSampler,
    TrackValue, TransformTrack, VectorTrack,
};
pub use transform::Transform;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
