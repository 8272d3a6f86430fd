//! Clip command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use glam::{Quat, Vec3};
use ossa_anim::{Armature, Clip, CrossFadeController, DEFAULT_SAMPLE_RATE, Pose, TrackSampler};

use crate::rig::Rig;
use crate::utils::{add_table_row, create_table, format_floats, format_quat, format_vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PaletteKind {
    /// Skinning matrices, column major
    Matrix,
    /// Skinning dual quaternions, real part first
    DualQuat,
}

#[derive(Subcommand)]
pub enum ClipCommands {
    /// Sample a clip at one point in time
    Sample {
        /// Path to the rig file
        file: PathBuf,

        /// Name of the clip to sample
        #[arg(short, long)]
        clip: String,

        /// Time in seconds
        #[arg(short, long, allow_hyphen_values = true)]
        time: f32,

        /// Sample through lookup-table tracks
        #[arg(long)]
        cached: bool,

        /// Lookup table rate in samples per second
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        rate: f32,

        /// Also print the skinning palette
        #[arg(short, long, value_enum)]
        palette: Option<PaletteKind>,
    },

    /// Step a crossfade from one clip to another
    Crossfade {
        /// Path to the rig file
        file: PathBuf,

        /// Clip playing at the start
        #[arg(long)]
        from: String,

        /// Clip to fade to
        #[arg(long)]
        to: String,

        /// Fade length in seconds
        #[arg(short, long, default_value_t = 0.5)]
        duration: f32,

        /// Time step per frame in seconds
        #[arg(short, long, default_value_t = 1.0 / 30.0)]
        step: f32,

        /// Number of frames to run
        #[arg(short, long, default_value_t = 30)]
        frames: u32,

        /// Bone to report; defaults to the first bone
        #[arg(short, long)]
        bone: Option<String>,
    },
}

pub fn execute(cmd: ClipCommands) -> Result<()> {
    match cmd {
        ClipCommands::Sample {
            file,
            clip,
            time,
            cached,
            rate,
            palette,
        } => handle_sample(&file, &clip, time, cached.then_some(rate), palette),
        ClipCommands::Crossfade {
            file,
            from,
            to,
            duration,
            step,
            frames,
            bone,
        } => handle_crossfade(&file, &from, &to, duration, step, frames, bone.as_deref()),
    }
}

fn sample_into<V, Q>(clip: &Clip<V, Q>, pose: &mut Pose, time: f32) -> f32
where
    V: TrackSampler<Vec3>,
    Q: TrackSampler<Quat>,
{
    clip.sample(pose, time)
}

fn handle_sample(
    path: &Path,
    clip_name: &str,
    time: f32,
    cache_rate: Option<f32>,
    palette: Option<PaletteKind>,
) -> Result<()> {
    let rig = Rig::load(path)?;
    let clip = rig.clip(clip_name)?;
    let armature = &rig.armature;

    let mut pose = armature.rest_pose().clone();
    let used = match cache_rate {
        Some(rate) => {
            log::info!("Sampling '{}' through lookup tables at {}Hz", clip.name(), rate);
            sample_into(&clip.to_cached(rate), &mut pose, time)
        }
        None => sample_into(clip, &mut pose, time),
    };

    println!("Clip: {} ({:.3}s to {:.3}s)", clip.name(), clip.start_time(), clip.end_time());
    println!("Requested time: {time:.3}, sampled at: {used:.3}");

    print_pose(armature, &pose);

    match palette {
        Some(PaletteKind::Matrix) => {
            let mut matrices = Vec::new();
            armature.skin_matrix_palette(&pose, &mut matrices);
            println!("\n=== Matrix palette ===");
            for (bone, matrix) in matrices.iter().enumerate() {
                println!("{bone}: [{}]", format_floats(&matrix.to_cols_array()));
            }
        }
        Some(PaletteKind::DualQuat) => {
            let mut dual = Vec::new();
            armature.skin_dual_quat_palette(&pose, &mut dual);
            println!("\n=== Dual quaternion palette ===");
            for (bone, dq) in dual.iter().enumerate() {
                println!("{bone}: [{}]", format_floats(&dq.to_array()));
            }
        }
        None => {}
    }

    Ok(())
}

fn print_pose(armature: &Armature, pose: &Pose) {
    let mut table = create_table(&["#", "Bone", "Position", "Rotation", "World position"]);
    for bone in 0..pose.len() {
        let local = pose.local_transform(bone);
        add_table_row(
            &mut table,
            vec![
                bone.to_string(),
                armature.bone_name(bone).unwrap_or_default().to_string(),
                format_vec3(local.position),
                format_quat(local.rotation),
                format_vec3(pose.world_transform(bone).position),
            ],
        );
    }
    table.printstd();
}

fn handle_crossfade(
    path: &Path,
    from: &str,
    to: &str,
    duration: f32,
    step: f32,
    frames: u32,
    bone: Option<&str>,
) -> Result<()> {
    if step <= 0.0 {
        bail!("Time step must be positive, got {step}");
    }

    let rig = Rig::load(path)?;
    let armature = &rig.armature;
    let bone = match bone {
        Some(name) => armature.find_bone(name)?,
        None => 0,
    };
    if bone >= armature.bone_count() {
        bail!("Rig has no bones");
    }

    let from = Arc::new(rig.clip(from)?.clone());
    let to = Arc::new(rig.clip(to)?.clone());

    let mut controller: CrossFadeController = CrossFadeController::from_armature(armature);
    controller.play(from);
    controller.fade_to(Arc::clone(&to), duration);

    println!(
        "Fading to '{}' over {duration:.3}s, reporting bone '{}'",
        to.name(),
        armature.bone_name(bone).unwrap_or_default()
    );
    let mut table = create_table(&["Frame", "Clip", "Time", "Weight", "Pending", "Position"]);
    for frame in 1..=frames {
        controller.update(step);
        let weight = controller
            .targets()
            .first()
            .map_or(1.0, |target| target.weight());
        add_table_row(
            &mut table,
            vec![
                frame.to_string(),
                controller
                    .current_clip()
                    .map(|clip| clip.name().to_string())
                    .unwrap_or_default(),
                format!("{:.3}", controller.current_time()),
                format!("{weight:.3}"),
                controller.targets().len().to_string(),
                format_vec3(controller.pose().world_transform(bone).position),
            ],
        );
    }
    table.printstd();
    Ok(())
}
