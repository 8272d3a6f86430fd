//! Rig file command implementations

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;
use ossa_anim::{Armature, rearrange_armature, rearrange_clip};

use crate::rig::{Rig, RigFile};
use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_quat, format_vec3,
    render_tree,
};

#[derive(Subcommand)]
pub enum RigCommands {
    /// Display bones and clips of a rig
    Info {
        /// Path to the rig file
        file: PathBuf,

        /// Show world space positions and clip tracks
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the bone hierarchy as a tree
    Tree {
        /// Path to the rig file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Show rest positions next to each bone
        #[arg(short, long)]
        metadata: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Reorder bones so every parent precedes its children
    Rearrange {
        /// Input rig file
        file: PathBuf,

        /// Output rig file
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn execute(cmd: RigCommands) -> Result<()> {
    match cmd {
        RigCommands::Info { file, detailed } => handle_info(&file, detailed),
        RigCommands::Tree {
            file,
            depth,
            metadata,
            no_color,
        } => handle_tree(&file, depth, metadata, no_color),
        RigCommands::Rearrange { file, output } => handle_rearrange(&file, &output),
    }
}

fn parent_name(armature: &Armature, bone: usize) -> String {
    armature
        .rest_pose()
        .parent(bone)
        .and_then(|parent| armature.bone_name(parent))
        .unwrap_or("-")
        .to_string()
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let rig = Rig::load(path)?;
    let armature = &rig.armature;
    let pose = armature.rest_pose();

    println!("Rig: {}", path.display());
    println!("Bones: {}", armature.bone_count());
    println!(
        "Parent-first order: {}",
        if pose.is_ascending() { "yes" } else { "no" }
    );

    let mut headers = vec!["#", "Bone", "Parent", "Position", "Rotation"];
    if detailed {
        headers.push("World position");
    }
    let mut table = create_table(&headers);
    for bone in 0..armature.bone_count() {
        let local = pose.local_transform(bone);
        let mut row = vec![
            bone.to_string(),
            armature.bone_name(bone).unwrap_or_default().to_string(),
            parent_name(armature, bone),
            format_vec3(local.position),
            format_quat(local.rotation),
        ];
        if detailed {
            row.push(format_vec3(pose.world_transform(bone).position));
        }
        add_table_row(&mut table, row);
    }
    table.printstd();

    if rig.clips.is_empty() {
        println!("\nNo clips");
        return Ok(());
    }

    println!("\nClips: {}", rig.clips.len());
    let mut table = create_table(&["Clip", "Start", "End", "Tracks", "Looping"]);
    for clip in &rig.clips {
        add_table_row(
            &mut table,
            vec![
                clip.name().to_string(),
                format!("{:.3}", clip.start_time()),
                format!("{:.3}", clip.end_time()),
                clip.track_count().to_string(),
                clip.is_looping().to_string(),
            ],
        );
    }
    table.printstd();

    if detailed {
        for clip in &rig.clips {
            println!("\n=== {} ===", clip.name());
            let mut table = create_table(&["Bone", "Position", "Rotation", "Scale"]);
            for track in clip.tracks() {
                let channel = |len: usize| match len {
                    0 => "-".to_string(),
                    n => format!("{n} keys"),
                };
                add_table_row(
                    &mut table,
                    vec![
                        armature
                            .bone_name(track.bone_id as usize)
                            .unwrap_or("?")
                            .to_string(),
                        channel(track.position.len()),
                        channel(track.rotation.len()),
                        channel(track.scale.len()),
                    ],
                );
            }
            table.printstd();
        }
    }

    Ok(())
}

fn bone_node(armature: &Armature, bone: usize, children: &[Vec<usize>], metadata: bool) -> TreeNode {
    let name = armature.bone_name(bone).unwrap_or_default();
    let mut node = TreeNode::new(name, NodeType::Bone);
    if metadata {
        let local = armature.rest_pose().local_transform(bone);
        node = node
            .with_metadata("index", bone.to_string())
            .with_metadata("position", format_vec3(local.position));
    }
    for &child in &children[bone] {
        node = node.add_child(bone_node(armature, child, children, metadata));
    }
    node
}

fn handle_tree(path: &Path, depth: Option<usize>, metadata: bool, no_color: bool) -> Result<()> {
    let rig = Rig::load(path)?;
    let armature = &rig.armature;
    let pose = armature.rest_pose();

    let mut children = vec![Vec::new(); armature.bone_count()];
    let mut roots = Vec::new();
    for bone in 0..armature.bone_count() {
        match pose.parent(bone) {
            Some(parent) => children[parent].push(bone),
            None => roots.push(bone),
        }
    }

    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    let mut root = TreeNode::new(file_name, NodeType::Root);
    for bone in roots {
        root = root.add_child(bone_node(armature, bone, &children, metadata));
    }
    let bones = root.bone_count();
    root = root.with_metadata("bones", bones.to_string());
    for clip in &rig.clips {
        root = root.add_child(
            TreeNode::new(clip.name(), NodeType::Clip)
                .with_metadata("duration", format!("{:.3}s", clip.duration())),
        );
    }

    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: true,
        compact: true,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

fn handle_rearrange(input: &Path, output: &Path) -> Result<()> {
    let mut rig = Rig::load(input)?;
    let (armature, map) = rearrange_armature(&rig.armature)?;
    for clip in &mut rig.clips {
        rearrange_clip(clip, &map);
    }

    if map.is_identity() {
        println!("Bones already in parent-first order");
    } else {
        let moved = (0..map.len())
            .filter(|&old| map.new_index(old) != Some(old))
            .count();
        println!("Moved {moved} of {} bones", map.len());
    }

    RigFile::from_rig(&armature, &rig.clips).save(output)?;
    println!("Saved rig to: {}", output.display());
    Ok(())
}
