//! Inverse kinematics command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use glam::Vec3;
use ossa_anim::Pose;
use ossa_ik::{CcdSolver, FabrikSolver, IkChain, IkSolver, SolverSettings};

use crate::rig::Rig;
use crate::utils::{add_table_row, create_table, format_quat, format_vec3, parse_vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SolverKind {
    /// Cyclic coordinate descent
    Ccd,
    /// Forward and backward reaching
    Fabrik,
}

#[derive(Subcommand)]
pub enum IkCommands {
    /// Bend a chain of bones in the rest pose toward a target
    Solve {
        /// Path to the rig file
        file: PathBuf,

        /// Bones from chain root to end effector, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        bones: Vec<String>,

        /// Target position in model space as x,y,z
        #[arg(short, long, allow_hyphen_values = true, value_parser = parse_vec3)]
        target: Vec3,

        /// Solver to use
        #[arg(short, long, value_enum, default_value_t = SolverKind::Fabrik)]
        solver: SolverKind,

        /// Maximum iterations
        #[arg(short, long, default_value_t = 15)]
        iterations: u32,

        /// Distance at which the target counts as reached
        #[arg(long, default_value_t = 0.0001)]
        threshold: f32,
    },
}

pub fn execute(cmd: IkCommands) -> Result<()> {
    match cmd {
        IkCommands::Solve {
            file,
            bones,
            target,
            solver,
            iterations,
            threshold,
        } => handle_solve(
            &file,
            &bones,
            target,
            solver,
            SolverSettings::new(iterations, threshold),
        ),
    }
}

fn run<S: IkSolver>(chain: IkChain, settings: SolverSettings, target: Vec3) -> (IkChain, bool, f32) {
    let mut solver = S::from_chain(chain, settings);
    let solved = solver.solve(target);
    let distance = solver.distance_to(target);
    (solver.chain().clone(), solved, distance)
}

fn handle_solve(
    path: &Path,
    names: &[String],
    target: Vec3,
    kind: SolverKind,
    settings: SolverSettings,
) -> Result<()> {
    let rig = Rig::load(path)?;
    let bones = rig.bone_indices(names)?;
    let mut pose: Pose = rig.armature.rest_pose().clone();

    let chain = IkChain::from_pose(&pose, &bones)
        .with_context(|| format!("Bones {} do not form a chain", names.join(",")))?;
    log::info!(
        "Solving {} bones with {:?}, at most {} iterations",
        chain.len(),
        kind,
        settings.max_iterations
    );

    let (chain, solved, distance) = match kind {
        SolverKind::Ccd => run::<CcdSolver>(chain, settings, target),
        SolverKind::Fabrik => run::<FabrikSolver>(chain, settings, target),
    };
    chain.apply_to_pose(&mut pose, &bones)?;

    println!("Target: {}", format_vec3(target));
    println!("Solved: {}", if solved { "yes" } else { "no" });
    println!("Distance to target: {distance:.5}");

    let mut table = create_table(&["Bone", "Rotation", "World position"]);
    for (&bone, name) in bones.iter().zip(names) {
        add_table_row(
            &mut table,
            vec![
                name.clone(),
                format_quat(pose.local_transform(bone).rotation),
                format_vec3(pose.world_transform(bone).position),
            ],
        );
    }
    table.printstd();
    Ok(())
}
