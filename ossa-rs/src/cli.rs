//! Root CLI structure for ossa-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ossa-rs")]
#[command(about = "Command-line tools for skeletal animation rigs", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rig inspection and conversion
    Rig {
        #[command(subcommand)]
        command: crate::commands::rig::RigCommands,
    },

    /// Clip sampling and crossfades
    Clip {
        #[command(subcommand)]
        command: crate::commands::clip::ClipCommands,
    },

    /// Inverse kinematics
    Ik {
        #[command(subcommand)]
        command: crate::commands::ik::IkCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
