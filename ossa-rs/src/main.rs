//! Main entry point for the ossa-rs CLI

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use std::io;

use ossa_rs::cli::{Cli, Commands};
use ossa_rs::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins when set
    let default_level = match (cli.verbose, cli.quiet) {
        (0, true) => log::LevelFilter::Error,
        (0, false) => log::LevelFilter::Warn,
        (1, _) => log::LevelFilter::Info,
        (2, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.as_str()),
    )
    .init();

    match cli.command {
        Commands::Rig { command } => commands::rig::execute(command),
        Commands::Clip { command } => commands::clip::execute(command),
        Commands::Ik { command } => commands::ik::execute(command),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
