//! ossa-rs library
//!
//! Rig file handling and the command implementations behind the `ossa-rs`
//! binary.

pub mod cli;
pub mod commands;
pub mod rig;
pub mod utils;
