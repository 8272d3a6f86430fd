//! Command implementations

pub mod clip;
pub mod ik;
pub mod rig;
