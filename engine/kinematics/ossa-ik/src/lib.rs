//! Inverse kinematics for ossa skeletons
//!
//! Two solvers share the [`IkSolver`] trait:
//!
//! - [`CcdSolver`] rotates one joint at a time toward the target
//! - [`FabrikSolver`] solves on joint positions and converts back
//!
//! Both work on an [`IkChain`], which can be lifted out of a
//! [`Pose`](ossa_anim::Pose) and written back after solving. [`IkLeg`]
//! wraps either solver for foot placement.
//!
//! ```rust
//! use glam::Vec3;
//! use ossa_anim::Transform;
//! use ossa_ik::{FabrikSolver, IkChain, IkSolver, SolverSettings};
//!
//! let chain = IkChain::new(vec![
//!     Transform::IDENTITY,
//!     Transform::from_position(Vec3::X),
//!     Transform::from_position(Vec3::X),
//! ])?;
//! let mut solver = FabrikSolver::from_chain(chain, SolverSettings::new(16, 1e-3));
//! assert!(solver.solve(Vec3::new(1.0, 1.0, 0.0)));
//! # Ok::<(), ossa_ik::IkError>(())
//! ```

pub mod ccd;
pub mod chain;
pub mod error;
pub mod fabrik;
pub mod leg;
pub mod solver;

pub use ccd::CcdSolver;
pub use chain::{IkChain, rotation_between};
pub use error::{IkError, Result};
pub use fabrik::FabrikSolver;
pub use leg::IkLeg;
pub use solver::{IkSolver, SolverSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
