//! Settings and the interface shared by the solvers

use glam::Vec3;
use ossa_anim::Transform;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::chain::IkChain;

/// Iteration budget and success distance for a solver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct SolverSettings {
    pub max_iterations: u32,
    /// Effector-to-target distance that counts as solved
    pub threshold: f32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            threshold: 0.0001,
        }
    }
}

impl SolverSettings {
    pub fn new(max_iterations: u32, threshold: f32) -> Self {
        Self {
            max_iterations,
            threshold,
        }
    }

    pub(crate) fn threshold_squared(&self) -> f32 {
        self.threshold * self.threshold
    }
}

/// An iterative solver that bends an [`IkChain`] toward a target
///
/// Solving never fails outright. When the budget runs out the chain keeps
/// the closest pose found and `solve` reports `false`.
pub trait IkSolver {
    fn from_chain(chain: IkChain, settings: SolverSettings) -> Self
    where
        Self: Sized;

    fn chain(&self) -> &IkChain;

    fn chain_mut(&mut self) -> &mut IkChain;

    fn settings(&self) -> &SolverSettings;

    fn settings_mut(&mut self) -> &mut SolverSettings;

    /// Move the end of the chain onto `target`, in model space
    fn solve(&mut self, target: Vec3) -> bool;

    /// Solve for the position of `target`; its rotation and scale are
    /// ignored
    fn solve_transform(&mut self, target: &Transform) -> bool {
        self.solve(target.position)
    }

    /// Distance still separating the effector from `target`
    fn distance_to(&self, target: Vec3) -> f32 {
        self.chain().effector().distance(target)
    }
}
