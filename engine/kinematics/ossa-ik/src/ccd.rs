//! Cyclic coordinate descent

use glam::{Quat, Vec3};
use log::trace;

use crate::chain::{IkChain, LENGTH_EPSILON, PARALLEL_EPSILON, rotation_between};
use crate::solver::{IkSolver, SolverSettings};

/// Above this cosine, either way round, the effector and target directions
/// count as one line
const ALIGNED_COSINE: f32 = 0.99;

/// Rotates one bone at a time, from the effector's parent back to the root,
/// so that the effector swings toward the target
#[derive(Debug, Clone, PartialEq)]
pub struct CcdSolver {
    chain: IkChain,
    settings: SolverSettings,
}

impl CcdSolver {
    pub fn new(chain: IkChain) -> Self {
        Self::from_chain(chain, SolverSettings::default())
    }

    fn reached(&self, target: Vec3) -> bool {
        self.chain.effector().distance_squared(target) < self.settings.threshold_squared()
    }

    fn rotate_bone(&mut self, bone: usize, target: Vec3) {
        let model = self.chain.model_transform(bone);
        let to_effector = self.chain.effector() - model.position;
        let to_target = target - model.position;
        if to_target.length_squared() <= LENGTH_EPSILON * LENGTH_EPSILON {
            return;
        }

        let delta = self
            .bend_to_reach(bone, model.position, target)
            .unwrap_or_else(|| rotation_between(to_effector, to_target));
        let parent_rotation = match bone {
            0 => Quat::IDENTITY,
            _ => self.chain.model_transform(bone - 1).rotation,
        };
        let rotated = delta * model.rotation;
        self.chain
            .set_local_rotation(bone, parent_rotation.conjugate() * rotated);
    }

    /// Rotation that bends `bone` until the effector is as far from the
    /// parent bone as the target is
    ///
    /// Used when the effector already lies on the line from the bone to the
    /// target, where aiming turns the bone by next to nothing.
    fn bend_to_reach(&self, bone: usize, position: Vec3, target: Vec3) -> Option<Quat> {
        if bone == 0 {
            return None;
        }
        let to_effector = self.chain.effector() - position;
        let effector_dir = to_effector.try_normalize()?;
        let target_dir = (target - position).try_normalize()?;
        if effector_dir.dot(target_dir).abs() < ALIGNED_COSINE {
            return None;
        }

        let parent = self.chain.model_transform(bone - 1).position;
        let to_parent = parent - position;
        let parent_dir = to_parent.try_normalize()?;
        let (arm, link) = (to_effector.length(), to_parent.length());
        let reach = target.distance(parent);

        // law of cosines for the angle the bone has to open to
        let wanted = ((arm * arm + link * link - reach * reach) / (2.0 * arm * link))
            .clamp(-1.0, 1.0)
            .acos();
        let current = parent_dir.dot(effector_dir).clamp(-1.0, 1.0).acos();

        let axis = to_parent.cross(to_effector);
        let axis = if axis.length() <= PARALLEL_EPSILON * arm * link {
            effector_dir.any_orthonormal_vector()
        } else {
            axis.normalize()
        };
        Some(Quat::from_axis_angle(axis, wanted - current))
    }
}

impl IkSolver for CcdSolver {
    fn from_chain(chain: IkChain, settings: SolverSettings) -> Self {
        Self { chain, settings }
    }

    fn chain(&self) -> &IkChain {
        &self.chain
    }

    fn chain_mut(&mut self) -> &mut IkChain {
        &mut self.chain
    }

    fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut SolverSettings {
        &mut self.settings
    }

    fn solve(&mut self, target: Vec3) -> bool {
        let last = self.chain.len() - 1;
        for iteration in 0..self.settings.max_iterations {
            if self.reached(target) {
                trace!("CCD reached target after {} iterations", iteration);
                return true;
            }

            for bone in (0..last).rev() {
                self.rotate_bone(bone, target);
                if self.reached(target) {
                    trace!("CCD reached target during iteration {}", iteration + 1);
                    return true;
                }
            }
        }

        let solved = self.reached(target);
        trace!(
            "CCD stopped after {} iterations, {} from target",
            self.settings.max_iterations,
            self.distance_to(target)
        );
        solved
    }
}
