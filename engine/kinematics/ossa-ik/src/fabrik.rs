//! Forward and backward reaching inverse kinematics

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use log::trace;

use crate::chain::{IkChain, rotation_between};
use crate::solver::{IkSolver, SolverSettings};

/// Sideways drift, relative to distance from the root, still counted as
/// lying on the chain's line
const STRAIGHT_TOLERANCE: f32 = 1e-4;
const FOLD_STEPS: usize = 32;

/// Solves on bone positions, then turns the result back into rotations
///
/// Each iteration drags the effector onto the target and pulls the rest of
/// the chain after it, then pins the root back in place and pushes the
/// chain out again. Segment lengths never change.
#[derive(Debug, Clone, PartialEq)]
pub struct FabrikSolver {
    chain: IkChain,
    settings: SolverSettings,
    positions: Vec<Vec3>,
    lengths: Vec<f32>,
}

impl FabrikSolver {
    pub fn new(chain: IkChain) -> Self {
        Self::from_chain(chain, SolverSettings::default())
    }

    /// Model space positions from the last solve
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Distance from each bone to its parent; the root's is zero
    pub fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    fn load_positions(&mut self) {
        self.positions = self.chain.positions();
        self.lengths.clear();
        self.lengths.push(0.0);
        self.lengths.extend(
            self.positions
                .windows(2)
                .map(|pair| pair[1].distance(pair[0])),
        );
    }

    fn reach_forward(&mut self, target: Vec3) {
        let last = self.positions.len() - 1;
        self.positions[last] = target;
        for bone in (0..last).rev() {
            let child = self.positions[bone + 1];
            let direction = direction(child, self.positions[bone]);
            self.positions[bone] = child + direction * self.lengths[bone + 1];
        }
    }

    fn reach_backward(&mut self, base: Vec3) {
        self.positions[0] = base;
        for bone in 1..self.positions.len() {
            let parent = self.positions[bone - 1];
            let direction = direction(parent, self.positions[bone]);
            self.positions[bone] = parent + direction * self.lengths[bone];
        }
    }

    fn is_straight(&self, axis: Vec3) -> bool {
        let base = self.positions[0];
        self.positions[1..].iter().all(|&position| {
            let offset = position - base;
            axis.cross(offset).length() <= STRAIGHT_TOLERANCE * offset.length()
        })
    }

    /// Lay the chain out from `base` turning by `turn` radians at every
    /// joint; returns the effector position
    fn fold(&mut self, base: Vec3, axis: Vec3, side: Vec3, turn: f32) -> Vec3 {
        let mut angle = 0.0f32;
        self.positions[0] = base;
        for bone in 1..self.positions.len() {
            let direction = axis * angle.cos() + side * angle.sin();
            self.positions[bone] = self.positions[bone - 1] + direction * self.lengths[bone];
            angle += turn;
        }
        self.positions[self.positions.len() - 1]
    }

    /// Bend a straight chain evenly until the effector is as far from the
    /// root as `target`, then swing it round onto the target
    ///
    /// The passes only slide the joints of a straight chain along its own
    /// line, so it would otherwise never bend.
    fn unfold_straight(&mut self, target: Vec3) {
        let last = self.positions.len() - 1;
        let base = self.positions[0];
        let Some(axis) = (self.positions[last] - base).try_normalize() else {
            return;
        };
        if last < 2 || !self.is_straight(axis) {
            return;
        }

        let to_target = target - base;
        let reach = to_target.length();
        let across = to_target - axis * axis.dot(to_target);
        let side = if across.length() <= STRAIGHT_TOLERANCE * reach {
            axis.any_orthonormal_vector()
        } else {
            across.normalize()
        };

        let total: f32 = self.lengths.iter().sum();
        let mut turn = 0.0;
        if reach < total {
            // the effector's distance from the root shrinks as the turn grows
            let (mut low, mut high) = (0.0, (TAU / last as f32).min(PI));
            for _ in 0..FOLD_STEPS {
                let mid = 0.5 * (low + high);
                if self.fold(base, axis, side, mid).distance(base) > reach {
                    low = mid;
                } else {
                    high = mid;
                }
            }
            turn = 0.5 * (low + high);
        }
        let effector = self.fold(base, axis, side, turn);

        let swing = rotation_between(effector - base, to_target);
        for position in &mut self.positions[1..] {
            *position = base + swing * (*position - base);
        }
        trace!("FABRIK unfolded a straight chain by {} per joint", turn);
    }

    /// Rotate each bone so its child lands on the solved position
    fn store_rotations(&mut self) {
        for bone in 0..self.positions.len() - 1 {
            let model = self.chain.model_transform(bone);
            let child = self.chain.model_transform(bone + 1);
            let inverse = model.rotation.conjugate();

            let to_child = inverse * (child.position - model.position);
            let to_desired = inverse * (self.positions[bone + 1] - model.position);
            let delta = rotation_between(to_child, to_desired);

            let local = self.chain.local(bone).rotation;
            self.chain.set_local_rotation(bone, local * delta);
        }
    }

    fn reached(&self, target: Vec3) -> bool {
        let threshold = self.settings.threshold_squared();
        self.positions
            .last()
            .is_some_and(|effector| effector.distance_squared(target) < threshold)
    }
}

fn direction(from: Vec3, to: Vec3) -> Vec3 {
    (to - from).try_normalize().unwrap_or(Vec3::Y)
}

impl IkSolver for FabrikSolver {
    fn from_chain(chain: IkChain, settings: SolverSettings) -> Self {
        let mut solver = Self {
            chain,
            settings,
            positions: Vec::new(),
            lengths: Vec::new(),
        };
        solver.load_positions();
        solver
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
        self.load_positions();
        let base = self.positions[0];
        self.unfold_straight(target);

        for iteration in 0..self.settings.max_iterations {
            if self.reached(target) {
                self.store_rotations();
                trace!("FABRIK reached target after {} iterations", iteration);
                return true;
            }
            self.reach_forward(target);
            self.reach_backward(base);
        }

        self.store_rotations();
        let solved = self.chain.effector().distance_squared(target)
            < self.settings.threshold_squared();
        trace!(
            "FABRIK stopped after {} iterations, {} from target",
            self.settings.max_iterations,
            self.distance_to(target)
        );
        solved
    }
}
