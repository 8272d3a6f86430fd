//! Hip, knee and ankle helper for foot placement

use glam::Vec3;
use log::warn;
use ossa_anim::{Armature, Pose, Transform};

use crate::chain::IkChain;
use crate::error::Result;
use crate::solver::{IkSolver, SolverSettings};

/// Plants a three-bone leg on a ground point
///
/// The ankle target is raised by the ankle's height above the sole so the
/// foot, not the ankle joint, meets the ground.
#[derive(Debug, Clone)]
pub struct IkLeg<S> {
    solver: S,
    hip: usize,
    knee: usize,
    ankle: usize,
    ankle_offset: f32,
}

impl<S: IkSolver> IkLeg<S> {
    pub fn new(
        pose: &Pose,
        hip: usize,
        knee: usize,
        ankle: usize,
        settings: SolverSettings,
    ) -> Result<Self> {
        let chain = IkChain::from_pose(pose, &[hip, knee, ankle])?;
        Ok(Self {
            solver: S::from_chain(chain, settings),
            hip,
            knee,
            ankle,
            ankle_offset: 0.0,
        })
    }

    /// Look the leg bones up by name in the armature's rest pose
    pub fn from_armature(
        armature: &Armature,
        hip: &str,
        knee: &str,
        ankle: &str,
        settings: SolverSettings,
    ) -> Result<Self> {
        Self::new(
            armature.rest_pose(),
            armature.find_bone(hip)?,
            armature.find_bone(knee)?,
            armature.find_bone(ankle)?,
            settings,
        )
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    /// Hip, knee and ankle bone indices
    pub fn bones(&self) -> [usize; 3] {
        [self.hip, self.knee, self.ankle]
    }

    pub fn ankle_offset(&self) -> f32 {
        self.ankle_offset
    }

    /// Height of the ankle joint above the ground contact
    pub fn set_ankle_offset(&mut self, offset: f32) {
        self.ankle_offset = offset;
    }

    /// Bend the leg in `pose` so the foot lands on `ground`
    ///
    /// `model` places the pose in the same space as `ground`. Returns whether
    /// the solver converged; the leg is written back either way.
    pub fn solve(&mut self, model: &Transform, pose: &mut Pose, ground: Vec3) -> bool {
        if self.bones().iter().any(|&bone| bone >= pose.len()) {
            warn!(
                "Leg bones {:?} do not fit a pose of {} bones",
                self.bones(),
                pose.len()
            );
            return false;
        }

        let chain = self.solver.chain_mut();
        chain.set_local(0, model.combine(&pose.world_transform(self.hip)));
        chain.set_local(1, pose.local_transform(self.knee));
        chain.set_local(2, pose.local_transform(self.ankle));

        let solved = self.solver.solve(ground + Vec3::Y * self.ankle_offset);

        let parent_world = match pose.parent(self.hip) {
            Some(parent) => model.combine(&pose.world_transform(parent)),
            None => *model,
        };
        let chain = self.solver.chain();
        pose.set_local_transform(self.hip, parent_world.inverse().combine(&chain.local(0)));
        pose.set_local_transform(self.knee, chain.local(1));
        pose.set_local_transform(self.ankle, chain.local(2));
        solved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccd::CcdSolver;
    use crate::error::IkError;
    use crate::fabrik::FabrikSolver;
    use glam::Quat;
    use ossa_anim::AnimError;

    /// pelvis -> hip -> knee -> ankle, knee slightly bent
    fn legs() -> Armature {
        let locals = vec![
            Transform::from_position(Vec3::new(0.0, 2.0, 0.0)),
            Transform::from_position(Vec3::new(0.2, 0.0, 0.0)),
            Transform::new(
                Vec3::new(0.0, -1.0, 0.0),
                Quat::from_rotation_x(0.3),
                Vec3::ONE,
            ),
            Transform::from_position(Vec3::new(0.0, -1.0, 0.0)),
        ];
        let pose = Pose::from_parts(locals, vec![-1, 0, 1, 2]).unwrap();
        let names = ["pelvis", "hip", "knee", "ankle"].map(String::from).to_vec();
        Armature::new(pose.clone(), pose, names).unwrap()
    }

    #[test]
    fn test_plants_foot() {
        let armature = legs();
        let mut leg: IkLeg<FabrikSolver> = IkLeg::from_armature(
            &armature,
            "hip",
            "knee",
            "ankle",
            SolverSettings::new(32, 1e-3),
        )
        .unwrap();
        leg.set_ankle_offset(0.1);
        assert_eq!(leg.bones(), [1, 2, 3]);

        let mut pose = armature.rest_pose().clone();
        assert!(leg.solve(&Transform::IDENTITY, &mut pose, Vec3::new(0.2, 0.3, 0.2)));

        let ankle = pose.world_transform(3).position;
        assert!(ankle.abs_diff_eq(Vec3::new(0.2, 0.4, 0.2), 2e-3), "{ankle}");
        // the pelvis is not part of the leg
        assert_eq!(pose.local_transform(0), armature.rest_pose().local_transform(0));
    }

    #[test]
    fn test_respects_model_transform() {
        let armature = legs();
        let mut leg: IkLeg<CcdSolver> =
            IkLeg::new(armature.rest_pose(), 1, 2, 3, SolverSettings::new(64, 1e-3)).unwrap();

        let model = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));
        let mut pose = armature.rest_pose().clone();
        let ground = Vec3::new(5.2, 0.4, 0.2);
        assert!(leg.solve(&model, &mut pose, ground));

        let ankle = model.combine(&pose.world_transform(3)).position;
        assert!(ankle.abs_diff_eq(ground, 2e-3), "{ankle}");
    }

    #[test]
    fn test_setup_errors() {
        let armature = legs();
        let err = IkLeg::<CcdSolver>::from_armature(
            &armature,
            "hip",
            "shin",
            "ankle",
            SolverSettings::default(),
        )
        .unwrap_err();
        assert_eq!(err, IkError::Anim(AnimError::UnknownBone("shin".into())));

        assert!(
            IkLeg::<CcdSolver>::new(armature.rest_pose(), 1, 3, 2, SolverSettings::default())
                .is_err()
        );
    }

    #[test]
    fn test_mismatched_pose_is_ignored() {
        let armature = legs();
        let mut leg: IkLeg<CcdSolver> =
            IkLeg::new(armature.rest_pose(), 1, 2, 3, SolverSettings::default()).unwrap();
        let mut small = Pose::new(2);
        assert!(!leg.solve(&Transform::IDENTITY, &mut small, Vec3::ZERO));
        assert_eq!(small, Pose::new(2));
    }
}
