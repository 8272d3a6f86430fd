//! Solver convergence on reachable targets

use glam::Vec3;
use ossa_anim::{Pose, Transform};
use ossa_ik::{CcdSolver, FabrikSolver, IkChain, IkSolver, SolverSettings};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use test_case::test_case;

/// Unit segments along +X from the origin
fn straight_chain(bones: usize) -> IkChain {
    let mut locals = vec![Transform::from_position(Vec3::X); bones];
    locals[0] = Transform::IDENTITY;
    IkChain::new(locals).unwrap()
}

fn segment_lengths(chain: &IkChain) -> Vec<f32> {
    chain
        .positions()
        .windows(2)
        .map(|pair| pair[1].distance(pair[0]))
        .collect()
}

/// Anywhere inside the reach of a chain of unit segments, axis included
fn target(reach: f32) -> impl Strategy<Value = Vec3> {
    (
        0.0f32..=reach,
        0.0f32..=std::f32::consts::PI,
        0.0f32..std::f32::consts::TAU,
    )
        .prop_map(|(radius, polar, azimuth)| {
            Vec3::new(
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
                radius * polar.sin() * azimuth.sin(),
            )
        })
}

fn chain_and_target() -> impl Strategy<Value = (usize, Vec3)> {
    (3usize..7).prop_flat_map(|bones| (Just(bones), target((bones - 1) as f32)))
}

#[test_case(CcdSolver::from_chain(straight_chain(3), SolverSettings::new(5, 1e-3)) ; "ccd")]
#[test_case(FabrikSolver::from_chain(straight_chain(3), SolverSettings::new(5, 1e-3)) ; "fabrik")]
fn test_two_bone_reach_along_axis(mut solver: impl IkSolver) {
    let before = solver.chain().clone();
    let target = Vec3::new(1.5, 0.0, 0.0);
    assert!(solver.solve(target));
    assert!(solver.distance_to(target) < 1e-3);

    let lengths = segment_lengths(solver.chain());
    for (length, expected) in lengths.iter().zip(segment_lengths(&before)) {
        assert!((length - expected).abs() < 1e-4);
    }
}

#[test_case(Vec3::new(1.125, (1.0f32 - 0.015_625).sqrt(), 0.0) ; "off axis")]
#[test_case(Vec3::new(1.5, 0.05, 0.0) ; "just off axis")]
#[test_case(Vec3::new(1.5, 0.001, 0.0) ; "grazing axis")]
#[test_case(Vec3::new(-1.5, 0.0, 0.0) ; "behind root")]
#[test_case(Vec3::new(0.3, 0.2, 0.0) ; "near root")]
#[test_case(Vec3::new(0.0, 2.0, 0.0) ; "full reach")]
fn test_two_bone_targets(target: Vec3) {
    let settings = SolverSettings::new(15, 1e-3);

    let mut ccd = CcdSolver::from_chain(straight_chain(3), settings);
    assert!(ccd.solve(target), "ccd missed by {}", ccd.distance_to(target));

    let mut fabrik = FabrikSolver::from_chain(straight_chain(3), settings);
    assert!(fabrik.solve(target), "fabrik missed by {}", fabrik.distance_to(target));
}

#[test_case(CcdSolver::new(straight_chain(3)) ; "ccd")]
#[test_case(FabrikSolver::new(straight_chain(3)) ; "fabrik")]
fn test_out_of_reach_on_axis(mut solver: impl IkSolver) {
    let before = solver.chain().clone();
    assert!(!solver.solve(Vec3::new(3.0, 0.0, 0.0)));
    assert!(solver.chain().effector().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-4));
    for (length, expected) in segment_lengths(solver.chain()).iter().zip(segment_lengths(&before)) {
        assert!((length - expected).abs() < 1e-4);
    }
}

#[test]
fn test_solve_inside_pose() {
    let _ = env_logger::builder().is_test(true).try_init();
    let locals = vec![
        Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
        Transform::from_position(Vec3::X),
        Transform::from_position(Vec3::X),
        Transform::from_position(Vec3::X),
    ];
    let mut pose = Pose::from_parts(locals, vec![-1, 0, 1, 2]).unwrap();
    let bones = [1, 2, 3];

    let chain = IkChain::from_pose(&pose, &bones).unwrap();
    let mut solver = FabrikSolver::from_chain(chain, SolverSettings::new(32, 1e-3));
    let target = Vec3::new(1.5, 2.0, 0.5);
    assert!(solver.solve(target));

    solver.chain().apply_to_pose(&mut pose, &bones).unwrap();
    assert!(pose.world_transform(3).position.distance(target) < 1e-3);
    assert_eq!(pose.local_transform(0).position, Vec3::new(0.0, 1.0, 0.0));
}

proptest! {
    #[test]
    fn ccd_converges((bones, target) in chain_and_target()) {
        let mut solver =
            CcdSolver::from_chain(straight_chain(bones), SolverSettings::new(32, 1e-3));
        prop_assert!(solver.solve(target), "missed {target} by {}", solver.distance_to(target));
    }

    #[test]
    fn fabrik_converges((bones, target) in chain_and_target()) {
        let mut solver =
            FabrikSolver::from_chain(straight_chain(bones), SolverSettings::new(32, 1e-3));
        prop_assert!(solver.solve(target), "missed {target} by {}", solver.distance_to(target));
    }

    #[test]
    fn fabrik_preserves_lengths(
        target in (-4.0f32..4.0, -4.0f32..4.0, -4.0f32..4.0),
        bones in 2usize..6,
        iterations in 1u32..20,
    ) {
        let target = Vec3::new(target.0, target.1, target.2);
        let mut solver = FabrikSolver::from_chain(
            straight_chain(bones),
            SolverSettings::new(iterations, 1e-4),
        );
        solver.solve(target);

        for (i, pair) in solver.positions().windows(2).enumerate() {
            let length = pair[1].distance(pair[0]);
            prop_assert!((length - 1.0).abs() < 1e-4, "segment {i} is {length}");
        }
        for length in segment_lengths(solver.chain()) {
            prop_assert!((length - 1.0).abs() < 1e-4);
        }
    }
}
