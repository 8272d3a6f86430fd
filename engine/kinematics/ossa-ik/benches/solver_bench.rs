use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;
use ossa_anim::Transform;
use ossa_ik::{CcdSolver, FabrikSolver, IkChain, IkSolver, SolverSettings};
use std::hint::black_box;

fn create_test_chain() -> IkChain {
    let mut locals = vec![Transform::from_position(Vec3::X); 5];
    locals[0] = Transform::IDENTITY;
    IkChain::new(locals).unwrap()
}

fn bench_solvers(c: &mut Criterion) {
    let settings = SolverSettings::new(15, 1e-4);
    let target = Vec3::new(1.5, 2.0, 0.75);

    c.bench_function("ccd_solve", |b| {
        b.iter(|| {
            let mut solver = CcdSolver::from_chain(create_test_chain(), settings);
            black_box(solver.solve(black_box(target)))
        })
    });

    c.bench_function("fabrik_solve", |b| {
        b.iter(|| {
            let mut solver = FabrikSolver::from_chain(create_test_chain(), settings);
            black_box(solver.solve(black_box(target)))
        })
    });
}

criterion_group!(benches, bench_solvers);
criterion_main!(benches);
