use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Quat, Vec3};
use ossa_anim::{Clip, Interpolation, Keyframe, Pose, Transform};
use std::hint::black_box;

const BONES: u32 = 64;
const FRAMES: usize = 240;

fn create_test_clip() -> Clip {
    let mut clip = Clip::new("bench");
    for bone in 0..BONES {
        let track = clip.track_for_bone_mut(bone);
        track.rotation.set_interpolation(Interpolation::Cubic);
        for frame in 0..FRAMES {
            let time = frame as f32 / 30.0;
            let angle = (time + bone as f32).sin();
            track
                .position
                .push(Keyframe::new(time, Vec3::new(angle, 1.0, 0.0)));
            track
                .rotation
                .push(Keyframe::new(time, Quat::from_rotation_y(angle)));
        }
    }
    clip.recalculate_duration();
    clip
}

fn create_test_pose() -> Pose {
    let locals = vec![Transform::from_position(Vec3::Y); BONES as usize];
    let parents = (0..BONES as i32).map(|bone| bone - 1).collect();
    Pose::from_parts(locals, parents).unwrap()
}

fn bench_clip_sample(c: &mut Criterion) {
    let clip = create_test_clip();
    let cached = clip.to_cached(60.0);
    let mut pose = create_test_pose();

    c.bench_function("sample_clip_search", |b| {
        let mut time = 0.0;
        b.iter(|| {
            time += 1.0 / 60.0;
            black_box(clip.sample(&mut pose, time));
        })
    });

    c.bench_function("sample_clip_cached", |b| {
        let mut time = 0.0;
        b.iter(|| {
            time += 1.0 / 60.0;
            black_box(cached.sample(&mut pose, time));
        })
    });
}

fn bench_palette(c: &mut Criterion) {
    let pose = create_test_pose();
    let mut matrices = Vec::new();
    let mut dual = Vec::new();

    c.bench_function("matrix_palette", |b| {
        b.iter(|| pose.matrix_palette(black_box(&mut matrices)))
    });

    c.bench_function("dual_quat_palette", |b| {
        b.iter(|| pose.dual_quat_palette(black_box(&mut dual)))
    });

    let mut reversed = pose.clone();
    for bone in 0..BONES as usize {
        reversed.set_parent(bone, None).unwrap();
    }
    for bone in 0..BONES as usize - 1 {
        reversed.set_parent(bone, Some(bone + 1)).unwrap();
    }
    c.bench_function("matrix_palette_unordered", |b| {
        b.iter(|| reversed.matrix_palette(black_box(&mut matrices)))
    });
}

criterion_group!(benches, bench_clip_sample, bench_palette);
criterion_main!(benches);
