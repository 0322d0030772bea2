use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use foliage_lod::*;
use foliage_view::{Camera, OrientedBox};
use glam::{Quat, Vec3};

fn grid_scene(side: usize, spacing: f32) -> Scene {
    let leaves = Arc::new(Geometry {
        name: "leaves".to_string(),
        vertex_count: 4,
        index_count: 6,
        material: Material::default(),
        instances: vec![InstanceTransform::new(Vec3::ZERO, Quat::IDENTITY); 2000],
    });
    let model = Model::new(
        "tree",
        OrientedBox::axis_aligned(Vec3::new(0.0, 4.0, 0.0), Vec3::new(3.0, 4.0, 3.0)),
    )
    .with_foliage(leaves.clone(), LodParams::new(30.0, 0.4).unwrap())
    .with_foliage(leaves, LodParams::new(60.0, 0.6).unwrap());

    let mut builder = Scene::builder();
    let tree = builder.add_model(model).unwrap();
    let half = side as f32 * spacing * 0.5;
    for row in 0..side {
        for col in 0..side {
            let position = Vec3::new(col as f32 * spacing - half, 0.0, -(row as f32) * spacing);
            builder.place(tree, position, Quat::IDENTITY).unwrap();
        }
    }
    builder.build()
}

fn bench_compute_visibility(c: &mut Criterion) {
    let mut scene = grid_scene(32, 10.0);
    let frustum = Camera::look_to(Vec3::new(0.0, 2.0, 10.0), Vec3::NEG_Z, Vec3::Y).frustum();
    c.bench_function("compute_visibility_1024", |bencher| {
        bencher.iter(|| black_box(compute_visibility(&frustum, scene.hosts_mut())))
    });
}

fn bench_compute_lods(c: &mut Criterion) {
    let mut scene = grid_scene(32, 10.0);
    let camera = Camera::look_to(Vec3::new(0.0, 2.0, 10.0), Vec3::NEG_Z, Vec3::Y);
    compute_visibility(&camera.frustum(), scene.hosts_mut());
    let view = ViewParams::from_camera(&camera);
    let budget = scene.instance_budget();
    c.bench_function("compute_lods_1024", |bencher| {
        bencher.iter(|| black_box(compute_lods(&view, budget, scene.hosts_mut())))
    });
}

fn bench_run_frame(c: &mut Criterion) {
    let mut scene = grid_scene(32, 10.0);
    let camera = Camera::look_to(Vec3::new(0.0, 2.0, 10.0), Vec3::NEG_Z, Vec3::Y);
    let frustum = camera.frustum();
    let view = ViewParams::from_camera(&camera);
    c.bench_function("run_frame_1024", |bencher| {
        bencher.iter(|| black_box(scene.run_frame(&frustum, &view).stats))
    });
}

criterion_group!(
    benches,
    bench_compute_visibility,
    bench_compute_lods,
    bench_run_frame
);
criterion_main!(benches);
