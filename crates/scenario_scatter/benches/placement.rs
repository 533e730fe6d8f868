mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scenario_scatter::prelude::*;

fn random_targets(count_per_meter: f32, length: f32, seed: u64) -> Vec<Transform> {
    let path = Polyline::new([[-length * 0.5, 0.0, 0.0], [length * 0.5, 0.0, 0.0]]);
    let sampler = RandomAlongPathSampling::new(count_per_meter, count_per_meter)
        .with_rotation(0.0, 360.0);
    let mut rng = StdRng::seed_from_u64(seed);
    sampler.generate(&path, &mut rng)
}

fn placement_pass_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/pass");

    for &n in &[16usize, 64, 256] {
        let targets = random_targets(n as f32 / 200.0, 200.0, 0xC0FFEE);
        group.throughput(common::elements_throughput(targets.len()));

        for (label, remove_overlaps) in [("obstacles", true), ("dressing", false)] {
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter_batched(
                    || common::floor_world(4, 400.0),
                    |(mut world, classes)| {
                        let mut engine = PlacementEngine::default();
                        let request = PlacementRequest::new(classes)
                            .with_seed(7)
                            .with_remove_overlaps(remove_overlaps);
                        let result = engine.place(&mut world, &targets, &request, &mut ());
                        black_box(result.map(|r| r.total_placed()).unwrap_or_default());
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }

    group.finish();
}

fn penetration_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/penetration_test");
    let probe = OverlapProbe {
        object_type: CollisionChannel::WorldStatic,
        location: glam::Vec3::ZERO,
        closest_point: glam::Vec3::new(0.5, 0.2, 0.0),
        vertical_extent: 1.0,
    };
    group.bench_function("world_static", |b| {
        b.iter(|| black_box(is_penetrating_overlap(&probe, black_box(glam::Vec3::X))));
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = placement_pass_benches, penetration_benches
}
criterion_main!(benches);
