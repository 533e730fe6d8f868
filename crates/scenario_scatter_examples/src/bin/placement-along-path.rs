use rand::rngs::StdRng;
use rand::SeedableRng;
use scenario_scatter::prelude::*;
use scenario_scatter_examples::{demo_classes, demo_world, init_tracing, write_output};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut world = demo_world();
    let ids = demo_classes();

    // A road edge that runs into the wall at x = 0.
    let path = Polyline::new([[-60.0, 10.0, 0.0], [0.0, 12.0, 0.0], [60.0, 30.0, 0.0]]);
    let sampler = RandomAlongPathSampling::new(0.4, 0.6)
        .with_rotation(-15.0, 15.0)
        .with_follow_path_rotation(true);
    let mut rng = StdRng::seed_from_u64(2025);
    let targets = sampler.generate(&path, &mut rng);

    let request = PlacementRequest::new([ids.cone, ids.barrel, ids.barrier])
        .with_seed(7)
        .with_remove_overlaps(true);

    let mut sink = VecSink::only(&[PlacementEventKind::TargetSkipped]);
    let mut engine = PlacementEngine::default();
    let result = engine.place(&mut world, &targets, &request, &mut sink)?;

    for (class, transforms) in result.iter() {
        info!("{class}: {} placed", transforms.len());
    }
    info!(
        "{} of {} targets skipped; scene now holds {} actors.",
        sink.len(),
        targets.len(),
        world.len()
    );

    let config = SpawnedObjectsConfig::from(&result);
    write_output("placement-along-path.json", &config.to_json_pretty()?)?;

    Ok(())
}
