use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scenario_scatter::prelude::*;
use scenario_scatter_examples::{demo_classes, demo_world, init_tracing, write_output};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut world = demo_world();
    let ids = demo_classes();
    let mut rng = StdRng::seed_from_u64(31);

    // A flat volume hovering over the wall, snapped onto the ground plate only.
    let ground = ActorMatcher::new(MatchBy::NameOrTags)
        .with_name_pattern("ground")
        .with_exact_name(true)
        .find(&world);
    let volume = BoxSampling::new(Vec3::new(0.0, 20.0, 8.0), Vec3::new(12.0, 8.0, 0.0))
        .with_density(0.05, 0.1);
    let raw = volume.generate(&mut rng);
    let mut targets = SurfaceSnap::new()
        .with_surfaces(ground.iter().copied())
        .apply(&world, &raw);
    info!(
        "{} of {} volume samples landed on the ground.",
        targets.len(),
        raw.len()
    );

    // Cones along the top of the wall.
    let wall = ActorMatcher::new(MatchBy::NameOrTags)
        .with_name_pattern("wall")
        .find(&world);
    let on_wall = SurfaceSampling::new(0.3, 0.3)
        .with_rotation(0.0, 0.0)
        .generate(&world, &wall, &mut rng);
    info!("{} samples on the wall top.", on_wall.len());
    targets.extend(on_wall);

    let request = PlacementRequest::new([ids.cone, ids.barrel])
        .with_seed(3)
        .with_remove_overlaps(true);
    let mut engine = PlacementEngine::default();
    let result = engine.place(&mut world, &targets, &request, &mut ())?;
    for (class, transforms) in result.iter() {
        info!("{class}: {} placed", transforms.len());
    }

    let config = SpawnedObjectsConfig::from(&result);
    write_output("placement-on-surfaces.json", &config.to_json_pretty()?)?;

    Ok(())
}
