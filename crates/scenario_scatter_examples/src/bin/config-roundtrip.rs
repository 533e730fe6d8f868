use scenario_scatter::prelude::*;
use scenario_scatter_examples::{demo_classes, demo_world, init_tracing};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut world = demo_world();
    let ids = demo_classes();

    // Fixed targets along a line; nothing stays in the scene afterwards.
    let path = Polyline::new([[-30.0, -20.0, 0.0], [30.0, -20.0, 0.0]]);
    let targets = FixedSpacingSampling::new(2.5).sample(&path);
    let request = PlacementRequest::new([ids.cone, ids.barrel]).with_seed(11);
    let result = PlacementEngine::default().generate_configuration(
        &mut world,
        &targets,
        &request,
        &mut (),
    )?;
    info!(
        "Generated {} placements; scene holds {} actors.",
        result.total_placed(),
        world.len()
    );

    let exported = SpawnedObjectsConfig::from(&result).to_json_string()?;
    let imported = SpawnedObjectsConfig::from_json_str(&exported)?;
    info!(
        "Re-imported {} transforms, clean: {}.",
        imported.value.total_transforms(),
        imported.is_clean()
    );

    // A hand-edited file with one broken location still loads.
    let edited = r#"[{"classIdentity": "/Game/Props/Barrel",
                      "transforms": [{"location": [1, 2], "rotation": [0, 90, 0]},
                                     {"location": [4, 5, 0], "rotation": [0, 0, 0]}]}]"#;
    let imported = SpawnedObjectsConfig::from_json_str(edited)?;
    for issue in &imported.issues {
        warn!("{issue}");
    }
    info!(
        "Edited file gave {} transforms with {} issue(s).",
        imported.value.total_transforms(),
        imported.issues.len()
    );

    Ok(())
}
