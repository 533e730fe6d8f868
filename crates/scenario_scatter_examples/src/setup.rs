use std::fs;
use std::path::Path;

use glam::Vec3;
use scenario_scatter::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber; `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Class identities registered by [`demo_world`].
pub struct DemoClasses {
    pub cone: ClassId,
    pub barrel: ClassId,
    pub barrier: ClassId,
    pub car: ClassId,
}

pub fn demo_classes() -> DemoClasses {
    DemoClasses {
        cone: "/Game/Props/TrafficCone".into(),
        barrel: "/Game/Props/Barrel".into(),
        barrier: "/Game/Props/Barrier".into(),
        car: "/Game/Vehicles/Sedan".into(),
    }
}

/// A 200 m square ground plate with a wall across it and the demo classes registered.
pub fn demo_world() -> SceneWorld {
    let ids = demo_classes();
    let mut registry = ClassRegistry::new();

    registry.register(
        ObjectClass::new(ids.cone)
            .with_geometry(GeometryComponent::box_on_ground("cone", Vec3::new(0.4, 0.4, 0.7))),
    );
    registry.register(
        ObjectClass::new(ids.barrel)
            .with_geometry(GeometryComponent::box_on_ground("barrel", Vec3::new(0.6, 0.6, 0.9))),
    );

    // Barrier: a rail on two posts declared through the construction tree.
    let mut barrier = ObjectClass::new(ids.barrier)
        .with_native(ComponentTemplate::Auxiliary {
            name: "root".into(),
        });
    let rail = barrier.add_construction_node(
        None,
        ComponentTemplate::Geometry(
            GeometryComponent::box_on_ground("rail", Vec3::new(2.0, 0.2, 0.3))
                .with_relative_location(Vec3::new(0.0, 0.0, 0.6)),
        ),
    );
    for x in [-0.9, 0.9] {
        barrier.add_construction_node(
            Some(rail),
            ComponentTemplate::Geometry(
                GeometryComponent::box_on_ground("post", Vec3::new(0.2, 0.2, 0.6))
                    .with_relative_location(Vec3::new(x, 0.0, 0.0)),
            ),
        );
    }
    registry.register(barrier);

    registry.register(
        ObjectClass::new(ids.car)
            .with_geometry(GeometryComponent::box_on_ground("body", Vec3::new(4.5, 1.8, 1.5))),
    );

    let mut world = SceneWorld::with_classes(registry);
    world.add_actor(
        "ground",
        Transform::at([0.0, 0.0, -0.5]),
        vec![GeometryComponent::box_on_ground("ground", Vec3::new(200.0, 200.0, 0.5))
            .with_collision(CollisionSettings::world_static())],
    );
    world.add_actor(
        "wall",
        Transform::at([0.0, 20.0, 0.0]),
        vec![GeometryComponent::box_on_ground("wall", Vec3::new(0.5, 30.0, 3.0))
            .with_collision(CollisionSettings::world_static())],
    );
    world
}

/// Writes `contents` to `path` and logs where it went.
pub fn write_output(path: impl AsRef<Path>, contents: &str) -> anyhow::Result<()> {
    let path = path.as_ref();
    fs::write(path, contents)?;
    info!("Wrote {} ({} bytes).", path.display(), contents.len());
    Ok(())
}
