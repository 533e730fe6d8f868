#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::Vec3;
use scenario_scatter::prelude::*;

pub const SAMPLE_SIZE: usize = 30;
pub const WARM_UP: Duration = Duration::from_millis(500);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Flat floor whose top face sits at z = 0, plus `class_count` one-meter cube classes.
pub fn floor_world(class_count: usize, floor_extent: f32) -> (SceneWorld, Vec<ClassId>) {
    let mut registry = ClassRegistry::new();
    let mut ids = Vec::with_capacity(class_count);
    for i in 0..class_count {
        let id = format!("/Bench/Prop{i}");
        registry.register(
            ObjectClass::new(id.clone())
                .with_geometry(GeometryComponent::box_on_ground("body", Vec3::ONE)),
        );
        ids.push(id);
    }

    let mut world = SceneWorld::with_classes(registry);
    world.add_actor(
        "floor",
        Transform::at([0.0, 0.0, -0.1]),
        vec![GeometryComponent::box_on_ground(
            "floor",
            Vec3::new(floor_extent, floor_extent, 0.1),
        )
        .with_collision(CollisionSettings::world_static())],
    );
    (world, ids)
}
