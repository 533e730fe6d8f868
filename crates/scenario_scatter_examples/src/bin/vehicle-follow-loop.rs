use glam::Vec3;
use scenario_scatter::prelude::*;
use scenario_scatter_examples::{demo_classes, demo_world, init_tracing, write_output};
use tracing::info;

// Simple bicycle model standing in for the vehicle dynamics.
const MAX_ACCEL: f32 = 4.0;
const MAX_DECEL: f32 = 8.0;
const MAX_WHEEL_ANGLE: f32 = 0.6;
const WHEELBASE: f32 = 2.7;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut world = demo_world();
    let ids = demo_classes();

    let config = PathSpawnConfig::new(
        ids.car,
        [
            [-40.0, -40.0, 0.0],
            [40.0, -40.0, 0.0],
            [40.0, 0.0, 0.0],
            [-40.0, 0.0, 0.0],
        ],
    )
    .with_closed_loop(true)
    .with_spacing(5.0)
    .with_speed_limit_kmh(30.0);

    let spawner = VehiclePathSpawner::new(config);
    let SpawnedVehicle {
        actor,
        mut follower,
    } = spawner.spawn(&mut world, FollowerConfig::default())?;

    let start = world
        .actor_transform(actor)
        .ok_or_else(|| anyhow::anyhow!("spawned vehicle vanished"))?;
    let mut location = start.location;
    let mut heading = start.rotation.yaw.to_radians();
    let mut speed = 0.0_f32;

    let dt = 1.0 / 30.0;
    for tick in 0..(90 * 30) {
        let forward = Vec3::new(heading.cos(), heading.sin(), 0.0);
        let out = follower.tick(&VehicleState::new(location, forward, speed), dt);

        speed = (speed + (out.throttle * MAX_ACCEL - out.brake * MAX_DECEL) * dt).max(0.0);
        heading += speed * (out.steering * MAX_WHEEL_ANGLE).tan() / WHEELBASE * dt;
        location += Vec3::new(heading.cos(), heading.sin(), 0.0) * speed * dt;
        world.teleport(actor, location);

        if tick % (10 * 30) == 0 {
            info!(
                "t = {:>4.1} s | at ({:>6.1}, {:>6.1}) | {:>4.1} m/s | steer {:>5.2} | {:?}",
                tick as f32 * dt,
                location.x,
                location.y,
                speed,
                out.steering,
                follower.state(),
            );
        }
    }

    write_output("vehicle-follow-loop.json", &spawner.to_config()?.to_json_pretty()?)?;

    Ok(())
}
