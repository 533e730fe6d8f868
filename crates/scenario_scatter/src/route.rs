//! Vehicle routes built from a path: waypoint sampling, config export and follower setup.
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::VehiclePathConfig;
use crate::control::{FollowerConfig, PathFollower};
use crate::error::{Error, Result};
use crate::geometry::{kmh_to_mps, Transform};
use crate::sampling::{FixedSpacingSampling, Polyline};
use crate::scene::{ActorId, ClassId, Scene, SpawnCollisionHandling};

/// Settings of a vehicle path spawner.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PathSpawnConfig {
    pub vehicle_class: ClassId,
    /// Control points of the path.
    pub points: Vec<Vec3>,
    pub closed_loop: bool,
    /// Distance between waypoints in meters.
    pub spacing: f32,
    /// Speed limit in km/h.
    pub speed_limit_kmh: f32,
}

impl Default for PathSpawnConfig {
    fn default() -> Self {
        Self {
            vehicle_class: ClassId::new(),
            points: Vec::new(),
            closed_loop: false,
            spacing: 10.0,
            speed_limit_kmh: 30.0,
        }
    }
}

impl PathSpawnConfig {
    pub fn new<I, P>(vehicle_class: impl Into<ClassId>, points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<mint::Vector3<f32>>,
    {
        Self {
            vehicle_class: vehicle_class.into(),
            points: points.into_iter().map(|p| Vec3::from(p.into())).collect(),
            ..Default::default()
        }
    }

    pub fn with_closed_loop(mut self, closed_loop: bool) -> Self {
        self.closed_loop = closed_loop;
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_speed_limit_kmh(mut self, speed_limit_kmh: f32) -> Self {
        self.speed_limit_kmh = speed_limit_kmh;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vehicle_class.is_empty() {
            return Err(Error::InvalidConfig("a vehicle class must be set".into()));
        }
        FixedSpacingSampling::new(self.spacing).validate()?;
        if !self.speed_limit_kmh.is_finite() || self.speed_limit_kmh < 0.0 {
            return Err(Error::InvalidConfig(
                "speed_limit_kmh must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// A vehicle spawned on its route together with the follower driving it.
#[derive(Debug, Clone)]
pub struct SpawnedVehicle {
    pub actor: ActorId,
    pub follower: PathFollower,
}

/// Turns a path into a drivable vehicle route.
#[derive(Debug, Clone)]
pub struct VehiclePathSpawner {
    config: PathSpawnConfig,
    path: Polyline,
}

impl VehiclePathSpawner {
    pub fn new(config: PathSpawnConfig) -> Self {
        let path = Self::build_path(&config);
        Self { config, path }
    }

    fn build_path(config: &PathSpawnConfig) -> Polyline {
        let path = Polyline::new(config.points.iter().copied());
        if config.closed_loop {
            path.closed()
        } else {
            path
        }
    }

    /// Replaces the settings and rebuilds the path.
    pub fn configure(&mut self, config: PathSpawnConfig) {
        self.path = Self::build_path(&config);
        self.config = config;
    }

    pub fn configuration(&self) -> &PathSpawnConfig {
        &self.config
    }

    pub fn path(&self) -> &Polyline {
        &self.path
    }

    /// Speed limit in m/s.
    pub fn speed_limit(&self) -> f32 {
        kmh_to_mps(self.config.speed_limit_kmh)
    }

    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        let length = self.path.length();
        if self.config.spacing > length {
            return Err(Error::InvalidConfig(format!(
                "waypoint spacing {} must be smaller than the path length {length}",
                self.config.spacing
            )));
        }
        Ok(())
    }

    /// Waypoints at fixed spacing along the path.
    pub fn waypoints(&self) -> Result<Vec<Transform>> {
        self.validate()?;
        Ok(FixedSpacingSampling::new(self.config.spacing).sample(&self.path))
    }

    /// Route record for export.
    pub fn to_config(&self) -> Result<VehiclePathConfig> {
        let waypoints = self.waypoints()?;
        Ok(VehiclePathConfig {
            vehicle_class: self.config.vehicle_class.clone(),
            speed_limit: self.speed_limit(),
            waypoints: waypoints.iter().map(|t| t.location.to_array()).collect(),
        })
    }

    /// A follower loaded with this route, looped when the path is closed, attached at
    /// the first waypoint.
    pub fn build_follower(&self, follower_config: FollowerConfig) -> Result<PathFollower> {
        let waypoints = self.waypoints()?;
        let mut follower = PathFollower::try_new(follower_config)?;
        follower.set_route_from_transforms(&waypoints);
        follower.set_speed_limit(self.speed_limit());
        follower.set_looped(self.path.is_closed());
        if let Some(first) = waypoints.first() {
            follower.attach(first.location);
        }
        Ok(follower)
    }

    /// Spawns the vehicle at the first waypoint regardless of collisions and returns it
    /// with a follower attached at its actual location.
    pub fn spawn<S: Scene + ?Sized>(
        &self,
        scene: &mut S,
        follower_config: FollowerConfig,
    ) -> Result<SpawnedVehicle> {
        let mut follower = self.build_follower(follower_config)?;
        let start = self
            .waypoints()?
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidConfig("path has no waypoints".into()))?;

        let class = &self.config.vehicle_class;
        let actor = scene
            .spawn(class, &start, SpawnCollisionHandling::AlwaysSpawn)
            .ok_or_else(|| Error::UnknownClass { id: class.clone() })?;
        if let Some(t) = scene.actor_transform(actor) {
            follower.attach(t.location);
        }

        info!(
            "Spawned '{class}' with {} waypoints at {:.1} m/s{}.",
            follower.route().len(),
            follower.speed_limit(),
            if follower.is_looped() { " (looped)" } else { "" },
        );
        Ok(SpawnedVehicle { actor, follower })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::FollowerState;
    use crate::scene::{ClassRegistry, GeometryComponent, ObjectClass, SceneWorld};

    fn square_config() -> PathSpawnConfig {
        PathSpawnConfig::new(
            "/Game/Sedan",
            [
                [0.0, 0.0, 0.0],
                [40.0, 0.0, 0.0],
                [40.0, 40.0, 0.0],
                [0.0, 40.0, 0.0],
            ],
        )
        .with_spacing(10.0)
        .with_speed_limit_kmh(36.0)
    }

    #[test]
    fn validation_rejects_missing_class_and_long_spacing() {
        let no_class = VehiclePathSpawner::new(PathSpawnConfig {
            vehicle_class: String::new(),
            ..square_config()
        });
        assert!(no_class.validate().is_err());

        let too_far = VehiclePathSpawner::new(square_config().with_spacing(500.0));
        assert!(matches!(too_far.waypoints(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn config_converts_speed_to_meters_per_second() {
        let spawner = VehiclePathSpawner::new(square_config());
        let config = spawner.to_config().unwrap();
        assert_eq!(config.vehicle_class, "/Game/Sedan");
        assert!((config.speed_limit - 10.0).abs() < 1e-5);
        assert_eq!(config.waypoints.len(), 13);
        assert_eq!(config.waypoints[4], [40.0, 0.0, 0.0]);
    }

    #[test]
    fn closed_path_gives_looped_follower() {
        let spawner = VehiclePathSpawner::new(square_config().with_closed_loop(true));
        let follower = spawner.build_follower(FollowerConfig::default()).unwrap();
        assert!(follower.is_looped());
        assert_eq!(follower.route().len(), 17);
        assert!((follower.waypoint_threshold() - 2.5).abs() < 1e-5);
        assert_eq!(follower.last_passed(), Vec3::ZERO);
        assert_eq!(follower.state(), FollowerState::Tracking);
    }

    #[test]
    fn spawn_places_vehicle_at_first_waypoint() {
        let mut world = SceneWorld::with_classes(ClassRegistry::new().with_class(
            ObjectClass::new("/Game/Sedan").with_geometry(GeometryComponent::box_on_ground(
                "body",
                Vec3::new(4.5, 1.8, 1.4),
            )),
        ));
        let spawner = VehiclePathSpawner::new(square_config());
        let spawned = spawner.spawn(&mut world, FollowerConfig::default()).unwrap();
        assert_eq!(
            world.actor_transform(spawned.actor).unwrap().location,
            Vec3::ZERO
        );

        let mut missing = square_config();
        missing.vehicle_class = "/Game/Truck".into();
        let err = VehiclePathSpawner::new(missing)
            .spawn(&mut world, FollowerConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownClass { .. }));
    }

    #[test]
    fn configure_rebuilds_the_path() {
        let mut spawner = VehiclePathSpawner::new(square_config());
        assert_eq!(spawner.path().length(), 120.0);
        spawner.configure(square_config().with_closed_loop(true));
        assert_eq!(spawner.path().length(), 160.0);
        assert!(spawner.configuration().closed_loop);
    }
}
