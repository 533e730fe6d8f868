//! The placement engine: scatters candidate classes over target transforms and keeps the
//! instances that do not interpenetrate anything.
use std::collections::BTreeMap;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::collision::CollisionSnapshot;
use crate::error::Result;
use crate::geometry::Transform;
use crate::placement::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::placement::penetration::{is_penetrating_overlap, OverlapProbe};
use crate::placement::request::{PlacementConfig, PlacementRequest};
use crate::placement::scope::PlacementScope;
use crate::placement::selection::{dedup_classes, pick_class};
use crate::placement::SkipReason;
use crate::scene::{
    ActorId, ClassId, ComponentHandle, Mobility, Scene, SpawnCollisionHandling,
};

/// Accepted transforms per class, in the order they were placed.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementResult {
    pub placements: BTreeMap<ClassId, Vec<Transform>>,
    /// Target transforms processed.
    pub targets_evaluated: usize,
    /// Targets that ended without an instance.
    pub targets_rejected: usize,
}

impl PlacementResult {
    pub fn transforms(&self, class: &str) -> &[Transform] {
        self.placements.get(class).map_or(&[], Vec::as_slice)
    }

    pub fn total_placed(&self) -> usize {
        self.placements.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassId, &[Transform])> {
        self.placements.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.total_placed() == 0
    }

    fn push(&mut self, class: &str, transform: Transform) {
        self.placements
            .entry(class.to_owned())
            .or_default()
            .push(transform);
    }
}

/// Handles of instances the engine created. Other code may destroy them too, so each
/// handle is checked for liveness before it is destroyed.
#[derive(Debug, Clone, Default)]
pub struct SpawnedInstanceRegistry {
    instances: Vec<ActorId>,
}

impl SpawnedInstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, actor: ActorId) {
        self.instances.push(actor);
    }

    pub fn as_slice(&self) -> &[ActorId] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Destroys every live instance and empties the registry. Returns how many were
    /// destroyed.
    pub fn clear<S: Scene + ?Sized>(&mut self, scene: &mut S) -> usize {
        let mut destroyed = 0;
        for actor in self.instances.drain(..) {
            if scene.is_alive(actor) && scene.destroy(actor) {
                destroyed += 1;
            }
        }
        destroyed
    }
}

enum TargetOutcome {
    Placed { actor: ActorId, transform: Transform },
    Skipped(SkipReason),
}

/// Runs placement passes against a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
    spawned: SpawnedInstanceRegistry,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        debug_assert!(
            config.drop_clearance.is_finite() && config.drop_clearance >= 0.0,
            "drop_clearance must be finite and >= 0"
        );
        Self {
            config,
            spawned: SpawnedInstanceRegistry::new(),
        }
    }

    pub fn try_new(config: PlacementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Instances created by earlier passes.
    pub fn spawned(&self) -> &SpawnedInstanceRegistry {
        &self.spawned
    }

    /// Destroys every instance this engine created that is still alive.
    pub fn destroy_spawned<S: Scene + ?Sized>(&mut self, scene: &mut S) -> usize {
        let destroyed = self.spawned.clear(scene);
        if destroyed > 0 {
            debug!("destroyed {destroyed} previously spawned instances");
        }
        destroyed
    }

    /// Runs one placement pass, replacing the instances of any previous pass.
    ///
    /// The request is validated before the scene is touched. Targets that cannot hold an
    /// instance are skipped; the result is simply shorter. An error is returned only for
    /// invalid requests and when class collision defaults could not be restored.
    pub fn place<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        targets: &[Transform],
        request: &PlacementRequest,
        sink: &mut dyn EventSink,
    ) -> Result<PlacementResult> {
        request.validate(scene.classes())?;
        self.destroy_spawned(scene);

        let (classes, duplicates) = dedup_classes(&request.classes);
        if sink.wants(PlacementEventKind::PassStarted) {
            sink.send(PlacementEvent::PassStarted {
                classes: classes.clone(),
                target_count: targets.len(),
                seed: request.seed,
            });
        }
        for class in duplicates {
            warn!("Class '{class}' is listed more than once; duplicates are ignored.");
            if sink.wants(PlacementEventKind::DuplicateClass) {
                sink.send(PlacementEvent::DuplicateClass { class });
            }
        }

        info!(
            "Placement pass | targets: {} | classes: {} | seed: {} | physics: {} | remove overlaps: {}.",
            targets.len(),
            classes.len(),
            request.seed,
            request.add_physics,
            request.remove_overlaps,
        );

        let mut rng = StdRng::seed_from_u64(request.seed);
        let mut result = PlacementResult::default();
        let mut scope = PlacementScope::begin(scene, &classes, request.remove_overlaps);

        for (target_index, target) in targets.iter().enumerate() {
            let Some(class) = pick_class(&classes, &mut rng) else {
                break;
            };
            result.targets_evaluated += 1;
            if sink.wants(PlacementEventKind::ClassChosen) {
                sink.send(PlacementEvent::ClassChosen {
                    target_index,
                    class: class.clone(),
                });
            }

            let (scene, profiles) = scope.split();
            match self.place_one(scene, profiles, class, target, request) {
                TargetOutcome::Placed { actor, transform } => {
                    self.spawned.push(actor);
                    result.push(class, transform);
                    if sink.wants(PlacementEventKind::InstancePlaced) {
                        sink.send(PlacementEvent::InstancePlaced {
                            target_index,
                            class: class.clone(),
                            actor,
                            transform,
                        });
                    }
                }
                TargetOutcome::Skipped(reason) => {
                    result.targets_rejected += 1;
                    debug!(
                        "Target {target_index} ({:?}) skipped for '{class}': {reason:?}.",
                        target.location
                    );
                    if sink.wants(PlacementEventKind::TargetSkipped) {
                        sink.send(PlacementEvent::TargetSkipped {
                            target_index,
                            class: class.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        if let Err(err) = scope.finish() {
            error!("Collision defaults could not be restored after placement: {err}");
            if sink.wants(PlacementEventKind::Warning) {
                sink.send(PlacementEvent::Warning {
                    context: "restore".into(),
                    message: err.to_string(),
                });
            }
            return Err(err);
        }

        info!(
            "Placement pass finished | placed: {} | rejected: {}.",
            result.total_placed(),
            result.targets_rejected,
        );
        if sink.wants(PlacementEventKind::PassFinished) {
            sink.send(PlacementEvent::PassFinished {
                placed: result.total_placed(),
                rejected: result.targets_rejected,
            });
        }

        Ok(result)
    }

    /// Runs a pass to compute placements, then removes the instances it created.
    pub fn generate_configuration<S: Scene + ?Sized>(
        &mut self,
        scene: &mut S,
        targets: &[Transform],
        request: &PlacementRequest,
        sink: &mut dyn EventSink,
    ) -> Result<PlacementResult> {
        let result = self.place(scene, targets, request, sink);
        self.destroy_spawned(scene);
        result
    }

    fn place_one<S: Scene + ?Sized>(
        &self,
        scene: &mut S,
        profiles: &CollisionSnapshot,
        class: &str,
        target: &Transform,
        request: &PlacementRequest,
    ) -> TargetOutcome {
        let handling = SpawnCollisionHandling::DontSpawnIfColliding;
        let mut spawned = scene.spawn(class, target, handling);
        if spawned.is_none() && request.add_physics {
            let raised =
                target.with_location(target.location + Vec3::Z * self.config.drop_clearance);
            spawned = scene.spawn(class, &raised, handling);
        }
        let Some(actor) = spawned else {
            return TargetOutcome::Skipped(SkipReason::Blocked);
        };

        if request.add_physics {
            if let Some(primary) = scene.components_mut(actor).and_then(|c| c.first_mut()) {
                primary.mobility = Mobility::Movable;
            }
            let at_target = scene
                .actor_transform(actor)
                .is_some_and(|t| t.location == target.location);
            if !at_target {
                scene.teleport(actor, target.location);
            }
        }

        let location = scene
            .actor_transform(actor)
            .map_or(target.location, |t| t.location);
        let penetrating = scene.overlapping_components(actor).into_iter().any(|handle| {
            OverlapProbe::from_scene(&*scene, handle, location)
                .is_some_and(|probe| is_penetrating_overlap(&probe, location))
        });
        if penetrating {
            scene.destroy(actor);
            return TargetOutcome::Skipped(SkipReason::Penetrating);
        }

        if let (Some(defaults), Some(components)) =
            (profiles.get(class), scene.components_mut(actor))
        {
            if defaults.len() != components.len() {
                warn!(
                    "Instance of '{class}' has {} components but {} defaults were stored.",
                    components.len(),
                    defaults.len()
                );
            }
            for (profile, component) in defaults.iter().zip(components.iter_mut()) {
                profile.apply_to_survivor(&mut component.collision);
            }
            if request.add_physics {
                if let Some(primary) = components.first_mut() {
                    if !primary.simulate_physics {
                        primary.simulate_physics = true;
                    }
                }
            }
        }

        let transform = request
            .add_physics
            .then(|| scene.component_transform(ComponentHandle::new(actor, 0)))
            .flatten()
            .or_else(|| scene.actor_transform(actor))
            .unwrap_or(*target);

        TargetOutcome::Placed { actor, transform }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionChannel, CollisionResponse, CollisionSettings};
    use crate::placement::events::VecSink;
    use crate::scene::{ClassRegistry, GeometryComponent, ObjectClass, SceneWorld};

    fn cube(id: &str) -> ObjectClass {
        ObjectClass::new(id).with_geometry(GeometryComponent::box_on_ground("body", Vec3::ONE))
    }

    fn world() -> SceneWorld {
        SceneWorld::with_classes(
            ClassRegistry::new()
                .with_class(cube("/Game/Cone"))
                .with_class(cube("/Game/Barrel")),
        )
    }

    fn row(n: usize, spacing: f32) -> Vec<Transform> {
        (0..n)
            .map(|i| Transform::at([i as f32 * spacing, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn spaced_targets_are_all_placed() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]).with_seed(1);

        let result = engine
            .place(&mut world, &row(5, 3.0), &request, &mut ())
            .unwrap();
        assert_eq!(result.transforms("/Game/Cone").len(), 5);
        assert_eq!(result.targets_rejected, 0);
        assert_eq!(engine.spawned().len(), 5);
        assert_eq!(
            result.transforms("/Game/Cone")[2].location,
            Vec3::new(6.0, 0.0, 0.0)
        );
    }

    #[test]
    fn crowded_obstacles_are_rejected() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]);

        let result = engine
            .place(&mut world, &row(4, 0.5), &request, &mut ())
            .unwrap();
        // 1 m cubes: 0.5 penetrates the first, 1.0 touches a spawned obstacle.
        assert_eq!(result.total_placed(), 2);
        assert_eq!(result.targets_rejected, 2);
        assert_eq!(result.targets_evaluated, 4);
    }

    #[test]
    fn overlap_mode_keeps_crowded_dressing() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]).with_remove_overlaps(false);

        let result = engine
            .place(&mut world, &row(4, 0.5), &request, &mut ())
            .unwrap();
        assert_eq!(result.total_placed(), 4);
    }

    #[test]
    fn survivors_keep_spawned_tag_and_class_defaults_return() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]);
        engine
            .place(&mut world, &row(1, 1.0), &request, &mut ())
            .unwrap();

        let actor = engine.spawned().as_slice()[0];
        let collision = &world.components(actor).unwrap()[0].collision;
        assert_eq!(collision.object_type, CollisionChannel::SpawnedObstacle);
        assert_eq!(
            collision.response_to(CollisionChannel::WorldStatic),
            CollisionResponse::Block
        );

        let class_default = &world.classes().get("/Game/Cone").unwrap().geometry_components()[0]
            .collision;
        assert_eq!(*class_default, CollisionSettings::default());
    }

    #[test]
    fn regeneration_replaces_previous_instances() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]);
        engine.place(&mut world, &row(3, 2.0), &request, &mut ()).unwrap();
        engine.place(&mut world, &row(3, 2.0), &request, &mut ()).unwrap();
        assert_eq!(world.instances_of("/Game/Cone").len(), 3);
    }

    #[test]
    fn externally_destroyed_instances_are_skipped_on_cleanup() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]);
        engine.place(&mut world, &row(3, 2.0), &request, &mut ()).unwrap();

        let first = engine.spawned().as_slice()[0];
        world.destroy(first);
        assert_eq!(engine.destroy_spawned(&mut world), 2);
        assert!(engine.spawned().is_empty());
        assert!(world.is_empty());
    }

    #[test]
    fn generate_configuration_leaves_scene_empty() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone", "/Game/Barrel"]).with_seed(3);
        let result = engine
            .generate_configuration(&mut world, &row(6, 2.0), &request, &mut ())
            .unwrap();
        assert_eq!(result.total_placed(), 6);
        assert!(world.is_empty());
    }

    #[test]
    fn invalid_request_touches_nothing() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let mut sink = VecSink::new();
        let err = engine.place(
            &mut world,
            &row(2, 2.0),
            &PlacementRequest::new(["/Game/Missing"]),
            &mut sink,
        );
        assert!(err.is_err());
        assert!(sink.is_empty());
        assert!(world.is_empty());
    }

    #[test]
    fn duplicates_are_reported_once_each() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let mut sink = VecSink::only(&[PlacementEventKind::DuplicateClass]);
        let request = PlacementRequest::new(["/Game/Cone", "/Game/Cone", "/Game/Barrel"]);
        engine
            .place(&mut world, &row(2, 2.0), &request, &mut sink)
            .unwrap();
        assert_eq!(
            sink.as_slice(),
            &[PlacementEvent::DuplicateClass {
                class: "/Game/Cone".into()
            }]
        );
    }

    fn skip_reasons(sink: &VecSink) -> Vec<SkipReason> {
        sink.as_slice()
            .iter()
            .filter_map(|e| match e {
                PlacementEvent::TargetSkipped { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn same_seed_repeats_class_choices() {
        let request = PlacementRequest::new(["/Game/Cone", "/Game/Barrel"]).with_seed(42);
        let targets = row(32, 2.0);

        let mut runs = Vec::new();
        for _ in 0..2 {
            let mut world = world();
            let mut engine = PlacementEngine::default();
            let mut sink = VecSink::only(&[PlacementEventKind::ClassChosen]);
            engine.place(&mut world, &targets, &request, &mut sink).unwrap();
            runs.push(sink.chosen_classes());
        }
        assert_eq!(runs[0].len(), 32);
        assert_eq!(runs[0], runs[1]);
        assert!(runs[0].iter().any(|c| c == "/Game/Cone"));
        assert!(runs[0].iter().any(|c| c == "/Game/Barrel"));
    }

    #[test]
    fn blocked_target_without_physics_is_skipped_as_blocked() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let mut sink = VecSink::only(&[PlacementEventKind::TargetSkipped]);
        let request = PlacementRequest::new(["/Game/Cone"]);
        let targets = [Transform::at([0.0, 0.0, 0.0]), Transform::at([0.5, 0.0, 0.0])];

        let result = engine.place(&mut world, &targets, &request, &mut sink).unwrap();
        assert_eq!(result.total_placed(), 1);
        assert_eq!(skip_reasons(&sink), vec![SkipReason::Blocked]);
    }

    #[test]
    fn raised_retry_is_teleported_back_and_vetoed() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let mut sink = VecSink::only(&[PlacementEventKind::TargetSkipped]);
        let request = PlacementRequest::new(["/Game/Cone"]).with_physics(true);
        let targets = [Transform::at([0.0, 0.0, 0.0]), Transform::at([0.5, 0.0, 0.0])];

        let result = engine.place(&mut world, &targets, &request, &mut sink).unwrap();
        assert_eq!(result.total_placed(), 1);
        assert_eq!(skip_reasons(&sink), vec![SkipReason::Penetrating]);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn physics_survivor_is_movable_and_simulating() {
        let mut world = world();
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]).with_physics(true);
        let result = engine
            .place(&mut world, &row(2, 3.0), &request, &mut ())
            .unwrap();

        assert_eq!(result.total_placed(), 2);
        for actor in engine.spawned().as_slice() {
            let primary = &world.components(*actor).unwrap()[0];
            assert_eq!(primary.mobility, Mobility::Movable);
            assert!(primary.simulate_physics);
        }
        assert_eq!(
            result.transforms("/Game/Cone")[1].location,
            Vec3::new(3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn static_wall_vetoes_neighbours_and_keeps_its_overlap_flag() {
        let mut world = world();
        let wall = world.add_actor(
            "wall",
            Transform::at([5.0, 0.0, 0.0]),
            vec![GeometryComponent::box_on_ground("wall", Vec3::new(1.0, 10.0, 3.0))
                .with_collision(CollisionSettings::world_static())],
        );
        let mut engine = PlacementEngine::default();
        let mut sink = VecSink::only(&[PlacementEventKind::TargetSkipped]);
        let request = PlacementRequest::new(["/Game/Cone"]);
        let targets = [Transform::at([5.8, 0.0, 0.0]), Transform::at([9.0, 0.0, 0.0])];

        let result = engine.place(&mut world, &targets, &request, &mut sink).unwrap();
        assert_eq!(result.total_placed(), 1);
        assert_eq!(skip_reasons(&sink), vec![SkipReason::Penetrating]);
        assert!(!world.components(wall).unwrap()[0].collision.generate_overlap_events);
    }

    #[test]
    fn resting_on_a_floor_is_not_penetration() {
        let mut world = world();
        world.add_actor(
            "floor",
            Transform::at([0.0, 0.0, -0.1]),
            vec![GeometryComponent::box_on_ground("floor", Vec3::new(50.0, 50.0, 0.1))
                .with_collision(CollisionSettings::world_static())],
        );
        let mut engine = PlacementEngine::default();
        let request = PlacementRequest::new(["/Game/Cone"]);
        let result = engine
            .place(&mut world, &row(4, 3.0), &request, &mut ())
            .unwrap();
        assert_eq!(result.total_placed(), 4);
    }
}
