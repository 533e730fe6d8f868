use std::collections::BTreeMap;

use glam::Vec3;
use tracing::debug;

use crate::collision::{CollisionResponse, CollisionSettings};
use crate::geometry::{Aabb, Transform};
use crate::scene::{
    ActorId, ClassId, ClassRegistry, ComponentHandle, GeometryComponent, Scene,
    SpawnCollisionHandling,
};

/// Depth below which two boxes are treated as merely touching when checking spawns.
pub const BLOCKING_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone)]
struct Actor {
    class: Option<ClassId>,
    label: String,
    tags: Vec<String>,
    transform: Transform,
    components: Vec<GeometryComponent>,
}

/// In-memory scene with axis-aligned box collision.
///
/// Rotation is carried on transforms but does not rotate collision boxes. A spawn is
/// refused when any new component penetrates an existing one and both block each other.
/// Overlaps are reported for touching or intersecting components whose effective
/// response is not `Ignore`, as long as both generate overlap events.
#[derive(Debug, Clone, Default)]
pub struct SceneWorld {
    classes: ClassRegistry,
    actors: BTreeMap<ActorId, Actor>,
    next_id: u64,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classes(classes: ClassRegistry) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    /// Inserts a classless actor, e.g. level geometry.
    pub fn add_actor(
        &mut self,
        label: impl Into<String>,
        transform: Transform,
        components: Vec<GeometryComponent>,
    ) -> ActorId {
        self.insert(Actor {
            class: None,
            label: label.into(),
            tags: Vec::new(),
            transform,
            components,
        })
    }

    pub fn actor_class(&self, actor: ActorId) -> Option<&ClassId> {
        self.actors.get(&actor).and_then(|a| a.class.as_ref())
    }

    /// Replaces an actor's tags; `false` if the actor is not alive.
    pub fn set_actor_tags<I, T>(&mut self, actor: ActorId, tags: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        match self.actors.get_mut(&actor) {
            Some(a) => {
                a.tags = tags.into_iter().map(Into::into).collect();
                true
            }
            None => false,
        }
    }

    /// Live actors spawned from `class`.
    pub fn instances_of(&self, class: &str) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|(_, a)| a.class.as_deref() == Some(class))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    fn insert(&mut self, actor: Actor) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.actors.insert(id, actor);
        id
    }

    fn component_origin(transform: &Transform, component: &GeometryComponent) -> Vec3 {
        transform.location + component.relative_location * transform.scale
    }

    fn world_bounds(transform: &Transform, component: &GeometryComponent) -> Aabb {
        component
            .bounds
            .scaled(transform.scale)
            .translated(Self::component_origin(transform, component))
    }

    fn is_blocked(&self, transform: &Transform, components: &[GeometryComponent]) -> bool {
        components.iter().any(|candidate| {
            let bounds = Self::world_bounds(transform, candidate);
            self.actors.values().any(|actor| {
                actor.components.iter().any(|existing| {
                    CollisionSettings::response_between(&candidate.collision, &existing.collision)
                        == CollisionResponse::Block
                        && bounds.penetrates(
                            &Self::world_bounds(&actor.transform, existing),
                            BLOCKING_TOLERANCE,
                        )
                })
            })
        })
    }
}

impl Scene for SceneWorld {
    fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    fn actors(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor)
    }

    fn components(&self, actor: ActorId) -> Option<&[GeometryComponent]> {
        self.actors.get(&actor).map(|a| a.components.as_slice())
    }

    fn components_mut(&mut self, actor: ActorId) -> Option<&mut [GeometryComponent]> {
        self.actors
            .get_mut(&actor)
            .map(|a| a.components.as_mut_slice())
    }

    fn actor_transform(&self, actor: ActorId) -> Option<Transform> {
        self.actors.get(&actor).map(|a| a.transform)
    }

    fn component_transform(&self, component: ComponentHandle) -> Option<Transform> {
        let actor = self.actors.get(&component.actor)?;
        let geometry = actor.components.get(component.index)?;
        Some(
            actor
                .transform
                .with_location(Self::component_origin(&actor.transform, geometry)),
        )
    }

    fn component_bounds(&self, component: ComponentHandle) -> Option<Aabb> {
        let actor = self.actors.get(&component.actor)?;
        let geometry = actor.components.get(component.index)?;
        Some(Self::world_bounds(&actor.transform, geometry))
    }

    fn spawn(
        &mut self,
        class: &str,
        transform: &Transform,
        handling: SpawnCollisionHandling,
    ) -> Option<ActorId> {
        let components = self.classes.get(class)?.instantiate_geometry();
        if handling == SpawnCollisionHandling::DontSpawnIfColliding
            && self.is_blocked(transform, &components)
        {
            debug!("spawn of '{class}' at {:?} is blocked", transform.location);
            return None;
        }
        Some(self.insert(Actor {
            class: Some(class.to_owned()),
            label: class.to_owned(),
            tags: Vec::new(),
            transform: *transform,
            components,
        }))
    }

    fn destroy(&mut self, actor: ActorId) -> bool {
        self.actors.remove(&actor).is_some()
    }

    fn teleport(&mut self, actor: ActorId, location: Vec3) -> bool {
        match self.actors.get_mut(&actor) {
            Some(a) => {
                a.transform.location = location;
                true
            }
            None => false,
        }
    }

    fn overlapping_components(&self, actor: ActorId) -> Vec<ComponentHandle> {
        let Some(subject) = self.actors.get(&actor) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (other_id, other) in &self.actors {
            if *other_id == actor {
                continue;
            }
            for (index, theirs) in other.components.iter().enumerate() {
                let their_bounds = Self::world_bounds(&other.transform, theirs);
                let overlaps = subject.components.iter().any(|ours| {
                    ours.collision.generate_overlap_events
                        && theirs.collision.generate_overlap_events
                        && CollisionSettings::response_between(&ours.collision, &theirs.collision)
                            != CollisionResponse::Ignore
                        && Self::world_bounds(&subject.transform, ours).intersects(&their_bounds)
                });
                if overlaps {
                    out.push(ComponentHandle::new(*other_id, index));
                }
            }
        }
        out
    }

    fn closest_point_on_collision(
        &self,
        component: ComponentHandle,
        point: Vec3,
    ) -> Option<Vec3> {
        self.component_bounds(component)
            .map(|bounds| bounds.closest_point(point))
    }
    fn actor_label(&self, actor: ActorId) -> Option<&str> {
        self.actors.get(&actor).map(|a| a.label.as_str())
    }

    fn actor_tags(&self, actor: ActorId) -> &[String] {
        self.actors
            .get(&actor)
            .map(|a| a.tags.as_slice())
            .unwrap_or_default()
    }
}
