//! Scene model shared by the placement engine and its collaborators.
//!
//! The engine never owns the scene. It drives it through the [`Scene`] trait: spawning
//! instances of [`ObjectClass`] templates, querying overlaps, and mutating the class-level
//! collision defaults held in a [`ClassRegistry`]. [`SceneWorld`] is an in-memory,
//! deterministic implementation used by tests, benches and the example binaries.
use std::collections::HashMap;

use glam::Vec3;

use crate::collision::{CollisionChannel, CollisionResponse, CollisionSettings};
use crate::geometry::{Aabb, Transform};

pub mod matcher;
pub mod world;

pub use matcher::{ActorMatcher, MatchBy};
pub use world::SceneWorld;

/// Default length of a downward surface trace, in meters.
pub const DEFAULT_TRACE_DISTANCE: f32 = 1000.0;

/// Unique path or name of an object class.
pub type ClassId = String;

/// Identity of a live actor in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

/// Addresses one geometry component of a live actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    pub actor: ActorId,
    pub index: usize,
}

impl ComponentHandle {
    pub fn new(actor: ActorId, index: usize) -> Self {
        Self { actor, index }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mobility {
    #[default]
    Static,
    Stationary,
    Movable,
}

/// How [`Scene::spawn`] treats a pose that collides with existing geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnCollisionHandling {
    AlwaysSpawn,
    DontSpawnIfColliding,
}

/// A piece of collidable geometry, either as a class template or on a live instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryComponent {
    pub name: String,
    /// Offset of the component origin from its owner's origin.
    pub relative_location: Vec3,
    /// Collision bounds relative to the component origin.
    pub bounds: Aabb,
    pub collision: CollisionSettings,
    pub mobility: Mobility,
    pub simulate_physics: bool,
}

impl GeometryComponent {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            relative_location: Vec3::ZERO,
            bounds,
            collision: CollisionSettings::default(),
            mobility: Mobility::Static,
            simulate_physics: false,
        }
    }

    /// Box of the given size resting on the component origin.
    pub fn box_on_ground(name: impl Into<String>, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(name, Aabb::new(Vec3::new(0.0, 0.0, half.z), half))
    }

    pub fn with_relative_location(mut self, relative_location: Vec3) -> Self {
        self.relative_location = relative_location;
        self
    }

    pub fn with_collision(mut self, collision: CollisionSettings) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_mobility(mut self, mobility: Mobility) -> Self {
        self.mobility = mobility;
        self
    }
}

/// Any component a class can declare. Only geometry takes part in collision.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentTemplate {
    Geometry(GeometryComponent),
    Auxiliary { name: String },
}

impl ComponentTemplate {
    pub fn as_geometry(&self) -> Option<&GeometryComponent> {
        match self {
            ComponentTemplate::Geometry(g) => Some(g),
            ComponentTemplate::Auxiliary { .. } => None,
        }
    }

    pub fn as_geometry_mut(&mut self) -> Option<&mut GeometryComponent> {
        match self {
            ComponentTemplate::Geometry(g) => Some(g),
            ComponentTemplate::Auxiliary { .. } => None,
        }
    }
}

/// A component added through a class's composition tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionNode {
    pub parent: Option<usize>,
    pub template: ComponentTemplate,
}

/// Class-level template of a spawnable object.
///
/// Components come from two places: those the class declares natively, and those added
/// by its composition tree. Both are reached through [`ObjectClass::visit_components`],
/// which fixes a single deterministic order: natives in declaration order, then the tree
/// depth-first with siblings in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectClass {
    id: ClassId,
    native: Vec<ComponentTemplate>,
    construction: Vec<ConstructionNode>,
}

impl ObjectClass {
    pub fn new(id: impl Into<ClassId>) -> Self {
        Self {
            id: id.into(),
            native: Vec::new(),
            construction: Vec::new(),
        }
    }

    pub fn id(&self) -> &ClassId {
        &self.id
    }

    /// Adds a natively declared component.
    pub fn with_native(mut self, template: ComponentTemplate) -> Self {
        self.native.push(template);
        self
    }

    pub fn with_geometry(self, geometry: GeometryComponent) -> Self {
        self.with_native(ComponentTemplate::Geometry(geometry))
    }

    /// Adds a node to the composition tree and returns its index. A parent that does not
    /// precede the new node is ignored and the node becomes a root.
    pub fn add_construction_node(
        &mut self,
        parent: Option<usize>,
        template: ComponentTemplate,
    ) -> usize {
        let index = self.construction.len();
        let parent = parent.filter(|p| *p < index);
        self.construction.push(ConstructionNode { parent, template });
        index
    }

    pub fn construction_nodes(&self) -> &[ConstructionNode] {
        &self.construction
    }

    /// Depth-first order of the composition tree.
    fn construction_order(&self) -> Vec<usize> {
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.construction.len()];
        let mut roots = Vec::new();
        for (i, node) in self.construction.iter().enumerate() {
            match node.parent {
                Some(p) => children[p].push(i),
                None => roots.push(i),
            }
        }

        let mut order = Vec::with_capacity(self.construction.len());
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(children[i].iter().rev().copied());
        }
        order
    }

    /// Visits every component template, natives first, then the composition tree.
    pub fn visit_components<'a>(&'a self, mut visitor: impl FnMut(&'a ComponentTemplate)) {
        for template in &self.native {
            visitor(template);
        }
        for i in self.construction_order() {
            visitor(&self.construction[i].template);
        }
    }

    /// Default geometry components of this class, in visit order.
    pub fn geometry_components(&self) -> Vec<&GeometryComponent> {
        let mut out = Vec::new();
        self.visit_components(|t| {
            if let Some(g) = t.as_geometry() {
                out.push(g);
            }
        });
        out
    }

    /// Mutable access to the same components, in the same order as
    /// [`ObjectClass::geometry_components`].
    pub fn geometry_components_mut(&mut self) -> Vec<&mut GeometryComponent> {
        let order = self.construction_order();
        let mut out: Vec<&mut GeometryComponent> = self
            .native
            .iter_mut()
            .filter_map(ComponentTemplate::as_geometry_mut)
            .collect();

        let mut nodes: Vec<Option<&mut ConstructionNode>> =
            self.construction.iter_mut().map(Some).collect();
        for i in order {
            if let Some(node) = nodes[i].take() {
                if let Some(g) = node.template.as_geometry_mut() {
                    out.push(g);
                }
            }
        }
        out
    }

    /// Copies of the current geometry defaults, as an instance of this class receives them.
    pub fn instantiate_geometry(&self) -> Vec<GeometryComponent> {
        self.geometry_components().into_iter().cloned().collect()
    }
}

/// Registry of class templates, keyed by class identity.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<ClassId, ObjectClass>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    /// Registers a class, replacing any class with the same identity.
    pub fn register(&mut self, class: ObjectClass) -> Option<ObjectClass> {
        self.classes.insert(class.id.clone(), class)
    }

    pub fn with_class(mut self, class: ObjectClass) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ObjectClass> {
        self.classes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ObjectClass> {
        self.classes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.classes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Where a downward trace met the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub component: ComponentHandle,
    pub point: Vec3,
}

/// Mutable scene the placement engine operates on.
///
/// Implementations hold global actor state; callers must not mutate the scene from
/// elsewhere while a placement pass is running.
pub trait Scene {
    fn classes(&self) -> &ClassRegistry;

    fn classes_mut(&mut self) -> &mut ClassRegistry;

    /// Every live actor, in a stable order.
    fn actors(&self) -> Vec<ActorId>;

    fn is_alive(&self, actor: ActorId) -> bool;

    fn components(&self, actor: ActorId) -> Option<&[GeometryComponent]>;

    fn components_mut(&mut self, actor: ActorId) -> Option<&mut [GeometryComponent]>;

    fn actor_transform(&self, actor: ActorId) -> Option<Transform>;

    fn component_transform(&self, component: ComponentHandle) -> Option<Transform>;

    /// World-space collision bounds of a component.
    fn component_bounds(&self, component: ComponentHandle) -> Option<Aabb>;

    /// Creates an instance of `class` at `transform`. With
    /// [`SpawnCollisionHandling::DontSpawnIfColliding`] nothing is created when the pose
    /// is blocked.
    fn spawn(
        &mut self,
        class: &str,
        transform: &Transform,
        handling: SpawnCollisionHandling,
    ) -> Option<ActorId>;

    /// Returns `false` if the actor was not alive.
    fn destroy(&mut self, actor: ActorId) -> bool;

    /// Moves an actor without sweeping or physics response.
    fn teleport(&mut self, actor: ActorId, location: Vec3) -> bool;

    /// Components of other actors currently overlapping any component of `actor`.
    fn overlapping_components(&self, actor: ActorId) -> Vec<ComponentHandle>;

    /// Point on the component's collision closest to `point`; `point` itself when inside.
    fn closest_point_on_collision(&self, component: ComponentHandle, point: Vec3)
        -> Option<Vec3>;

    /// Display name of an actor.
    fn actor_label(&self, actor: ActorId) -> Option<&str>;

    /// Tags attached to an actor; empty for unknown actors.
    fn actor_tags(&self, actor: ActorId) -> &[String];

    /// Union of the world bounds of an actor's components.
    fn actor_bounds(&self, actor: ActorId) -> Option<Aabb> {
        let count = self.components(actor)?.len();
        (0..count)
            .filter_map(|index| self.component_bounds(ComponentHandle::new(actor, index)))
            .reduce(|a, b| a.union(&b))
    }

    /// Casts a ray straight down from `from` and returns the highest top face it meets
    /// within `max_distance`. Only components that answer queries and block
    /// [`CollisionChannel::Visibility`] are hit. A ray starting inside a box passes
    /// through it.
    fn trace_down(&self, from: Vec3, max_distance: f32) -> Option<SurfaceHit> {
        let mut best: Option<SurfaceHit> = None;
        for actor in self.actors() {
            let Some(components) = self.components(actor) else {
                continue;
            };
            for (index, geometry) in components.iter().enumerate() {
                if !geometry.collision.enabled.has_query()
                    || geometry.collision.response_to(CollisionChannel::Visibility)
                        != CollisionResponse::Block
                {
                    continue;
                }
                let handle = ComponentHandle::new(actor, index);
                let Some(bounds) = self.component_bounds(handle) else {
                    continue;
                };
                let top = bounds.max().z;
                if !bounds.contains_xy(from) || top > from.z || from.z - top > max_distance {
                    continue;
                }
                if best.is_none_or(|hit| top > hit.point.z) {
                    best = Some(SurfaceHit {
                        component: handle,
                        point: Vec3::new(from.x, from.y, top),
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(name: &str) -> ComponentTemplate {
        ComponentTemplate::Geometry(GeometryComponent::box_on_ground(name, Vec3::ONE))
    }

    fn aux(name: &str) -> ComponentTemplate {
        ComponentTemplate::Auxiliary { name: name.into() }
    }

    fn names(class: &ObjectClass) -> Vec<String> {
        class
            .geometry_components()
            .into_iter()
            .map(|g| g.name.clone())
            .collect()
    }

    #[test]
    fn native_components_come_first() {
        let mut class = ObjectClass::new("/Game/Barrier")
            .with_native(geo("body"))
            .with_native(aux("arrow"));
        class.add_construction_node(None, geo("cap"));

        assert_eq!(names(&class), vec!["body", "cap"]);
    }

    #[test]
    fn composition_tree_is_walked_depth_first() {
        let mut class = ObjectClass::new("/Game/Kiosk");
        let root = class.add_construction_node(None, aux("root"));
        let a = class.add_construction_node(Some(root), geo("a"));
        let _b = class.add_construction_node(Some(root), geo("b"));
        class.add_construction_node(Some(a), geo("a_child"));
        class.add_construction_node(None, geo("second_root"));

        assert_eq!(names(&class), vec!["a", "a_child", "b", "second_root"]);
    }

    #[test]
    fn mutable_walk_matches_shared_walk() {
        let mut class = ObjectClass::new("/Game/Kiosk").with_native(geo("n0"));
        let root = class.add_construction_node(None, geo("r"));
        class.add_construction_node(None, geo("r2"));
        class.add_construction_node(Some(root), geo("r_child"));

        let shared = names(&class);
        let mutable: Vec<String> = class
            .geometry_components_mut()
            .into_iter()
            .map(|g| g.name.clone())
            .collect();
        assert_eq!(shared, mutable);
        assert_eq!(shared, vec!["n0", "r", "r_child", "r2"]);
    }

    #[test]
    fn forward_parent_reference_becomes_root() {
        let mut class = ObjectClass::new("/Game/Odd");
        let idx = class.add_construction_node(Some(5), geo("orphan"));
        assert_eq!(class.construction_nodes()[idx].parent, None);
        assert_eq!(names(&class), vec!["orphan"]);
    }

    #[test]
    fn registry_lookup_by_identity() {
        let registry = ClassRegistry::new().with_class(ObjectClass::new("/Game/Cone"));
        assert!(registry.contains("/Game/Cone"));
        assert!(registry.get("/Game/Barrel").is_none());
        assert_eq!(registry.len(), 1);
    }
}
