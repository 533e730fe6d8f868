//! Collision settings and the profile store used around a placement pass.
//!
//! A pass temporarily rewrites the class-level collision defaults of every candidate
//! class and forces overlap reporting on for every actor in the scene. The snapshots
//! here record what was there before so it can be put back exactly.
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::scene::{ActorId, ClassId, ClassRegistry, GeometryComponent, ObjectClass, Scene};

/// Profile name given to class defaults while a placement pass is running.
pub const PLACEMENT_PROFILE_NAME: &str = "ScenarioSpawnedObstacle";

/// Object-type and response channels.
///
/// `SpawnedObstacle` and `SpawnedOverlap` tag instances created by a placement pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionChannel {
    WorldStatic,
    WorldDynamic,
    Pawn,
    PhysicsBody,
    Vehicle,
    Destructible,
    Visibility,
    Camera,
    SpawnedObstacle,
    SpawnedOverlap,
}

impl CollisionChannel {
    pub const COUNT: usize = 10;

    pub const ALL: [CollisionChannel; Self::COUNT] = [
        CollisionChannel::WorldStatic,
        CollisionChannel::WorldDynamic,
        CollisionChannel::Pawn,
        CollisionChannel::PhysicsBody,
        CollisionChannel::Vehicle,
        CollisionChannel::Destructible,
        CollisionChannel::Visibility,
        CollisionChannel::Camera,
        CollisionChannel::SpawnedObstacle,
        CollisionChannel::SpawnedOverlap,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Ordered from weakest to strongest; the effective response between two components is
/// the weaker of the two sides.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionResponse {
    Ignore,
    Overlap,
    Block,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollisionEnabled {
    NoCollision,
    QueryOnly,
    PhysicsOnly,
    #[default]
    QueryAndPhysics,
}

impl CollisionEnabled {
    pub fn has_query(self) -> bool {
        matches!(
            self,
            CollisionEnabled::QueryOnly | CollisionEnabled::QueryAndPhysics
        )
    }

    pub fn has_physics(self) -> bool {
        matches!(
            self,
            CollisionEnabled::PhysicsOnly | CollisionEnabled::QueryAndPhysics
        )
    }
}

/// Per-channel response table.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelResponses([CollisionResponse; CollisionChannel::COUNT]);

impl ChannelResponses {
    pub fn all(response: CollisionResponse) -> Self {
        Self([response; CollisionChannel::COUNT])
    }

    pub fn get(&self, channel: CollisionChannel) -> CollisionResponse {
        self.0[channel.index()]
    }

    pub fn set(&mut self, channel: CollisionChannel, response: CollisionResponse) {
        self.0[channel.index()] = response;
    }

    pub fn set_all(&mut self, response: CollisionResponse) {
        self.0 = [response; CollisionChannel::COUNT];
    }

    pub fn with(mut self, channel: CollisionChannel, response: CollisionResponse) -> Self {
        self.set(channel, response);
        self
    }
}

impl Default for ChannelResponses {
    fn default() -> Self {
        Self::all(CollisionResponse::Block)
    }
}

/// Collision state of one geometry component.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionSettings {
    pub object_type: CollisionChannel,
    pub enabled: CollisionEnabled,
    pub responses: ChannelResponses,
    pub profile_name: String,
    pub generate_overlap_events: bool,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            object_type: CollisionChannel::WorldDynamic,
            enabled: CollisionEnabled::QueryAndPhysics,
            responses: ChannelResponses::default(),
            profile_name: "BlockAllDynamic".to_owned(),
            generate_overlap_events: false,
        }
    }
}

impl CollisionSettings {
    /// Static level geometry that blocks everything.
    pub fn world_static() -> Self {
        Self {
            object_type: CollisionChannel::WorldStatic,
            profile_name: "BlockAll".to_owned(),
            ..Self::default()
        }
    }

    pub fn with_object_type(mut self, object_type: CollisionChannel) -> Self {
        self.object_type = object_type;
        self
    }

    pub fn with_enabled(mut self, enabled: CollisionEnabled) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_responses(mut self, responses: ChannelResponses) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_overlap_events(mut self, generate_overlap_events: bool) -> Self {
        self.generate_overlap_events = generate_overlap_events;
        self
    }

    pub fn response_to(&self, channel: CollisionChannel) -> CollisionResponse {
        self.responses.get(channel)
    }

    /// Effective response between two components: `Ignore` unless both take part in
    /// queries, otherwise the weaker of the two sides.
    pub fn response_between(a: &CollisionSettings, b: &CollisionSettings) -> CollisionResponse {
        if !a.enabled.has_query() || !b.enabled.has_query() {
            return CollisionResponse::Ignore;
        }
        a.response_to(b.object_type).min(b.response_to(a.object_type))
    }
}

/// Stored copy of one component's collision defaults.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionProfile {
    pub object_type: CollisionChannel,
    pub enabled: CollisionEnabled,
    pub responses: ChannelResponses,
    pub profile_name: String,
    pub generate_overlap_events: bool,
}

impl CollisionProfile {
    pub fn capture(settings: &CollisionSettings) -> Self {
        Self {
            object_type: settings.object_type,
            enabled: settings.enabled,
            responses: settings.responses,
            profile_name: settings.profile_name.clone(),
            generate_overlap_events: settings.generate_overlap_events,
        }
    }

    /// Writes every stored field back.
    pub fn apply(&self, settings: &mut CollisionSettings) {
        settings.object_type = self.object_type;
        settings.enabled = self.enabled;
        settings.responses = self.responses;
        settings.profile_name = self.profile_name.clone();
        settings.generate_overlap_events = self.generate_overlap_events;
    }

    /// Resets a surviving instance to its class defaults while keeping the
    /// spawned-obstacle/overlap object type it was created with. The instance keeps
    /// overlapping the `SpawnedOverlap` channel.
    pub fn apply_to_survivor(&self, settings: &mut CollisionSettings) {
        settings.responses = self.responses;
        settings.responses.set(
            CollisionChannel::SpawnedOverlap,
            CollisionResponse::Overlap,
        );
        settings.enabled = self.enabled;
    }
}

/// Geometry components of a class in the order every store and restore uses.
pub fn find_geometry_components(class: &ObjectClass) -> Vec<&GeometryComponent> {
    class.geometry_components()
}

/// Rewrites component defaults for the duration of a pass.
///
/// Components are tagged `SpawnedObstacle` when `remove_overlaps` is set and
/// `SpawnedOverlap` otherwise. Either way they take part in queries and physics, generate
/// overlap events, overlap every channel and block `SpawnedObstacle`.
pub fn apply_placement_collision_profile<'c>(
    components: impl IntoIterator<Item = &'c mut CollisionSettings>,
    remove_overlaps: bool,
) {
    for settings in components {
        settings.generate_overlap_events = true;
        settings.object_type = if remove_overlaps {
            CollisionChannel::SpawnedObstacle
        } else {
            CollisionChannel::SpawnedOverlap
        };
        settings.enabled = CollisionEnabled::QueryAndPhysics;
        settings.profile_name = PLACEMENT_PROFILE_NAME.to_owned();
        settings.responses.set_all(CollisionResponse::Overlap);
        settings
            .responses
            .set(CollisionChannel::SpawnedObstacle, CollisionResponse::Block);
        settings
            .responses
            .set(CollisionChannel::SpawnedOverlap, CollisionResponse::Overlap);
    }
}

/// Class-default collision profiles captured before a pass, keyed by class identity.
#[derive(Debug, Clone, Default)]
pub struct CollisionSnapshot {
    profiles: HashMap<ClassId, Vec<CollisionProfile>>,
}

impl CollisionSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one profile per component, replacing anything stored for `class_id`.
    pub fn store_profiles(&mut self, class_id: &str, components: &[&GeometryComponent]) {
        let profiles = components
            .iter()
            .map(|c| CollisionProfile::capture(&c.collision))
            .collect();
        self.profiles.insert(class_id.to_owned(), profiles);
    }

    pub fn get(&self, class_id: &str) -> Option<&[CollisionProfile]> {
        self.profiles.get(class_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Writes the stored profiles back onto the class defaults, pairing components by
    /// position. Every class is attempted; the first component-count mismatch is
    /// returned after the others have been restored.
    pub fn restore(&self, registry: &mut ClassRegistry, classes: &[ClassId]) -> Result<()> {
        let mut first_error = None;
        for class_id in classes {
            let Some(profiles) = self.profiles.get(class_id) else {
                continue;
            };
            let Some(class) = registry.get_mut(class_id) else {
                warn!("class '{class_id}' disappeared before its collision profiles were restored");
                first_error.get_or_insert(Error::UnknownClass {
                    id: class_id.clone(),
                });
                continue;
            };
            let components = class.geometry_components_mut();
            if components.len() != profiles.len() {
                first_error.get_or_insert(Error::ProfileMismatch {
                    class: class_id.clone(),
                    expected: profiles.len(),
                    found: components.len(),
                });
                continue;
            }
            for (component, profile) in components.into_iter().zip(profiles) {
                profile.apply(&mut component.collision);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Per-actor overlap-event flags captured before a pass.
#[derive(Debug, Clone, Default)]
pub struct OverlapEventSnapshot {
    flags: HashMap<ActorId, Vec<bool>>,
}

impl OverlapEventSnapshot {
    /// Records every actor's flags, then turns overlap events on for all components.
    pub fn capture_and_enable<S: Scene + ?Sized>(scene: &mut S) -> Self {
        let mut flags = HashMap::new();
        for actor in scene.actors() {
            if let Some(components) = scene.components_mut(actor) {
                let saved = components
                    .iter()
                    .map(|c| c.collision.generate_overlap_events)
                    .collect();
                for component in components.iter_mut() {
                    component.collision.generate_overlap_events = true;
                }
                flags.insert(actor, saved);
            }
        }
        Self { flags }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Puts the recorded flags back on every actor that is still alive. An actor whose
    /// component count changed is skipped with a warning.
    pub fn restore<S: Scene + ?Sized>(&self, scene: &mut S) {
        for (actor, saved) in &self.flags {
            let Some(components) = scene.components_mut(*actor) else {
                continue;
            };
            if components.len() != saved.len() {
                warn!(
                    "actor {:?} has {} components but {} overlap flags were recorded; leaving it unchanged",
                    actor,
                    components.len(),
                    saved.len()
                );
                continue;
            }
            for (component, flag) in components.iter_mut().zip(saved) {
                component.collision.generate_overlap_events = *flag;
            }
        }
    }
}
