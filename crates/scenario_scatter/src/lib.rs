#![forbid(unsafe_code)]
//! scenario_scatter: procedural placement with collision resolution, and PID path
//! following for driving-scenario authoring.
//!
//! Modules:
//! - geometry: transforms, boxes, curvature and heading helpers
//! - scene: class templates, the `Scene` trait, actor matching and the in-memory `SceneWorld`
//! - collision: channels, collision settings, profile snapshots
//! - placement: placement engine, penetration test, scope guard, events
//! - sampling: target transforms along a path, over a box or over actor surfaces
//! - control: PID controllers and the waypoint follower
//! - route: vehicle routes built from a path
//! - config: export/import records (JSON with the `serde` feature)
pub mod collision;
pub mod config;
pub mod control;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod route;
pub mod sampling;
pub mod scene;

/// Convenient re-exports for common types. Import with `use scenario_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::collision::{
        apply_placement_collision_profile, find_geometry_components, ChannelResponses,
        CollisionChannel, CollisionEnabled, CollisionProfile, CollisionResponse,
        CollisionSettings, CollisionSnapshot, OverlapEventSnapshot, PLACEMENT_PROFILE_NAME,
    };
    pub use crate::config::{
        ConfigIssue, Imported, SpawnedObjectRecord, SpawnedObjectsConfig, TransformRecord,
        VehiclePathConfig,
    };
    pub use crate::control::{
        ControlOutput, FollowerConfig, FollowerState, LateralController,
        LongitudinalController, PathFollower, PidController, PidGains, VehicleState,
    };
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{
        circle_radius, horizontal_distance, kmh_to_mps, signed_horizontal_angle, Aabb, Rotator,
        Transform, STRAIGHT_LINE_RADIUS,
    };
    pub use crate::placement::{
        is_penetrating_overlap, EventSink, FnSink, MultiSink, OverlapProbe, PlacementConfig,
        PlacementEngine, PlacementEvent, PlacementEventKind, PlacementRequest, PlacementResult,
        PlacementScope, SkipReason, SpawnedInstanceRegistry, VecSink,
    };
    pub use crate::route::{PathSpawnConfig, SpawnedVehicle, VehiclePathSpawner};
    pub use crate::sampling::{
        BoxSampling, FixedSpacingSampling, Polyline, RandomAlongPathSampling, SurfaceSampling,
        SurfaceSnap, TargetSampling,
    };
    pub use crate::scene::{
        ActorId, ActorMatcher, ClassId, ClassRegistry, ComponentHandle, ComponentTemplate,
        GeometryComponent, MatchBy, Mobility, ObjectClass, Scene, SceneWorld,
        SpawnCollisionHandling, SurfaceHit,
    };
}
