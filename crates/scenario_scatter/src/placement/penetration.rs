//! Decides whether an overlap reported for a freshly spawned instance is a real
//! interpenetration or only a touch.
use glam::Vec3;

use crate::collision::CollisionChannel;
use crate::scene::{ComponentHandle, Scene};

/// Tolerance, in meters, under which two distances are treated as equal.
pub const PENETRATION_TOLERANCE: f32 = 1e-5;

/// What the test needs to know about one overlapping component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapProbe {
    pub object_type: CollisionChannel,
    /// World location of the overlapping component.
    pub location: Vec3,
    /// Closest point on the component's collision to the instance location.
    pub closest_point: Vec3,
    /// Half height of the component's bounds.
    pub vertical_extent: f32,
}

impl OverlapProbe {
    /// Reads a probe from the scene; `None` when the component is gone.
    pub fn from_scene<S: Scene + ?Sized>(
        scene: &S,
        component: ComponentHandle,
        instance_location: Vec3,
    ) -> Option<Self> {
        let geometry = scene.components(component.actor)?.get(component.index)?;
        let location = scene.component_transform(component)?.location;
        let bounds = scene.component_bounds(component)?;
        let closest_point = scene.closest_point_on_collision(component, instance_location)?;
        Some(Self {
            object_type: geometry.collision.object_type,
            location,
            closest_point,
            vertical_extent: bounds.half_extents.z,
        })
    }
}

fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= PENETRATION_TOLERANCE
}

/// Returns `true` when the overlap should veto the instance.
///
/// Spawned-overlap components never veto and spawned obstacles always do. For anything
/// else the distance from the component to the instance is compared with the distance
/// from the component to its closest collision point. When they differ the instance sits
/// inside the component's volume. When they agree and the instance sits exactly on the
/// component origin, it only counts if the component has vertical extent.
pub fn is_penetrating_overlap(probe: &OverlapProbe, instance_location: Vec3) -> bool {
    match probe.object_type {
        CollisionChannel::SpawnedOverlap => return false,
        CollisionChannel::SpawnedObstacle => return true,
        _ => {}
    }

    let to_instance = instance_location.distance(probe.location);
    let to_surface = probe.closest_point.distance(probe.location);
    if nearly_equal(to_instance, to_surface) {
        if to_instance == 0.0 {
            return probe.vertical_extent > 0.0;
        }
        return false;
    }
    true
}
