//! Dropping generated transforms onto the geometry below them.
use tracing::debug;

use crate::geometry::Transform;
use crate::scene::{ActorId, Scene, DEFAULT_TRACE_DISTANCE};

/// Moves transforms down onto the surface below and filters them by what they land on.
///
/// With no surfaces listed and `snap_to_surface_below` off the snap is inactive and
/// every transform passes unchanged. Otherwise each transform traces down: a miss drops
/// it, a hit moves it to the hit height, and when surfaces are listed the hit actor must
/// be one of them.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnap {
    pub surfaces: Vec<ActorId>,
    pub snap_to_surface_below: bool,
    /// Trace length in meters.
    pub max_distance: f32,
}

impl Default for SurfaceSnap {
    fn default() -> Self {
        Self {
            surfaces: Vec::new(),
            snap_to_surface_below: false,
            max_distance: DEFAULT_TRACE_DISTANCE,
        }
    }
}

impl SurfaceSnap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts only transforms landing on these actors.
    pub fn with_surfaces(mut self, surfaces: impl IntoIterator<Item = ActorId>) -> Self {
        self.surfaces = surfaces.into_iter().collect();
        self
    }

    pub fn with_snap_to_surface_below(mut self, snap_to_surface_below: bool) -> Self {
        self.snap_to_surface_below = snap_to_surface_below;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn is_active(&self) -> bool {
        self.snap_to_surface_below || !self.surfaces.is_empty()
    }

    /// The snapped transform, or `None` when it has nowhere valid to land.
    pub fn snap<S: Scene + ?Sized>(&self, scene: &S, transform: &Transform) -> Option<Transform> {
        if !self.is_active() {
            return Some(*transform);
        }
        let hit = scene.trace_down(transform.location, self.max_distance)?;
        if !self.surfaces.is_empty() && !self.surfaces.contains(&hit.component.actor) {
            return None;
        }
        let mut location = transform.location;
        location.z = hit.point.z;
        Some(transform.with_location(location))
    }

    /// Snaps every transform and keeps the ones that land, in order.
    pub fn apply<S: Scene + ?Sized>(&self, scene: &S, transforms: &[Transform]) -> Vec<Transform> {
        let out: Vec<Transform> = transforms
            .iter()
            .filter_map(|t| self.snap(scene, t))
            .collect();
        if out.len() < transforms.len() {
            debug!(
                "{} of {} transforms found no surface below.",
                transforms.len() - out.len(),
                transforms.len()
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::geometry::Rotator;
    use crate::scene::{GeometryComponent, SceneWorld};

    fn two_plates() -> (SceneWorld, ActorId, ActorId) {
        let mut world = SceneWorld::new();
        let road = world.add_actor(
            "road",
            Transform::at([0.0, 0.0, -0.25]),
            vec![GeometryComponent::box_on_ground("r", Vec3::new(10.0, 10.0, 0.25))],
        );
        let kerb = world.add_actor(
            "kerb",
            Transform::at([10.0, 0.0, 0.0]),
            vec![GeometryComponent::box_on_ground("k", Vec3::new(10.0, 10.0, 0.25))],
        );
        (world, road, kerb)
    }

    #[test]
    fn inactive_snap_passes_everything() {
        let (world, _, _) = two_plates();
        let floating = Transform::at([100.0, 100.0, 50.0]);
        assert_eq!(SurfaceSnap::new().snap(&world, &floating), Some(floating));
    }

    #[test]
    fn snapping_keeps_xy_and_rotation() {
        let (world, _, _) = two_plates();
        let t = Transform::new(Vec3::new(1.0, 2.0, 5.0), Rotator::from_yaw(30.0));
        let snapped = SurfaceSnap::new()
            .with_snap_to_surface_below(true)
            .snap(&world, &t)
            .unwrap();
        assert_eq!(snapped.location, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(snapped.rotation, t.rotation);

        let on_kerb = Transform::at([12.0, 0.0, 5.0]);
        let snapped = SurfaceSnap::new()
            .with_snap_to_surface_below(true)
            .snap(&world, &on_kerb)
            .unwrap();
        assert_eq!(snapped.location.z, 0.25);
    }

    #[test]
    fn listed_surfaces_filter_hits() {
        let (world, road, _) = two_plates();
        let snap = SurfaceSnap::new().with_surfaces([road]);
        let kept = snap.apply(
            &world,
            &[
                Transform::at([0.0, 0.0, 1.0]),
                Transform::at([12.0, 0.0, 1.0]),
                Transform::at([50.0, 0.0, 1.0]),
            ],
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].location, Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn nothing_below_is_dropped() {
        let (world, _, _) = two_plates();
        let snap = SurfaceSnap::new().with_snap_to_surface_below(true);
        assert!(snap.snap(&world, &Transform::at([0.0, 0.0, -5.0])).is_none());
        assert!(snap
            .with_max_distance(1.0)
            .snap(&world, &Transform::at([0.0, 0.0, 3.0]))
            .is_none());
    }
}
