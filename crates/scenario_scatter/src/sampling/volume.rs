//! Area samplers: the top of a box volume and the top faces of scene actors.
use glam::Vec3;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::geometry::{Rotator, Transform};
use crate::sampling::{draw_count, rand_range, validate_bounds};
use crate::scene::{ActorId, Scene, DEFAULT_TRACE_DISTANCE};

/// Height above a surface's bounds from which its samples are traced down.
const SURFACE_TRACE_LIFT: f32 = 0.01;

/// Scatters transforms over the top face of a box, optionally rotated about Z.
///
/// The count is `area × density` with density drawn once per call from
/// `[density_min, density_max]` items per square meter. Samples sit at the box's top
/// height with a random yaw. Chain a [`SurfaceSnap`](crate::sampling::SurfaceSnap) to
/// drop them onto the ground.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSampling {
    pub center: Vec3,
    pub half_extents: Vec3,
    /// Rotation of the box about Z, in degrees.
    pub yaw: f32,
    pub density_min: f32,
    pub density_max: f32,
    pub rotation_min: f32,
    pub rotation_max: f32,
}

impl BoxSampling {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
            yaw: 0.0,
            density_min: 0.0,
            density_max: 0.2,
            rotation_min: 0.0,
            rotation_max: 360.0,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_density(mut self, density_min: f32, density_max: f32) -> Self {
        self.density_min = density_min;
        self.density_max = density_max;
        self
    }

    pub fn with_rotation(mut self, rotation_min: f32, rotation_max: f32) -> Self {
        self.rotation_min = rotation_min;
        self.rotation_max = rotation_max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.center.is_finite() || !self.half_extents.is_finite() || !self.yaw.is_finite() {
            return Err(Error::InvalidConfig("box must have finite extents".into()));
        }
        validate_bounds(
            self.density_min,
            self.density_max,
            self.rotation_min,
            self.rotation_max,
        )
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> Vec<Transform> {
        if let Err(err) = self.validate() {
            warn!("No transforms generated: {err}.");
            return Vec::new();
        }
        if self.half_extents.z > 0.0 {
            debug!("Box has height; sampling its top face.");
        }

        let Vec3 { x: hx, y: hy, z: hz } = self.half_extents;
        let area = 4.0 * hx * hy;
        let count = draw_count(rng, area, self.density_min, self.density_max);
        let top = self.center.z + hz;
        let (sin, cos) = self.yaw.to_radians().sin_cos();

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let lx = rand_range(rng, -hx, hx);
            let ly = rand_range(rng, -hy, hy);
            let location = Vec3::new(
                self.center.x + lx * cos - ly * sin,
                self.center.y + lx * sin + ly * cos,
                top,
            );
            let yaw = rand_range(rng, self.rotation_min, self.rotation_max);
            out.push(Transform::new(location, Rotator::from_yaw(yaw)));
        }
        out
    }
}

/// Scatters transforms over the top faces of scene actors.
///
/// Each actor gets `footprint area × density` tries at random points of its bounds.
/// A try is traced down from just above the bounds and kept only when the first surface
/// it meets belongs to that actor. Tries over gaps in an irregular actor fall through to
/// whatever lies below and are dropped.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSampling {
    pub density_min: f32,
    pub density_max: f32,
    pub rotation_min: f32,
    pub rotation_max: f32,
}

impl Default for SurfaceSampling {
    fn default() -> Self {
        Self {
            density_min: 0.0,
            density_max: 0.2,
            rotation_min: 0.0,
            rotation_max: 360.0,
        }
    }
}

impl SurfaceSampling {
    pub fn new(density_min: f32, density_max: f32) -> Self {
        Self {
            density_min,
            density_max,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation_min: f32, rotation_max: f32) -> Self {
        self.rotation_min = rotation_min;
        self.rotation_max = rotation_max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_bounds(
            self.density_min,
            self.density_max,
            self.rotation_min,
            self.rotation_max,
        )
    }

    pub fn generate<S: Scene + ?Sized>(
        &self,
        scene: &S,
        surfaces: &[ActorId],
        rng: &mut dyn RngCore,
    ) -> Vec<Transform> {
        if let Err(err) = self.validate() {
            warn!("No transforms generated: {err}.");
            return Vec::new();
        }

        let mut out = Vec::new();
        for &surface in surfaces {
            let Some(bounds) = scene.actor_bounds(surface) else {
                debug!("Surface {surface:?} has no geometry.");
                continue;
            };
            let (min, max) = (bounds.min(), bounds.max());
            let size = max - min;
            let count = draw_count(rng, size.x * size.y, self.density_min, self.density_max);
            let start_z = max.z + SURFACE_TRACE_LIFT;

            for _ in 0..count {
                let x = rand_range(rng, min.x, max.x);
                let y = rand_range(rng, min.y, max.y);
                let yaw = rand_range(rng, self.rotation_min, self.rotation_max);
                let from = Vec3::new(x, y, start_z);
                match scene.trace_down(from, DEFAULT_TRACE_DISTANCE) {
                    Some(hit) if hit.component.actor == surface => {
                        out.push(Transform::new(hit.point, Rotator::from_yaw(yaw)));
                    }
                    _ => {}
                }
            }
        }
        out
    }
}
