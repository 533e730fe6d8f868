//! Randomly scattered transforms along a path.
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::geometry::{Rotator, Transform};
use crate::sampling::{draw_count, rand_range, validate_bounds, Polyline, TargetSampling};

/// Draws `length × density` transforms at random distances along a path.
///
/// Density is items per meter, drawn once per call from `[density_min, density_max]`.
/// Each item gets a random yaw from `[rotation_min, rotation_max]` degrees, added to the
/// path heading when `follow_path_rotation` is set. Pass the result through a
/// [`SurfaceSnap`](crate::sampling::SurfaceSnap) to drop it onto the ground below.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomAlongPathSampling {
    pub density_min: f32,
    pub density_max: f32,
    pub rotation_min: f32,
    pub rotation_max: f32,
    pub follow_path_rotation: bool,
}

impl Default for RandomAlongPathSampling {
    fn default() -> Self {
        Self {
            density_min: 0.0,
            density_max: 0.0,
            rotation_min: 0.0,
            rotation_max: 0.0,
            follow_path_rotation: false,
        }
    }
}

impl RandomAlongPathSampling {
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

    pub fn with_follow_path_rotation(mut self, follow_path_rotation: bool) -> Self {
        self.follow_path_rotation = follow_path_rotation;
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
}

impl TargetSampling for RandomAlongPathSampling {
    fn generate(&self, path: &Polyline, rng: &mut dyn RngCore) -> Vec<Transform> {
        if let Err(err) = self.validate() {
            warn!("No transforms generated: {err}.");
            return Vec::new();
        }

        let length = path.length();
        let count = draw_count(rng, length, self.density_min, self.density_max);

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let distance = rand_range(rng, 0.0, length);
            let mut yaw = rand_range(rng, self.rotation_min, self.rotation_max);
            if self.follow_path_rotation {
                yaw += path.yaw_at_distance(distance);
            }
            out.push(Transform::new(
                path.location_at_distance(distance),
                Rotator::from_yaw(yaw),
            ));
        }
        out
    }
}
