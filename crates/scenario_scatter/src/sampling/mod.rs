//! Target-transform generation.
//!
//! Path samplers turn a [`Polyline`] into the ordered transforms consumed by the placement
//! engine and by vehicle routes. [`BoxSampling`] scatters over the top of a volume and
//! [`SurfaceSampling`] over the top faces of matched scene actors. [`SurfaceSnap`] drops
//! any of these onto the geometry below.
use rand::RngCore;
use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::Transform;

pub mod fixed_spacing;
pub mod path;
pub mod random_along_path;
pub mod snap;
pub mod volume;

pub use fixed_spacing::FixedSpacingSampling;
pub use path::Polyline;
pub use random_along_path::RandomAlongPathSampling;
pub use snap::SurfaceSnap;
pub use volume::{BoxSampling, SurfaceSampling};

/// Densities above this many items per meter (or square meter) are logged as likely to
/// hurt performance.
pub const DENSITY_WARNING_LIMIT: f32 = 3.0;

/// Upper bound on the transforms a single `generate` call produces.
pub const MAX_GENERATED_TRANSFORMS: usize = 1_000_000;

/// Trait for target-transform sampling along a path.
pub trait TargetSampling: Send + Sync {
    fn generate(&self, path: &Polyline, rng: &mut dyn RngCore) -> Vec<Transform>;
}

/// Generate a random float in the range [0, 1].
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Uniform float between `min` and `max`.
#[inline]
pub(crate) fn rand_range(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + (max - min) * rand01(rng)
}

/// Checks the density and yaw bounds shared by the random samplers.
pub(crate) fn validate_bounds(
    density_min: f32,
    density_max: f32,
    rotation_min: f32,
    rotation_max: f32,
) -> Result<()> {
    for (name, value) in [
        ("density_min", density_min),
        ("density_max", density_max),
        ("rotation_min", rotation_min),
        ("rotation_max", rotation_max),
    ] {
        if !value.is_finite() {
            return Err(Error::InvalidConfig(format!("{name} must be finite, got {value}")));
        }
    }
    Error::check_range("density", density_min, density_max)?;
    Error::check_range("rotation", rotation_min, rotation_max)?;
    if density_min < 0.0 {
        return Err(Error::InvalidConfig("density must be >= 0".into()));
    }
    Ok(())
}

/// Number of items for `measure` (a length or an area) at a density drawn from the range.
pub(crate) fn draw_count(
    rng: &mut dyn RngCore,
    measure: f32,
    density_min: f32,
    density_max: f32,
) -> usize {
    if density_max > DENSITY_WARNING_LIMIT {
        warn!(
            "Maximum density {density_max} is above {DENSITY_WARNING_LIMIT}; expect slow generation."
        );
    }
    let count = measure * rand_range(rng, density_min, density_max);
    if count.is_nan() || count < 1.0 {
        return 0;
    }
    if count >= MAX_GENERATED_TRANSFORMS as f32 {
        warn!("Capping {count} requested transforms at {MAX_GENERATED_TRANSFORMS}.");
        return MAX_GENERATED_TRANSFORMS;
    }
    count as usize
}
