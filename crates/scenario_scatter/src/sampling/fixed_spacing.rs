//! Evenly spaced transforms along a path.
use rand::RngCore;
use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::Transform;
use crate::sampling::{Polyline, TargetSampling};

/// Transforms at distances `0, d, 2d, …` up to the path length, oriented along the path.
#[derive(Debug, Clone)]
pub struct FixedSpacingSampling {
    /// Distance between consecutive transforms, in meters.
    pub spacing: f32,
}

impl FixedSpacingSampling {
    pub fn new(spacing: f32) -> Self {
        Self { spacing }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(Error::InvalidConfig("spacing must be > 0".into()));
        }
        Ok(())
    }

    /// Deterministic; does not need a generator.
    pub fn sample(&self, path: &Polyline) -> Vec<Transform> {
        if self.validate().is_err() {
            warn!("Spacing {} is not a positive distance.", self.spacing);
            return Vec::new();
        }
        let length = path.length();
        if self.spacing > length {
            warn!(
                "Spacing {} must be smaller than the path length {}.",
                self.spacing, length
            );
            return Vec::new();
        }

        let count = (length / self.spacing).floor() as usize + 1;
        (0..count)
            .map(|i| i as f32 * self.spacing)
            .filter(|d| *d <= length)
            .map(|d| path.transform_at_distance(d))
            .collect()
    }
}

impl TargetSampling for FixedSpacingSampling {
    fn generate(&self, path: &Polyline, _rng: &mut dyn RngCore) -> Vec<Transform> {
        self.sample(path)
    }
}
