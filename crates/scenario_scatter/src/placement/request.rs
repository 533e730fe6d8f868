#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scene::{ClassId, ClassRegistry};

/// Engine-level tunables.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    /// Height in meters above a blocked target at which a physics-enabled spawn is retried.
    pub drop_clearance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            drop_clearance: 1.0,
        }
    }
}

impl PlacementConfig {
    pub fn with_drop_clearance(mut self, drop_clearance: f32) -> Self {
        self.drop_clearance = drop_clearance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.drop_clearance.is_finite() || self.drop_clearance < 0.0 {
            return Err(Error::InvalidConfig(
                "drop_clearance must be finite and >= 0".into(),
            ));
        }
        Ok(())
    }
}

/// One placement pass: which classes to scatter and how.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    /// Candidate classes. Duplicates are allowed and dropped with a warning.
    pub classes: Vec<ClassId>,
    /// Seeds the generator that picks a class per target.
    pub seed: u64,
    /// Enable physics simulation on placed instances.
    pub add_physics: bool,
    /// Tag instances as obstacles so that interpenetrating ones are removed.
    pub remove_overlaps: bool,
}

impl Default for PlacementRequest {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            seed: 0,
            add_physics: false,
            remove_overlaps: true,
        }
    }
}

impl PlacementRequest {
    pub fn new<I>(classes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ClassId>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_physics(mut self, add_physics: bool) -> Self {
        self.add_physics = add_physics;
        self
    }

    pub fn with_remove_overlaps(mut self, remove_overlaps: bool) -> Self {
        self.remove_overlaps = remove_overlaps;
        self
    }

    /// Rejects an empty candidate list and identities missing from `registry`.
    pub fn validate(&self, registry: &ClassRegistry) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::EmptyCandidates);
        }
        if let Some(id) = self
            .classes
            .iter()
            .find(|id| id.is_empty() || !registry.contains(id))
        {
            return Err(Error::UnknownClass { id: id.clone() });
        }
        Ok(())
    }
}
