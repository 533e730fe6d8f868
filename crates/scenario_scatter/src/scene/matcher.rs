//! Selecting scene actors by label and tags.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::scene::{ActorId, Scene};

/// How the name and tag conditions of an [`ActorMatcher`] combine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchBy {
    #[default]
    NameAndTags,
    NameOrTags,
}

/// Picks actors whose label matches a pattern and/or that carry every listed tag.
///
/// An empty pattern never matches by name and an empty tag list never matches by tags,
/// so a matcher with neither selects nothing.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorMatcher {
    pub match_by: MatchBy,
    /// Substring of the label, or the whole label when `exact_name` is set.
    pub name_pattern: String,
    pub tags: Vec<String>,
    pub exact_name: bool,
}

impl ActorMatcher {
    pub fn new(match_by: MatchBy) -> Self {
        Self {
            match_by,
            ..Default::default()
        }
    }

    pub fn with_name_pattern(mut self, name_pattern: impl Into<String>) -> Self {
        self.name_pattern = name_pattern.into();
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exact_name(mut self, exact_name: bool) -> Self {
        self.exact_name = exact_name;
        self
    }

    fn matches_name(&self, label: &str) -> bool {
        if self.name_pattern.is_empty() {
            return false;
        }
        if self.exact_name {
            label == self.name_pattern
        } else {
            label.contains(&self.name_pattern)
        }
    }

    fn matches_tags(&self, tags: &[String]) -> bool {
        !self.tags.is_empty() && self.tags.iter().all(|t| tags.contains(t))
    }

    pub fn matches(&self, label: &str, tags: &[String]) -> bool {
        match self.match_by {
            MatchBy::NameAndTags => self.matches_name(label) && self.matches_tags(tags),
            MatchBy::NameOrTags => self.matches_name(label) || self.matches_tags(tags),
        }
    }

    /// Matching live actors in the scene's actor order.
    pub fn find<S: Scene + ?Sized>(&self, scene: &S) -> Vec<ActorId> {
        scene
            .actors()
            .into_iter()
            .filter(|&actor| {
                let label = scene.actor_label(actor).unwrap_or_default();
                self.matches(label, scene.actor_tags(actor))
            })
            .collect()
    }
}
