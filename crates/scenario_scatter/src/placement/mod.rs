//! Procedural placement with collision resolution.
//!
//! A pass takes target transforms and candidate classes, spawns one instance per target
//! through a [`crate::scene::Scene`], and removes instances that interpenetrate existing
//! geometry. Class collision defaults and the scene's overlap flags are rewritten for the
//! pass and restored afterwards by a [`PlacementScope`].
pub mod engine;
pub mod events;
pub mod penetration;
pub mod request;
pub mod scope;
pub mod selection;

pub use engine::{PlacementEngine, PlacementResult, SpawnedInstanceRegistry};
pub use events::{EventSink, FnSink, MultiSink, PlacementEvent, PlacementEventKind, VecSink};
pub use penetration::{is_penetrating_overlap, OverlapProbe, PENETRATION_TOLERANCE};
pub use request::{PlacementConfig, PlacementRequest};
pub use scope::PlacementScope;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a target ended without an instance.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Spawning was refused at the target (and at the raised retry, with physics).
    Blocked,
    /// The instance spawned but interpenetrated existing geometry and was destroyed.
    Penetrating,
}
