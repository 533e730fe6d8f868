use std::ops::{Deref, DerefMut};

use tracing::error;

use crate::collision::{
    apply_placement_collision_profile, find_geometry_components, CollisionSnapshot,
    OverlapEventSnapshot,
};
use crate::error::Result;
use crate::scene::{ClassId, Scene};

/// Holds a scene in placement mode.
///
/// Opening the scope forces overlap events on for every actor and rewrites the collision
/// defaults of the candidate classes. [`PlacementScope::finish`] puts both back and
/// reports a failed profile restore. A scope dropped without `finish` (early return or
/// panic) still restores and logs any failure.
pub struct PlacementScope<'a, S: Scene + ?Sized> {
    scene: &'a mut S,
    overlap_events: OverlapEventSnapshot,
    profiles: CollisionSnapshot,
    classes: Vec<ClassId>,
    finished: bool,
}

impl<'a, S: Scene + ?Sized> PlacementScope<'a, S> {
    pub fn begin(scene: &'a mut S, classes: &[ClassId], remove_overlaps: bool) -> Self {
        let overlap_events = OverlapEventSnapshot::capture_and_enable(scene);

        let mut profiles = CollisionSnapshot::new();
        let registry = scene.classes_mut();
        for class_id in classes {
            let Some(class) = registry.get_mut(class_id) else {
                continue;
            };
            profiles.store_profiles(class_id, &find_geometry_components(class));
            apply_placement_collision_profile(
                class
                    .geometry_components_mut()
                    .into_iter()
                    .map(|g| &mut g.collision),
                remove_overlaps,
            );
        }

        Self {
            scene,
            overlap_events,
            profiles,
            classes: classes.to_vec(),
            finished: false,
        }
    }

    /// Class defaults as they were before the scope opened.
    pub fn profiles(&self) -> &CollisionSnapshot {
        &self.profiles
    }

    /// The scene together with the stored class defaults.
    pub fn split(&mut self) -> (&mut S, &CollisionSnapshot) {
        (&mut *self.scene, &self.profiles)
    }

    /// Restores class defaults and overlap flags.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        let restored = self
            .profiles
            .restore(self.scene.classes_mut(), &self.classes);
        self.overlap_events.restore(&mut *self.scene);
        restored
    }
}

impl<S: Scene + ?Sized> Deref for PlacementScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.scene
    }
}

impl<S: Scene + ?Sized> DerefMut for PlacementScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.scene
    }
}

impl<S: Scene + ?Sized> Drop for PlacementScope<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.restore() {
            error!("failed to restore collision state after an interrupted placement pass: {err}");
        }
    }
}
