//! Candidate-class bookkeeping for a placement pass: deduplication and the uniform draw
//! made once per target.
use std::collections::HashSet;

use rand::RngCore;

use crate::scene::ClassId;

/// Splits `classes` into distinct identities (first-seen order) and the repeated ones.
pub fn dedup_classes(classes: &[ClassId]) -> (Vec<ClassId>, Vec<ClassId>) {
    let mut seen = HashSet::with_capacity(classes.len());
    let mut unique = Vec::with_capacity(classes.len());
    let mut duplicates = Vec::new();
    for class in classes {
        if seen.insert(class.as_str()) {
            unique.push(class.clone());
        } else {
            duplicates.push(class.clone());
        }
    }
    (unique, duplicates)
}

/// Uniform index in `0..len` from one 32-bit draw.
#[inline]
pub(crate) fn uniform_index(rng: &mut dyn RngCore, len: usize) -> usize {
    ((rng.next_u32() as u64 * len as u64) >> 32) as usize
}

/// Picks the class for one target. A single candidate is returned without touching the
/// generator, so adding targets never shifts the draws of a one-class pass.
pub fn pick_class<'c>(classes: &'c [ClassId], rng: &mut dyn RngCore) -> Option<&'c ClassId> {
    match classes.len() {
        0 => None,
        1 => classes.first(),
        len => classes.get(uniform_index(rng, len)),
    }
}
