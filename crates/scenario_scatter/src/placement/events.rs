//! Events emitted while a placement pass runs, and sinks that receive them.
//!
//! [`crate::placement::PlacementEngine::place`] reports each stage of a pass through an
//! [`EventSink`]. Pass `&mut ()` to ignore them, a [`VecSink`] to collect them, or a
//! [`FnSink`] to react inline.
use crate::geometry::Transform;
use crate::placement::SkipReason;
use crate::scene::{ActorId, ClassId};

/// Describes events emitted by a placement pass.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementEvent {
    /// Emitted once the request has been validated.
    PassStarted {
        /// Distinct candidate classes, in first-occurrence order.
        classes: Vec<ClassId>,
        /// Number of target transforms in the pass.
        target_count: usize,
        seed: u64,
    },

    /// A class identity appeared more than once in the candidate list.
    DuplicateClass { class: ClassId },

    /// The class drawn for a target, before any spawn attempt.
    ClassChosen { target_index: usize, class: ClassId },

    /// An instance survived the pass.
    InstancePlaced {
        target_index: usize,
        class: ClassId,
        actor: ActorId,
        transform: Transform,
    },

    /// No instance remains at this target.
    TargetSkipped {
        target_index: usize,
        class: ClassId,
        reason: SkipReason,
    },

    /// Non-fatal warning generated during the pass.
    Warning { context: String, message: String },

    /// Emitted after class defaults and overlap flags have been restored.
    PassFinished { placed: usize, rejected: usize },
}

/// Discriminant of [`PlacementEvent`], used by sinks to opt out of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementEventKind {
    PassStarted,
    DuplicateClass,
    ClassChosen,
    InstancePlaced,
    TargetSkipped,
    Warning,
    PassFinished,
}

impl PlacementEvent {
    pub fn kind(&self) -> PlacementEventKind {
        match self {
            PlacementEvent::PassStarted { .. } => PlacementEventKind::PassStarted,
            PlacementEvent::DuplicateClass { .. } => PlacementEventKind::DuplicateClass,
            PlacementEvent::ClassChosen { .. } => PlacementEventKind::ClassChosen,
            PlacementEvent::InstancePlaced { .. } => PlacementEventKind::InstancePlaced,
            PlacementEvent::TargetSkipped { .. } => PlacementEventKind::TargetSkipped,
            PlacementEvent::Warning { .. } => PlacementEventKind::Warning,
            PlacementEvent::PassFinished { .. } => PlacementEventKind::PassFinished,
        }
    }
}

/// A generic event sink that accepts [`PlacementEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PlacementEvent);

    /// Lets the emitter skip building events nobody listens to.
    #[inline]
    fn wants(&mut self, _kind: PlacementEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = PlacementEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PlacementEvent) {}

    #[inline]
    fn wants(&mut self, _kind: PlacementEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PlacementEvent),
{
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally restricted to some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PlacementEvent>,
    only: Option<Vec<PlacementEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects only events of the listed kinds.
    pub fn only(kinds: &[PlacementEventKind]) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.to_vec()),
        }
    }

    pub fn into_inner(self) -> Vec<PlacementEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PlacementEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Classes drawn per target, in draw order.
    pub fn chosen_classes(&self) -> Vec<ClassId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PlacementEvent::ClassChosen { class, .. } => Some(class.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: PlacementEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&mut self, kind: PlacementEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn sinks(&self) -> &[S] {
        &self.sinks
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: PlacementEvent) {
        let Some((last, rest)) = self.sinks.split_last_mut() else {
            return;
        };
        for sink in rest {
            sink.send(event.clone());
        }
        last.send(event);
    }

    fn wants(&mut self, kind: PlacementEventKind) -> bool {
        self.sinks.iter_mut().any(|s| s.wants(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> PlacementEvent {
        PlacementEvent::Warning {
            context: context.into(),
            message: "m".into(),
        }
    }

    #[test]
    fn unit_sink_wants_nothing() {
        let mut sink = ();
        assert!(!sink.wants(PlacementEventKind::Warning));
        sink.send(warning("a"));
    }

    #[test]
    fn vec_sink_filters_by_kind() {
        let mut sink = VecSink::only(&[PlacementEventKind::ClassChosen]);
        sink.send(warning("a"));
        sink.send(PlacementEvent::ClassChosen {
            target_index: 0,
            class: "/Game/Cone".into(),
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.chosen_classes(), vec!["/Game/Cone".to_owned()]);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![VecSink::new(), VecSink::new()]);
        multi.send(warning("ctx"));
        assert_eq!(multi.len(), 2);
        assert_eq!(multi.sinks()[0].len(), 1);
        assert_eq!(multi.sinks()[1].as_slice(), &[warning("ctx")]);
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        sink.send_many([warning("a"), warning("b")]);
        drop(sink);
        assert_eq!(count, 3);
    }
}
