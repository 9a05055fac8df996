use std::collections::BTreeSet;

use crate::dynamics::BodyId;
use crate::events::ShapeRef;

/// Unordered shape pair, stored with the smaller reference first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ShapePairKey {
    pub a: ShapeRef,
    pub b: ShapeRef,
}

impl ShapePairKey {
    pub fn new(a: ShapeRef, b: ShapeRef) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }
}

/// Remembers which shape pairs overlapped during the previous and the
/// current step, to derive begin/end contact transitions.
#[derive(Clone, Debug, Default)]
pub struct OverlapKeeper {
    last: BTreeSet<ShapePairKey>,
    current: BTreeSet<ShapePairKey>,
}

impl OverlapKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new step: current overlaps become the previous ones.
    pub fn tick(&mut self) {
        std::mem::swap(&mut self.last, &mut self.current);
        self.current.clear();
    }

    pub fn set_overlapping(&mut self, a: ShapeRef, b: ShapeRef) {
        self.current.insert(ShapePairKey::new(a, b));
    }

    /// Pairs overlapping now that were apart last step.
    pub fn new_overlaps(&self) -> impl Iterator<Item = ShapePairKey> + '_ {
        self.current.difference(&self.last).copied()
    }

    /// Pairs that overlapped last step and no longer do.
    pub fn end_overlaps(&self) -> impl Iterator<Item = ShapePairKey> + '_ {
        self.last.difference(&self.current).copied()
    }

    pub fn bodies_are_overlapping(&self, a: BodyId, b: BodyId) -> bool {
        self.current
            .iter()
            .any(|k| (k.a.body == a && k.b.body == b) || (k.a.body == b && k.b.body == a))
    }

    /// Drop every pair involving `body`, e.g. when it leaves the world.
    pub fn remove_body(&mut self, body: BodyId) {
        self.last.retain(|k| k.a.body != body && k.b.body != body);
        self.current.retain(|k| k.a.body != body && k.b.body != body);
    }

    pub fn clear(&mut self) {
        self.last.clear();
        self.current.clear();
    }
}
