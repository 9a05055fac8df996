//! Joints built from one or more equations.
//!
//! A constraint owns every equation it may ever need. Equations that only
//! apply part of the time (limits, motors) are switched in and out of the
//! active set during `update`; none are created or dropped after
//! construction.

pub mod distance;
pub mod gear;
pub mod prismatic;
pub mod revolute;

use std::sync::atomic::{AtomicU32, Ordering};

pub use distance::{DistanceConstraint, DistanceConstraintDef};
pub use gear::{GearConstraint, GearConstraintDef};
pub use prismatic::{PrismaticConstraint, PrismaticConstraintDef};
pub use revolute::{RevoluteConstraint, RevoluteConstraintDef};

use crate::dynamics::{Body, BodyId};
use crate::equations::Equation;

static NEXT_CONSTRAINT_ID: AtomicU32 = AtomicU32::new(0);

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub u32);

impl ConstraintId {
    fn next() -> Self {
        Self(NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// All equations of a constraint plus the ordered list of active slots.
#[derive(Clone, Debug, Default)]
pub struct EquationSet {
    all: Vec<Equation>,
    active: Vec<usize>,
}

impl EquationSet {
    pub fn push(&mut self, eq: Equation, active: bool) -> usize {
        let slot = self.all.len();
        self.all.push(eq);
        if active {
            self.active.push(slot);
        }
        slot
    }

    pub fn activate(&mut self, slot: usize) {
        if !self.active.contains(&slot) {
            self.active.push(slot);
        }
    }

    pub fn deactivate(&mut self, slot: usize) {
        self.active.retain(|&s| s != slot);
    }

    #[inline]
    pub fn is_active(&self, slot: usize) -> bool {
        self.active.contains(&slot)
    }

    #[inline]
    pub fn get(&self, slot: usize) -> &Equation {
        &self.all[slot]
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> &mut Equation {
        &mut self.all[slot]
    }

    /// Active equations in activation order.
    pub fn active(&self) -> impl Iterator<Item = &Equation> + '_ {
        self.active.iter().map(|&s| &self.all[s])
    }

    /// Same order as [`active`](Self::active).
    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Equation> + '_ {
        let mut slots: Vec<Option<&mut Equation>> = self.all.iter_mut().map(Some).collect();
        self.active.iter().filter_map(move |&s| slots[s].take())
    }

    pub fn all(&self) -> &[Equation] {
        &self.all
    }

    pub fn all_mut(&mut self) -> &mut [Equation] {
        &mut self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[derive(Clone, Debug)]
pub enum ConstraintKind {
    Distance(DistanceConstraint),
    Gear(GearConstraint),
    Prismatic(PrismaticConstraint),
    Revolute(RevoluteConstraint),
}

impl ConstraintKind {
    fn update(&mut self, equations: &mut EquationSet, a: &Body, b: &Body) {
        match self {
            ConstraintKind::Distance(c) => c.update(equations, a, b),
            ConstraintKind::Gear(c) => c.update(equations),
            ConstraintKind::Prismatic(c) => c.update(equations, a, b),
            ConstraintKind::Revolute(c) => c.update(equations, a, b),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Distance(_) => "distance",
            ConstraintKind::Gear(_) => "gear",
            ConstraintKind::Prismatic(_) => "prismatic",
            ConstraintKind::Revolute(_) => "revolute",
        }
    }
}

/// Construction parameters for any constraint kind.
#[derive(Clone, Debug)]
pub enum ConstraintDef {
    Distance(DistanceConstraintDef),
    Gear(GearConstraintDef),
    Prismatic(PrismaticConstraintDef),
    Revolute(RevoluteConstraintDef),
}

impl ConstraintDef {
    pub fn bodies(&self) -> (BodyId, BodyId) {
        match self {
            ConstraintDef::Distance(d) => (d.body_a, d.body_b),
            ConstraintDef::Gear(d) => (d.body_a, d.body_b),
            ConstraintDef::Prismatic(d) => (d.body_a, d.body_b),
            ConstraintDef::Revolute(d) => (d.body_a, d.body_b),
        }
    }

    fn collide_connected(&self) -> bool {
        match self {
            ConstraintDef::Distance(d) => d.collide_connected,
            ConstraintDef::Gear(d) => d.collide_connected,
            ConstraintDef::Prismatic(d) => d.collide_connected,
            ConstraintDef::Revolute(d) => d.collide_connected,
        }
    }
}

impl From<DistanceConstraintDef> for ConstraintDef {
    fn from(def: DistanceConstraintDef) -> Self {
        ConstraintDef::Distance(def)
    }
}

impl From<GearConstraintDef> for ConstraintDef {
    fn from(def: GearConstraintDef) -> Self {
        ConstraintDef::Gear(def)
    }
}

impl From<PrismaticConstraintDef> for ConstraintDef {
    fn from(def: PrismaticConstraintDef) -> Self {
        ConstraintDef::Prismatic(def)
    }
}

impl From<RevoluteConstraintDef> for ConstraintDef {
    fn from(def: RevoluteConstraintDef) -> Self {
        ConstraintDef::Revolute(def)
    }
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub id: ConstraintId,
    body_a: BodyId,
    body_b: BodyId,
    /// When false, the two bodies are never tested for contact.
    pub collide_connected: bool,
    /// Wake both bodies when the constraint is added to a world.
    pub wake_up_bodies: bool,
    equations: EquationSet,
    kind: ConstraintKind,
}

impl Constraint {
    /// Build a constraint between `a` and `b`, which must be the bodies
    /// named by `def`.
    pub fn from_def(def: &ConstraintDef, a: &Body, b: &Body) -> Self {
        let (kind, equations) = match def {
            ConstraintDef::Distance(d) => {
                let (c, eqs) = DistanceConstraint::from_def(d, a, b);
                (ConstraintKind::Distance(c), eqs)
            }
            ConstraintDef::Gear(d) => {
                let (c, eqs) = GearConstraint::from_def(d, a, b);
                (ConstraintKind::Gear(c), eqs)
            }
            ConstraintDef::Prismatic(d) => {
                let (c, eqs) = PrismaticConstraint::from_def(d);
                (ConstraintKind::Prismatic(c), eqs)
            }
            ConstraintDef::Revolute(d) => {
                let (c, eqs) = RevoluteConstraint::from_def(d, a, b);
                (ConstraintKind::Revolute(c), eqs)
            }
        };

        Self {
            id: ConstraintId::next(),
            body_a: a.id,
            body_b: b.id,
            collide_connected: def.collide_connected(),
            wake_up_bodies: true,
            equations,
            kind,
        }
    }

    #[inline]
    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    #[inline]
    pub fn body_b(&self) -> BodyId {
        self.body_b
    }

    pub fn connects(&self, a: BodyId, b: BodyId) -> bool {
        (self.body_a == a && self.body_b == b) || (self.body_a == b && self.body_b == a)
    }

    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }

    #[inline]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    #[inline]
    pub fn kind_mut(&mut self) -> &mut ConstraintKind {
        &mut self.kind
    }

    pub fn equations(&self) -> &EquationSet {
        &self.equations
    }

    /// Bind the equations to the bodies' current indices and refresh
    /// the active set from the bodies' state.
    pub fn update(&mut self, bodies: &[Body], index_a: usize, index_b: usize) {
        for eq in self.equations.all_mut() {
            eq.body_a = index_a;
            eq.body_b = index_b;
        }
        self.kind
            .update(&mut self.equations, &bodies[index_a], &bodies[index_b]);
    }

    /// Active, enabled equations, ready for the solver.
    pub fn solver_equations(&mut self) -> impl Iterator<Item = &mut Equation> + '_ {
        self.equations.active_mut().filter(|eq| eq.enabled)
    }

    pub fn set_stiffness(&mut self, stiffness: f32) {
        for eq in self.equations.all_mut() {
            eq.stiffness = stiffness;
            eq.needs_update = true;
        }
    }

    pub fn set_relaxation(&mut self, relaxation: f32) {
        for eq in self.equations.all_mut() {
            eq.relaxation = relaxation;
            eq.needs_update = true;
        }
    }

    pub fn enable_motor(&mut self) {
        match &mut self.kind {
            ConstraintKind::Prismatic(c) => c.motor_enabled = true,
            ConstraintKind::Revolute(c) => c.motor_enabled = true,
            other => log::warn!("A {} constraint has no motor.", other.name()),
        }
    }

    pub fn disable_motor(&mut self) {
        match &mut self.kind {
            ConstraintKind::Prismatic(c) => c.motor_enabled = false,
            ConstraintKind::Revolute(c) => c.motor_enabled = false,
            other => log::warn!("A {} constraint has no motor.", other.name()),
        }
    }

    /// Target relative speed of body B with respect to body A.
    pub fn set_motor_speed(&mut self, speed: f32) {
        match &mut self.kind {
            ConstraintKind::Prismatic(c) => c.motor_speed = speed,
            ConstraintKind::Revolute(c) => c.motor_speed = speed,
            other => log::warn!("A {} constraint has no motor.", other.name()),
        }
    }

    /// Limits on the constraint's position coordinate: travel for
    /// prismatic, relative angle for revolute, length for distance.
    pub fn set_limits(&mut self, lower: Option<f32>, upper: Option<f32>) {
        match &mut self.kind {
            ConstraintKind::Distance(c) => (c.lower_limit, c.upper_limit) = (lower, upper),
            ConstraintKind::Prismatic(c) => (c.lower_limit, c.upper_limit) = (lower, upper),
            ConstraintKind::Revolute(c) => (c.lower_limit, c.upper_limit) = (lower, upper),
            other => log::warn!("A {} constraint has no limits.", other.name()),
        }
    }

    pub fn as_distance(&self) -> Option<&DistanceConstraint> {
        match &self.kind {
            ConstraintKind::Distance(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gear(&self) -> Option<&GearConstraint> {
        match &self.kind {
            ConstraintKind::Gear(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_prismatic(&self) -> Option<&PrismaticConstraint> {
        match &self.kind {
            ConstraintKind::Prismatic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_revolute(&self) -> Option<&RevoluteConstraint> {
        match &self.kind {
            ConstraintKind::Revolute(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::EquationKind;

    #[test]
    fn slots_toggle_without_deleting() {
        let mut set = EquationSet::default();
        let a = set.push(Equation::default(), true);
        let b = set.push(Equation::new(0, 1, 0.0, 1.0, EquationKind::default()), false);

        assert_eq!(set.active().count(), 1);
        set.activate(b);
        set.activate(b);
        assert_eq!(set.active().count(), 2);

        set.deactivate(a);
        assert_eq!(set.len(), 2);
        assert!(!set.is_active(a));
        assert!(set.is_active(b));
        assert_eq!(set.active().next().map(|e| e.max_force), Some(1.0));
    }

    #[test]
    fn mutable_iteration_follows_activation_order() {
        let mut set = EquationSet::default();
        let slots: Vec<usize> = (0..3)
            .map(|i| set.push(Equation::new(0, 1, 0.0, i as f32, EquationKind::default()), false))
            .collect();
        set.activate(slots[2]);
        set.activate(slots[0]);

        let order: Vec<f32> = set.active().map(|e| e.max_force).collect();
        assert_eq!(order, vec![2.0, 0.0]);
        let order_mut: Vec<f32> = set.active_mut().map(|e| e.max_force).collect();
        assert_eq!(order_mut, order);
    }
}
