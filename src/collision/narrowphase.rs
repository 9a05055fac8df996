//! Exact shape-pair tests that turn touching shapes into contact and
//! friction equations.
//!
//! Equations come from two pools owned by the narrowphase. `reset` returns
//! every equation handed out during the previous step before new ones are
//! drawn, so equation storage is reused from step to step.

use std::collections::BTreeSet;

use crate::collision::collide::{self, ContactPoint, ShapePose};
use crate::dynamics::{Body, BodyId, ContactMaterial};
use crate::equations::{ContactEquation, Equation, EquationKind, FrictionEquation};
use crate::shapes::Shape;
use crate::utils::{Pool, PoolHandle};

/// Unordered body pair, smaller id first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BodyPairKey(pub BodyId, pub BodyId);

impl BodyPairKey {
    #[inline]
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Parameters applied to every equation generated for the current pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactParams {
    pub friction: f32,
    pub restitution: f32,
    pub stiffness: f32,
    pub relaxation: f32,
    pub friction_stiffness: f32,
    pub friction_relaxation: f32,
    pub surface_velocity: f32,
    pub contact_skin_size: f32,
    /// Normal force used to derive the slip force from the friction coefficient.
    pub friction_gravity: f32,
    pub enable_friction: bool,
}

impl ContactParams {
    pub fn from_material(material: &ContactMaterial, friction_gravity: f32) -> Self {
        Self {
            friction: material.friction,
            restitution: material.restitution,
            stiffness: material.stiffness,
            relaxation: material.relaxation,
            friction_stiffness: material.friction_stiffness,
            friction_relaxation: material.friction_relaxation,
            surface_velocity: material.surface_velocity,
            contact_skin_size: material.contact_skin_size,
            friction_gravity,
            enable_friction: material.friction > 0.0,
        }
    }
}

impl Default for ContactParams {
    fn default() -> Self {
        Self::from_material(&ContactMaterial::default(), 10.0)
    }
}

/// One side of a shape pair: the shape, its body and the body's index in
/// the world.
#[derive(Copy, Clone, Debug)]
pub struct CollisionSide<'a> {
    pub index: usize,
    pub body: &'a Body,
    pub shape: &'a Shape,
}

#[derive(Debug)]
pub struct Narrowphase {
    pub params: ContactParams,
    contact_pool: Pool<Equation>,
    friction_pool: Pool<Equation>,
    contact_equations: Vec<PoolHandle>,
    friction_equations: Vec<PoolHandle>,
    colliding_last_step: BTreeSet<BodyPairKey>,
    colliding_this_step: BTreeSet<BodyPairKey>,
    scratch: Vec<ContactPoint>,
}

impl Default for Narrowphase {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl Narrowphase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrowphase with `size` equations preallocated in each pool.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            params: ContactParams::default(),
            contact_pool: Pool::with_capacity(size),
            friction_pool: Pool::with_capacity(size),
            contact_equations: Vec::new(),
            friction_equations: Vec::new(),
            colliding_last_step: BTreeSet::new(),
            colliding_this_step: BTreeSet::new(),
            scratch: Vec::new(),
        }
    }

    /// Release all equations and remember which bodies touched.
    pub fn reset(&mut self) {
        std::mem::swap(&mut self.colliding_last_step, &mut self.colliding_this_step);
        self.colliding_this_step.clear();

        for h in self.contact_equations.drain(..) {
            self.contact_pool.release(h);
        }
        for h in self.friction_equations.drain(..) {
            self.friction_pool.release(h);
        }
    }

    pub fn colliding_last_step(&self, a: BodyId, b: BodyId) -> bool {
        self.colliding_last_step.contains(&BodyPairKey::new(a, b))
    }

    /// Test a shape pair. Returns the number of contact points; unless
    /// `test_only` is set, one contact (and optionally one friction)
    /// equation is created per point.
    pub fn collide(&mut self, a: CollisionSide<'_>, b: CollisionSide<'_>, test_only: bool) -> usize {
        let (a, b) = if a.shape.shape_type().flag() > b.shape.shape_type().flag() {
            (b, a)
        } else {
            (a, b)
        };

        let (pos_a, angle_a) = a.body.shape_world_transform(a.shape);
        let (pos_b, angle_b) = b.body.shape_world_transform(b.shape);

        let mut points = std::mem::take(&mut self.scratch);
        points.clear();
        collide::collide(
            &mut points,
            ShapePose {
                kind: a.shape.kind(),
                position: pos_a,
                angle: angle_a,
            },
            ShapePose {
                kind: b.shape.kind(),
                position: pos_b,
                angle: angle_b,
            },
        );

        let count = points.len();
        if !test_only && count > 0 {
            self.create_equations(&a, &b, &points);
        }
        self.scratch = points;
        count
    }

    fn create_equations(&mut self, a: &CollisionSide<'_>, b: &CollisionSide<'_>, points: &[ContactPoint]) {
        let key = BodyPairKey::new(a.body.id, b.body.id);
        let first_impact = !self.colliding_last_step.contains(&key);
        self.colliding_this_step.insert(key);

        let p = self.params;
        let inv_mass_sum = a.body.inv_mass() + b.body.inv_mass();
        let reduced_mass = if inv_mass_sum > 0.0 { 1.0 / inv_mass_sum } else { 0.0 };
        let slip_force = p.friction * p.friction_gravity * reduced_mass;

        for cp in points {
            let contact_point_a = cp.world_a - a.body.position();
            let contact_point_b = cp.world_b - b.body.position();

            let h = self.contact_pool.get();
            let eq = self.contact_pool.get_mut(h);
            eq.body_a = a.index;
            eq.body_b = b.index;
            eq.min_force = 0.0;
            eq.max_force = f32::MAX;
            eq.stiffness = p.stiffness;
            eq.relaxation = p.relaxation;
            eq.needs_update = true;
            eq.kind = EquationKind::Contact(ContactEquation {
                contact_point_a,
                contact_point_b,
                normal_a: cp.normal,
                restitution: p.restitution,
                first_impact,
                offset: p.contact_skin_size,
                shape_a: Some(a.shape.id),
                shape_b: Some(b.shape.id),
            });
            self.contact_equations.push(h);

            if !p.enable_friction {
                continue;
            }

            let h = self.friction_pool.get();
            let eq = self.friction_pool.get_mut(h);
            eq.body_a = a.index;
            eq.body_b = b.index;
            eq.set_max_force(slip_force);
            eq.stiffness = p.friction_stiffness;
            eq.relaxation = p.friction_relaxation;
            eq.relative_velocity = p.surface_velocity;
            eq.needs_update = true;
            eq.kind = EquationKind::Friction(FrictionEquation {
                contact_point_a,
                contact_point_b,
                t: cp.normal.rotate90cw(),
                friction_coefficient: p.friction,
                shape_a: Some(a.shape.id),
                shape_b: Some(b.shape.id),
            });
            self.friction_equations.push(h);
        }
    }

    pub fn contact_equations(&self) -> impl Iterator<Item = &Equation> + '_ {
        self.contact_equations.iter().map(|&h| self.contact_pool.get_ref(h))
    }

    pub fn friction_equations(&self) -> impl Iterator<Item = &Equation> + '_ {
        self.friction_equations.iter().map(|&h| self.friction_pool.get_ref(h))
    }

    /// Handles of the live contact equations, in creation order.
    pub fn contact_handles(&self) -> &[PoolHandle] {
        &self.contact_equations
    }

    pub fn friction_handles(&self) -> &[PoolHandle] {
        &self.friction_equations
    }

    /// Mutable access to all live equations: contacts first, then friction.
    pub fn equations_mut(&mut self) -> Vec<&mut Equation> {
        let mut all = self.contact_pool.get_many_mut(&self.contact_equations);
        all.extend(self.friction_pool.get_many_mut(&self.friction_equations));
        all
    }

    pub fn contact_count(&self) -> usize {
        self.contact_equations.len()
    }

    pub fn friction_count(&self) -> usize {
        self.friction_equations.len()
    }

    /// Forget contact history and drop all issued equations.
    pub fn clear(&mut self) {
        self.reset();
        self.colliding_last_step.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyDef;
    use crate::math::Vec2;
    use approx::assert_relative_eq;

    fn body(x: f32, y: f32, mass: f32, shape: Shape) -> Body {
        let mut b = Body::from_def(BodyDef {
            position: Vec2::new(x, y),
            mass,
            ..Default::default()
        });
        b.add_shape(shape, Vec2::ZERO, 0.0);
        b
    }

    fn side(index: usize, body: &Body) -> CollisionSide<'_> {
        CollisionSide {
            index,
            body,
            shape: &body.shapes()[0],
        }
    }

    #[test]
    fn contact_and_friction_per_point() {
        let a = body(0.0, 0.0, 1.0, Shape::circle(1.0));
        let b = body(1.4, 0.0, 1.0, Shape::circle(1.0));
        let mut np = Narrowphase::new();

        let n = np.collide(side(0, &a), side(1, &b), false);
        assert_eq!(n, 1);
        assert_eq!(np.contact_count(), 1);
        assert_eq!(np.friction_count(), 1);

        let eq = np.contact_equations().next().unwrap();
        let c = eq.contact().unwrap();
        assert!(c.first_impact);
        assert_relative_eq!(c.normal_a, Vec2::X, epsilon = 1e-6);
        assert_relative_eq!(c.contact_point_a, Vec2::new(1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(c.contact_point_b, Vec2::new(-1.0, 0.0), epsilon = 1e-6);

        // Slip force: mu * g * reduced mass = 0.3 * 10 * 0.5
        let f = np.friction_equations().next().unwrap();
        assert_relative_eq!(f.max_force, 1.5, epsilon = 1e-6);
        assert_relative_eq!(f.min_force, -1.5, epsilon = 1e-6);
    }

    #[test]
    fn pair_is_ordered_by_type_flag() {
        let ground = body(0.0, 0.0, 0.0, Shape::plane());
        let ball = body(0.0, 0.5, 1.0, Shape::circle(1.0));
        let mut np = Narrowphase::new();

        assert_eq!(np.collide(side(0, &ground), side(1, &ball), false), 1);
        let eq = np.contact_equations().next().unwrap();
        // Circle has the lower flag, so it becomes body A.
        assert_eq!((eq.body_a, eq.body_b), (1, 0));
    }

    #[test]
    fn test_only_creates_nothing() {
        let a = body(0.0, 0.0, 1.0, Shape::circle(1.0));
        let b = body(1.0, 0.0, 1.0, Shape::circle(1.0));
        let mut np = Narrowphase::new();

        assert_eq!(np.collide(side(0, &a), side(1, &b), true), 1);
        assert_eq!(np.contact_count(), 0);
    }

    #[test]
    fn first_impact_only_on_first_step() {
        let a = body(0.0, 0.0, 1.0, Shape::circle(1.0));
        let b = body(1.5, 0.0, 1.0, Shape::circle(1.0));
        let mut np = Narrowphase::new();

        np.reset();
        np.collide(side(0, &a), side(1, &b), false);
        np.reset();
        assert!(np.colliding_last_step(b.id, a.id));
        np.collide(side(0, &a), side(1, &b), false);

        let c = np.contact_equations().next().unwrap().contact().unwrap().clone();
        assert!(!c.first_impact);
    }

    #[test]
    fn reset_reuses_pooled_equations() {
        let a = body(0.0, 0.0, 1.0, Shape::circle(1.0));
        let b = body(1.5, 0.0, 1.0, Shape::circle(1.0));
        let mut np = Narrowphase::with_capacity(0);

        np.collide(side(0, &a), side(1, &b), false);
        let first = np.contact_handles().to_vec();
        np.reset();
        np.collide(side(0, &a), side(1, &b), false);
        assert_eq!(np.contact_handles(), first.as_slice());
    }

    #[test]
    fn no_friction_without_coefficient() {
        let a = body(0.0, 0.0, 1.0, Shape::circle(1.0));
        let b = body(1.5, 0.0, 1.0, Shape::circle(1.0));
        let mut np = Narrowphase::new();
        np.params.enable_friction = false;

        np.collide(side(0, &a), side(1, &b), false);
        assert_eq!(np.friction_count(), 0);
        assert_eq!(np.equations_mut().len(), 1);
    }
}
