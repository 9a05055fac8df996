//! Scalar velocity constraints.
//!
//! Every equation couples two bodies through a 6-component Jacobian
//! `[vA.x, vA.y, wA, vB.x, vB.y, wB]`. What varies between kinds is how the
//! position error and the Jacobian are computed, which is the job of
//! [`ConstraintFunction`].

pub mod contact;
pub mod linear;
pub mod rotational;

pub use contact::{ContactEquation, FrictionEquation};
pub use linear::{DistanceEquation, PivotAxisEquation, PrismaticAxisEquation, VelocityEquation};
pub use rotational::{AngleLockEquation, RotationalLockEquation, RotationalVelocityEquation};

use crate::dynamics::Body;
use crate::dynamics::world::bodies_two_mut;
use crate::math::Vec2;
use crate::utils::Poolable;

pub const DEFAULT_STIFFNESS: f32 = 1e6;
pub const DEFAULT_RELAXATION: f32 = 4.0;

pub trait ConstraintFunction {
    /// Write the Jacobian into `g` and return the position error `Gq`.
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32;
}

#[derive(Clone, Debug, PartialEq)]
pub enum EquationKind {
    Contact(ContactEquation),
    Friction(FrictionEquation),
    Distance(DistanceEquation),
    AngleLock(AngleLockEquation),
    RotationalLock(RotationalLockEquation),
    RotationalVelocity(RotationalVelocityEquation),
    Velocity(VelocityEquation),
    PivotAxis(PivotAxisEquation),
    PrismaticAxis(PrismaticAxisEquation),
}

impl EquationKind {
    fn function(&self) -> &dyn ConstraintFunction {
        match self {
            EquationKind::Contact(e) => e,
            EquationKind::Friction(e) => e,
            EquationKind::Distance(e) => e,
            EquationKind::AngleLock(e) => e,
            EquationKind::RotationalLock(e) => e,
            EquationKind::RotationalVelocity(e) => e,
            EquationKind::Velocity(e) => e,
            EquationKind::PivotAxis(e) => e,
            EquationKind::PrismaticAxis(e) => e,
        }
    }
}

impl Default for EquationKind {
    fn default() -> Self {
        EquationKind::Contact(ContactEquation::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    /// Indices into the world's body list, rebound every step.
    pub body_a: usize,
    pub body_b: usize,
    pub min_force: f32,
    pub max_force: f32,
    pub g: [f32; 6],
    pub stiffness: f32,
    pub relaxation: f32,
    /// Added to `G * W`; motors and conveyor surfaces use it as a target speed.
    pub relative_velocity: f32,
    pub enabled: bool,
    pub needs_update: bool,
    /// Force applied by the last solve.
    pub multiplier: f32,
    pub kind: EquationKind,
    a: f32,
    b: f32,
    epsilon: f32,
    time_step: f32,
}

impl Default for Equation {
    fn default() -> Self {
        Self {
            body_a: 0,
            body_b: 0,
            min_force: -f32::MAX,
            max_force: f32::MAX,
            g: [0.0; 6],
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
            relative_velocity: 0.0,
            enabled: true,
            needs_update: true,
            multiplier: 0.0,
            kind: EquationKind::default(),
            a: 0.0,
            b: 0.0,
            epsilon: 0.0,
            time_step: 1.0 / 60.0,
        }
    }
}

impl Poolable for Equation {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Equation {
    pub fn new(body_a: usize, body_b: usize, min_force: f32, max_force: f32, kind: EquationKind) -> Self {
        Self {
            body_a,
            body_b,
            min_force,
            max_force,
            kind,
            ..Self::default()
        }
    }

    pub fn set_max_force(&mut self, force: f32) {
        self.max_force = force;
        self.min_force = -force;
    }

    #[inline]
    pub fn spook_params(&self) -> (f32, f32, f32) {
        (self.a, self.b, self.epsilon)
    }

    /// Recompute the SPOOK parameters from stiffness, relaxation and time step.
    pub fn update(&mut self) {
        let k = self.stiffness;
        let d = self.relaxation;
        let h = self.time_step;

        self.a = 4.0 / (h * (1.0 + 4.0 * d));
        self.b = (4.0 * d) / (1.0 + 4.0 * d);
        self.epsilon = 4.0 / (h * h * k * (1.0 + 4.0 * d));
        self.needs_update = false;
    }

    /// Refresh SPOOK parameters if the step size or stiffness changed.
    pub fn prepare(&mut self, h: f32) {
        if self.needs_update || self.time_step != h {
            self.time_step = h;
            self.update();
        }
    }

    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Recompute the Jacobian from the current body state and return `Gq`.
    pub fn update_jacobian(&mut self, bodies: &[Body]) -> f32 {
        let (a, b) = (&bodies[self.body_a], &bodies[self.body_b]);
        self.kind.function().compute_gq_and_jacobian(&mut self.g, a, b)
    }

    /// Right-hand side `B = -Gq * a - GW * b - h * GiMf`.
    pub fn compute_b(&mut self, bodies: &[Body], h: f32) -> f32 {
        let gq = self.update_jacobian(bodies);
        let (a, b) = (&bodies[self.body_a], &bodies[self.body_b]);
        let gw = self.compute_gw(a, b);
        let gimf = self.compute_gimf(a, b);

        let (gq, gw) = match &self.kind {
            EquationKind::Contact(c) if c.first_impact && c.restitution != 0.0 => {
                (0.0, (1.0 / self.b) * (1.0 + c.restitution) * gw)
            }
            _ => (gq, gw),
        };

        -gq * self.a - gw * self.b - h * gimf
    }

    #[inline]
    fn gmult(&self, va: Vec2, wa: f32, vb: Vec2, wb: f32) -> f32 {
        let g = &self.g;
        g[0] * va.x + g[1] * va.y + g[2] * wa + g[3] * vb.x + g[4] * vb.y + g[5] * wb
    }

    /// Constraint velocity `G * W`, biased by `relative_velocity`.
    pub fn compute_gw(&self, a: &Body, b: &Body) -> f32 {
        self.gmult(a.velocity, a.angular_velocity, b.velocity, b.angular_velocity) + self.relative_velocity
    }

    /// `G * W` over the velocity deltas accumulated by the solver.
    pub fn compute_gw_lambda(&self, a: &Body, b: &Body) -> f32 {
        self.gmult(a.vlambda, a.wlambda, b.vlambda, b.wlambda)
    }

    /// `G * M^-1 * f`, the constraint velocity the external forces would add.
    pub fn compute_gimf(&self, a: &Body, b: &Body) -> f32 {
        self.gmult(
            a.force * a.inv_mass_solve,
            a.torque * a.inv_inertia_solve,
            b.force * b.inv_mass_solve,
            b.torque * b.inv_inertia_solve,
        )
    }

    /// `G * M^-1 * G^T`, the effective inverse mass along the constraint.
    pub fn compute_gimgt(&self, a: &Body, b: &Body) -> f32 {
        let g = &self.g;
        g[0] * g[0] * a.inv_mass_solve
            + g[1] * g[1] * a.inv_mass_solve
            + g[2] * g[2] * a.inv_inertia_solve
            + g[3] * g[3] * b.inv_mass_solve
            + g[4] * g[4] * b.inv_mass_solve
            + g[5] * g[5] * b.inv_inertia_solve
    }

    pub fn compute_inv_c(&self, a: &Body, b: &Body, eps: f32) -> f32 {
        let c = self.compute_gimgt(a, b) + eps;
        if c > 0.0 { 1.0 / c } else { 0.0 }
    }

    /// Push an impulse change onto both bodies' accumulated velocity deltas.
    pub fn add_to_wlambda(&self, bodies: &mut [Body], delta_lambda: f32) {
        let g = &self.g;
        let (a, b) = bodies_two_mut(bodies, self.body_a, self.body_b);

        a.vlambda += Vec2::new(g[0], g[1]) * (a.inv_mass_solve * delta_lambda);
        a.wlambda += a.inv_inertia_solve * g[2] * delta_lambda;

        b.vlambda += Vec2::new(g[3], g[4]) * (b.inv_mass_solve * delta_lambda);
        b.wlambda += b.inv_inertia_solve * g[5] * delta_lambda;
    }

    pub fn contact(&self) -> Option<&ContactEquation> {
        match &self.kind {
            EquationKind::Contact(c) => Some(c),
            _ => None,
        }
    }

    pub fn contact_mut(&mut self) -> Option<&mut ContactEquation> {
        match &mut self.kind {
            EquationKind::Contact(c) => Some(c),
            _ => None,
        }
    }

    pub fn friction(&self) -> Option<&FrictionEquation> {
        match &self.kind {
            EquationKind::Friction(f) => Some(f),
            _ => None,
        }
    }
}
