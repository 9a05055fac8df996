use crate::constraints::EquationSet;
use crate::dynamics::{Body, BodyId};
use crate::equations::{
    ContactEquation, Equation, EquationKind, PrismaticAxisEquation, RotationalLockEquation, VelocityEquation,
};
use crate::math::Vec2;

const TRANS: usize = 0;
const ROTATION: usize = 1;
const UPPER: usize = 2;
const LOWER: usize = 3;
const MOTOR: usize = 4;

#[derive(Copy, Clone, Debug)]
pub struct PrismaticConstraintDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Sliding axis in body A's frame.
    pub local_axis_a: Vec2,
    pub max_force: f32,
    pub disable_rotational_lock: bool,
    pub lower_limit: Option<f32>,
    pub upper_limit: Option<f32>,
    pub collide_connected: bool,
}

impl PrismaticConstraintDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            local_axis_a: Vec2::X,
            max_force: f32::MAX,
            disable_rotational_lock: false,
            lower_limit: None,
            upper_limit: None,
            collide_connected: true,
        }
    }
}

/// Lets body B slide along an axis fixed in body A.
#[derive(Clone, Debug)]
pub struct PrismaticConstraint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub lower_limit: Option<f32>,
    pub upper_limit: Option<f32>,
    pub motor_enabled: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,
    position: f32,
}

impl PrismaticConstraint {
    pub(crate) fn from_def(def: &PrismaticConstraintDef) -> (Self, EquationSet) {
        let max = def.max_force;
        let mut equations = EquationSet::default();

        equations.push(
            Equation::new(
                0,
                0,
                -max,
                max,
                EquationKind::PrismaticAxis(PrismaticAxisEquation {
                    local_anchor_a: def.local_anchor_a,
                    local_anchor_b: def.local_anchor_b,
                    local_axis_a: def.local_axis_a,
                }),
            ),
            true,
        );
        equations.push(
            Equation::new(0, 0, -max, max, EquationKind::RotationalLock(RotationalLockEquation::default())),
            !def.disable_rotational_lock,
        );
        for slot in [UPPER, LOWER] {
            let s = equations.push(
                Equation::new(0, 0, 0.0, max, EquationKind::Contact(ContactEquation::default())),
                false,
            );
            debug_assert_eq!(s, slot);
        }
        equations.push(
            Equation::new(
                0,
                0,
                -max,
                max,
                EquationKind::Velocity(VelocityEquation {
                    local_anchor_a: def.local_anchor_a,
                    local_anchor_b: def.local_anchor_b,
                    local_axis_a: def.local_axis_a,
                }),
            ),
            false,
        );

        let constraint = Self {
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            local_axis_a: def.local_axis_a,
            lower_limit: def.lower_limit,
            upper_limit: def.upper_limit,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_force: max,
            position: 0.0,
        };
        (constraint, equations)
    }

    /// Travel of anchor B along the axis, measured at the last update.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub(crate) fn update(&mut self, equations: &mut EquationSet, a: &Body, b: &Body) {
        let axis = a.vector_to_world_frame(self.local_axis_a);
        let anchor_a = a.to_world_frame(self.local_anchor_a);
        let anchor_b = b.to_world_frame(self.local_anchor_b);
        self.position = (anchor_b - anchor_a).dot(axis);

        if let EquationKind::PrismaticAxis(trans) = &mut equations.get_mut(TRANS).kind {
            trans.local_anchor_a = self.local_anchor_a;
            trans.local_anchor_b = self.local_anchor_b;
            trans.local_axis_a = self.local_axis_a;
        }

        let arm_a = anchor_a - a.position();
        let arm_b = anchor_b - b.position();

        match self.upper_limit {
            Some(upper) if self.position > upper => {
                if let Some(c) = equations.get_mut(UPPER).contact_mut() {
                    c.normal_a = -axis;
                    c.contact_point_a = arm_a + axis * upper;
                    c.contact_point_b = arm_b;
                }
                equations.activate(UPPER);
            }
            _ => equations.deactivate(UPPER),
        }

        match self.lower_limit {
            Some(lower) if self.position < lower => {
                if let Some(c) = equations.get_mut(LOWER).contact_mut() {
                    c.normal_a = axis;
                    c.contact_point_a = arm_a;
                    c.contact_point_b = arm_b - axis * lower;
                }
                equations.activate(LOWER);
            }
            _ => equations.deactivate(LOWER),
        }

        if self.motor_enabled {
            let motor = equations.get_mut(MOTOR);
            motor.set_max_force(self.max_motor_force);
            motor.relative_velocity = -self.motor_speed;
            if let EquationKind::Velocity(v) = &mut motor.kind {
                v.local_anchor_a = self.local_anchor_a;
                v.local_anchor_b = self.local_anchor_b;
                v.local_axis_a = self.local_axis_a;
            }
            equations.activate(MOTOR);
        } else {
            equations.deactivate(MOTOR);
        }
    }
}
