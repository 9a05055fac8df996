use crate::constraints::EquationSet;
use crate::dynamics::{Body, BodyId};
use crate::equations::{Equation, EquationKind, PivotAxisEquation, RotationalLockEquation, RotationalVelocityEquation};
use crate::math::Vec2;

const PIVOT_X: usize = 0;
const PIVOT_Y: usize = 1;
const UPPER: usize = 2;
const LOWER: usize = 3;
const MOTOR: usize = 4;

#[derive(Copy, Clone, Debug)]
pub struct RevoluteConstraintDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Shared pivot in world coordinates. Overrides the local pivots.
    pub world_pivot: Option<Vec2>,
    pub local_pivot_a: Vec2,
    pub local_pivot_b: Vec2,
    pub max_force: f32,
    pub collide_connected: bool,
}

impl RevoluteConstraintDef {
    pub fn new(body_a: BodyId, body_b: BodyId, world_pivot: Vec2) -> Self {
        Self {
            body_a,
            body_b,
            world_pivot: Some(world_pivot),
            local_pivot_a: Vec2::ZERO,
            local_pivot_b: Vec2::ZERO,
            max_force: f32::MAX,
            collide_connected: true,
        }
    }

    pub fn with_local_pivots(body_a: BodyId, body_b: BodyId, local_pivot_a: Vec2, local_pivot_b: Vec2) -> Self {
        Self {
            world_pivot: None,
            local_pivot_a,
            local_pivot_b,
            ..Self::new(body_a, body_b, Vec2::ZERO)
        }
    }
}

/// Pins a point of body A to a point of body B, leaving rotation free.
#[derive(Clone, Debug)]
pub struct RevoluteConstraint {
    pub local_pivot_a: Vec2,
    pub local_pivot_b: Vec2,
    pub lower_limit: Option<f32>,
    pub upper_limit: Option<f32>,
    pub motor_enabled: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    max_force: f32,
    angle: f32,
}

impl RevoluteConstraint {
    pub(crate) fn from_def(def: &RevoluteConstraintDef, a: &Body, b: &Body) -> (Self, EquationSet) {
        let (local_pivot_a, local_pivot_b) = match def.world_pivot {
            Some(pivot) => (a.to_local_frame(pivot), b.to_local_frame(pivot)),
            None => (def.local_pivot_a, def.local_pivot_b),
        };

        let max = def.max_force;
        let mut equations = EquationSet::default();
        for axis in [Vec2::X, Vec2::Y] {
            equations.push(
                Equation::new(
                    0,
                    0,
                    -max,
                    max,
                    EquationKind::PivotAxis(PivotAxisEquation {
                        local_pivot_a,
                        local_pivot_b,
                        axis,
                    }),
                ),
                true,
            );
        }
        // Limit stops only push one way.
        equations.push(
            Equation::new(0, 0, 0.0, max, EquationKind::RotationalLock(RotationalLockEquation::default())),
            false,
        );
        equations.push(
            Equation::new(0, 0, -max, 0.0, EquationKind::RotationalLock(RotationalLockEquation::default())),
            false,
        );
        equations.push(
            Equation::new(
                0,
                0,
                -max,
                max,
                EquationKind::RotationalVelocity(RotationalVelocityEquation::default()),
            ),
            false,
        );

        let constraint = Self {
            local_pivot_a,
            local_pivot_b,
            lower_limit: None,
            upper_limit: None,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: max,
            max_force: max,
            angle: b.angle() - a.angle(),
        };
        (constraint, equations)
    }

    /// Relative angle `angleB - angleA` at the last update.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    pub(crate) fn update(&mut self, equations: &mut EquationSet, a: &Body, b: &Body) {
        self.angle = b.angle() - a.angle();

        for slot in [PIVOT_X, PIVOT_Y] {
            if let EquationKind::PivotAxis(pivot) = &mut equations.get_mut(slot).kind {
                pivot.local_pivot_a = self.local_pivot_a;
                pivot.local_pivot_b = self.local_pivot_b;
            }
        }

        match self.upper_limit {
            Some(upper) if self.angle > upper => {
                equations.get_mut(UPPER).kind = EquationKind::RotationalLock(RotationalLockEquation { angle: upper });
                equations.activate(UPPER);
            }
            _ => equations.deactivate(UPPER),
        }

        match self.lower_limit {
            Some(lower) if self.angle < lower => {
                equations.get_mut(LOWER).kind = EquationKind::RotationalLock(RotationalLockEquation { angle: lower });
                equations.activate(LOWER);
            }
            _ => equations.deactivate(LOWER),
        }

        if self.motor_enabled {
            let motor = equations.get_mut(MOTOR);
            motor.set_max_force(self.max_motor_torque);
            motor.relative_velocity = -self.motor_speed;
            equations.activate(MOTOR);
        } else {
            equations.deactivate(MOTOR);
        }
    }
}
