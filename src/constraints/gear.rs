use crate::constraints::EquationSet;
use crate::dynamics::{Body, BodyId};
use crate::equations::{AngleLockEquation, Equation, EquationKind};

#[derive(Copy, Clone, Debug)]
pub struct GearConstraintDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub ratio: f32,
    /// Angle offset. Defaults to `angleB - ratio * angleA` at creation, so
    /// the bodies keep their current relative orientation.
    pub angle: Option<f32>,
    pub max_torque: f32,
    pub collide_connected: bool,
}

impl GearConstraintDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            ratio: 1.0,
            angle: None,
            max_torque: f32::MAX,
            collide_connected: true,
        }
    }
}

/// Couples the rotations of two bodies: `angleB = ratio * angleA + angle`.
#[derive(Clone, Debug)]
pub struct GearConstraint {
    pub ratio: f32,
    pub angle: f32,
    max_torque: f32,
}

impl GearConstraint {
    pub(crate) fn from_def(def: &GearConstraintDef, a: &Body, b: &Body) -> (Self, EquationSet) {
        let angle = def.angle.unwrap_or(b.angle() - def.ratio * a.angle());

        let mut equations = EquationSet::default();
        equations.push(
            Equation::new(
                0,
                0,
                -def.max_torque,
                def.max_torque,
                EquationKind::AngleLock(AngleLockEquation {
                    angle,
                    ratio: def.ratio,
                }),
            ),
            true,
        );

        let gear = Self {
            ratio: def.ratio,
            angle,
            max_torque: def.max_torque,
        };
        (gear, equations)
    }

    pub fn max_torque(&self) -> f32 {
        self.max_torque
    }

    pub fn set_max_torque(&mut self, torque: f32) {
        self.max_torque = torque;
    }

    pub(crate) fn update(&mut self, equations: &mut EquationSet) {
        let eq = equations.get_mut(0);
        eq.set_max_force(self.max_torque);
        if let EquationKind::AngleLock(lock) = &mut eq.kind {
            lock.ratio = self.ratio;
            lock.angle = self.angle;
        }
    }
}
