use crate::dynamics::Body;
use crate::equations::ConstraintFunction;
use crate::math::Vec2;

/// `ratio * angleA - angleB + angle = 0`. Drives gears.
#[derive(Clone, Debug, PartialEq)]
pub struct AngleLockEquation {
    pub angle: f32,
    pub ratio: f32,
}

impl Default for AngleLockEquation {
    fn default() -> Self {
        Self { angle: 0.0, ratio: 1.0 }
    }
}

impl ConstraintFunction for AngleLockEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        *g = [0.0, 0.0, self.ratio, 0.0, 0.0, -1.0];
        self.ratio * a.angle() - b.angle() + self.angle
    }
}

/// Holds `angleB - angleA` at `angle`.
///
/// The error is the sine of the deviation, so it stays bounded for
/// bodies that have spun many turns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RotationalLockEquation {
    pub angle: f32,
}

impl ConstraintFunction for RotationalLockEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        *g = [0.0, 0.0, 1.0, 0.0, 0.0, -1.0];
        let world_a = Vec2::X.rotate(a.angle() + self.angle);
        let world_b = Vec2::Y.rotate(b.angle());
        world_a.dot(world_b)
    }
}

/// `ratio * wB - wA`, biased by the equation's relative velocity.
#[derive(Clone, Debug, PartialEq)]
pub struct RotationalVelocityEquation {
    pub ratio: f32,
}

impl Default for RotationalVelocityEquation {
    fn default() -> Self {
        Self { ratio: 1.0 }
    }
}

impl ConstraintFunction for RotationalVelocityEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], _a: &Body, _b: &Body) -> f32 {
        *g = [0.0, 0.0, -1.0, 0.0, 0.0, self.ratio];
        0.0
    }
}
