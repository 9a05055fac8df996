use crate::dynamics::Body;
use crate::equations::ConstraintFunction;
use crate::math::Vec2;

/// Jacobian for a relative displacement along `axis` between two anchor
/// offsets `ri`, `rj`.
#[inline]
fn axis_jacobian(g: &mut [f32; 6], axis: Vec2, ri: Vec2, rj: Vec2) {
    *g = [-axis.x, -axis.y, -ri.cross(axis), axis.x, axis.y, rj.cross(axis)];
}

/// Keeps two anchor points a fixed distance apart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistanceEquation {
    pub distance: f32,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
}

impl ConstraintFunction for DistanceEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        let ri = self.local_anchor_a.rotate(a.angle());
        let rj = self.local_anchor_b.rotate(b.angle());
        let r = b.position() + rj - a.position() - ri;

        axis_jacobian(g, r.normalize(), ri, rj);
        r.length() - self.distance
    }
}

/// One component of a pin joint: pivots coincide along a world axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PivotAxisEquation {
    pub local_pivot_a: Vec2,
    pub local_pivot_b: Vec2,
    pub axis: Vec2,
}

impl ConstraintFunction for PivotAxisEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        let ri = self.local_pivot_a.rotate(a.angle());
        let rj = self.local_pivot_b.rotate(b.angle());

        axis_jacobian(g, self.axis, ri, rj);
        self.axis.dot(b.position() + rj - a.position() - ri)
    }
}

/// Keeps anchor B on the line through anchor A along `local_axis_a`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrismaticAxisEquation {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
}

impl ConstraintFunction for PrismaticAxisEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        let ri = self.local_anchor_a.rotate(a.angle());
        let rj = self.local_anchor_b.rotate(b.angle());
        let gap = b.position() + rj - a.position() - ri;
        // Perpendicular to the sliding axis.
        let t = self.local_axis_a.rotate(a.angle() + core::f32::consts::FRAC_PI_2);

        *g = [-t.x, -t.y, -ri.cross(t) + t.cross(gap), t.x, t.y, rj.cross(t)];
        gap.dot(t)
    }
}

/// Relative sliding velocity along `local_axis_a`, for linear motors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VelocityEquation {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
}

impl ConstraintFunction for VelocityEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        let axis = self.local_axis_a.rotate(a.angle());
        let ri = self.local_anchor_a.rotate(a.angle());
        let rj = self.local_anchor_b.rotate(b.angle());

        axis_jacobian(g, axis, ri, rj);
        0.0
    }
}
