use crate::dynamics::Body;
use crate::equations::ConstraintFunction;
use crate::math::Vec2;
use crate::shapes::ShapeId;

/// Non-penetration along `normal_a`.
///
/// Contact points are world-oriented offsets from each body's position.
/// The normal points from body A towards body B.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactEquation {
    pub contact_point_a: Vec2,
    pub contact_point_b: Vec2,
    pub normal_a: Vec2,
    pub restitution: f32,
    /// Set when the bodies were not touching during the previous step.
    pub first_impact: bool,
    /// Allowed penetration before the contact starts pushing back.
    pub offset: f32,
    pub shape_a: Option<ShapeId>,
    pub shape_b: Option<ShapeId>,
}

impl ConstraintFunction for ContactEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], a: &Body, b: &Body) -> f32 {
        let n = self.normal_a;
        let ri = self.contact_point_a;
        let rj = self.contact_point_b;

        *g = [-n.x, -n.y, -ri.cross(n), n.x, n.y, rj.cross(n)];

        let penetration = b.position() + rj - a.position() - ri;
        n.dot(penetration) + self.offset
    }
}

/// Tangential resistance at a contact point, bounded by the slip force.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrictionEquation {
    pub contact_point_a: Vec2,
    pub contact_point_b: Vec2,
    /// Unit tangent, the contact normal rotated a quarter turn clockwise.
    pub t: Vec2,
    pub friction_coefficient: f32,
    pub shape_a: Option<ShapeId>,
    pub shape_b: Option<ShapeId>,
}

impl ConstraintFunction for FrictionEquation {
    fn compute_gq_and_jacobian(&self, g: &mut [f32; 6], _a: &Body, _b: &Body) -> f32 {
        let t = self.t;
        *g = [
            -t.x,
            -t.y,
            -self.contact_point_a.cross(t),
            t.x,
            t.y,
            self.contact_point_b.cross(t),
        ];
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyDef;
    use approx::assert_relative_eq;

    fn body_at(x: f32) -> Body {
        Body::from_def(BodyDef {
            position: Vec2::new(x, 0.0),
            mass: 1.0,
            ..Default::default()
        })
    }

    #[test]
    fn overlapping_circles_have_negative_error() {
        // Unit circles at x = 0 and x = 1.5 overlap by 0.5.
        let (a, b) = (body_at(0.0), body_at(1.5));
        let eq = ContactEquation {
            normal_a: Vec2::X,
            contact_point_a: Vec2::new(1.0, 0.0),
            contact_point_b: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };

        let mut g = [0.0; 6];
        let gq = eq.compute_gq_and_jacobian(&mut g, &a, &b);
        assert_relative_eq!(gq, -0.5, epsilon = 1e-6);
        assert_eq!(g, [-1.0, -0.0, -0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn friction_jacobian_uses_tangent() {
        let (a, b) = (body_at(0.0), body_at(2.0));
        let eq = FrictionEquation {
            t: Vec2::new(0.0, -1.0),
            contact_point_a: Vec2::new(1.0, 0.0),
            contact_point_b: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };

        let mut g = [0.0; 6];
        assert_eq!(eq.compute_gq_and_jacobian(&mut g, &a, &b), 0.0);
        assert_relative_eq!(g[2], 1.0);
        assert_relative_eq!(g[5], 1.0);
    }
}
