use crate::constraints::EquationSet;
use crate::dynamics::{Body, BodyId};
use crate::equations::{DistanceEquation, Equation, EquationKind};
use crate::math::Vec2;

#[derive(Copy, Clone, Debug)]
pub struct DistanceConstraintDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Target length. Defaults to the anchors' distance at creation.
    pub distance: Option<f32>,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub collide_connected: bool,
}

impl DistanceConstraintDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            distance: None,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            max_force: f32::MAX,
            collide_connected: true,
        }
    }
}

/// Keeps two anchor points at a fixed distance, or within limits when
/// either limit is set.
#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    pub distance: f32,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub upper_limit: Option<f32>,
    pub lower_limit: Option<f32>,
    position: f32,
}

impl DistanceConstraint {
    pub(crate) fn from_def(def: &DistanceConstraintDef, a: &Body, b: &Body) -> (Self, EquationSet) {
        let distance = def.distance.unwrap_or_else(|| {
            let world_a = a.to_world_frame(def.local_anchor_a);
            let world_b = b.to_world_frame(def.local_anchor_b);
            world_a.distance(world_b)
        });

        let mut equations = EquationSet::default();
        equations.push(
            Equation::new(
                0,
                0,
                -def.max_force,
                def.max_force,
                EquationKind::Distance(DistanceEquation {
                    distance,
                    local_anchor_a: def.local_anchor_a,
                    local_anchor_b: def.local_anchor_b,
                }),
            ),
            true,
        );

        let constraint = Self {
            distance,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            max_force: def.max_force,
            upper_limit: None,
            lower_limit: None,
            position: distance,
        };
        (constraint, equations)
    }

    /// Anchor separation measured at the last update.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub(crate) fn update(&mut self, equations: &mut EquationSet, a: &Body, b: &Body) {
        let world_a = a.to_world_frame(self.local_anchor_a);
        let world_b = b.to_world_frame(self.local_anchor_b);
        self.position = world_a.distance(world_b);

        let eq = equations.get_mut(0);
        eq.set_max_force(self.max_force);

        let mut target = self.distance;
        let mut violating = false;
        if let Some(upper) = self.upper_limit {
            if self.position > upper {
                // Only pull the anchors together.
                eq.max_force = 0.0;
                eq.min_force = -self.max_force;
                target = upper;
                violating = true;
            }
        }
        if let Some(lower) = self.lower_limit {
            if self.position < lower {
                eq.max_force = self.max_force;
                eq.min_force = 0.0;
                target = lower;
                violating = true;
            }
        }

        if (self.upper_limit.is_some() || self.lower_limit.is_some()) && !violating {
            eq.enabled = false;
            return;
        }
        eq.enabled = true;

        if let EquationKind::Distance(d) = &mut eq.kind {
            d.distance = target;
            d.local_anchor_a = self.local_anchor_a;
            d.local_anchor_b = self.local_anchor_b;
        }
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
    fn default_distance_is_current_separation() {
        let (a, b) = (body_at(0.0), body_at(3.0));
        let def = DistanceConstraintDef::new(a.id, b.id);
        let (c, eqs) = DistanceConstraint::from_def(&def, &a, &b);
        assert_relative_eq!(c.distance, 3.0);
        assert_eq!(eqs.active().count(), 1);
    }

    #[test]
    fn limits_disable_equation_inside_range() {
        let (a, b) = (body_at(0.0), body_at(3.0));
        let (mut c, mut eqs) = DistanceConstraint::from_def(&DistanceConstraintDef::new(a.id, b.id), &a, &b);
        c.lower_limit = Some(1.0);
        c.upper_limit = Some(5.0);

        c.update(&mut eqs, &a, &b);
        assert!(!eqs.get(0).enabled);

        c.upper_limit = Some(2.0);
        c.update(&mut eqs, &a, &b);
        let eq = eqs.get(0);
        assert!(eq.enabled);
        assert_eq!(eq.max_force, 0.0);
        assert_eq!(eq.kind, EquationKind::Distance(DistanceEquation {
            distance: 2.0,
            ..Default::default()
        }));
    }
}
