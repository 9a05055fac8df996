use crate::dynamics::Body;
use crate::equations::Equation;

/// Iterative Gauss-Seidel solver.
///
/// Each pass walks the equations in order, computes the impulse change
/// that best satisfies the equation given the current velocity deltas,
/// clamps the accumulated impulse to the force bounds and applies it at
/// once. Stops early once the total change per pass is small enough.
#[derive(Clone, Debug)]
pub struct GsSolver {
    pub iterations: usize,
    pub tolerance: f32,
    used_iterations: usize,
    lambda: Vec<f32>,
    bs: Vec<f32>,
    inv_cs: Vec<f32>,
}

impl Default for GsSolver {
    fn default() -> Self {
        Self::new(10, 1e-7)
    }
}

impl GsSolver {
    pub fn new(iterations: usize, tolerance: f32) -> Self {
        Self {
            iterations,
            tolerance,
            used_iterations: 0,
            lambda: Vec::new(),
            bs: Vec::new(),
            inv_cs: Vec::new(),
        }
    }

    /// Passes run by the last solve.
    pub fn used_iterations(&self) -> usize {
        self.used_iterations
    }

    /// Solve every equation against every body.
    pub fn solve_all(&mut self, h: f32, bodies: &mut [Body], equations: &mut [&mut Equation]) {
        let subset: Vec<usize> = (0..equations.len()).collect();
        let body_indices: Vec<usize> = (0..bodies.len()).collect();
        self.solve(h, bodies, equations, &subset, &body_indices);
    }

    /// Solve `equations[i]` for each `i` in `subset`. Only the bodies in
    /// `body_indices` receive velocity corrections.
    pub fn solve(
        &mut self,
        h: f32,
        bodies: &mut [Body],
        equations: &mut [&mut Equation],
        subset: &[usize],
        body_indices: &[usize],
    ) {
        self.used_iterations = 0;
        let n = subset.len();
        if n == 0 {
            return;
        }

        for &i in body_indices {
            let body = &mut bodies[i];
            body.update_solve_mass_properties();
            body.reset_constraint_velocity();
        }

        self.lambda.clear();
        self.lambda.resize(n, 0.0);
        self.bs.clear();
        self.inv_cs.clear();

        for &i in subset {
            let eq = &mut *equations[i];
            eq.prepare(h);
            self.bs.push(eq.compute_b(bodies, h));
            self.inv_cs
                .push(eq.compute_inv_c(&bodies[eq.body_a], &bodies[eq.body_b], eq.epsilon()));
        }

        let tolerance_sq = (self.tolerance * n as f32).powi(2);

        for _ in 0..self.iterations {
            let mut delta_total = 0.0;
            for (k, &i) in subset.iter().enumerate() {
                let eq = &*equations[i];
                let delta = self.iterate_equation(k, eq, bodies, h);
                delta_total += delta.abs();
            }
            self.used_iterations += 1;

            if delta_total * delta_total <= tolerance_sq {
                break;
            }
        }

        let inv_h = 1.0 / h;
        for (k, &i) in subset.iter().enumerate() {
            equations[i].multiplier = self.lambda[k] * inv_h;
        }

        for &i in body_indices {
            bodies[i].add_constraint_velocity();
        }

        log::trace!("Solved {} equations in {} iterations.", n, self.used_iterations);
    }

    fn iterate_equation(&mut self, k: usize, eq: &Equation, bodies: &mut [Body], h: f32) -> f32 {
        let lambda = self.lambda[k];
        let gw_lambda = eq.compute_gw_lambda(&bodies[eq.body_a], &bodies[eq.body_b]);

        let mut delta = self.inv_cs[k] * (self.bs[k] - gw_lambda - eq.epsilon() * lambda);

        // Clamp the accumulated impulse, not the increment.
        let next = lambda + delta;
        if next < eq.min_force * h {
            delta = eq.min_force * h - lambda;
        } else if next > eq.max_force * h {
            delta = eq.max_force * h - lambda;
        }

        self.lambda[k] += delta;
        eq.add_to_wlambda(bodies, delta);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyDef;
    use crate::equations::{ContactEquation, EquationKind};
    use crate::math::Vec2;
    use crate::shapes::Shape;
    use approx::assert_relative_eq;

    fn ball(x: f32, vx: f32) -> Body {
        let mut b = Body::from_def(BodyDef {
            position: Vec2::new(x, 0.0),
            velocity: Vec2::new(vx, 0.0),
            mass: 1.0,
            ..Default::default()
        });
        b.add_shape(Shape::circle(1.0), Vec2::ZERO, 0.0);
        b
    }

    fn contact(a: usize, b: usize) -> Equation {
        Equation::new(
            a,
            b,
            0.0,
            f32::MAX,
            EquationKind::Contact(ContactEquation {
                normal_a: Vec2::X,
                contact_point_a: Vec2::new(1.0, 0.0),
                contact_point_b: Vec2::new(-1.0, 0.0),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn approaching_contact_is_stopped() {
        let mut bodies = vec![ball(0.0, 1.0), ball(2.0, -1.0)];
        let mut eq = contact(0, 1);

        let mut solver = GsSolver::new(20, 1e-7);
        solver.solve_all(1.0 / 60.0, &mut bodies, &mut [&mut eq]);

        // Closing speed removed (restitution 0), momentum conserved.
        let closing = bodies[1].velocity.x - bodies[0].velocity.x;
        assert!(closing > -0.2, "closing speed {closing}");
        assert_relative_eq!(bodies[0].velocity.x + bodies[1].velocity.x, 0.0, epsilon = 1e-5);
        assert!(eq.multiplier > 0.0);
    }

    #[test]
    fn separating_contact_does_not_pull() {
        let mut bodies = vec![ball(0.0, -1.0), ball(2.0, 1.0)];
        let mut eq = contact(0, 1);

        GsSolver::default().solve_all(1.0 / 60.0, &mut bodies, &mut [&mut eq]);
        assert_relative_eq!(bodies[0].velocity.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(bodies[1].velocity.x, 1.0, epsilon = 1e-6);
        assert_eq!(eq.multiplier, 0.0);
    }

    #[test]
    fn no_equations_means_no_iterations() {
        let mut bodies = vec![ball(0.0, 1.0)];
        let mut solver = GsSolver::default();
        solver.solve_all(0.1, &mut bodies, &mut []);
        assert_eq!(solver.used_iterations(), 0);
        assert_relative_eq!(bodies[0].velocity.x, 1.0);
    }

    #[test]
    fn static_body_is_unaffected() {
        let mut ground = ball(2.0, 0.0);
        ground.set_body_type(crate::dynamics::BodyType::Static);
        let mut bodies = vec![ball(0.0, 3.0), ground];
        let mut eq = contact(0, 1);

        GsSolver::new(30, 1e-9).solve_all(1.0 / 60.0, &mut bodies, &mut [&mut eq]);
        assert_eq!(bodies[1].velocity, Vec2::ZERO);
        assert!(bodies[0].velocity.x < 0.5);
    }
}
