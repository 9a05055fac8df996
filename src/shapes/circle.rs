use crate::collision::{Aabb, Ray, RaycastResult};
use crate::math::Vec2;
use crate::shapes::ShapeGeometry;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Circle {
    pub radius: f32,
}

impl Circle {
    pub fn new(radius: f32) -> Self {
        debug_assert!(radius >= 0.0, "circle radius must be non-negative");
        Self { radius }
    }
}

impl ShapeGeometry for Circle {
    fn moment_of_inertia(&self, mass: f32) -> f32 {
        mass * self.radius * self.radius / 2.0
    }

    fn bounding_radius(&self) -> f32 {
        self.radius
    }

    fn area(&self) -> f32 {
        core::f32::consts::PI * self.radius * self.radius
    }

    fn compute_aabb(&self, position: Vec2, _angle: f32) -> Aabb {
        let r = Vec2::new(self.radius, self.radius);
        Aabb::new(position - r, position + r)
    }

    fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, _angle: f32) {
        let from = ray.from;
        let to = ray.to;
        let r = self.radius;

        // |from + t (to - from) - position|^2 = r^2
        let d = to - from;
        let f = from - position;
        let a = d.length_squared();
        let b = 2.0 * d.dot(f);
        let c = f.length_squared() - r * r;

        if a == 0.0 {
            return;
        }

        let delta = b * b - 4.0 * a * c;

        if delta < 0.0 {
            return;
        }

        if delta == 0.0 {
            // Tangent: a single touching point.
            let t = -b / (2.0 * a);
            if (0.0..=1.0).contains(&t) {
                let normal = (from.lerp(to, t) - position).normalize();
                ray.report_intersection(result, t, normal, None);
            }
            return;
        }

        let sqrt_delta = delta.sqrt();
        let inv_2a = 1.0 / (2.0 * a);
        let d1 = (-b - sqrt_delta) * inv_2a;
        let d2 = (-b + sqrt_delta) * inv_2a;

        if (0.0..=1.0).contains(&d1) {
            let normal = (from.lerp(to, d1) - position).normalize();
            ray.report_intersection(result, d1, normal, None);
            if ray.should_stop(result) {
                return;
            }
        }

        if (0.0..=1.0).contains(&d2) {
            let normal = (from.lerp(to, d2) - position).normalize();
            ray.report_intersection(result, d2, normal, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::RayMode;
    use approx::assert_relative_eq;

    #[test]
    fn mass_properties() {
        let c = Circle::new(2.0);
        assert_relative_eq!(c.moment_of_inertia(3.0), 6.0);
        assert_relative_eq!(c.area(), 4.0 * core::f32::consts::PI, epsilon = 1e-5);
        assert_relative_eq!(c.bounding_radius(), 2.0);
    }

    #[test]
    fn aabb_ignores_angle() {
        let c = Circle::new(1.0);
        let aabb = c.compute_aabb(Vec2::new(2.0, 3.0), 1.0);
        assert_relative_eq!(aabb.lower_bound, Vec2::new(1.0, 2.0));
        assert_relative_eq!(aabb.upper_bound, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn ray_through_center_keeps_entry_point() {
        let c = Circle::new(2.0);
        let mut ray = Ray::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), RayMode::Closest);
        let mut result = RaycastResult::default();

        c.raycast(&mut result, &mut ray, Vec2::ZERO, 0.0);

        assert!(result.has_hit());
        assert_relative_eq!(result.fraction, 0.4, epsilon = 1e-5);
        assert_relative_eq!(result.normal, Vec2::new(-1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn ray_missing_circle_reports_nothing() {
        let c = Circle::new(1.0);
        let mut ray = Ray::new(Vec2::new(-10.0, 5.0), Vec2::new(10.0, 5.0), RayMode::Closest);
        let mut result = RaycastResult::default();
        c.raycast(&mut result, &mut ray, Vec2::ZERO, 0.0);
        assert!(!result.has_hit());
    }

    #[test]
    fn ray_starting_inside_hits_exit_point() {
        let c = Circle::new(1.0);
        let mut ray = Ray::new(Vec2::ZERO, Vec2::new(4.0, 0.0), RayMode::Closest);
        let mut result = RaycastResult::default();
        c.raycast(&mut result, &mut ray, Vec2::ZERO, 0.0);
        assert_relative_eq!(result.fraction, 0.25, epsilon = 1e-5);
    }
}
