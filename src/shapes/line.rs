use crate::collision::{Aabb, Ray, RaycastResult};
use crate::math::{Vec2, get_line_segments_intersection_fraction};
use crate::shapes::ShapeGeometry;

/// Finite segment centered on the shape origin, along local X.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line {
    pub length: f32,
}

impl Line {
    pub fn new(length: f32) -> Self {
        Self { length }
    }

    /// Segment endpoints in the shape frame.
    #[inline]
    pub fn local_endpoints(&self) -> [Vec2; 2] {
        let h = 0.5 * self.length;
        [Vec2::new(-h, 0.0), Vec2::new(h, 0.0)]
    }

    #[inline]
    pub fn world_endpoints(&self, position: Vec2, angle: f32) -> [Vec2; 2] {
        self.local_endpoints().map(|p| p.to_global_frame(position, angle))
    }
}

impl ShapeGeometry for Line {
    fn moment_of_inertia(&self, mass: f32) -> f32 {
        mass * self.length * self.length / 12.0
    }

    fn bounding_radius(&self) -> f32 {
        0.5 * self.length
    }

    fn area(&self) -> f32 {
        0.0
    }

    fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb {
        Aabb::from_points(&self.local_endpoints(), position, angle, 0.0)
    }

    fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, angle: f32) {
        let from = ray.from.to_local_frame(position, angle);
        let to = ray.to.to_local_frame(position, angle);
        let [v0, v1] = self.local_endpoints();

        let Some(fraction) = get_line_segments_intersection_fraction(from, to, v0, v1) else {
            return;
        };

        // Two-sided: the normal always faces the incoming ray.
        let mut normal = Vec2::Y.rotate(angle);
        if normal.dot(ray.direction) > 0.0 {
            normal = -normal;
        }
        ray.report_intersection(result, fraction, normal, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::RayMode;
    use approx::assert_relative_eq;

    #[test]
    fn inertia_and_radius() {
        let l = Line::new(6.0);
        assert_relative_eq!(l.moment_of_inertia(2.0), 6.0);
        assert_relative_eq!(l.bounding_radius(), 3.0);
    }

    #[test]
    fn vertical_line_aabb() {
        let l = Line::new(2.0);
        let aabb = l.compute_aabb(Vec2::ZERO, core::f32::consts::FRAC_PI_2);
        assert_relative_eq!(aabb.lower_bound, Vec2::new(0.0, -1.0), epsilon = 1e-5);
        assert_relative_eq!(aabb.upper_bound, Vec2::new(0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn ray_from_below_gets_downward_normal() {
        let l = Line::new(2.0);
        let mut ray = Ray::new(Vec2::new(0.5, -2.0), Vec2::new(0.5, 2.0), RayMode::Closest);
        let mut result = RaycastResult::default();
        l.raycast(&mut result, &mut ray, Vec2::ZERO, 0.0);

        assert_relative_eq!(result.fraction, 0.5, epsilon = 1e-6);
        assert_relative_eq!(result.normal, Vec2::new(0.0, -1.0), epsilon = 1e-6);
    }
}
