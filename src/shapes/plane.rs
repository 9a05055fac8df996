use crate::collision::{Aabb, Ray, RaycastResult};
use crate::math::{Vec2, quarter_turn};
use crate::shapes::ShapeGeometry;

/// Infinite half-space. The surface normal is the local +Y axis; everything
/// below the surface is solid.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Plane;

impl Plane {
    #[inline]
    pub fn world_normal(angle: f32) -> Vec2 {
        Vec2::Y.rotate(angle)
    }
}

impl ShapeGeometry for Plane {
    fn moment_of_inertia(&self, _mass: f32) -> f32 {
        0.0
    }

    fn bounding_radius(&self) -> f32 {
        f32::INFINITY
    }

    fn area(&self) -> f32 {
        0.0
    }

    fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb {
        let max = f32::MAX;
        let (lower, upper) = match quarter_turn(angle) {
            // Normal +Y: solid below.
            Some(0) => (Vec2::new(-max, -max), Vec2::new(max, position.y)),
            // Normal -X: solid to the right.
            Some(1) => (Vec2::new(position.x, -max), Vec2::new(max, max)),
            // Normal -Y: solid above.
            Some(2) => (Vec2::new(-max, position.y), Vec2::new(max, max)),
            // Normal +X: solid to the left.
            Some(3) => (Vec2::new(-max, -max), Vec2::new(position.x, max)),
            _ => (Vec2::new(-max, -max), Vec2::new(max, max)),
        };
        Aabb::new(lower, upper)
    }

    fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, angle: f32) {
        let normal = Self::world_normal(angle);

        let from_dist = (ray.from - position).dot(normal);
        let to_dist = (ray.to - position).dot(normal);

        // Both ends on the same side.
        if from_dist * to_dist > 0.0 {
            return;
        }

        let denom = from_dist - to_dist;
        if denom == 0.0 {
            // Ray lies in the surface.
            return;
        }

        let fraction = from_dist / denom;
        ray.report_intersection(result, fraction, normal, None);
    }
}
