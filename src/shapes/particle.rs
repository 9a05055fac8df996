use crate::collision::{Aabb, Ray, RaycastResult};
use crate::math::Vec2;
use crate::shapes::ShapeGeometry;

/// A point with no extent. Collides with circles, planes and convex shapes.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Particle;

impl ShapeGeometry for Particle {
    fn moment_of_inertia(&self, _mass: f32) -> f32 {
        0.0
    }

    fn bounding_radius(&self) -> f32 {
        0.0
    }

    fn area(&self) -> f32 {
        0.0
    }

    fn compute_aabb(&self, position: Vec2, _angle: f32) -> Aabb {
        Aabb::new(position, position)
    }

    fn raycast(&self, _result: &mut RaycastResult, _ray: &mut Ray, _position: Vec2, _angle: f32) {}
}
