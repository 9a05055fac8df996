use std::fmt;

use crate::collision::{Aabb, RaycastResult};
use crate::dynamics::{Body, BodyId};
use crate::math::Vec2;
use crate::shapes::{Shape, ShapeId};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RayMode {
    /// Keep the hit with the smallest fraction.
    Closest,
    /// Stop at the first hit found.
    Any,
    /// Invoke the callback for every hit.
    All,
}

pub type RayCallback = Box<dyn FnMut(&RaycastResult)>;

pub struct Ray {
    pub from: Vec2,
    pub to: Vec2,
    pub check_collision_response: bool,
    pub skip_backfaces: bool,
    pub collision_mask: u32,
    pub collision_group: u32,
    pub mode: RayMode,
    /// Unit vector from `from` to `to`. Refreshed by `update`.
    pub direction: Vec2,
    pub length: f32,
    callback: Option<RayCallback>,
    current_body: Option<BodyId>,
    current_shape: Option<ShapeId>,
}

impl fmt::Debug for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ray")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("mode", &self.mode)
            .field("collision_mask", &self.collision_mask)
            .field("collision_group", &self.collision_group)
            .field("skip_backfaces", &self.skip_backfaces)
            .finish_non_exhaustive()
    }
}

impl Ray {
    pub fn new(from: Vec2, to: Vec2, mode: RayMode) -> Self {
        let mut ray = Self {
            from,
            to,
            check_collision_response: true,
            skip_backfaces: false,
            collision_mask: u32::MAX,
            collision_group: u32::MAX,
            mode,
            direction: Vec2::ZERO,
            length: 0.0,
            callback: None,
            current_body: None,
            current_shape: None,
        };
        ray.update();
        ray
    }

    /// Callback for `RayMode::All`; called once per hit.
    pub fn with_callback(mut self, callback: impl FnMut(&RaycastResult) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Recompute direction and length after moving `from` or `to`.
    pub fn update(&mut self) {
        let d = self.to - self.from;
        self.length = d.length();
        self.direction = d.normalize();
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.from.min(self.to), self.from.max(self.to))
    }

    #[inline]
    pub fn should_stop(&self, result: &RaycastResult) -> bool {
        result.is_stopped || (result.has_hit() && self.mode == RayMode::Any)
    }

    pub fn intersect_bodies<'a>(
        &mut self,
        result: &mut RaycastResult,
        bodies: impl IntoIterator<Item = &'a Body>,
    ) {
        for body in bodies {
            if self.should_stop(result) {
                break;
            }
            let aabb = body.aabb();
            if aabb.overlaps_ray(self).is_some() || aabb.contains_point(self.from) {
                self.intersect_body(result, body);
            }
        }
    }

    pub fn intersect_body(&mut self, result: &mut RaycastResult, body: &Body) {
        let check_response = self.check_collision_response;
        if check_response && !body.collision_response {
            return;
        }

        for shape in body.shapes() {
            if check_response && !shape.collision_response {
                continue;
            }
            if !Shape::filters_match(
                self.collision_group,
                self.collision_mask,
                shape.collision_group,
                shape.collision_mask,
            ) {
                continue;
            }

            let position = body.position() + shape.position.rotate(body.angle());
            let angle = body.angle() + shape.angle;

            self.intersect_shape(result, shape, body.id, position, angle);

            if self.should_stop(result) {
                break;
            }
        }
    }

    fn intersect_shape(
        &mut self,
        result: &mut RaycastResult,
        shape: &Shape,
        body: BodyId,
        position: Vec2,
        angle: f32,
    ) {
        // Cheap rejection: infinite line vs bounding circle. Unbounded
        // shapes (planes) always go to the exact test.
        let r = shape.bounding_radius();
        if r.is_finite() && self.distance_from_line_squared(position) > r * r {
            return;
        }

        self.current_body = Some(body);
        self.current_shape = Some(shape.id);
        shape.raycast(result, self, position, angle);
        self.current_body = None;
        self.current_shape = None;
    }

    /// Squared distance from `point` to the infinite line through the ray.
    fn distance_from_line_squared(&self, point: Vec2) -> f32 {
        let along = (point - self.from).dot(self.direction);
        let closest = self.from + self.direction * along;
        point.distance_squared(closest)
    }

    /// Record a hit found by a shape's raycast, according to the ray mode.
    pub fn report_intersection(
        &mut self,
        result: &mut RaycastResult,
        fraction: f32,
        normal: Vec2,
        face_index: Option<usize>,
    ) {
        if self.skip_backfaces && normal.dot(self.direction) > 0.0 {
            return;
        }

        let (shape, body) = (self.current_shape, self.current_body);
        match self.mode {
            RayMode::All => {
                result.set(normal, shape, body, fraction, face_index);
                if let Some(cb) = self.callback.as_mut() {
                    cb(result);
                }
            }
            RayMode::Closest => {
                if !result.has_hit() || fraction < result.fraction {
                    result.set(normal, shape, body, fraction, face_index);
                }
            }
            RayMode::Any => {
                result.set(normal, shape, body, fraction, face_index);
                result.stop();
            }
        }
    }
}
