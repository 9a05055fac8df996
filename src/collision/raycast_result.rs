use crate::collision::Ray;
use crate::dynamics::BodyId;
use crate::math::Vec2;
use crate::shapes::ShapeId;

/// Storage for one ray hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastResult {
    /// Surface normal at the hit point, in world space.
    pub normal: Vec2,
    pub shape: Option<ShapeId>,
    pub body: Option<BodyId>,
    /// Edge index for polygon hits.
    pub face_index: Option<usize>,
    /// Distance along the ray in [0, 1]; -1 when nothing was hit.
    pub fraction: f32,
    pub is_stopped: bool,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self {
            normal: Vec2::ZERO,
            shape: None,
            body: None,
            face_index: None,
            fraction: -1.0,
            is_stopped: false,
        }
    }
}

impl RaycastResult {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn has_hit(&self) -> bool {
        self.fraction >= 0.0
    }

    pub fn hit_distance(&self, ray: &Ray) -> f32 {
        ray.from.distance(ray.to) * self.fraction
    }

    pub fn hit_point(&self, ray: &Ray) -> Vec2 {
        ray.from.lerp(ray.to, self.fraction)
    }

    pub fn stop(&mut self) {
        self.is_stopped = true;
    }

    pub fn set(
        &mut self,
        normal: Vec2,
        shape: Option<ShapeId>,
        body: Option<BodyId>,
        fraction: f32,
        face_index: Option<usize>,
    ) {
        self.normal = normal;
        self.shape = shape;
        self.body = body;
        self.fraction = fraction;
        self.face_index = face_index;
    }
}
