use crate::collision::Ray;
use crate::math::Vec2;

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Aabb {
    pub lower_bound: Vec2,
    pub upper_bound: Vec2,
}

impl Aabb {
    #[inline]
    pub const fn new(lower_bound: Vec2, upper_bound: Vec2) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }

    /// Box around `points` after placing them in the frame (`position`, `angle`),
    /// grown by `skin` on every side.
    pub fn from_points(points: &[Vec2], position: Vec2, angle: f32, skin: f32) -> Self {
        let mut lower = Vec2::new(f32::MAX, f32::MAX);
        let mut upper = Vec2::new(-f32::MAX, -f32::MAX);

        for p in points {
            let p = p.to_global_frame(position, angle);
            lower = lower.min(p);
            upper = upper.max(p);
        }

        if points.is_empty() {
            lower = position;
            upper = position;
        }

        let skin = Vec2::new(skin, skin);
        Self::new(lower - skin, upper + skin)
    }

    pub fn extend(&mut self, other: &Aabb) {
        self.lower_bound = self.lower_bound.min(other.lower_bound);
        self.upper_bound = self.upper_bound.max(other.upper_bound);
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower_bound.x <= other.upper_bound.x
            && other.lower_bound.x <= self.upper_bound.x
            && self.lower_bound.y <= other.upper_bound.y
            && other.lower_bound.y <= self.upper_bound.y
    }

    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.lower_bound.x <= p.x
            && p.x <= self.upper_bound.x
            && self.lower_bound.y <= p.y
            && p.y <= self.upper_bound.y
    }

    /// Slab test. Returns the entry fraction along the ray, if it touches the box.
    pub fn overlaps_ray(&self, ray: &Ray) -> Option<f32> {
        let dir_frac_x = 1.0 / ray.direction.x;
        let dir_frac_y = 1.0 / ray.direction.y;

        let t1 = (self.lower_bound.x - ray.from.x) * dir_frac_x;
        let t2 = (self.upper_bound.x - ray.from.x) * dir_frac_x;
        let t3 = (self.lower_bound.y - ray.from.y) * dir_frac_y;
        let t4 = (self.upper_bound.y - ray.from.y) * dir_frac_y;

        let tmin = t1.min(t2).max(t3.min(t4));
        let tmax = t1.max(t2).min(t3.max(t4));

        // Box is behind the ray, missed entirely, or beyond its end.
        if tmax < 0.0 || tmin > tmax || tmin > ray.length {
            return None;
        }

        if ray.length > 0.0 {
            Some(tmin.max(0.0) / ray.length)
        } else {
            Some(0.0)
        }
    }
}
