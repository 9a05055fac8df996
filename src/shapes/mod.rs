pub mod circle;
pub mod convex;
pub mod line;
pub mod particle;
pub mod plane;

pub use circle::Circle;
pub use convex::{BoxShape, Convex};
pub use line::Line;
pub use particle::Particle;
pub use plane::Plane;

use std::sync::atomic::{AtomicU32, Ordering};

use crate::collision::{Aabb, Ray, RaycastResult};
use crate::dynamics::{BodyId, MaterialId};
use crate::error::Result;
use crate::math::Vec2;

static NEXT_SHAPE_ID: AtomicU32 = AtomicU32::new(0);

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

impl ShapeId {
    fn next() -> Self {
        Self(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shape type tags. Each is a distinct bit so a pair of shapes can be
/// described by OR-ing their tags.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ShapeType {
    Circle = 1,
    Particle = 2,
    Plane = 4,
    Convex = 8,
    Line = 16,
    Box = 32,
}

impl ShapeType {
    #[inline]
    pub const fn flag(self) -> u32 {
        self as u32
    }
}

/// Geometry every shape variant provides, in the shape's own frame.
pub trait ShapeGeometry {
    /// Moment of inertia about the shape origin for the given mass.
    fn moment_of_inertia(&self, mass: f32) -> f32;

    fn bounding_radius(&self) -> f32;

    fn area(&self) -> f32;

    fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb;

    /// Report every intersection of `ray` with this shape placed at
    /// (`position`, `angle`) through `ray.report_intersection`.
    fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, angle: f32);
}

#[derive(Clone, Debug)]
pub enum ShapeKind {
    Circle(Circle),
    Particle(Particle),
    Plane(Plane),
    Line(Line),
    Convex(Convex),
    Box(BoxShape),
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Circle(_) => ShapeType::Circle,
            ShapeKind::Particle(_) => ShapeType::Particle,
            ShapeKind::Plane(_) => ShapeType::Plane,
            ShapeKind::Line(_) => ShapeType::Line,
            ShapeKind::Convex(_) => ShapeType::Convex,
            ShapeKind::Box(_) => ShapeType::Box,
        }
    }

    pub fn geometry(&self) -> &dyn ShapeGeometry {
        match self {
            ShapeKind::Circle(s) => s,
            ShapeKind::Particle(s) => s,
            ShapeKind::Plane(s) => s,
            ShapeKind::Line(s) => s,
            ShapeKind::Convex(s) => s,
            ShapeKind::Box(s) => s,
        }
    }

    /// Polygon view of convex-like shapes.
    pub fn polygon(&self) -> Option<&Convex> {
        match self {
            ShapeKind::Convex(c) => Some(c),
            ShapeKind::Box(b) => Some(b.convex()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub id: ShapeId,
    /// Offset from the owning body's origin, in body coordinates.
    pub position: Vec2,
    pub angle: f32,
    pub collision_group: u32,
    pub collision_mask: u32,
    /// False turns the shape into a sensor: overlaps are reported but
    /// no contact equations are generated.
    pub collision_response: bool,
    pub material: Option<MaterialId>,
    pub(crate) body: Option<BodyId>,
    bounding_radius: f32,
    area: f32,
    kind: ShapeKind,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Self {
        let mut shape = Self {
            id: ShapeId::next(),
            position: Vec2::ZERO,
            angle: 0.0,
            collision_group: 1,
            collision_mask: u32::MAX,
            collision_response: true,
            material: None,
            body: None,
            bounding_radius: 0.0,
            area: 0.0,
            kind,
        };
        shape.update_bounding_radius();
        shape.update_area();
        shape
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(ShapeKind::Circle(Circle::new(radius)))
    }

    pub fn particle() -> Self {
        Self::new(ShapeKind::Particle(Particle))
    }

    pub fn plane() -> Self {
        Self::new(ShapeKind::Plane(Plane))
    }

    pub fn line(length: f32) -> Self {
        Self::new(ShapeKind::Line(Line::new(length)))
    }

    /// Fails if the vertices are not counter-clockwise.
    pub fn convex(vertices: Vec<Vec2>) -> Result<Self> {
        Ok(Self::new(ShapeKind::Convex(Convex::new(vertices)?)))
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Self::new(ShapeKind::Box(BoxShape::new(width, height)))
    }

    pub fn with_collision_group(mut self, group: u32) -> Self {
        self.collision_group = group;
        self
    }

    pub fn with_collision_mask(mut self, mask: u32) -> Self {
        self.collision_mask = mask;
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.collision_response = false;
        self
    }

    #[inline]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Mutable access to the geometry. Call `update_bounding_radius` and
    /// `update_area` (and the owning body's mass update) after changing it.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut ShapeKind {
        &mut self.kind
    }

    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    #[inline]
    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn update_bounding_radius(&mut self) {
        self.bounding_radius = self.kind.geometry().bounding_radius();
    }

    pub fn update_area(&mut self) {
        self.area = self.kind.geometry().area();
    }

    pub fn compute_moment_of_inertia(&self, mass: f32) -> f32 {
        self.kind.geometry().moment_of_inertia(mass)
    }

    pub fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb {
        self.kind.geometry().compute_aabb(position, angle)
    }

    pub fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, angle: f32) {
        self.kind.geometry().raycast(result, ray, position, angle);
    }

    /// Group/mask test between two filters.
    #[inline]
    pub fn filters_match(group_a: u32, mask_a: u32, group_b: u32, mask_b: u32) -> bool {
        (group_a & mask_b) != 0 && (group_b & mask_a) != 0
    }
}
