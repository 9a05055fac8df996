use crate::collision::{Aabb, Ray, RaycastResult};
use crate::error::{PhysicsError, Result};
use crate::math::{Vec2, get_line_segments_intersection_fraction};
use crate::shapes::ShapeGeometry;

/// Convex polygon with counter-clockwise vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Convex {
    vertices: Vec<Vec2>,
    /// Outward unit normal of edge `i` (from vertex `i` to `i + 1`).
    normals: Vec<Vec2>,
    triangles: Vec<[usize; 3]>,
    center_of_mass: Vec2,
    area: f32,
}

impl Convex {
    pub fn new(vertices: Vec<Vec2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::TooFewVertices {
                count: vertices.len(),
            });
        }

        let convex = Self::from_ccw(vertices);
        if convex.area < 0.0 {
            return Err(PhysicsError::ClockwiseWinding { area: convex.area });
        }
        Ok(convex)
    }

    /// Build without validating the winding. Callers guarantee CCW order.
    pub(crate) fn from_ccw(vertices: Vec<Vec2>) -> Self {
        let mut convex = Self {
            vertices,
            normals: Vec::new(),
            triangles: Vec::new(),
            center_of_mass: Vec2::ZERO,
            area: 0.0,
        };
        convex.update_normals();
        convex.update_triangles();
        convex.update_center_of_mass();
        convex
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn center_of_mass(&self) -> Vec2 {
        self.center_of_mass
    }

    fn update_normals(&mut self) {
        let n = self.vertices.len();
        self.normals.clear();
        for i in 0..n {
            let edge = self.vertices[(i + 1) % n] - self.vertices[i];
            self.normals.push(edge.rotate90cw().normalize());
        }
    }

    /// Fan triangulation from vertex 0. Exact for convex input.
    fn update_triangles(&mut self) {
        self.triangles.clear();
        for i in 1..self.vertices.len().saturating_sub(1) {
            self.triangles.push([0, i, i + 1]);
        }
    }

    /// Area-weighted average of the triangle centroids. Also sets the signed area.
    fn update_center_of_mass(&mut self) {
        let mut weighted = Vec2::ZERO;
        let mut total = 0.0;

        for &[a, b, c] in &self.triangles {
            let (a, b, c) = (self.vertices[a], self.vertices[b], self.vertices[c]);
            let centroid = (a + b + c) * (1.0 / 3.0);
            let area = 0.5 * (b - a).cross(c - a);
            weighted += centroid * area;
            total += area;
        }

        self.area = total;
        self.center_of_mass = if total != 0.0 { weighted * (1.0 / total) } else { Vec2::ZERO };
    }

    /// Vertices placed in the frame (`position`, `angle`).
    pub fn world_vertices(&self, position: Vec2, angle: f32) -> impl Iterator<Item = Vec2> + '_ {
        self.vertices.iter().map(move |v| v.to_global_frame(position, angle))
    }
}

impl ShapeGeometry for Convex {
    /// Second moment of the polygon about the shape origin.
    fn moment_of_inertia(&self, mass: f32) -> f32 {
        let n = self.vertices.len();
        let mut denom = 0.0;
        let mut numer = 0.0;

        for j in 0..n {
            let p0 = self.vertices[(j + n - 1) % n];
            let p1 = self.vertices[j];
            let a = p0.cross(p1).abs();
            let b = p1.dot(p1) + p1.dot(p0) + p0.dot(p0);
            denom += a;
            numer += a * b;
        }

        if denom == 0.0 {
            return 0.0;
        }
        (mass / 6.0) * (numer / denom)
    }

    fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.length_squared())
            .fold(0.0_f32, f32::max)
            .sqrt()
    }

    fn area(&self) -> f32 {
        self.area
    }

    fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb {
        Aabb::from_points(&self.vertices, position, angle, 0.0)
    }

    /// One report per crossed edge, in edge order.
    fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, angle: f32) {
        let from = ray.from.to_local_frame(position, angle);
        let to = ray.to.to_local_frame(position, angle);

        let n = self.vertices.len();
        for i in 0..n {
            let q1 = self.vertices[i];
            let q2 = self.vertices[(i + 1) % n];

            if let Some(fraction) = get_line_segments_intersection_fraction(from, to, q1, q2) {
                let normal = self.normals[i].rotate(angle);
                ray.report_intersection(result, fraction, normal, Some(i));
                if ray.should_stop(result) {
                    return;
                }
            }
        }
    }
}

/// Rectangle centered on the shape origin.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxShape {
    width: f32,
    height: f32,
    convex: Convex,
}

impl BoxShape {
    pub fn new(width: f32, height: f32) -> Self {
        debug_assert!(width > 0.0 && height > 0.0);
        let (w, h) = (0.5 * width, 0.5 * height);
        let convex = Convex::from_ccw(vec![
            Vec2::new(-w, -h),
            Vec2::new(w, -h),
            Vec2::new(w, h),
            Vec2::new(-w, h),
        ]);
        Self {
            width,
            height,
            convex,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn convex(&self) -> &Convex {
        &self.convex
    }
}

impl ShapeGeometry for BoxShape {
    fn moment_of_inertia(&self, mass: f32) -> f32 {
        mass * (self.width * self.width + self.height * self.height) / 12.0
    }

    fn bounding_radius(&self) -> f32 {
        self.convex.bounding_radius()
    }

    fn area(&self) -> f32 {
        self.width * self.height
    }

    fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb {
        self.convex.compute_aabb(position, angle)
    }

    fn raycast(&self, result: &mut RaycastResult, ray: &mut Ray, position: Vec2, angle: f32) {
        self.convex.raycast(result, ray, position, angle);
    }
}
