//! Shape-pair contact routines.
//!
//! Every routine writes world-space contact points for a pair `(A, B)`
//! whose type flags are in ascending order. Normals point from A to B.
//! Pairs without a routine produce no contacts.

use crate::math::Vec2;
use crate::shapes::{Convex, Line, ShapeKind};

/// One touching point pair.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContactPoint {
    /// Unit normal from A to B.
    pub normal: Vec2,
    /// Deepest point of A inside B, on A's surface.
    pub world_a: Vec2,
    /// Deepest point of B inside A, on B's surface.
    pub world_b: Vec2,
}

impl ContactPoint {
    /// Signed gap along the normal; negative when overlapping.
    pub fn separation(&self) -> f32 {
        self.normal.dot(self.world_b - self.world_a)
    }
}

/// A shape placed in the world.
#[derive(Copy, Clone, Debug)]
pub struct ShapePose<'a> {
    pub kind: &'a ShapeKind,
    pub position: Vec2,
    pub angle: f32,
}

enum Geometry<'a> {
    Circle(f32),
    Particle,
    Plane,
    Line(&'a Line),
    Polygon(&'a Convex),
}

fn geometry(kind: &ShapeKind) -> Geometry<'_> {
    match kind {
        ShapeKind::Circle(c) => Geometry::Circle(c.radius),
        ShapeKind::Particle(_) => Geometry::Particle,
        ShapeKind::Plane(_) => Geometry::Plane,
        ShapeKind::Line(l) => Geometry::Line(l),
        ShapeKind::Convex(c) => Geometry::Polygon(c),
        ShapeKind::Box(b) => Geometry::Polygon(b.convex()),
    }
}

/// Run the routine for `(a, b)`. `a` must not have a higher type flag than `b`.
pub fn collide(out: &mut Vec<ContactPoint>, a: ShapePose<'_>, b: ShapePose<'_>) {
    debug_assert!(a.kind.shape_type().flag() <= b.kind.shape_type().flag());

    use Geometry::*;
    match (geometry(a.kind), geometry(b.kind)) {
        (Circle(ra), Circle(rb)) => circle_circle(out, a.position, ra, b.position, rb),
        (Circle(r), Particle) => circle_circle(out, a.position, r, b.position, 0.0),
        (Circle(r), Plane) => circle_plane(out, a.position, r, b.position, b.angle),
        (Circle(r), Line(l)) => circle_line(out, a.position, r, l, b.position, b.angle),
        (Circle(r), Polygon(p)) => circle_convex(out, a.position, r, p, b.position, b.angle),
        (Particle, Plane) => particle_plane(out, a.position, b.position, b.angle),
        (Particle, Polygon(p)) => circle_convex(out, a.position, 0.0, p, b.position, b.angle),
        (Plane, Line(l)) => {
            let ends = l.world_endpoints(b.position, b.angle);
            plane_points(out, a.position, a.angle, &ends);
        }
        (Plane, Polygon(p)) => {
            let verts: Vec<Vec2> = p.world_vertices(b.position, b.angle).collect();
            plane_points(out, a.position, a.angle, &verts);
        }
        (Polygon(pa), Polygon(pb)) => convex_convex(out, pa, a.position, a.angle, pb, b.position, b.angle),
        _ => {}
    }
}

pub fn circle_circle(out: &mut Vec<ContactPoint>, pa: Vec2, ra: f32, pb: Vec2, rb: f32) {
    let d = pb - pa;
    let r = ra + rb;
    if d.length_squared() > r * r {
        return;
    }

    let n = if d.length_squared() > 0.0 { d.normalize() } else { Vec2::X };
    out.push(ContactPoint {
        normal: n,
        world_a: pa + n * ra,
        world_b: pb - n * rb,
    });
}

pub fn circle_plane(out: &mut Vec<ContactPoint>, pc: Vec2, r: f32, plane_pos: Vec2, plane_angle: f32) {
    let n = Vec2::Y.rotate(plane_angle);
    let dist = (pc - plane_pos).dot(n);
    if dist > r {
        return;
    }

    out.push(ContactPoint {
        normal: -n,
        world_a: pc - n * r,
        world_b: pc - n * dist,
    });
}

pub fn particle_plane(out: &mut Vec<ContactPoint>, p: Vec2, plane_pos: Vec2, plane_angle: f32) {
    let n = Vec2::Y.rotate(plane_angle);
    let dist = (p - plane_pos).dot(n);
    if dist > 0.0 {
        return;
    }

    out.push(ContactPoint {
        normal: -n,
        world_a: p,
        world_b: p - n * dist,
    });
}

pub fn circle_line(out: &mut Vec<ContactPoint>, pc: Vec2, r: f32, line: &Line, pos: Vec2, angle: f32) {
    let [e0, e1] = line.world_endpoints(pos, angle);
    let edge = e1 - e0;
    let len_sq = edge.length_squared();
    let t = if len_sq > 0.0 {
        ((pc - e0).dot(edge) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = e0 + edge * t;

    let d = closest - pc;
    if d.length_squared() > r * r {
        return;
    }

    // Center exactly on the segment: push out along the line normal.
    let n = if d.length_squared() > 0.0 { d.normalize() } else { -Vec2::Y.rotate(angle) };
    out.push(ContactPoint {
        normal: n,
        world_a: pc + n * r,
        world_b: closest,
    });
}

/// Circle (or particle, with `r == 0`) against a polygon.
pub fn circle_convex(out: &mut Vec<ContactPoint>, pc: Vec2, r: f32, poly: &Convex, pos: Vec2, angle: f32) {
    let c = pc.to_local_frame(pos, angle);
    let verts = poly.vertices();
    let normals = poly.normals();
    let count = verts.len();

    let mut best = 0;
    let mut separation = -f32::MAX;
    for i in 0..count {
        let s = normals[i].dot(c - verts[i]);
        if s > r {
            return;
        }
        if s > separation {
            separation = s;
            best = i;
        }
    }

    let v1 = verts[best];
    let v2 = verts[(best + 1) % count];

    // `n` points from the polygon towards the circle, `on_poly` is local.
    let (n, on_poly) = if separation < f32::EPSILON {
        (normals[best], c - normals[best] * separation)
    } else {
        let u1 = (c - v1).dot(v2 - v1);
        let u2 = (c - v2).dot(v1 - v2);
        if u1 <= 0.0 {
            if c.distance_squared(v1) > r * r {
                return;
            }
            ((c - v1).normalize(), v1)
        } else if u2 <= 0.0 {
            if c.distance_squared(v2) > r * r {
                return;
            }
            ((c - v2).normalize(), v2)
        } else {
            (normals[best], c - normals[best] * separation)
        }
    };

    let n = n.rotate(angle);
    out.push(ContactPoint {
        normal: -n,
        world_a: pc - n * r,
        world_b: on_poly.to_global_frame(pos, angle),
    });
}

/// Plane against a set of world points (polygon vertices or segment ends).
pub fn plane_points(out: &mut Vec<ContactPoint>, plane_pos: Vec2, plane_angle: f32, points: &[Vec2]) {
    let n = Vec2::Y.rotate(plane_angle);
    for &v in points {
        let d = (v - plane_pos).dot(n);
        if d < 0.0 {
            out.push(ContactPoint {
                normal: n,
                world_a: v - n * d,
                world_b: v,
            });
        }
    }
}

/// Edge of `poly1` with the largest separation from `poly2`, both given as
/// world vertices and normals.
fn find_max_separation(v1: &[Vec2], n1: &[Vec2], v2: &[Vec2]) -> (usize, f32) {
    let mut best = 0;
    let mut max_sep = -f32::MAX;
    for i in 0..v1.len() {
        let si = v2
            .iter()
            .map(|&p| n1[i].dot(p - v1[i]))
            .fold(f32::MAX, f32::min);
        if si > max_sep {
            max_sep = si;
            best = i;
        }
    }
    (best, max_sep)
}

/// Keep the part of segment `v_in` with `normal . v <= offset`.
pub fn clip_segment_to_line(v_out: &mut [Vec2; 2], v_in: &[Vec2; 2], normal: Vec2, offset: f32) -> usize {
    let mut num_out: usize = 0;

    let distance0 = normal.dot(v_in[0]) - offset;
    let distance1 = normal.dot(v_in[1]) - offset;

    if distance0 <= 0.0 {
        v_out[num_out] = v_in[0];
        num_out += 1;
    }
    if distance1 <= 0.0 {
        v_out[num_out] = v_in[1];
        num_out += 1;
    }

    if distance0 * distance1 < 0.0 && num_out < 2 {
        let interp = distance0 / (distance0 - distance1);
        v_out[num_out] = v_in[0] + interp * (v_in[1] - v_in[0]);
        num_out += 1;
    }

    num_out
}

struct WorldPolygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
}

impl WorldPolygon {
    fn new(poly: &Convex, pos: Vec2, angle: f32) -> Self {
        Self {
            vertices: poly.world_vertices(pos, angle).collect(),
            normals: poly.normals().iter().map(|n| n.rotate(angle)).collect(),
        }
    }
}

/// Separating-axis test followed by reference/incident face clipping.
/// Produces at most two points.
pub fn convex_convex(
    out: &mut Vec<ContactPoint>,
    poly_a: &Convex,
    pos_a: Vec2,
    angle_a: f32,
    poly_b: &Convex,
    pos_b: Vec2,
    angle_b: f32,
) {
    let wa = WorldPolygon::new(poly_a, pos_a, angle_a);
    let wb = WorldPolygon::new(poly_b, pos_b, angle_b);

    let (edge_a, sep_a) = find_max_separation(&wa.vertices, &wa.normals, &wb.vertices);
    if sep_a > 0.0 {
        return;
    }
    let (edge_b, sep_b) = find_max_separation(&wb.vertices, &wb.normals, &wa.vertices);
    if sep_b > 0.0 {
        return;
    }

    // Prefer A as reference unless B is clearly better.
    const TOLERANCE: f32 = 0.0005;
    let (reference, incident, edge, flip) = if sep_b > sep_a + TOLERANCE {
        (&wb, &wa, edge_b, true)
    } else {
        (&wa, &wb, edge_a, false)
    };

    let ref_normal = reference.normals[edge];

    // Incident edge: the one most anti-parallel to the reference normal.
    let mut incident_index = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in incident.normals.iter().enumerate() {
        let d = ref_normal.dot(*n);
        if d < min_dot {
            min_dot = d;
            incident_index = i;
        }
    }
    let ni = incident.vertices.len();
    let incident_edge = [
        incident.vertices[incident_index],
        incident.vertices[(incident_index + 1) % ni],
    ];

    let nr = reference.vertices.len();
    let v11 = reference.vertices[edge];
    let v12 = reference.vertices[(edge + 1) % nr];
    let tangent = (v12 - v11).normalize();
    let normal = tangent.rotate90cw();

    let front_offset = normal.dot(v11);
    let side_offset1 = -tangent.dot(v11);
    let side_offset2 = tangent.dot(v12);

    let mut clip1 = [Vec2::ZERO; 2];
    let mut clip2 = [Vec2::ZERO; 2];

    if clip_segment_to_line(&mut clip1, &incident_edge, -tangent, side_offset1) < 2 {
        return;
    }
    if clip_segment_to_line(&mut clip2, &clip1, tangent, side_offset2) < 2 {
        return;
    }

    for cp in clip2 {
        let separation = normal.dot(cp) - front_offset;
        if separation > 0.0 {
            continue;
        }
        // Slide the incident point onto the reference face.
        let on_reference = cp - normal * separation;
        out.push(if flip {
            ContactPoint {
                normal: -normal,
                world_a: cp,
                world_b: on_reference,
            }
        } else {
            ContactPoint {
                normal,
                world_a: on_reference,
                world_b: cp,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{BoxShape, Circle, Plane};
    use approx::assert_relative_eq;

    fn pose(kind: &ShapeKind, x: f32, y: f32, angle: f32) -> ShapePose<'_> {
        ShapePose {
            kind,
            position: Vec2::new(x, y),
            angle,
        }
    }

    #[test]
    fn clip_segment_to_line_clips_one_point() {
        // Line: x = 0.5, keep points with x <= 0.5
        let v_in = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        let mut v_out = [Vec2::ZERO; 2];
        let n = clip_segment_to_line(&mut v_out, &v_in, Vec2::X, 0.5);

        assert_eq!(n, 2);
        assert_relative_eq!(v_out[0].x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v_out[1].x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(v_out[1].y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn overlapping_circles_touch_along_center_line() {
        let c = ShapeKind::Circle(Circle::new(1.0));
        let mut out = Vec::new();
        collide(&mut out, pose(&c, 0.0, 0.0, 0.0), pose(&c, 1.4, 0.0, 0.0));

        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].normal, Vec2::X, epsilon = 1e-6);
        assert_relative_eq!(out[0].separation(), -0.6, epsilon = 1e-5);
    }

    #[test]
    fn separated_circles_do_not_touch() {
        let c = ShapeKind::Circle(Circle::new(1.0));
        let mut out = Vec::new();
        collide(&mut out, pose(&c, 0.0, 0.0, 0.0), pose(&c, 2.5, 0.0, 0.0));
        assert!(out.is_empty());
    }

    #[test]
    fn circle_resting_on_plane() {
        let c = ShapeKind::Circle(Circle::new(0.5));
        let p = ShapeKind::Plane(Plane);
        let mut out = Vec::new();
        collide(&mut out, pose(&c, 0.0, 0.4, 0.0), pose(&p, 0.0, 0.0, 0.0));

        assert_eq!(out.len(), 1);
        // From the circle (A) into the plane (B).
        assert_relative_eq!(out[0].normal, Vec2::new(0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(out[0].world_b, Vec2::new(0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(out[0].separation(), -0.1, epsilon = 1e-6);
    }

    #[test]
    fn box_on_plane_touches_at_two_corners() {
        let p = ShapeKind::Plane(Plane);
        let b = ShapeKind::Box(BoxShape::new(2.0, 2.0));
        let mut out = Vec::new();
        collide(&mut out, pose(&p, 0.0, 0.0, 0.0), pose(&b, 0.0, 0.9, 0.0));

        assert_eq!(out.len(), 2);
        for c in &out {
            assert_relative_eq!(c.normal, Vec2::Y, epsilon = 1e-6);
            assert_relative_eq!(c.separation(), -0.1, epsilon = 1e-5);
        }
    }

    #[test]
    fn circle_against_box_face_and_corner() {
        let c = ShapeKind::Circle(Circle::new(0.5));
        let b = ShapeKind::Box(BoxShape::new(2.0, 2.0));

        let mut out = Vec::new();
        collide(&mut out, pose(&c, -1.4, 0.0, 0.0), pose(&b, 0.0, 0.0, 0.0));
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].normal, Vec2::X, epsilon = 1e-6);
        assert_relative_eq!(out[0].separation(), -0.1, epsilon = 1e-5);

        out.clear();
        collide(&mut out, pose(&c, 1.3, 1.3, 0.0), pose(&b, 0.0, 0.0, 0.0));
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].world_b, Vec2::new(1.0, 1.0), epsilon = 1e-5);

        out.clear();
        collide(&mut out, pose(&c, 1.5, 1.5, 0.0), pose(&b, 0.0, 0.0, 0.0));
        assert!(out.is_empty());
    }

    #[test]
    fn stacked_boxes_produce_two_points() {
        let b = ShapeKind::Box(BoxShape::new(2.0, 2.0));
        let mut out = Vec::new();
        collide(&mut out, pose(&b, 0.0, 0.0, 0.0), pose(&b, 0.5, 1.9, 0.0));

        assert_eq!(out.len(), 2);
        for c in &out {
            assert_relative_eq!(c.normal, Vec2::Y, epsilon = 1e-5);
            assert_relative_eq!(c.separation(), -0.1, epsilon = 1e-5);
        }
    }

    #[test]
    fn separated_boxes_do_not_touch() {
        let b = ShapeKind::Box(BoxShape::new(1.0, 1.0));
        let mut out = Vec::new();
        collide(&mut out, pose(&b, 0.0, 0.0, 0.0), pose(&b, 3.0, 0.0, 0.3));
        assert!(out.is_empty());
    }

    #[test]
    fn unsupported_pairs_are_silent() {
        let p = ShapeKind::Plane(Plane);
        let mut out = Vec::new();
        collide(&mut out, pose(&p, 0.0, 0.0, 0.0), pose(&p, 0.0, -1.0, 0.0));
        assert!(out.is_empty());
    }
}
