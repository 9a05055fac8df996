//! Coarse body-pair filtering.
//!
//! Pairs are reported as indices into the world's body list. The set of
//! pairs does not depend on the order of that list; the order of the
//! returned vector does.

use crate::collision::Aabb;
use crate::dynamics::{Body, BodyType};
use crate::shapes::Shape;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BroadphaseKind {
    #[default]
    Naive,
    SweepAndPrune,
}

impl BroadphaseKind {
    pub fn build(self) -> Box<dyn Broadphase> {
        match self {
            BroadphaseKind::Naive => Box::new(NaiveBroadphase),
            BroadphaseKind::SweepAndPrune => Box::new(SapBroadphase::default()),
        }
    }
}

pub trait Broadphase {
    /// Candidate pairs `(i, j)` of bodies that may touch.
    fn get_collision_pairs(&mut self, bodies: &mut [Body]) -> Vec<(usize, usize)>;

    /// Indices of bodies whose bounding box overlaps `aabb`.
    fn aabb_query(&mut self, bodies: &mut [Body], aabb: &Aabb) -> Vec<usize> {
        bodies
            .iter_mut()
            .enumerate()
            .filter_map(|(i, b)| b.get_aabb().overlaps(aabb).then_some(i))
            .collect()
    }
}

/// Body-level filter, independent of geometry.
pub fn can_collide(a: &Body, b: &Body) -> bool {
    use BodyType::*;

    match (a.body_type(), b.body_type()) {
        (Static | Kinematic, Static | Kinematic) => return false,
        _ => {}
    }

    if a.is_sleeping() && (b.is_sleeping() || b.is_static()) {
        return false;
    }
    if b.is_sleeping() && a.is_static() {
        return false;
    }

    let (group_a, mask_a) = a.collision_filter();
    let (group_b, mask_b) = b.collision_filter();
    Shape::filters_match(group_a, mask_a, group_b, mask_b)
}

/// Overlap test on cached boxes. Callers refresh stale boxes first.
#[inline]
pub fn aabb_check(a: &Body, b: &Body) -> bool {
    a.aabb().overlaps(&b.aabb())
}

fn refresh_aabbs(bodies: &mut [Body]) {
    for body in bodies.iter_mut() {
        if body.aabb_needs_update() {
            body.update_aabb();
        }
    }
}

/// Tests every pair of bodies.
#[derive(Copy, Clone, Debug, Default)]
pub struct NaiveBroadphase;

impl Broadphase for NaiveBroadphase {
    fn get_collision_pairs(&mut self, bodies: &mut [Body]) -> Vec<(usize, usize)> {
        refresh_aabbs(bodies);

        let mut pairs = Vec::new();
        for i in 0..bodies.len() {
            for j in 0..i {
                let (bi, bj) = (&bodies[i], &bodies[j]);
                if can_collide(bi, bj) && aabb_check(bi, bj) {
                    pairs.push((i, j));
                }
            }
        }

        log::trace!("Naive broadphase: {} bodies, {} pairs.", bodies.len(), pairs.len());
        pairs
    }
}

/// Sort-and-sweep along the x axis. The ordering is kept between calls so
/// the insertion sort only has to fix up what moved.
#[derive(Clone, Debug, Default)]
pub struct SapBroadphase {
    order: Vec<usize>,
}

impl SapBroadphase {
    fn sort(&mut self, bodies: &[Body]) {
        if self.order.len() != bodies.len() {
            self.order = (0..bodies.len()).collect();
        }

        let key = |i: usize| bodies[i].aabb().lower_bound.x;
        for i in 1..self.order.len() {
            let v = self.order[i];
            let kv = key(v);
            let mut j = i;
            while j > 0 && key(self.order[j - 1]) > kv {
                self.order[j] = self.order[j - 1];
                j -= 1;
            }
            self.order[j] = v;
        }
    }
}

impl Broadphase for SapBroadphase {
    fn get_collision_pairs(&mut self, bodies: &mut [Body]) -> Vec<(usize, usize)> {
        refresh_aabbs(bodies);
        self.sort(bodies);

        let mut pairs = Vec::new();
        for (k, &i) in self.order.iter().enumerate() {
            let bi = &bodies[i];
            let upper = bi.aabb().upper_bound.x;

            for &j in &self.order[k + 1..] {
                let bj = &bodies[j];
                if bj.aabb().lower_bound.x > upper {
                    break;
                }
                if can_collide(bi, bj) && aabb_check(bi, bj) {
                    pairs.push((i, j));
                }
            }
        }

        log::trace!("SAP broadphase: {} bodies, {} pairs.", bodies.len(), pairs.len());
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyDef;
    use crate::math::Vec2;

    fn circle_body(x: f32, mass: f32) -> Body {
        let mut b = Body::from_def(BodyDef {
            position: Vec2::new(x, 0.0),
            mass,
            ..Default::default()
        });
        b.add_shape(Shape::circle(1.0), Vec2::ZERO, 0.0);
        b
    }

    #[test]
    fn static_pairs_never_collide() {
        let a = circle_body(0.0, 0.0);
        let b = circle_body(0.5, 0.0);
        assert!(!can_collide(&a, &b));

        let mut k = circle_body(0.5, 1.0);
        k.set_body_type(BodyType::Kinematic);
        assert!(!can_collide(&a, &k));
        assert!(!can_collide(&k, &a));
    }

    #[test]
    fn sleeping_pairs_are_skipped() {
        let mut a = circle_body(0.0, 1.0);
        let mut b = circle_body(0.5, 1.0);
        let ground = circle_body(0.0, 0.0);

        a.sleep();
        assert!(can_collide(&a, &b));
        assert!(!can_collide(&a, &ground));
        assert!(!can_collide(&ground, &a));

        b.sleep();
        assert!(!can_collide(&a, &b));
    }

    #[test]
    fn masks_must_match_both_ways() {
        let mut a = Body::from_def(BodyDef {
            mass: 1.0,
            ..Default::default()
        });
        a.add_shape(Shape::circle(1.0).with_collision_group(0b01).with_collision_mask(0b10), Vec2::ZERO, 0.0);

        let mut b = Body::from_def(BodyDef {
            mass: 1.0,
            ..Default::default()
        });
        b.add_shape(Shape::circle(1.0).with_collision_group(0b10).with_collision_mask(0b10), Vec2::ZERO, 0.0);

        // a accepts b, but b does not accept a's group.
        assert!(!can_collide(&a, &b));
    }

    #[test]
    fn naive_emits_lower_index_second() {
        let mut bodies = vec![circle_body(0.0, 1.0), circle_body(1.4, 1.0), circle_body(10.0, 1.0)];
        let pairs = NaiveBroadphase.get_collision_pairs(&mut bodies);
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn sap_agrees_with_naive() {
        let mut bodies: Vec<Body> = [5.0, -1.0, 0.5, 3.0, 3.5, -8.0, 4.2]
            .iter()
            .map(|&x| circle_body(x, 1.0))
            .collect();

        let normalize = |pairs: Vec<(usize, usize)>| {
            let mut v: Vec<_> = pairs.into_iter().map(|(a, b)| (a.min(b), a.max(b))).collect();
            v.sort();
            v
        };

        let naive = normalize(NaiveBroadphase.get_collision_pairs(&mut bodies));
        let mut sap = SapBroadphase::default();
        assert_eq!(naive, normalize(sap.get_collision_pairs(&mut bodies)));

        // Move something and run again on the persistent ordering.
        bodies[5].set_position(Vec2::new(4.0, 0.5));
        let naive = normalize(NaiveBroadphase.get_collision_pairs(&mut bodies));
        assert_eq!(naive, normalize(sap.get_collision_pairs(&mut bodies)));
    }

    #[test]
    fn aabb_query_refreshes_stale_boxes() {
        let mut bodies = vec![circle_body(0.0, 1.0), circle_body(10.0, 1.0)];
        bodies[1].set_position(Vec2::new(0.5, 0.0));

        let query = Aabb::new(Vec2::new(-0.1, -0.1), Vec2::new(0.1, 0.1));
        let hits = NaiveBroadphase.aabb_query(&mut bodies, &query);
        assert_eq!(hits, vec![0, 1]);
    }
}
