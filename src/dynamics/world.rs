use std::collections::{BTreeSet, HashMap};

use crate::collision::{
    Broadphase, BroadphaseKind, BodyPairKey, CollisionSide, ContactParams, Narrowphase, OverlapKeeper, Ray,
    RaycastResult,
};
use crate::constraints::{Constraint, ConstraintDef, ConstraintId};
use crate::dynamics::{Body, BodyDef, BodyId, ContactMaterial, MaterialId, SleepState};
use crate::error::{PhysicsError, Result};
use crate::events::{EventEmitter, EventTarget, ShapeRef, WorldEvent, WorldEventKind};
use crate::math::Vec2;
use crate::shapes::Shape;
use crate::solver::{GsSolver, IslandManager};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SleepMode {
    #[default]
    NoSleeping,
    /// Each body falls asleep on its own once idle long enough.
    BodySleeping,
    /// A whole island sleeps once all its bodies are idle.
    IslandSleeping,
}

#[derive(Copy, Clone, Debug)]
pub struct WorldConfig {
    /// Solve each island separately instead of all equations at once.
    pub island_split: bool,
    pub sleep_mode: SleepMode,
    pub broadphase: BroadphaseKind,
    pub apply_gravity: bool,
    pub apply_damping: bool,
    /// Normal force used for friction. Defaults to the gravity magnitude.
    pub friction_gravity: Option<f32>,
    pub solver_tolerance: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            island_split: true,
            sleep_mode: SleepMode::NoSleeping,
            broadphase: BroadphaseKind::Naive,
            apply_gravity: true,
            apply_damping: true,
            friction_gravity: None,
            solver_tolerance: 1e-7,
        }
    }
}

pub struct World {
    pub gravity: Vec2,
    pub config: WorldConfig,
    pub solver: GsSolver,
    /// Used for shape pairs without a matching contact material.
    pub default_contact_material: ContactMaterial,
    pub events: EventEmitter<WorldEvent>,
    bodies: Vec<Body>,
    body_index: HashMap<BodyId, usize>,
    constraints: Vec<Constraint>,
    contact_materials: Vec<ContactMaterial>,
    broadphase: Box<dyn Broadphase>,
    narrowphase: Narrowphase,
    island_manager: IslandManager,
    overlap_keeper: OverlapKeeper,
    time: f32,
}

impl World {
    #[inline]
    pub fn new(gravity: Vec2, iterations: usize) -> Self {
        Self::with_config(gravity, iterations, WorldConfig::default())
    }

    pub fn with_config(gravity: Vec2, iterations: usize, config: WorldConfig) -> Self {
        Self {
            gravity,
            config,
            solver: GsSolver::new(iterations, config.solver_tolerance),
            default_contact_material: ContactMaterial::default(),
            events: EventEmitter::new(),
            bodies: Vec::new(),
            body_index: HashMap::new(),
            constraints: Vec::new(),
            contact_materials: Vec::new(),
            broadphase: config.broadphase.build(),
            narrowphase: Narrowphase::new(),
            island_manager: IslandManager::new(),
            overlap_keeper: OverlapKeeper::new(),
            time: 0.0,
        }
    }

    /// Simulated time, the sum of all step sizes so far.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_broadphase(&mut self, kind: BroadphaseKind) {
        self.config.broadphase = kind;
        self.broadphase = kind.build();
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = body.id;
        self.body_index.insert(id, self.bodies.len());
        self.bodies.push(body);

        log::debug!("Added body {:?} ({} bodies).", id, self.bodies.len());
        self.events.emit(EventTarget::World, &WorldEvent::AddBody { body: id });
        id
    }

    pub fn create_body(&mut self, def: BodyDef) -> BodyId {
        self.add_body(Body::from_def(def))
    }

    /// Remove a body and every constraint attached to it.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body> {
        let Some(index) = self.body_index.remove(&id) else {
            log::warn!("Tried to remove body {:?}, which is not in the world.", id);
            return Err(PhysicsError::UnknownBody(id));
        };

        let body = self.bodies.remove(index);
        for (i, b) in self.bodies.iter().enumerate().skip(index) {
            self.body_index.insert(b.id, i);
        }

        let before = self.constraints.len();
        self.constraints.retain(|c| !c.involves(id));
        let dropped = before - self.constraints.len();
        self.overlap_keeper.remove_body(id);

        log::debug!("Removed body {:?} and {} attached constraint(s).", id, dropped);
        self.events.emit(EventTarget::World, &WorldEvent::RemoveBody { body: id });
        Ok(body)
    }

    #[inline]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.body_index.get(&id).map(|&i| &self.bodies[i])
    }

    #[inline]
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.body_index.get(&id).map(|&i| &mut self.bodies[i])
    }

    /// Bodies in insertion order.
    #[inline]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_two_mut(&mut self, a: BodyId, b: BodyId) -> Option<(&mut Body, &mut Body)> {
        let ia = *self.body_index.get(&a)?;
        let ib = *self.body_index.get(&b)?;
        Some(bodies_two_mut(&mut self.bodies, ia, ib))
    }

    pub fn add_constraint(&mut self, def: impl Into<ConstraintDef>) -> Result<ConstraintId> {
        let def = def.into();
        let (a, b) = def.bodies();
        if a == b {
            return Err(PhysicsError::SelfConstraint(a));
        }
        let ia = *self.body_index.get(&a).ok_or(PhysicsError::UnknownBody(a))?;
        let ib = *self.body_index.get(&b).ok_or(PhysicsError::UnknownBody(b))?;

        let constraint = Constraint::from_def(&def, &self.bodies[ia], &self.bodies[ib]);
        if constraint.wake_up_bodies {
            self.bodies[ia].wake_up();
            self.bodies[ib].wake_up();
        }

        let id = constraint.id;
        self.constraints.push(constraint);
        log::debug!("Added constraint {:?} between {:?} and {:?}.", id, a, b);
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Constraint> {
        let Some(index) = self.constraints.iter().position(|c| c.id == id) else {
            log::warn!("Tried to remove constraint {:?}, which is not in the world.", id);
            return Err(PhysicsError::UnknownConstraint(id));
        };
        log::debug!("Removed constraint {:?}.", id);
        Ok(self.constraints.remove(index))
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.iter_mut().find(|c| c.id == id)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn add_contact_material(&mut self, material: ContactMaterial) {
        self.contact_materials.push(material);
    }

    /// The contact material registered for this (unordered) pair, if any.
    pub fn get_contact_material(&self, a: MaterialId, b: MaterialId) -> Option<&ContactMaterial> {
        self.contact_materials.iter().find(|cm| cm.matches(a, b))
    }

    /// Equations generated by the last step's narrowphase.
    pub fn narrowphase(&self) -> &Narrowphase {
        &self.narrowphase
    }

    pub fn island_manager(&self) -> &IslandManager {
        &self.island_manager
    }

    /// Cast `ray` against all bodies. Returns whether anything was hit.
    pub fn raycast(&mut self, result: &mut RaycastResult, ray: &mut Ray) -> bool {
        ray.update();
        let candidates = self.broadphase.aabb_query(&mut self.bodies, &ray.aabb());
        ray.intersect_bodies(result, candidates.iter().map(|&i| &self.bodies[i]));
        result.has_hit()
    }

    /// Remove all bodies and constraints.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.body_index.clear();
        self.constraints.clear();
        self.narrowphase.clear();
        self.overlap_keeper.clear();
        self.broadphase = self.config.broadphase.build();
        log::debug!("World cleared.");
    }

    fn friction_gravity(&self) -> f32 {
        match self.config.friction_gravity {
            Some(g) => g,
            None => {
                let g = self.gravity.length();
                if g > 0.0 { g } else { 10.0 }
            }
        }
    }

    fn contact_params(&self, a: &Shape, b: &Shape, friction_gravity: f32) -> ContactParams {
        let material = match (a.material, b.material) {
            (Some(ma), Some(mb)) => self.get_contact_material(ma, mb),
            _ => None,
        };
        ContactParams::from_material(material.unwrap_or(&self.default_contact_material), friction_gravity)
    }

    /// Body pairs that share a constraint with `collide_connected` off.
    fn ignored_pairs(&self) -> BTreeSet<BodyPairKey> {
        self.constraints
            .iter()
            .filter(|c| !c.collide_connected)
            .map(|c| BodyPairKey::new(c.body_a(), c.body_b()))
            .collect()
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.apply_forces(dt);

        let pairs = self.broadphase_pairs();
        self.run_narrowphase(&pairs);
        self.emit_overlap_events();
        self.wake_up_touched_bodies();

        for c in self.constraints.iter_mut() {
            let (Some(&ia), Some(&ib)) = (self.body_index.get(&c.body_a()), self.body_index.get(&c.body_b())) else {
                continue;
            };
            c.update(&self.bodies, ia, ib);
        }

        let use_islands = self.config.island_split || self.config.sleep_mode == SleepMode::IslandSleeping;
        self.solve(dt, use_islands);
        self.emit_impacts();

        for body in self.bodies.iter_mut() {
            if !body.is_static() && !body.is_sleeping() {
                body.integrate(dt);
            }
            body.set_zero_force();
        }
        self.time += dt;

        self.tick_sleep(dt, use_islands);
        self.flush_body_events();
        self.events.emit(EventTarget::World, &WorldEvent::PostStep);
    }

    fn apply_forces(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut() {
            if !body.is_dynamic() || body.is_sleeping() {
                continue;
            }
            if self.config.apply_gravity {
                let mass = body.mass();
                body.add_force(gravity * mass);
            }
            if self.config.apply_damping {
                body.apply_damping(dt);
            }
        }
    }

    fn broadphase_pairs(&mut self) -> Vec<(usize, usize)> {
        let mut pairs = self.broadphase.get_collision_pairs(&mut self.bodies);

        let ignored = self.ignored_pairs();
        if !ignored.is_empty() {
            let bodies = &self.bodies;
            pairs.retain(|&(i, j)| !ignored.contains(&BodyPairKey::new(bodies[i].id, bodies[j].id)));
        }

        log::trace!("Broadphase kept {} pair(s).", pairs.len());
        if self.events.has(WorldEventKind::PostBroadphase) {
            let pairs = pairs
                .iter()
                .map(|&(i, j)| (self.bodies[i].id, self.bodies[j].id))
                .collect();
            self.events.emit(EventTarget::World, &WorldEvent::PostBroadphase { pairs });
        }
        pairs
    }

    fn run_narrowphase(&mut self, pairs: &[(usize, usize)]) {
        self.overlap_keeper.tick();
        self.narrowphase.reset();

        let friction_gravity = self.friction_gravity();
        let mut to_wake = Vec::new();

        for &(i, j) in pairs {
            let (bi, bj) = (&self.bodies[i], &self.bodies[j]);
            let body_sensor = !bi.collision_response || !bj.collision_response;

            for si in bi.shapes() {
                for sj in bj.shapes() {
                    if !Shape::filters_match(si.collision_group, si.collision_mask, sj.collision_group, sj.collision_mask)
                    {
                        continue;
                    }

                    self.narrowphase.params = self.contact_params(si, sj, friction_gravity);
                    let test_only = body_sensor || !si.collision_response || !sj.collision_response;
                    let count = self.narrowphase.collide(
                        CollisionSide {
                            index: i,
                            body: bi,
                            shape: si,
                        },
                        CollisionSide {
                            index: j,
                            body: bj,
                            shape: sj,
                        },
                        test_only,
                    );
                    if count == 0 {
                        continue;
                    }

                    if wakes(bi, bj) {
                        to_wake.push(i);
                    }
                    if wakes(bj, bi) {
                        to_wake.push(j);
                    }
                    self.overlap_keeper.set_overlapping(
                        ShapeRef {
                            body: bi.id,
                            shape: si.id,
                        },
                        ShapeRef {
                            body: bj.id,
                            shape: sj.id,
                        },
                    );
                }
            }
        }

        for i in to_wake {
            self.bodies[i].wake_up_after_narrowphase = true;
        }

        log::trace!(
            "Narrowphase produced {} contact and {} friction equation(s).",
            self.narrowphase.contact_count(),
            self.narrowphase.friction_count()
        );
    }

    fn emit_overlap_events(&self) {
        for key in self.overlap_keeper.new_overlaps() {
            self.events.emit(
                EventTarget::World,
                &WorldEvent::BeginContact {
                    shape_a: key.a,
                    shape_b: key.b,
                },
            );
        }
        for key in self.overlap_keeper.end_overlaps() {
            self.events.emit(
                EventTarget::World,
                &WorldEvent::EndContact {
                    shape_a: key.a,
                    shape_b: key.b,
                },
            );
        }
    }

    fn wake_up_touched_bodies(&mut self) {
        for body in self.bodies.iter_mut() {
            if body.wake_up_after_narrowphase {
                body.wake_up();
                body.wake_up_after_narrowphase = false;
            }
        }
    }

    fn solve(&mut self, dt: f32, use_islands: bool) {
        let World {
            bodies,
            constraints,
            narrowphase,
            island_manager,
            solver,
            config,
            ..
        } = self;

        for body in bodies.iter_mut() {
            body.update_solve_mass_properties();
            body.reset_constraint_velocity();
        }

        let mut equations = narrowphase.equations_mut();
        for c in constraints.iter_mut() {
            equations.extend(c.solver_equations());
        }

        let islands = if use_islands {
            island_manager.split(bodies, equations.iter().map(|eq| (eq.body_a, eq.body_b)))
        } else {
            Vec::new()
        };

        // A zero step cannot produce impulses; skip the solver entirely.
        if dt <= 0.0 {
            return;
        }

        if use_islands && config.island_split {
            for island in islands {
                solver.solve(dt, bodies, &mut equations, &island.equations, &island.bodies);
            }
        } else {
            solver.solve_all(dt, bodies, &mut equations);
        }
    }

    fn emit_impacts(&self) {
        if !self.events.has(WorldEventKind::Impact) {
            return;
        }

        let mut seen = BTreeSet::new();
        for eq in self.narrowphase.contact_equations() {
            let Some(contact) = eq.contact() else { continue };
            if !contact.first_impact {
                continue;
            }
            let (a, b) = (self.bodies[eq.body_a].id, self.bodies[eq.body_b].id);
            if seen.insert(BodyPairKey::new(a, b)) {
                self.events
                    .emit(EventTarget::World, &WorldEvent::Impact { body_a: a, body_b: b });
            }
        }
    }

    fn tick_sleep(&mut self, dt: f32, use_islands: bool) {
        match self.config.sleep_mode {
            SleepMode::NoSleeping => {}
            SleepMode::BodySleeping => {
                let time = self.time;
                for body in self.bodies.iter_mut() {
                    body.sleep_tick(time, false, dt);
                }
            }
            SleepMode::IslandSleeping => {
                let time = self.time;
                for body in self.bodies.iter_mut() {
                    body.sleep_tick(time, true, dt);
                }
                if use_islands {
                    for island in self.island_manager.islands() {
                        if island.wants_to_sleep(&self.bodies) {
                            island.sleep(&mut self.bodies);
                        }
                    }
                }
            }
        }
    }

    fn flush_body_events(&mut self) {
        for body in self.bodies.iter_mut() {
            let id = body.id;
            for event in body.drain_events() {
                self.events.emit(EventTarget::Body(id), &event);
            }
        }
    }
}

/// Whether `sleeper` should wake because `other` hit it fast enough.
fn wakes(sleeper: &Body, other: &Body) -> bool {
    if !sleeper.allow_sleep || !sleeper.is_dynamic() || !sleeper.is_sleeping() {
        return false;
    }
    if other.sleep_state() != SleepState::Awake || other.is_static() {
        return false;
    }
    let speed_sq = other.velocity.length_squared() + other.angular_velocity * other.angular_velocity;
    speed_sq >= 2.0 * other.sleep_speed_limit * other.sleep_speed_limit
}

pub(crate) fn bodies_two_mut(bodies: &mut [Body], a: usize, b: usize) -> (&mut Body, &mut Body) {
    assert!(a != b, "bodies_two_mut called with identical indices");

    let (i, j) = if a <= b { (a, b) } else { (b, a) };
    let (left, right) = bodies.split_at_mut(j);
    let bi = &mut left[i];
    let bj = &mut right[0];

    if a < b { (bi, bj) } else { (bj, bi) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::BodyType;
    use approx::assert_relative_eq;

    fn circle(def: BodyDef) -> Body {
        let mut b = Body::from_def(def);
        b.add_shape(Shape::circle(0.5), Vec2::ZERO, 0.0);
        b
    }

    #[test]
    fn add_body_returns_valid_id() {
        let mut world = World::new(Vec2::new(0.0, -10.0), 10);
        let id = world.add_body(circle(BodyDef {
            mass: 1.0,
            ..Default::default()
        }));

        let b = world.body(id).expect("body was just added");
        assert_relative_eq!(b.mass(), 1.0);
        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn step_static_body_does_not_move() {
        let mut world = World::new(Vec2::new(0.0, -10.0), 10);
        let id = world.add_body(circle(BodyDef {
            position: Vec2::new(0.0, 5.0),
            ..Default::default()
        }));

        world.step(0.1);

        let b = world.body(id).expect("static body");
        assert_eq!(b.body_type(), BodyType::Static);
        assert_relative_eq!(b.position(), Vec2::new(0.0, 5.0));
        assert_relative_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn step_dynamic_body_accelerates_under_gravity() {
        let mut world = World::new(Vec2::new(0.0, -10.0), 10);
        let id = world.add_body(circle(BodyDef {
            mass: 2.0,
            ..Default::default()
        }));

        world.step(0.1);

        // v += g * dt, then x += v * dt.
        let b = world.body(id).expect("dynamic body");
        assert_relative_eq!(b.velocity.y, -1.0, epsilon = 1e-6);
        assert_relative_eq!(b.position().y, -0.1, epsilon = 1e-6);
        assert_relative_eq!(world.time(), 0.1);
    }

    #[test]
    fn forces_are_cleared_after_step() {
        let mut world = World::new(Vec2::ZERO, 10);
        let id = world.add_body(circle(BodyDef {
            mass: 1.0,
            ..Default::default()
        }));

        {
            let b = world.body_mut(id).expect("dynamic body");
            b.add_force(Vec2::new(3.0, 4.0));
            b.torque = 2.0;
        }

        world.step(0.1);

        let b = world.body(id).expect("dynamic body");
        assert_relative_eq!(b.force, Vec2::ZERO);
        assert_relative_eq!(b.torque, 0.0);
    }

    #[test]
    fn self_constraint_is_rejected() {
        let mut world = World::new(Vec2::ZERO, 10);
        let id = world.add_body(circle(BodyDef {
            mass: 1.0,
            ..Default::default()
        }));

        let def = crate::constraints::GearConstraintDef::new(id, id);
        assert_eq!(world.add_constraint(def), Err(PhysicsError::SelfConstraint(id)));
    }

    #[test]
    fn removing_unknown_body_fails() {
        let mut world = World::new(Vec2::ZERO, 10);
        let stray = Body::from_def(BodyDef::default());
        assert_eq!(
            world.remove_body(stray.id).map(|b| b.id),
            Err(PhysicsError::UnknownBody(stray.id))
        );
    }

    #[test]
    fn friction_gravity_falls_back_to_ten() {
        let world = World::new(Vec2::ZERO, 10);
        assert_eq!(world.friction_gravity(), 10.0);

        let world = World::new(Vec2::new(0.0, -9.81), 10);
        assert_relative_eq!(world.friction_gravity(), 9.81);
    }

    #[test]
    #[should_panic(expected = "identical indices")]
    fn bodies_two_mut_rejects_aliasing() {
        let mut bodies = vec![Body::from_def(BodyDef::default())];
        let _ = bodies_two_mut(&mut bodies, 0, 0);
    }
}
