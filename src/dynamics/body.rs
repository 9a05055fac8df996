use std::sync::atomic::{AtomicU32, Ordering};

use crate::collision::Aabb;
use crate::events::WorldEvent;
use crate::math::{Mat22, Vec2};
use crate::shapes::{Shape, ShapeId};

static NEXT_BODY_ID: AtomicU32 = AtomicU32::new(0);

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl BodyId {
    fn next() -> Self {
        Self(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BodyType {
    /// Never moves, infinite mass.
    Static,
    Dynamic,
    /// Moves with its own velocity, unaffected by forces and contacts.
    Kinematic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SleepState {
    Awake,
    Sleepy,
    Sleeping,
}

#[derive(Copy, Clone, Debug)]
pub struct BodyDef {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub mass: f32,
    /// None => Dynamic if `mass > 0`, Static otherwise.
    pub body_type: Option<BodyType>,
    pub damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,
    pub allow_sleep: bool,
    pub sleep_speed_limit: f32,
    pub sleep_time_limit: f32,
    pub collision_response: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 0.0,
            body_type: None,
            damping: 0.1,
            angular_damping: 0.1,
            fixed_rotation: false,
            allow_sleep: true,
            sleep_speed_limit: 0.2,
            sleep_time_limit: 1.0,
            collision_response: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,

    position: Vec2,
    angle: f32,

    pub velocity: Vec2,
    pub angular_velocity: f32,

    pub force: Vec2,
    pub torque: f32,

    pub damping: f32,
    pub angular_damping: f32,
    pub collision_response: bool,

    pub allow_sleep: bool,
    pub sleep_speed_limit: f32,
    pub sleep_time_limit: f32,

    body_type: BodyType,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    fixed_rotation: bool,

    // Solver scratch: effective inverse mass and accumulated velocity deltas.
    pub(crate) inv_mass_solve: f32,
    pub(crate) inv_inertia_solve: f32,
    pub(crate) vlambda: Vec2,
    pub(crate) wlambda: f32,

    shapes: Vec<Shape>,
    aabb: Aabb,
    aabb_needs_update: bool,

    sleep_state: SleepState,
    idle_time: f32,
    pub(crate) wants_to_sleep: bool,
    pub(crate) wake_up_after_narrowphase: bool,
    time_last_sleepy: f32,
    pending_events: Vec<WorldEvent>,
}

impl Body {
    pub fn from_def(def: BodyDef) -> Self {
        let body_type = def.body_type.unwrap_or(if def.mass > 0.0 {
            BodyType::Dynamic
        } else {
            BodyType::Static
        });

        let mut body = Self {
            id: BodyId::next(),
            position: def.position,
            angle: def.angle,
            velocity: def.velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2::ZERO,
            torque: 0.0,
            damping: def.damping,
            angular_damping: def.angular_damping,
            collision_response: def.collision_response,
            allow_sleep: def.allow_sleep,
            sleep_speed_limit: def.sleep_speed_limit,
            sleep_time_limit: def.sleep_time_limit,
            body_type,
            mass: def.mass,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            fixed_rotation: def.fixed_rotation,
            inv_mass_solve: 0.0,
            inv_inertia_solve: 0.0,
            vlambda: Vec2::ZERO,
            wlambda: 0.0,
            shapes: Vec::new(),
            aabb: Aabb::new(def.position, def.position),
            aabb_needs_update: true,
            sleep_state: SleepState::Awake,
            idle_time: 0.0,
            wants_to_sleep: false,
            wake_up_after_narrowphase: false,
            time_last_sleepy: 0.0,
            pending_events: Vec::new(),
        };
        body.update_mass_properties();
        body
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.aabb_needs_update = true;
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.aabb_needs_update = true;
    }

    #[inline]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        self.update_mass_properties();
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.update_mass_properties();
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    #[inline]
    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.fixed_rotation = fixed;
        self.update_mass_properties();
    }

    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Attach `shape` at `offset`/`angle` in body coordinates.
    pub fn add_shape(&mut self, mut shape: Shape, offset: Vec2, angle: f32) -> ShapeId {
        shape.position = offset;
        shape.angle = angle;
        shape.body = Some(self.id);
        let id = shape.id;
        self.shapes.push(shape);
        self.update_mass_properties();
        self.aabb_needs_update = true;
        id
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let idx = self.shapes.iter().position(|s| s.id == id)?;
        let mut shape = self.shapes.remove(idx);
        shape.body = None;
        self.update_mass_properties();
        self.aabb_needs_update = true;
        Some(shape)
    }

    pub fn area(&self) -> f32 {
        self.shapes.iter().map(Shape::area).sum()
    }

    /// Set the mass from the total shape area.
    pub fn set_density(&mut self, density: f32) {
        self.mass = self.area() * density;
        self.update_mass_properties();
    }

    /// Recompute inverse mass and inertia from the shapes.
    ///
    /// Mass is split evenly between shapes; each shape contributes its own
    /// moment plus the parallel-axis term for its offset.
    pub fn update_mass_properties(&mut self) {
        if self.body_type != BodyType::Dynamic {
            self.inv_mass = 0.0;
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
            return;
        }

        let n = self.shapes.len().max(1) as f32;
        let m = self.mass / n;
        let mut inertia = 0.0;

        if !self.fixed_rotation {
            for shape in &self.shapes {
                let r2 = shape.position.length_squared();
                inertia += shape.compute_moment_of_inertia(m) + m * r2;
            }
        }

        self.inertia = inertia;
        self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
        self.inv_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
    }

    /// Group and mask unions over all shapes.
    pub fn collision_filter(&self) -> (u32, u32) {
        self.shapes
            .iter()
            .fold((0, 0), |(g, m), s| (g | s.collision_group, m | s.collision_mask))
    }

    /// World position and angle of a shape attached to this body.
    #[inline]
    pub fn shape_world_transform(&self, shape: &Shape) -> (Vec2, f32) {
        (
            self.position + Mat22::from_angle(self.angle) * shape.position,
            self.angle + shape.angle,
        )
    }

    pub fn update_aabb(&mut self) {
        self.aabb = self.compute_aabb();
        self.aabb_needs_update = false;
    }

    /// Bounding box over all shapes, recomputed only when stale.
    pub fn get_aabb(&mut self) -> Aabb {
        if self.aabb_needs_update {
            self.update_aabb();
        }
        self.aabb
    }

    /// Like `get_aabb` but without refreshing the cache.
    pub fn aabb(&self) -> Aabb {
        if self.aabb_needs_update { self.compute_aabb() } else { self.aabb }
    }

    #[inline]
    pub fn aabb_needs_update(&self) -> bool {
        self.aabb_needs_update
    }

    fn compute_aabb(&self) -> Aabb {
        let mut shapes = self.shapes.iter();
        let Some(first) = shapes.next() else {
            return Aabb::new(self.position, self.position);
        };

        let (pos, angle) = self.shape_world_transform(first);
        let mut aabb = first.compute_aabb(pos, angle);
        for shape in shapes {
            let (pos, angle) = self.shape_world_transform(shape);
            aabb.extend(&shape.compute_aabb(pos, angle));
        }
        aabb
    }

    pub fn to_local_frame(&self, world_point: Vec2) -> Vec2 {
        Mat22::from_angle(self.angle).transpose() * (world_point - self.position)
    }

    pub fn to_world_frame(&self, local_point: Vec2) -> Vec2 {
        Mat22::from_angle(self.angle) * local_point + self.position
    }

    pub fn vector_to_local_frame(&self, world_vector: Vec2) -> Vec2 {
        Mat22::from_angle(self.angle).transpose() * world_vector
    }

    pub fn vector_to_world_frame(&self, local_vector: Vec2) -> Vec2 {
        Mat22::from_angle(self.angle) * local_vector
    }

    #[inline]
    pub fn add_force(&mut self, f: Vec2) {
        self.force += f;
    }

    /// Force applied at `relative_point` (world-oriented offset from the body origin).
    pub fn apply_force(&mut self, force: Vec2, relative_point: Vec2) {
        self.force += force;
        self.torque += relative_point.cross(force);
    }

    /// Force and point both given in body coordinates.
    pub fn apply_force_local(&mut self, local_force: Vec2, local_point: Vec2) {
        let force = self.vector_to_world_frame(local_force);
        let point = self.vector_to_world_frame(local_point);
        self.apply_force(force, point);
    }

    pub fn apply_impulse(&mut self, impulse: Vec2, relative_point: Vec2) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += relative_point.cross(impulse) * self.inv_inertia;
    }

    pub fn apply_impulse_local(&mut self, local_impulse: Vec2, local_point: Vec2) {
        let impulse = self.vector_to_world_frame(local_impulse);
        let point = self.vector_to_world_frame(local_point);
        self.apply_impulse(impulse, point);
    }

    pub fn set_zero_force(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Velocity of the material point at `relative_point`.
    pub fn velocity_at_point(&self, relative_point: Vec2) -> Vec2 {
        self.velocity + Vec2::cross_scalar_vec(self.angular_velocity, relative_point)
    }

    pub fn apply_damping(&mut self, dt: f32) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.velocity *= (1.0 - self.damping).powf(dt);
        self.angular_velocity *= (1.0 - self.angular_damping).powf(dt);
    }

    /// Semi-implicit Euler step.
    pub fn integrate(&mut self, dt: f32) {
        if !self.fixed_rotation {
            self.angular_velocity += self.torque * self.inv_inertia * dt;
        }
        self.velocity += self.force * (self.inv_mass * dt);

        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
        self.aabb_needs_update = true;
    }

    pub(crate) fn update_solve_mass_properties(&mut self) {
        if self.sleep_state == SleepState::Sleeping || self.body_type == BodyType::Kinematic {
            self.inv_mass_solve = 0.0;
            self.inv_inertia_solve = 0.0;
        } else {
            self.inv_mass_solve = self.inv_mass;
            self.inv_inertia_solve = self.inv_inertia;
        }
    }

    pub(crate) fn add_constraint_velocity(&mut self) {
        self.velocity += self.vlambda;
        self.angular_velocity += self.wlambda;
    }

    pub(crate) fn reset_constraint_velocity(&mut self) {
        self.vlambda = Vec2::ZERO;
        self.wlambda = 0.0;
    }

    #[inline]
    pub fn sleep_state(&self) -> SleepState {
        self.sleep_state
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.sleep_state == SleepState::Sleeping
    }

    pub fn time_last_sleepy(&self) -> f32 {
        self.time_last_sleepy
    }

    pub fn sleep(&mut self) {
        if self.sleep_state == SleepState::Sleeping {
            return;
        }
        self.sleep_state = SleepState::Sleeping;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.set_zero_force();
        log::debug!("Body {:?} fell asleep.", self.id);
        self.pending_events.push(WorldEvent::Sleep);
    }

    pub fn wake_up(&mut self) {
        let previous = self.sleep_state;
        self.sleep_state = SleepState::Awake;
        self.idle_time = 0.0;
        if previous != SleepState::Awake {
            log::debug!("Body {:?} woke up.", self.id);
            self.pending_events.push(WorldEvent::WakeUp);
        }
    }

    /// Advance the idle timer. With `dont_sleep` the body only records that
    /// it wants to sleep, leaving the decision to its island.
    pub fn sleep_tick(&mut self, time: f32, dont_sleep: bool, dt: f32) {
        if !self.allow_sleep || self.sleep_state == SleepState::Sleeping {
            return;
        }

        self.wants_to_sleep = false;

        let speed_sq = self.velocity.length_squared() + self.angular_velocity * self.angular_velocity;
        if speed_sq >= self.sleep_speed_limit * self.sleep_speed_limit {
            self.idle_time = 0.0;
            self.sleep_state = SleepState::Awake;
        } else {
            self.idle_time += dt;
            if self.sleep_state == SleepState::Awake {
                self.sleep_state = SleepState::Sleepy;
                self.time_last_sleepy = time;
                self.pending_events.push(WorldEvent::Sleepy);
            }
        }

        if self.idle_time > self.sleep_time_limit {
            if dont_sleep {
                self.wants_to_sleep = true;
            } else {
                self.sleep();
            }
        }
    }

    pub(crate) fn drain_events(&mut self) -> std::vec::Drain<'_, WorldEvent> {
        self.pending_events.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dynamic_box(mass: f32) -> Body {
        let mut b = Body::from_def(BodyDef {
            mass,
            ..Default::default()
        });
        b.add_shape(Shape::rectangle(2.0, 4.0), Vec2::ZERO, 0.0);
        b
    }

    #[test]
    fn zero_mass_infers_static_with_zero_inverses() {
        let mut b = Body::from_def(BodyDef::default());
        b.add_shape(Shape::circle(1.0), Vec2::ZERO, 0.0);

        assert_eq!(b.body_type(), BodyType::Static);
        assert_eq!(b.inv_mass(), 0.0);
        assert_eq!(b.inv_inertia(), 0.0);
    }

    #[test]
    fn kinematic_has_zero_inverses_even_with_mass() {
        let mut b = Body::from_def(BodyDef {
            mass: 5.0,
            body_type: Some(BodyType::Kinematic),
            ..Default::default()
        });
        b.add_shape(Shape::circle(1.0), Vec2::ZERO, 0.0);

        assert_eq!(b.inv_mass(), 0.0);
        assert_eq!(b.inv_inertia(), 0.0);
    }

    #[test]
    fn dynamic_mass_properties_from_box() {
        let b = dynamic_box(3.0);
        assert_relative_eq!(b.inv_mass(), 1.0 / 3.0, epsilon = 1e-6);

        // i = m*(w^2 + h^2)/12
        let i = 3.0 * (4.0 + 16.0) / 12.0;
        assert_relative_eq!(b.inv_inertia(), 1.0 / i, epsilon = 1e-6);
    }

    #[test]
    fn offset_shape_adds_parallel_axis_term() {
        let mut b = Body::from_def(BodyDef {
            mass: 2.0,
            ..Default::default()
        });
        b.add_shape(Shape::circle(1.0), Vec2::new(3.0, 0.0), 0.0);
        assert_relative_eq!(b.inertia(), 2.0 * 0.5 + 2.0 * 9.0, epsilon = 1e-5);
    }

    #[test]
    fn fixed_rotation_zeroes_inertia() {
        let mut b = dynamic_box(1.0);
        b.set_fixed_rotation(true);
        assert_eq!(b.inv_inertia(), 0.0);
    }

    #[test]
    fn aabb_is_lazy_and_tracks_moves() {
        let mut b = dynamic_box(1.0);
        let aabb = b.get_aabb();
        assert!(!b.aabb_needs_update());
        assert_relative_eq!(aabb.upper_bound, Vec2::new(1.0, 2.0), epsilon = 1e-6);

        b.set_position(Vec2::new(10.0, 0.0));
        assert!(b.aabb_needs_update());
        assert_relative_eq!(b.get_aabb().lower_bound, Vec2::new(9.0, -2.0), epsilon = 1e-6);
    }

    #[test]
    fn frame_transforms_round_trip() {
        let mut b = dynamic_box(1.0);
        b.set_position(Vec2::new(1.0, 2.0));
        b.set_angle(0.5);

        let p = Vec2::new(-3.0, 4.0);
        assert_relative_eq!(b.to_world_frame(b.to_local_frame(p)), p, epsilon = 1e-5);

        let v = Vec2::new(0.0, 1.0);
        assert_relative_eq!(b.vector_to_local_frame(b.vector_to_world_frame(v)), v, epsilon = 1e-5);
    }

    #[test]
    fn force_at_point_creates_torque() {
        let mut b = dynamic_box(1.0);
        b.apply_force(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.0));
        b.add_force(Vec2::new(-0.5, 3.0));

        assert_relative_eq!(b.force, Vec2::new(-0.5, 5.0), epsilon = 1e-6);
        assert_relative_eq!(b.torque, 2.0, epsilon = 1e-6);

        b.set_zero_force();
        assert_eq!(b.force, Vec2::ZERO);
        assert_eq!(b.torque, 0.0);
    }

    #[test]
    fn impulse_changes_velocity_immediately() {
        let mut b = dynamic_box(2.0);
        b.apply_impulse(Vec2::new(4.0, 0.0), Vec2::ZERO);
        assert_relative_eq!(b.velocity, Vec2::new(2.0, 0.0), epsilon = 1e-6);
        assert_eq!(b.angular_velocity, 0.0);
    }

    #[test]
    fn integrate_is_semi_implicit() {
        let mut b = dynamic_box(2.0);
        b.add_force(Vec2::new(0.0, -20.0));
        b.integrate(0.1);

        // v = 0 + dt * f / m = -1; x = dt * v = -0.1
        assert_relative_eq!(b.velocity.y, -1.0, epsilon = 1e-6);
        assert_relative_eq!(b.position().y, -0.1, epsilon = 1e-6);
    }

    #[test]
    fn sleep_tick_goes_sleepy_then_asleep() {
        let mut b = dynamic_box(1.0);
        b.sleep_time_limit = 0.5;

        b.sleep_tick(0.0, false, 0.3);
        assert_eq!(b.sleep_state(), SleepState::Sleepy);

        b.sleep_tick(0.3, false, 0.3);
        assert_eq!(b.sleep_state(), SleepState::Sleeping);

        let events: Vec<_> = b.drain_events().collect();
        assert_eq!(events, vec![WorldEvent::Sleepy, WorldEvent::Sleep]);

        b.wake_up();
        assert_eq!(b.sleep_state(), SleepState::Awake);
        assert_eq!(b.drain_events().collect::<Vec<_>>(), vec![WorldEvent::WakeUp]);
    }

    #[test]
    fn fast_body_stays_awake() {
        let mut b = dynamic_box(1.0);
        b.velocity = Vec2::new(5.0, 0.0);
        for i in 0..10 {
            b.sleep_tick(i as f32, false, 1.0);
        }
        assert_eq!(b.sleep_state(), SleepState::Awake);
    }
}
