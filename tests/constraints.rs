use approx::assert_relative_eq;

use rigid2d::PhysicsError;
use rigid2d::constraints::{
    DistanceConstraintDef, GearConstraintDef, PrismaticConstraintDef, RevoluteConstraintDef,
};
use rigid2d::dynamics::{Body, BodyDef, BodyId, World};
use rigid2d::math::Vec2;
use rigid2d::shapes::Shape;

const DT: f32 = 1.0 / 60.0;

fn anchor(world: &mut World) -> BodyId {
    world.add_body(Body::from_def(BodyDef::default()))
}

fn disc(world: &mut World, position: Vec2, velocity: Vec2) -> BodyId {
    let mut b = Body::from_def(BodyDef {
        position,
        velocity,
        mass: 1.0,
        damping: 0.0,
        angular_damping: 0.0,
        ..Default::default()
    });
    b.add_shape(Shape::circle(0.25), Vec2::ZERO, 0.0);
    world.add_body(b)
}

#[test]
fn pendulum_keeps_its_length() {
    let mut world = World::new(Vec2::new(0.0, -10.0), 10);
    let pin = anchor(&mut world);
    let bob = disc(&mut world, Vec2::new(1.0, 0.0), Vec2::ZERO);
    world
        .add_constraint(RevoluteConstraintDef::new(pin, bob, Vec2::ZERO))
        .expect("pendulum");

    for _ in 0..60 {
        world.step(DT);
        let r = world.body(bob).expect("bob").position().length();
        assert!((r - 1.0).abs() < 0.05, "arm stretched to {r}");
    }
    assert!(world.body(bob).expect("bob").position().y < -0.5);
}

#[test]
fn distance_constraint_holds_spinning_pair() {
    let mut world = World::new(Vec2::ZERO, 10);
    let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let b = disc(&mut world, Vec2::new(2.0, 0.0), Vec2::new(0.0, 3.0));
    let id = world.add_constraint(DistanceConstraintDef::new(a, b)).expect("link");

    for _ in 0..60 {
        world.step(DT);
    }

    let (pa, pb) = (world.body(a).expect("a").position(), world.body(b).expect("b").position());
    assert_relative_eq!(pa.distance(pb), 2.0, epsilon = 0.05);
    let link = world.constraint(id).and_then(|c| c.as_distance()).expect("distance constraint");
    assert_relative_eq!(link.distance, 2.0);
}

#[test]
fn gear_angle_defaults_to_current_offset() {
    let mut world = World::new(Vec2::ZERO, 10);
    let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let b = disc(&mut world, Vec2::new(3.0, 0.0), Vec2::ZERO);
    world.body_mut(b).expect("b").set_angle(0.3);

    let id = world
        .add_constraint(GearConstraintDef {
            ratio: 2.0,
            ..GearConstraintDef::new(a, b)
        })
        .expect("gear");

    let gear = world.constraint(id).and_then(|c| c.as_gear()).expect("gear constraint");
    assert_relative_eq!(gear.angle, 0.3);
    assert_relative_eq!(gear.ratio, 2.0);
}

#[test]
fn gear_couples_angular_velocities() {
    let mut world = World::new(Vec2::ZERO, 20);
    let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let b = disc(&mut world, Vec2::new(3.0, 0.0), Vec2::ZERO);
    world.body_mut(a).expect("a").angular_velocity = 1.0;
    world
        .add_constraint(GearConstraintDef {
            ratio: 2.0,
            ..GearConstraintDef::new(a, b)
        })
        .expect("gear");

    for _ in 0..60 {
        world.step(DT);
    }

    let (wa, wb) = (
        world.body(a).expect("a").angular_velocity,
        world.body(b).expect("b").angular_velocity,
    );
    assert!(wa.abs() > 0.05);
    assert_relative_eq!(wb, 2.0 * wa, epsilon = 1e-2);
}

#[test]
fn revolute_motor_reaches_target_speed() {
    let mut world = World::new(Vec2::ZERO, 10);
    let pin = anchor(&mut world);
    let wheel = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let id = world
        .add_constraint(RevoluteConstraintDef::new(pin, wheel, Vec2::ZERO))
        .expect("axle");

    let axle = world.constraint_mut(id).expect("axle");
    axle.enable_motor();
    axle.set_motor_speed(2.0);

    for _ in 0..30 {
        world.step(DT);
    }
    assert_relative_eq!(world.body(wheel).expect("wheel").angular_velocity, 2.0, epsilon = 1e-2);
    assert!(world.constraint(id).and_then(|c| c.as_revolute()).expect("revolute").motor_enabled);
}

#[test]
fn revolute_upper_limit_stops_rotation() {
    let mut world = World::new(Vec2::ZERO, 10);
    let pin = anchor(&mut world);
    let arm = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    world.body_mut(arm).expect("arm").angular_velocity = 5.0;
    let id = world
        .add_constraint(RevoluteConstraintDef::new(pin, arm, Vec2::ZERO))
        .expect("hinge");
    world.constraint_mut(id).expect("hinge").set_limits(Some(-0.5), Some(0.5));

    for _ in 0..60 {
        world.step(DT);
    }
    let angle = world.body(arm).expect("arm").angle();
    assert!(angle < 0.6, "hinge rotated to {angle}");
}

#[test]
fn prismatic_upper_limit_stops_slider() {
    let mut world = World::new(Vec2::ZERO, 10);
    let rail = anchor(&mut world);
    let slider = disc(&mut world, Vec2::ZERO, Vec2::new(5.0, 0.0));
    world
        .add_constraint(PrismaticConstraintDef {
            upper_limit: Some(1.0),
            ..PrismaticConstraintDef::new(rail, slider)
        })
        .expect("rail");

    for _ in 0..60 {
        world.step(DT);
    }

    let p = world.body(slider).expect("slider").position();
    assert!(p.x < 1.15, "slider overshot to {}", p.x);
    assert!(p.x > 0.8);
    assert_relative_eq!(p.y, 0.0, epsilon = 1e-3);
}

#[test]
fn prismatic_motor_drives_along_axis() {
    let mut world = World::new(Vec2::ZERO, 10);
    let rail = anchor(&mut world);
    let slider = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let id = world
        .add_constraint(PrismaticConstraintDef::new(rail, slider))
        .expect("rail");

    let rail_constraint = world.constraint_mut(id).expect("rail");
    rail_constraint.enable_motor();
    rail_constraint.set_motor_speed(2.0);

    for _ in 0..30 {
        world.step(DT);
    }
    let v = world.body(slider).expect("slider").velocity;
    assert_relative_eq!(v.x, 2.0, epsilon = 1e-2);
    assert_relative_eq!(v.y, 0.0, epsilon = 1e-3);
}

#[test]
fn connected_bodies_skip_contacts_unless_allowed() {
    for collide_connected in [false, true] {
        let mut world = World::new(Vec2::ZERO, 10);
        let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
        let b = disc(&mut world, Vec2::new(0.3, 0.0), Vec2::ZERO);
        world
            .add_constraint(DistanceConstraintDef {
                collide_connected,
                ..DistanceConstraintDef::new(a, b)
            })
            .expect("link");

        world.step(DT);
        assert_eq!(world.narrowphase().contact_count() > 0, collide_connected);
    }
}

#[test]
fn removing_constraints_and_bodies() {
    let mut world = World::new(Vec2::ZERO, 10);
    let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let b = disc(&mut world, Vec2::new(2.0, 0.0), Vec2::ZERO);
    let c = disc(&mut world, Vec2::new(4.0, 0.0), Vec2::ZERO);

    let ab = world.add_constraint(DistanceConstraintDef::new(a, b)).expect("ab");
    world.add_constraint(DistanceConstraintDef::new(b, c)).expect("bc");

    let removed = world.remove_constraint(ab).expect("ab is in the world");
    assert_eq!(removed.id, ab);
    assert!(matches!(world.remove_constraint(ab), Err(PhysicsError::UnknownConstraint(id)) if id == ab));
    assert_eq!(world.constraints().len(), 1);

    world.remove_body(c).expect("c is in the world");
    assert!(world.constraints().is_empty());
}

#[test]
fn invalid_constraints_are_rejected() {
    let mut world = World::new(Vec2::ZERO, 10);
    let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let b = disc(&mut world, Vec2::new(2.0, 0.0), Vec2::ZERO);
    world.remove_body(b).expect("b is in the world");

    assert!(world.add_constraint(DistanceConstraintDef::new(a, a)).is_err());
    assert!(matches!(
        world.add_constraint(DistanceConstraintDef::new(a, b)),
        Err(PhysicsError::UnknownBody(id)) if id == b
    ));
}

#[test]
fn limits_on_a_gear_are_ignored() {
    let mut world = World::new(Vec2::ZERO, 10);
    let a = disc(&mut world, Vec2::ZERO, Vec2::ZERO);
    let b = disc(&mut world, Vec2::new(3.0, 0.0), Vec2::ZERO);
    let id = world.add_constraint(GearConstraintDef::new(a, b)).expect("gear");

    let gear = world.constraint_mut(id).expect("gear");
    let before = gear.equations().len();
    gear.set_limits(Some(-1.0), Some(1.0));
    gear.enable_motor();

    assert_eq!(gear.equations().len(), before);
    assert!(gear.as_gear().is_some());
}
