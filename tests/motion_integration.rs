use kestrel::{BodyHandle, FixedNum, FixedVec2, ShapeDef, World, WorldConfig};

fn fx(v: f32) -> FixedNum {
    FixedNum::from_num(v)
}

fn v(x: f32, y: f32) -> FixedVec2 {
    FixedVec2::from_f32(x, y)
}

/// Floor top at y = 0, wall face at x = 0, meeting in a right angle.
fn corner(world: &mut World) {
    world
        .create_static(v(-10.0, -0.5), FixedNum::ZERO, [ShapeDef::rectangle(fx(10.0), fx(0.5))])
        .unwrap();
    world
        .create_static(v(0.5, 5.0), FixedNum::ZERO, [ShapeDef::rectangle(fx(0.5), fx(5.0))])
        .unwrap();
}

fn mover(world: &mut World, position: FixedVec2) -> BodyHandle {
    world
        .create_kinematic(position, FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap()
}

#[test]
fn test_move_and_collide_stops_at_wall() {
    let mut world = World::new(WorldConfig::default());
    corner(&mut world);
    let ball = mover(&mut world, v(-2.0, 2.0));

    // 120 units/s for one 60 Hz tick is about 2 units, but the wall is 1.5 away
    let hit = world.move_and_collide(ball, v(120.0, 0.0), None).unwrap().unwrap();
    let position = world.body(ball).unwrap().position();
    assert!((position.x - fx(-0.5)).abs() < fx(0.01), "stopped at {}", position.x);
    assert!(hit.normal.x < fx(-0.9));
    assert!(hit.remainder.x > FixedNum::ZERO && hit.remainder.x < fx(120.0));
    assert_eq!(position, v(-2.0, 2.0) + hit.travel);
}

#[test]
fn test_move_and_collide_free_motion() {
    let mut world = World::new(WorldConfig::default());
    corner(&mut world);
    let ball = mover(&mut world, v(-5.0, 3.0));

    let hit = world.move_and_collide(ball, v(-60.0, 0.0), None).unwrap();
    assert!(hit.is_none());
    let expected = v(-5.0, 3.0) + v(-60.0, 0.0) * world.delta_time();
    assert_eq!(world.body(ball).unwrap().position(), expected);
}

#[test]
fn test_slide_along_floor() {
    let mut world = World::new(WorldConfig::default());
    corner(&mut world);
    let ball = mover(&mut world, v(-5.0, 0.5));

    let result = world.move_and_slide(ball, v(30.0, -30.0), 4, None).unwrap();
    // Downward part removed, sideways part kept
    assert!(result.velocity.y.abs() < fx(0.01));
    assert!((result.velocity.x - fx(30.0)).abs() < fx(0.01));
    let position = world.body(ball).unwrap().position();
    assert!(position.x > fx(-4.6), "barely moved: {}", position.x);
    assert!(position.y >= fx(0.49));
}

#[test]
fn test_slide_into_corner_stops() {
    let mut world = World::new(WorldConfig::default());
    corner(&mut world);
    let ball = mover(&mut world, v(-0.55, 0.55));

    let result = world.move_and_slide(ball, v(30.0, -30.0), 4, None).unwrap();
    assert!(!result.collisions.is_empty());
    assert!(result.velocity.x.abs() < fx(0.01), "x velocity {}", result.velocity.x);
    assert!(result.velocity.y.abs() < fx(0.01), "y velocity {}", result.velocity.y);

    // Nestled in the corner without sinking into either surface
    let position = world.body(ball).unwrap().position();
    assert!(position.x <= fx(-0.49) && position.y >= fx(0.49));
}

#[test]
fn test_depenetration_before_sweep() {
    let mut world = World::new(WorldConfig::default());
    corner(&mut world);
    // Starts sunk 0.2 into the floor
    let ball = mover(&mut world, v(-5.0, 0.3));

    world.move_and_collide(ball, FixedVec2::ZERO, None).unwrap();
    let position = world.body(ball).unwrap().position();
    assert!(position.y >= fx(0.49), "still sunk at {}", position.y);
}

#[test]
fn test_dynamic_bodies_do_not_block_motion() {
    let mut world = World::new(WorldConfig::default());
    let ball = mover(&mut world, v(0.0, 0.0));
    world
        .create_dynamic(v(1.0, 0.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();

    let hit = world.move_and_collide(ball, v(120.0, 0.0), None).unwrap();
    assert!(hit.is_none());
    assert_eq!(world.body(ball).unwrap().position(), v(120.0, 0.0) * world.delta_time());
}

/// Thin static wall whose near face is at x = 4.35.
fn thin_wall(world: &mut World) -> BodyHandle {
    world
        .create_static(v(4.4, 0.0), FixedNum::ZERO, [ShapeDef::rectangle(fx(0.05), fx(2.0))])
        .unwrap()
}

#[test]
fn test_fast_circle_stops_at_thin_wall() {
    let mut world = World::new(WorldConfig::default());
    let wall = thin_wall(&mut world);
    let ball = world
        .create_kinematic(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::circle(fx(0.1))])
        .unwrap();

    // Ten units in one tick, far more than the wall is thick
    let hit = world.move_and_collide(ball, v(600.0, 0.0), None).unwrap();
    let hit = hit.expect("passed through the wall");
    assert_eq!(hit.other, wall);
    assert!(hit.normal.x < fx(-0.9));
    let x = world.body(ball).unwrap().position().x;
    assert!(x > fx(4.2) && x < fx(4.26), "stopped at {x}");
}

#[test]
fn test_fast_box_stops_at_thin_wall() {
    let mut world = World::new(WorldConfig::default());
    let wall = thin_wall(&mut world);
    let crate_body = world
        .create_kinematic(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::rectangle(fx(0.1), fx(0.1))])
        .unwrap();

    let hit = world.move_and_collide(crate_body, v(600.0, 0.0), None).unwrap();
    let hit = hit.expect("passed through the wall");
    assert_eq!(hit.other, wall);
    assert!(hit.normal.x < fx(-0.9));
    let x = world.body(crate_body).unwrap().position().x;
    assert!(x > fx(4.15) && x < fx(4.3), "stopped at {x}");
}
