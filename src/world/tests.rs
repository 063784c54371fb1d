use super::*;
use crate::body::layers;
use crate::collision::trigger_query_filter;
use crate::fixed_math::RayCast;

fn fx(v: f32) -> FixedNum {
    FixedNum::from_num(v)
}

fn v(x: f32, y: f32) -> FixedVec2 {
    FixedVec2::from_f32(x, y)
}

fn world() -> World {
    World::new(WorldConfig::default().with_gravity(v(0.0, -10.0)))
}

fn floor(world: &mut World) -> BodyHandle {
    world
        .create_static(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::rectangle(fx(10.0), fx(0.5))])
        .unwrap()
}

#[test]
fn test_create_and_destroy() {
    let mut world = world();
    let a = floor(&mut world);
    let b = world
        .create_dynamic(v(0.0, 3.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    assert_eq!(world.body_count(), 2);
    assert_eq!(world.broadphase().static_index.len(), 1);
    assert_eq!(world.broadphase().dynamic_index.len(), 1);

    let removed = world.destroy_body(b).unwrap();
    assert_eq!(removed.handle(), b);
    assert!(world.broadphase().dynamic_index.is_empty());
    assert_eq!(world.destroy_body(b).unwrap_err(), PhysicsError::BodyNotFound(b));
    assert!(world.body(b).is_err());
    assert!(world.body(a).is_ok());
}

#[test]
fn test_stale_handle_does_not_alias_new_body() {
    let mut world = world();
    let old = world
        .create_dynamic(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    world.destroy_body(old).unwrap();
    let new = world
        .create_dynamic(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    assert_eq!(old.index, new.index);
    assert!(!world.contains(old));
    assert!(world.contains(new));
}

#[test]
fn test_empty_body_is_rejected() {
    let mut world = world();
    let result = world.create_dynamic(FixedVec2::ZERO, FixedNum::ZERO, Vec::<ShapeDef>::new());
    assert_eq!(result, Err(PhysicsError::EmptyBody));
    assert_eq!(world.body_count(), 0);
}

#[test]
fn test_gravity_moves_only_dynamic_bodies() {
    let mut world = world();
    let wall = floor(&mut world);
    let kinematic = world
        .create_kinematic(v(0.0, 20.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    let ball = world
        .create_dynamic(v(5.0, 20.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();

    world.update();
    assert_eq!(world.tick(), 1);
    assert_eq!(world.body(wall).unwrap().position(), FixedVec2::ZERO);
    assert_eq!(world.body(kinematic).unwrap().position(), v(0.0, 20.0));
    assert!(world.body(ball).unwrap().position().y < fx(20.0));
    assert!(world.body(ball).unwrap().linear_velocity.y < FixedNum::ZERO);
}

#[test]
fn test_resting_contact_produces_reports() {
    let mut world = world();
    floor(&mut world);
    let ball = world
        .create_dynamic(v(0.0, 0.99), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();

    world.update();
    let reports = world.contact_reports();
    assert_eq!(reports.len(), 1);
    // Circles sort before polygons, so the ball is side A
    assert_eq!(reports[0].body_a, ball);
    assert!(reports[0].normal.y < FixedNum::ZERO);
    assert!(reports[0].normal_impulse > FixedNum::ZERO);
    assert_eq!(world.manifold_count(), 1);

    // Lifting the ball clear drops the manifold
    world.set_pose(ball, v(0.0, 5.0), FixedNum::ZERO).unwrap();
    world.update();
    assert_eq!(world.manifold_count(), 0);
    assert!(world.contact_reports().is_empty());
}

#[test]
fn test_destroying_a_body_drops_its_manifolds() {
    let mut world = world();
    floor(&mut world);
    let ball = world
        .create_dynamic(v(0.0, 0.99), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    world.update();
    assert_eq!(world.manifold_count(), 1);

    world.destroy_body(ball).unwrap();
    assert_eq!(world.manifold_count(), 0);
    world.update();
    assert!(world.contact_reports().is_empty());
}

#[test]
fn test_trigger_events_enter_stay_exit() {
    let mut world = World::new(WorldConfig::default());
    let zone = world
        .create_trigger(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::rectangle(fx(2.0), fx(2.0))])
        .unwrap();
    let ball = world
        .create_dynamic(v(-5.0, 0.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();

    world.update();
    assert!(world.trigger_events().is_empty());

    world.set_pose(ball, v(0.0, 0.0), FixedNum::ZERO).unwrap();
    world.update();
    assert_eq!(
        world.trigger_events(),
        &[TriggerEvent {
            trigger: zone,
            other: ball,
            phase: TriggerPhase::Enter
        }]
    );

    world.update();
    assert_eq!(world.trigger_events()[0].phase, TriggerPhase::Stay);
    // Triggers never push
    assert_eq!(world.body(ball).unwrap().position(), FixedVec2::ZERO);
    assert_eq!(world.manifold_count(), 0);

    world.set_pose(ball, v(5.0, 0.0), FixedNum::ZERO).unwrap();
    world.update();
    assert_eq!(world.trigger_events()[0].phase, TriggerPhase::Exit);

    world.update();
    assert!(world.trigger_events().is_empty());
}

#[test]
fn test_trigger_events_use_only_the_trigger_mask() {
    let mut world = World::new(WorldConfig::default());
    let zone = world
        .create_body(
            BodyDef::new(BodyType::Trigger)
                .with_shape(ShapeDef::rectangle(fx(2.0), fx(2.0)))
                .with_layers(layers::STATIC, layers::ALL),
        )
        .unwrap();
    // The ball's own mask does not include the trigger's layer
    let ball = world
        .create_body(
            BodyDef::new(BodyType::Dynamic)
                .with_shape(ShapeDef::circle(fx(0.5)))
                .with_layers(layers::DEFAULT, layers::DEFAULT),
        )
        .unwrap();

    assert_eq!(world.query_trigger(zone, trigger_query_filter).unwrap(), vec![ball]);
    world.update();
    assert_eq!(
        world.trigger_events(),
        &[TriggerEvent {
            trigger: zone,
            other: ball,
            phase: TriggerPhase::Enter
        }]
    );

    // A trigger whose mask rejects the ball stays silent
    let blind = world
        .create_body(
            BodyDef::new(BodyType::Trigger)
                .with_shape(ShapeDef::rectangle(fx(2.0), fx(2.0)))
                .with_layers(layers::STATIC, layers::PROJECTILE),
        )
        .unwrap();
    world.update();
    assert!(world.trigger_events().iter().all(|e| e.trigger != blind));
}

#[test]
fn test_trigger_filter_can_be_replaced() {
    let mut world = World::new(WorldConfig::default());
    world
        .create_trigger(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::rectangle(fx(2.0), fx(2.0))])
        .unwrap();
    world
        .create_dynamic(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    world.set_trigger_filter(|_, _| false);
    world.update();
    assert!(world.trigger_events().is_empty());
}

#[test]
fn test_query_trigger_sees_every_category() {
    let mut world = World::new(WorldConfig::default());
    let zone = world
        .create_trigger(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::circle(fx(3.0))])
        .unwrap();
    let wall = world
        .create_static(v(2.0, 0.0), FixedNum::ZERO, [ShapeDef::rectangle(fx(0.5), fx(0.5))])
        .unwrap();
    let mover = world
        .create_kinematic(v(-2.0, 0.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();
    world
        .create_dynamic(v(10.0, 0.0), FixedNum::ZERO, [ShapeDef::circle(fx(0.5))])
        .unwrap();

    let mut hits = world.query_trigger(zone, trigger_query_filter).unwrap();
    hits.sort();
    assert_eq!(hits, vec![wall, mover]);
}

#[test]
fn test_layers_keep_bodies_apart() {
    let mut world = world();
    floor(&mut world);
    let ghost = world
        .create_body(
            BodyDef::new(BodyType::Dynamic)
                .at(v(0.0, 0.9))
                .with_shape(ShapeDef::circle(fx(0.5)))
                .with_layers(layers::PROJECTILE, layers::PROJECTILE),
        )
        .unwrap();
    world.update();
    assert_eq!(world.manifold_count(), 0);
    assert!(world.body(ghost).unwrap().position().y < fx(0.9));
}

#[test]
fn test_history_window_is_enforced() {
    let mut world = World::new(WorldConfig::default().with_history_length(5).unwrap());
    floor(&mut world);
    assert!(world.query_point(FixedVec2::ZERO, None, 5).is_ok());
    assert_eq!(
        world.query_point(FixedVec2::ZERO, None, 6),
        Err(PhysicsError::HistoryOutOfRange {
            requested: 6,
            retained: 5
        })
    );
    let ray = RayCast::between(v(-20.0, 0.0), v(20.0, 0.0)).unwrap();
    assert!(world.ray_cast(&ray, None, 6).is_err());
}

#[test]
fn test_young_bodies_are_absent_from_the_past() {
    let mut world = World::new(WorldConfig::default());
    world.update();
    let late = world
        .create_static(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::circle(fx(1.0))])
        .unwrap();
    assert_eq!(world.query_point(FixedVec2::ZERO, None, 0).unwrap(), vec![late]);
    assert!(world.query_point(FixedVec2::ZERO, None, 1).unwrap().is_empty());

    world.update();
    assert_eq!(world.query_point(FixedVec2::ZERO, None, 1).unwrap(), vec![late]);
}

#[test]
fn test_checksum_tracks_state() {
    let build = || {
        let mut world = world();
        floor(&mut world);
        world
            .create_dynamic(v(0.3, 4.0), fx(0.2), [ShapeDef::rectangle(fx(0.5), fx(0.25))])
            .unwrap();
        world
    };
    let mut a = build();
    let mut b = build();
    assert_eq!(a.checksum(), b.checksum());
    for _ in 0..30 {
        a.update();
        b.update();
    }
    assert_eq!(a.checksum(), b.checksum());

    b.update();
    assert_ne!(a.checksum(), b.checksum());
}
