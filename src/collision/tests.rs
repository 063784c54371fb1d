use super::*;
use crate::body::{layers, Body, BodyDef, BodyType};
use crate::collections::Pool;
use crate::fixed_math::{approx_eq, FixedNum, FixedVec2, Transform2D};
use crate::shape::{Material, Shape, ShapeDef, ShapeKind};

fn fx(v: f32) -> FixedNum {
    FixedNum::from_num(v)
}

fn v(x: f32, y: f32) -> FixedVec2 {
    FixedVec2::from_f32(x, y)
}

fn close(a: FixedVec2, b: FixedVec2) -> bool {
    approx_eq(a.x, b.x, fx(0.002)) && approx_eq(a.y, b.y, fx(0.002))
}

fn placed(def: ShapeDef, x: f32, y: f32) -> Shape {
    Shape::from_def(&def, &Transform2D::from_pose(v(x, y), FixedVec2::UNIT_X), FixedNum::ONE).unwrap()
}

fn circle(x: f32, y: f32, r: f32) -> Shape {
    placed(ShapeDef::circle(fx(r)), x, y)
}

fn rect(x: f32, y: f32, hw: f32, hh: f32) -> Shape {
    placed(ShapeDef::rectangle(fx(hw), fx(hh)), x, y)
}

fn diamond() -> Shape {
    placed(
        ShapeDef::polygon(vec![v(0.0, 0.4), v(0.7, 1.1), v(0.0, 1.8), v(-0.7, 1.1)]),
        0.0,
        0.0,
    )
}

fn assert_symmetric(a: &Shape, b: &Shape) {
    let forward = collide(a, b);
    let backward = collide(b, a);
    assert!(!forward.is_empty());
    assert_eq!(forward.len(), backward.len());
    for (f, r) in forward.iter().zip(backward.iter()) {
        assert!(close(f.position, r.position), "{:?} vs {:?}", f.position, r.position);
        assert!(close(f.normal, -r.normal));
        assert!(approx_eq(f.penetration, r.penetration, fx(0.002)));
    }
}

// ============================================================================
// Narrowphase
// ============================================================================

#[test]
fn test_circle_circle_contact() {
    let contacts = collide(&circle(0.0, 0.0, 1.0), &circle(1.5, 0.0, 1.0));
    assert_eq!(contacts.len(), 1);
    let c = contacts[0];
    assert!(close(c.normal, v(1.0, 0.0)));
    assert!(approx_eq(c.penetration, fx(0.5), fx(0.001)));
    assert!(close(c.position, v(0.75, 0.0)));
}

#[test]
fn test_separated_and_touching_circles_have_no_contact() {
    assert!(collide(&circle(0.0, 0.0, 1.0), &circle(3.0, 0.0, 1.0)).is_empty());
    assert!(collide(&circle(0.0, 0.0, 1.0), &circle(2.0, 0.0, 1.0)).is_empty());
}

#[test]
fn test_coincident_circles_pick_a_fixed_normal() {
    let contacts = collide(&circle(1.0, 1.0, 0.5), &circle(1.0, 1.0, 0.5));
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].normal, FixedVec2::UNIT_Y);
    assert_eq!(contacts[0].penetration, fx(1.0));
}

#[test]
fn test_concentric_circles_flip_with_operand_order() {
    let small = circle(1.0, 1.0, 0.5);
    let large = circle(1.0, 1.0, 0.8);
    let forward = collide(&small, &large);
    let backward = collide(&large, &small);
    assert_eq!(forward[0].normal, FixedVec2::UNIT_Y);
    assert_eq!(backward[0].normal, -FixedVec2::UNIT_Y);
    assert_eq!(forward[0].penetration, backward[0].penetration);
}

#[test]
fn test_circle_resting_on_box_face() {
    let floor = rect(0.0, 0.0, 5.0, 0.5);
    let ball = circle(0.0, 1.4, 1.0);

    let contacts = collide(&ball, &floor);
    assert_eq!(contacts.len(), 1);
    assert!(close(contacts[0].normal, v(0.0, -1.0)));
    assert!(approx_eq(contacts[0].penetration, fx(0.1), fx(0.001)));
    assert!(close(contacts[0].position, v(0.0, 0.5)));

    // Polygon first: same point, normal points into the ball
    let contacts = collide(&floor, &ball);
    assert!(close(contacts[0].normal, v(0.0, 1.0)));
}

#[test]
fn test_circle_center_inside_box() {
    let contacts = collide(&circle(0.0, 0.3, 0.5), &rect(0.0, 0.0, 5.0, 0.5));
    assert_eq!(contacts.len(), 1);
    assert!(close(contacts[0].normal, v(0.0, -1.0)));
    assert!(approx_eq(contacts[0].penetration, fx(0.7), fx(0.001)));
    assert!(close(contacts[0].position, v(0.0, 0.5)));
}

#[test]
fn test_circle_against_box_corner() {
    let contacts = collide(&circle(5.3, 0.8, 0.5), &rect(0.0, 0.0, 5.0, 0.5));
    assert_eq!(contacts.len(), 1);
    assert!(close(contacts[0].position, v(5.0, 0.5)));
    assert!(close(contacts[0].normal, v(-0.7071, -0.7071)));
    assert!(approx_eq(contacts[0].penetration, fx(0.0757), fx(0.002)));

    assert!(collide(&circle(5.5, 1.0, 0.5), &rect(0.0, 0.0, 5.0, 0.5)).is_empty());
}

#[test]
fn test_box_on_floor_yields_two_contacts() {
    let floor = rect(0.0, 0.0, 5.0, 0.5);
    let crate_box = rect(0.0, 0.95, 0.5, 0.5);

    let contacts = collide(&floor, &crate_box);
    assert_eq!(contacts.len(), 2);
    for c in &contacts {
        assert!(close(c.normal, v(0.0, 1.0)));
        assert!(approx_eq(c.penetration, fx(0.05), fx(0.001)));
        // Midway between the floor top (0.5) and the box bottom (0.45)
        assert!(approx_eq(c.position.y, fx(0.475), fx(0.001)));
    }
    assert_ne!(contacts[0].feature, contacts[1].feature);
}

#[test]
fn test_separated_boxes_have_no_contact() {
    assert!(collide(&rect(0.0, 0.0, 1.0, 1.0), &rect(2.5, 0.0, 1.0, 1.0)).is_empty());
    assert!(collide(&rect(0.0, 0.0, 1.0, 1.0), &rect(2.0, 0.0, 1.0, 1.0)).is_empty());
}

#[test]
fn test_collide_is_symmetric() {
    assert_symmetric(&circle(0.0, 0.0, 1.0), &circle(1.2, 0.7, 0.8));
    assert_symmetric(&circle(0.0, 1.4, 1.0), &rect(0.0, 0.0, 5.0, 0.5));
    assert_symmetric(&rect(0.0, 0.0, 5.0, 0.5), &circle(5.3, 0.8, 0.5));
    assert_symmetric(&rect(0.0, 0.0, 2.0, 0.5), &diamond());
    // Equal separations on both sides: either box may supply the reference face
    assert_symmetric(&rect(1.0, 1.0, 1.0, 1.0), &rect(2.0, 2.5, 1.0, 1.0));
    assert_symmetric(&rect(0.0, 0.0, 5.0, 0.5), &rect(0.0, 0.95, 0.5, 0.5));
    assert_symmetric(&rect(0.0, 0.0, 0.5, 0.5), &rect(0.0, 0.95, 0.5, 0.5));
}

#[test]
fn test_feature_ids_are_stable_under_small_motion() {
    let floor = rect(0.0, 0.0, 5.0, 0.5);
    let first = collide(&floor, &rect(0.0, 0.95, 0.5, 0.5));
    let second = collide(&floor, &rect(0.01, 0.96, 0.5, 0.5));
    let ids = |list: &ContactList| list.iter().map(|c| c.feature).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
}

// ============================================================================
// Filters
// ============================================================================

fn body(index: u32, body_type: BodyType) -> Body {
    let def = BodyDef::new(body_type).with_shape(ShapeDef::circle(fx(1.0)));
    Body::from_def(crate::body::BodyHandle { index, generation: 0 }, &def, FixedNum::ONE, 2).unwrap()
}

#[test]
fn test_world_filter_category_rules() {
    use BodyType::*;
    let cases = [
        (Static, Static, false),
        (Static, Kinematic, false),
        (Kinematic, Static, false),
        (Kinematic, Kinematic, false),
        (Dynamic, Static, true),
        (Dynamic, Kinematic, true),
        (Dynamic, Dynamic, true),
        (Trigger, Dynamic, true),
    ];
    for (ta, tb, expected) in cases {
        assert_eq!(world_filter(&body(0, ta), &body(1, tb)), expected, "{ta:?} vs {tb:?}");
    }
    let b = body(3, Dynamic);
    assert!(!world_filter(&b, &b));
}

#[test]
fn test_layers_and_masks() {
    let mut a = body(0, BodyType::Dynamic);
    let mut b = body(1, BodyType::Dynamic);
    a.mask = layers::STATIC;
    b.layer = layers::DEFAULT;
    assert!(!layers_match(&a, &b));
    assert!(layers_match(&b, &a));
    assert!(!world_filter(&a, &b));
    assert!(!world_filter(&b, &a));

    a.mask = layers::ALL;
    assert!(world_filter(&a, &b));
}

#[test]
fn test_trigger_and_move_filters() {
    let trigger = body(0, BodyType::Trigger);
    for other in [BodyType::Static, BodyType::Kinematic, BodyType::Dynamic] {
        assert!(trigger_query_filter(&trigger, &body(1, other)));
    }
    assert!(!trigger_query_filter(&trigger, &trigger));

    let mover = body(0, BodyType::Kinematic);
    assert!(move_filter(&mover, &body(1, BodyType::Static)));
    assert!(move_filter(&mover, &body(1, BodyType::Kinematic)));
    assert!(!move_filter(&mover, &body(1, BodyType::Dynamic)));
    assert!(!move_filter(&mover, &body(1, BodyType::Trigger)));
}

// ============================================================================
// Manifolds
// ============================================================================

fn shape_ref(kind: ShapeKind, body: u32) -> ShapeRef {
    ShapeRef { kind, body, shape: 0 }
}

#[test]
fn test_pair_key_is_order_independent() {
    let x = shape_ref(ShapeKind::Polygon, 1);
    let y = shape_ref(ShapeKind::Circle, 7);
    assert_eq!(PairKey::new(x, y), PairKey::new(y, x));
    assert_eq!(PairKey::new(x, y).a, y);
    assert!(PairKey::new(x, y).involves_body(1));
    assert!(!PairKey::new(x, y).involves_body(2));
}

#[test]
fn test_manifold_material_mixing() {
    let key = PairKey::new(shape_ref(ShapeKind::Circle, 0), shape_ref(ShapeKind::Circle, 1));
    let a = Material {
        friction: fx(0.25),
        restitution: fx(0.0),
        ..Material::default()
    };
    let b = Material {
        friction: fx(1.0),
        restitution: fx(0.9),
        ..Material::default()
    };
    let manifold = Manifold::new(key, &a, &b, FixedNum::ONE);
    assert!(approx_eq(manifold.friction, fx(0.5), fx(0.001)));
    assert_eq!(manifold.restitution, FixedNum::ZERO);
}

#[test]
fn test_refresh_carries_impulses_by_feature() {
    let key = PairKey::new(shape_ref(ShapeKind::Polygon, 0), shape_ref(ShapeKind::Polygon, 1));
    let mut pool = Pool::<Contact>::new();
    let mut manifold = Manifold::new(key, &Material::default(), &Material::default(), FixedNum::ONE);

    let points = collide(&rect(0.0, 0.0, 5.0, 0.5), &rect(0.0, 0.95, 0.5, 0.5));
    manifold.refresh(&points, &mut pool, 1);
    assert_eq!(pool.len(), 2);
    for &index in &manifold.contacts {
        let contact = pool.get_index_mut(index).unwrap();
        contact.normal_impulse = fx(3.0);
        contact.tangent_impulse = fx(-1.0);
        contact.bias_impulse = fx(9.0);
    }

    manifold.refresh(&points, &mut pool, 2);
    assert_eq!(pool.len(), 2);
    assert_eq!(manifold.seen_tick, 2);
    for &index in &manifold.contacts {
        let contact = pool.get_index(index).unwrap();
        assert_eq!(contact.normal_impulse, fx(3.0));
        assert_eq!(contact.tangent_impulse, fx(-1.0));
        assert_eq!(contact.bias_impulse, FixedNum::ZERO);
    }

    // A different feature set starts cold
    let mut moved = points.clone();
    for point in &mut moved {
        point.feature ^= 0x40;
    }
    manifold.refresh(&moved, &mut pool, 3);
    for &index in &manifold.contacts {
        assert_eq!(pool.get_index(index).unwrap().normal_impulse, FixedNum::ZERO);
    }

    manifold.release(&mut pool);
    assert!(pool.is_empty());
    assert!(manifold.contacts.is_empty());
}

#[test]
fn test_seed_restores_warm_starts() {
    let key = PairKey::new(shape_ref(ShapeKind::Circle, 0), shape_ref(ShapeKind::Circle, 1));
    let mut pool = Pool::<Contact>::new();
    let mut manifold = Manifold::new(key, &Material::default(), &Material::default(), FixedNum::ONE);
    let cached = [WarmStart {
        feature: 0,
        normal_impulse: fx(2.0),
        tangent_impulse: fx(0.5),
    }];
    manifold.seed(&cached, &mut pool, 4);
    assert_eq!(manifold.warm_starts(&pool).as_slice(), &cached);

    manifold.refresh(&collide(&circle(0.0, 0.0, 1.0), &circle(1.5, 0.0, 1.0)), &mut pool, 5);
    assert_eq!(manifold.warm_starts(&pool).as_slice(), &cached);
}

// ============================================================================
// Solver
// ============================================================================

struct Scene {
    bodies: Pool<Body>,
    contacts: Pool<Contact>,
    manifold: Manifold,
}

fn floor_and_box(box_velocity: FixedVec2) -> Scene {
    let mut bodies = Pool::new();
    let floor_def = BodyDef::new(BodyType::Static).with_shape(ShapeDef::rectangle(fx(5.0), fx(0.5)));
    let handle = bodies.next_key().into();
    let floor = Body::from_def(handle, &floor_def, FixedNum::ONE, 2).unwrap();
    let floor_key = bodies.insert(floor);

    let box_def = BodyDef::new(BodyType::Dynamic)
        .at(v(0.0, 0.9))
        .with_shape(ShapeDef::rectangle(fx(0.5), fx(0.5)).with_restitution(FixedNum::ZERO));
    let handle = bodies.next_key().into();
    let mut crate_box = Body::from_def(handle, &box_def, FixedNum::ONE, 2).unwrap();
    crate_box.linear_velocity = box_velocity;
    let box_key = bodies.insert(crate_box);

    let key = PairKey::new(
        shape_ref(ShapeKind::Polygon, floor_key.index),
        shape_ref(ShapeKind::Polygon, box_key.index),
    );
    let floor_shape = &bodies.get(floor_key).unwrap().shapes()[0];
    let box_shape = &bodies.get(box_key).unwrap().shapes()[0];
    let points = collide(floor_shape, box_shape);
    let mut manifold = Manifold::new(key, &floor_shape.material, &box_shape.material, FixedNum::ONE);
    let mut contacts = Pool::new();
    manifold.refresh(&points, &mut contacts, 1);

    Scene {
        bodies,
        contacts,
        manifold,
    }
}

fn params() -> SolverParams {
    SolverParams {
        resolve_slop: fx(0.01),
        resolve_rate: fx(0.1),
    }
}

fn run(scene: &mut Scene, iterations: usize) {
    solver::pre_step(&scene.manifold, &mut scene.contacts, &mut scene.bodies, &params());
    for _ in 0..iterations {
        solver::solve(&scene.manifold, &mut scene.contacts, &mut scene.bodies);
    }
}

#[test]
fn test_solver_stops_approach_velocity() {
    let mut scene = floor_and_box(v(0.0, -0.5));
    assert_eq!(scene.manifold.contacts.len(), 2);
    run(&mut scene, 20);

    let crate_box = scene.bodies.get_index(1).unwrap();
    assert!(crate_box.linear_velocity.y > fx(-0.01), "{:?}", crate_box.linear_velocity);
    assert!(crate_box.linear_velocity.y < fx(0.01));
    for &index in &scene.manifold.contacts {
        assert!(scene.contacts.get_index(index).unwrap().normal_impulse >= FixedNum::ZERO);
    }

    // Static side never moves
    assert_eq!(scene.bodies.get_index(0).unwrap().linear_velocity, FixedVec2::ZERO);
}

#[test]
fn test_bias_channel_separates_without_velocity() {
    let mut scene = floor_and_box(FixedVec2::ZERO);
    run(&mut scene, 20);

    let crate_box = scene.bodies.get_index(1).unwrap();
    assert!(crate_box.bias_velocity.y > FixedNum::ZERO);
    assert!(crate_box.linear_velocity.length() < fx(0.001));
    for &index in &scene.manifold.contacts {
        assert!(scene.contacts.get_index(index).unwrap().bias_impulse >= FixedNum::ZERO);
    }
}

#[test]
fn test_friction_never_exceeds_coulomb_bound() {
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..20 {
        let velocity = v(rng.f32() * 20.0 - 10.0, -rng.f32() * 5.0);
        let mut scene = floor_and_box(velocity);
        run(&mut scene, 1 + rng.usize(..15));
        for &index in &scene.manifold.contacts {
            let contact = scene.contacts.get_index(index).unwrap();
            let bound = scene.manifold.friction * contact.normal_impulse;
            assert!(contact.tangent_impulse.abs() <= bound + FixedNum::DELTA);
        }
    }
}

#[test]
fn test_warm_start_applies_cached_impulse() {
    let mut scene = floor_and_box(FixedVec2::ZERO);
    for &index in &scene.manifold.contacts {
        scene.contacts.get_index_mut(index).unwrap().normal_impulse = fx(0.25);
    }
    solver::pre_step(&scene.manifold, &mut scene.contacts, &mut scene.bodies, &params());

    // Two contacts pushing up on a box of mass 1
    let crate_box = scene.bodies.get_index(1).unwrap();
    assert!(approx_eq(crate_box.linear_velocity.y, fx(0.5), fx(0.01)));
}
