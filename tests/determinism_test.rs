use kestrel::world::WorldSnapshot;
use kestrel::{FixedNum, FixedVec2, ShapeDef, World, WorldConfig};

/// Build a walled pit with a seeded pile of mixed shapes.
fn build_pile(seed: u64, count: usize) -> World {
    let mut world = World::new(WorldConfig::default().with_gravity(FixedVec2::from_f32(0.0, -10.0)));
    world
        .create_static(FixedVec2::ZERO, FixedNum::ZERO, [ShapeDef::rectangle(FixedNum::from_num(12), FixedNum::ONE)])
        .unwrap();
    for side in [-1, 1] {
        world
            .create_static(
                FixedVec2::new(FixedNum::from_num(side * 11), FixedNum::from_num(8)),
                FixedNum::ZERO,
                [ShapeDef::rectangle(FixedNum::ONE, FixedNum::from_num(8))],
            )
            .unwrap();
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    for i in 0..count {
        // Integer bit patterns keep the layout exact across platforms
        let x = FixedNum::from_bits(rng.i64(-8 << 16..8 << 16));
        let y = FixedNum::from_num(3 + i as i32);
        let angle = FixedNum::from_bits(rng.i64(-3 << 16..3 << 16));
        let size = FixedNum::from_bits(rng.i64(20_000..45_000));
        let shape = if rng.bool() {
            ShapeDef::circle(size)
        } else {
            ShapeDef::rectangle(size, size)
        };
        world.create_dynamic(FixedVec2::new(x, y), angle, [shape]).unwrap();
    }
    world
}

#[test]
fn test_identical_inputs_produce_identical_checksums() {
    let mut first = build_pile(7, 30);
    let mut second = build_pile(7, 30);

    for tick in 0..240 {
        first.update();
        second.update();
        assert_eq!(first.checksum(), second.checksum(), "diverged at tick {}", tick + 1);
    }
}

#[test]
fn test_different_layouts_produce_different_checksums() {
    let mut first = build_pile(7, 20);
    let mut second = build_pile(8, 20);
    for _ in 0..10 {
        first.update();
        second.update();
    }
    assert_ne!(first.checksum(), second.checksum());
}

#[test]
fn test_snapshot_restore_replays_identically() {
    let mut world = build_pile(42, 25);
    for _ in 0..45 {
        world.update();
    }

    let snapshot = world.snapshot();
    let mut expected = Vec::new();
    for _ in 0..60 {
        world.update();
        expected.push(world.checksum());
    }

    world.restore(&snapshot).unwrap();
    assert_eq!(world.tick(), 45);
    for (i, &checksum) in expected.iter().enumerate() {
        world.update();
        assert_eq!(world.checksum(), checksum, "replay diverged {} ticks after restore", i + 1);
    }
}

#[test]
fn test_snapshot_survives_serialization() {
    let mut world = build_pile(3, 15);
    for _ in 0..30 {
        world.update();
    }
    let snapshot = world.snapshot();
    let bytes = snapshot.to_bytes().unwrap();
    let decoded = WorldSnapshot::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, snapshot);

    // A second world built from the same inputs restored from the bytes agrees
    let mut replica = build_pile(3, 15);
    replica.restore(&decoded).unwrap();
    assert_eq!(replica.checksum(), world.checksum());
    for _ in 0..30 {
        world.update();
        replica.update();
    }
    assert_eq!(replica.checksum(), world.checksum());
}

#[test]
fn test_restore_rejects_missing_bodies() {
    let mut world = build_pile(5, 5);
    world.update();
    let snapshot = world.snapshot();
    let victim = world.bodies().last().map(|b| b.handle()).unwrap();
    world.destroy_body(victim).unwrap();

    let checksum_before = world.checksum();
    assert!(world.restore(&snapshot).is_err());
    assert_eq!(world.checksum(), checksum_before);
}

#[test]
fn test_garbage_bytes_are_rejected() {
    assert!(WorldSnapshot::from_bytes(&[0xff, 0x01, 0x02]).is_err());
}
