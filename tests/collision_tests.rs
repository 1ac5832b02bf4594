use approx::assert_abs_diff_eq;
use sat_physics::*;

fn world_without_gravity() -> PhysicsWorld {
    PhysicsWorld::with_config(1.0 / 60.0, WorldConfig::default().without_gravity())
}

#[test]
fn sphere_pairs_collide_iff_closer_than_radius_sum() {
    let cases = [
        (Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 1.0),
        (Vec3::ZERO, 0.5, Vec3::new(0.0, 0.7, 0.7), 0.5),
        (Vec3::new(1.0, 2.0, 3.0), 0.25, Vec3::new(1.0, 2.0, 3.6), 0.25),
        (Vec3::ZERO, 2.0, Vec3::new(-3.0, 0.0, 0.0), 1.5),
        (Vec3::ZERO, 1.0, Vec3::new(0.0, 0.0, 2.0), 1.0),
    ];

    for (c1, r1, c2, r2) in cases {
        let distance = c1.distance(c2);
        let contact = NarrowPhase::sphere_sphere(c1, r1, c2, r2);
        assert_eq!(contact.is_some(), distance < r1 + r2, "{c1:?}/{c2:?}");
        if let Some(contact) = contact {
            assert_abs_diff_eq!(contact.points[0].depth, distance - (r1 + r2), epsilon = 1e-5);
            // Normal points from the second sphere toward the first.
            assert!(contact.normal.dot(c1 - c2) > 0.0);
        }
    }
}

#[test]
fn stacked_unit_boxes_scenario() {
    let mut world = world_without_gravity();
    let lower = world
        .add_box_collider(Vec3::ZERO, Vec3::ONE, 1.0, 0.1, false)
        .expect("lower box");
    let upper = world
        .add_box_collider(Vec3::new(0.0, 0.9, 0.0), Vec3::ONE, 1.0, 0.1, false)
        .expect("upper box");

    assert_eq!(world.detect_collisions(), 1);
    let manifold = world.manifold_between(lower, upper).expect("boxes overlap");

    assert_eq!((manifold.body_a, manifold.body_b), (lower, upper));
    assert_abs_diff_eq!(manifold.normal.y.abs(), 1.0, epsilon = 1e-5);
    // B sits above A, so the normal from B toward A points down.
    assert!(manifold.normal.y < 0.0);
    assert_eq!(manifold.points.len(), 4);
    for point in &manifold.points {
        assert_abs_diff_eq!(point.depth, -0.1, epsilon = 1e-4);
    }
}

#[test]
fn equal_boxes_offset_along_each_axis_share_depth_sign() {
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        let mut world = world_without_gravity();
        world
            .add_box_collider(Vec3::ZERO, Vec3::splat(2.0), 1.0, 0.0, false)
            .expect("box a");
        world
            .add_box_collider(axis * 1.5, Vec3::splat(2.0), 1.0, 0.0, false)
            .expect("box b");

        world.detect_collisions();
        let manifold = &world.manifolds()[0];
        assert_abs_diff_eq!(manifold.normal.dot(axis), -1.0, epsilon = 1e-5);
        assert_eq!(manifold.points.len(), 4);
        assert!(manifold.points.iter().all(|p| p.depth < 0.0));
    }
}

#[test]
fn rotated_box_resting_on_ground_collides() {
    let mut world = world_without_gravity();
    let ground = world
        .add_box_collider(Vec3::ZERO, Vec3::new(10.0, 1.0, 10.0), 0.0, 0.0, true)
        .expect("ground");
    let tilted = world
        .add_body(
            RigidBody::cuboid(Vec3::ONE)
                .with_position(Vec3::new(0.0, 1.2, 0.0))
                .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4)),
        )
        .expect("tilted box");

    world.detect_collisions();
    let manifold = world.manifold_between(ground, tilted).expect("corner dips into ground");
    // The tilted box was added second, so the normal points from it toward the ground.
    assert!(manifold.normal.y < -0.99);
    assert!(manifold.points.iter().all(|p| p.depth <= 0.0));
    assert!(!manifold.points.is_empty());
}

#[test]
fn sphere_resting_on_box_face() {
    let mut world = world_without_gravity();
    let ground = world
        .add_box_collider(Vec3::ZERO, Vec3::new(4.0, 1.0, 4.0), 0.0, 0.0, true)
        .expect("ground");
    let ball = world
        .add_sphere_collider(Vec3::new(0.3, 0.95, -0.2), 0.5, 1.0, 0.5, false)
        .expect("ball");

    world.detect_collisions();
    let manifold = world.manifold_between(ground, ball).expect("ball touches ground");
    // Normal from the ball (B) toward the ground (A).
    assert_abs_diff_eq!(manifold.normal.y, -1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(manifold.points[0].depth, -0.05, epsilon = 1e-5);
    assert_abs_diff_eq!(manifold.points[0].position.y, 0.5, epsilon = 1e-5);
}

#[test]
fn plane_collider_catches_spheres_and_boxes() {
    let mut world = world_without_gravity();
    let floor = world.add_plane_collider(Vec3::ZERO, Vec3::Y).expect("floor");
    let ball = world
        .add_sphere_collider(Vec3::new(0.0, 0.4, 0.0), 0.5, 1.0, 0.0, false)
        .expect("ball");
    let crate_box = world
        .add_box_collider(Vec3::new(3.0, 0.45, 0.0), Vec3::ONE, 1.0, 0.0, false)
        .expect("box");

    assert_eq!(world.detect_collisions(), 2);

    let sphere_contact = world.manifold_between(floor, ball).expect("sphere contact");
    assert_eq!(sphere_contact.normal, Vec3::NEG_Y);
    assert_abs_diff_eq!(sphere_contact.points[0].depth, -0.1, epsilon = 1e-5);

    let box_contact = world.manifold_between(floor, crate_box).expect("box contact");
    assert_eq!(box_contact.points.len(), 4);
    assert_eq!(box_contact.feature, ContactFeature::Vertices);
}

#[test]
fn convex_hull_on_box_produces_face_contact() {
    // Square pyramid standing on its base.
    let vertices = vec![
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(-0.5, 0.0, 0.5),
        Vec3::new(0.0, 1.0, 0.0),
    ];
    let faces = vec![
        vec![0, 1, 2, 3],
        vec![0, 1, 4],
        vec![1, 2, 4],
        vec![2, 3, 4],
        vec![3, 0, 4],
    ];
    let pyramid = ConvexShape::from_faces(vertices, faces).expect("valid pyramid");

    let mut world = world_without_gravity();
    let ground = world
        .add_box_collider(Vec3::ZERO, Vec3::new(4.0, 1.0, 4.0), 0.0, 0.0, true)
        .expect("ground");
    let hull = world
        .add_convex_collider(Vec3::new(0.0, 0.48, 0.0), pyramid, 1.0, 0.0, false)
        .expect("pyramid");

    world.detect_collisions();
    let manifold = world.manifold_between(ground, hull).expect("pyramid base overlaps");
    assert_abs_diff_eq!(manifold.normal.y, -1.0, epsilon = 1e-4);
    assert_eq!(manifold.points.len(), 4);
    for p in &manifold.points {
        assert_abs_diff_eq!(p.depth, -0.02, epsilon = 1e-4);
    }
}

#[test]
fn hull_data_is_validated_before_it_reaches_the_world() {
    let empty = ConvexHullData {
        vertices: Vec::new(),
        faces: Vec::new(),
    };
    assert!(matches!(
        ConvexShape::try_from(empty),
        Err(PhysicsError::InvalidShape(_))
    ));

    let mut cube = ConvexHullData::from(ConvexShape::cuboid(Vec3::ONE));
    cube.faces[2].truncate(2);
    assert!(ConvexShape::try_from(cube).is_err());

    let rebuilt = ConvexShape::try_from(ConvexHullData::from(ConvexShape::cuboid(Vec3::ONE)))
        .expect("cube data is valid");
    let mut world = world_without_gravity();
    let floor = world
        .add_convex_collider(Vec3::ZERO, rebuilt, 0.0, 0.0, true)
        .expect("static hull");
    let ball = world
        .add_sphere_collider(Vec3::new(0.0, 0.9, 0.0), 0.5, 1.0, 0.0, false)
        .expect("ball");

    assert_eq!(world.detect_collisions(), 1);
    let manifold = world.manifold_between(floor, ball).expect("ball rests on hull");
    assert_abs_diff_eq!(manifold.normal.y, -1.0, epsilon = 1e-5);
}

#[test]
fn static_pairs_and_disabled_bodies_are_skipped() {
    let mut world = world_without_gravity();
    world
        .add_box_collider(Vec3::ZERO, Vec3::ONE, 0.0, 0.0, true)
        .expect("static a");
    world
        .add_box_collider(Vec3::new(0.5, 0.0, 0.0), Vec3::ONE, 0.0, 0.0, true)
        .expect("static b");
    let ball = world
        .add_sphere_collider(Vec3::new(0.0, 0.9, 0.0), 0.5, 1.0, 0.0, false)
        .expect("ball");

    assert_eq!(world.detect_collisions(), 2);

    world.set_enabled(ball, false).expect("ball exists");
    assert_eq!(world.detect_collisions(), 0);
}

#[test]
fn narrow_phase_is_idempotent_without_integration() {
    let mut world = world_without_gravity();
    world
        .add_box_collider(Vec3::ZERO, Vec3::ONE, 1.0, 0.0, false)
        .expect("box");
    world
        .add_body(
            RigidBody::cuboid(Vec3::ONE)
                .with_position(Vec3::new(0.2, 0.85, 0.1))
                .with_rotation(Quat::from_rotation_y(0.3)),
        )
        .expect("rotated box");
    world
        .add_sphere_collider(Vec3::new(0.0, -0.8, 0.0), 0.4, 1.0, 0.0, false)
        .expect("sphere");

    world.detect_collisions();
    let first: Vec<ContactManifold> = world.manifolds().to_vec();
    world.detect_collisions();
    let second = world.manifolds();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second) {
        assert_eq!(a.normal, b.normal);
        assert_eq!(a.points.len(), b.points.len());
        for (p, q) in a.points.iter().zip(&b.points) {
            assert_abs_diff_eq!(p.depth, q.depth, epsilon = 1e-6);
        }
    }
}

#[test]
fn full_collision_table_drops_later_pairs() {
    let config = WorldConfig {
        max_collisions: 1,
        ..WorldConfig::default().without_gravity()
    };
    let mut world = PhysicsWorld::with_config(1.0 / 60.0, config);
    for x in 0..3 {
        world
            .add_sphere_collider(Vec3::new(x as f32 * 0.5, 0.0, 0.0), 0.5, 1.0, 0.0, false)
            .expect("sphere");
    }

    assert_eq!(world.detect_collisions(), 1);
    let kept = &world.manifolds()[0];
    assert_eq!((kept.body_a.index(), kept.body_b.index()), (0, 1));
}
