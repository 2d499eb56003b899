//! Scene and body lifecycle through the capability traits

use engine_physics::prelude::*;

fn system() -> PhysicsSystem {
    PhysicsSystem::init(PhysicsConfig {
        worker_threads: Some(2),
        temp_arena_bytes: 4 * 1024 * 1024,
        ..Default::default()
    })
    .unwrap()
}

fn floor_mesh() -> (Vec<Vec3>, Vec<[u32; 3]>) {
    (
        vec![
            Vec3::new(-512.0, -512.0, 0.0),
            Vec3::new(512.0, -512.0, 0.0),
            Vec3::new(512.0, 512.0, 0.0),
            Vec3::new(-512.0, 512.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

/// Drop a box on the floor, remove it, and check nothing mentions it afterwards
fn removed_body_is_forgotten<B: PhysicsBackend>(backend: &B) {
    let mut scene = backend.create_scene().unwrap();
    let (vertices, indices) = floor_mesh();
    scene.create_and_add_world_body(&vertices, &indices).unwrap();

    let shape = backend.create_box_shape(Vec3::splat(8.0));
    const TAG: u64 = 0xDEAD_BEEF;
    let settings = BodyCreationSettings::new(Vec3::new(0.0, 0.0, 8.5), Vec3::ZERO, MotionKind::Dynamic);
    let id = scene.create_and_add_body(&settings, &shape, TAG);
    assert_eq!(scene.body(id).map(|b| b.user_data()), Some(TAG));

    // Contacts are queued but not drained before the body goes away
    for _ in 0..5 {
        scene.simulate(1.0 / 60.0);
    }
    scene.remove_and_destroy_body(id);

    let events = scene.drain_contact_events();
    assert!(events.iter().all(|e| e.user_data_a != TAG && e.user_data_b != TAG));
    assert!(events.iter().all(|e| !e.involves(id)));

    let down = RayCastQuery::swept_box(Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, -200.0), Vec3::splat(2.0));
    let hit = scene.trace(&down, None);
    assert_ne!(hit.user_data, Some(TAG));
    assert!(scene.body(id).is_none());
    assert_eq!(scene.body_count(), 1);

    backend.destroy_shape(shape);
    backend.destroy_scene(scene);
}

#[test]
fn test_body_lifecycle() {
    let system = system();
    removed_body_is_forgotten(&system);
    assert_eq!(system.live_scene_count(), 0);
    system.shutdown();
}

#[test]
fn test_bodies_keep_their_user_data() {
    let system = system();
    let mut scene = system.create_scene().unwrap();
    let shape = system.create_sphere_shape(4.0);

    let ids: Vec<BodyId> = (0..16u64)
        .map(|i| {
            let settings = BodyCreationSettings::new(
                Vec3::new(i as f32 * 20.0, 0.0, 100.0),
                Vec3::ZERO,
                MotionKind::Dynamic,
            );
            scene.create_and_add_body(&settings, &shape, 1000 + i)
        })
        .collect();
    scene.simulate(1.0 / 60.0);

    for (i, id) in ids.iter().enumerate() {
        assert_eq!(scene.body(*id).unwrap().user_data(), 1000 + i as u64);
    }
    scene.remove_and_destroy_body(ids[3]);
    assert_eq!(scene.body_count(), 15);
}

#[test]
fn test_kinematic_body_follows_its_velocity() {
    let system = system();
    let mut scene = system.create_scene().unwrap();
    let shape = system.create_box_shape(Vec3::splat(8.0));
    let settings = BodyCreationSettings::new(Vec3::ZERO, Vec3::ZERO, MotionKind::Kinematic);
    let id = scene.create_and_add_body(&settings, &shape, 0);

    scene
        .body_mut(id)
        .unwrap()
        .set_linear_and_angular_velocity(Vec3::new(60.0, 0.0, 0.0), Vec3::ZERO);
    scene.simulate(1.0 / 60.0);

    // 8 steps of 1/60 s at 60 units/s, no gravity on kinematic bodies
    let (position, _) = scene.body(id).unwrap().position_and_rotation();
    assert!((position - Vec3::new(8.0, 0.0, 0.0)).length() < 1e-2);
}

#[test]
fn test_teleport_and_rotate() {
    let system = system();
    let mut scene = system.create_scene().unwrap();
    let shape = system.create_box_shape(Vec3::splat(8.0));
    let id = scene.create_and_add_body(&BodyCreationSettings::default(), &shape, 0);

    {
        let mut body = scene.body_mut(id).unwrap();
        body.set_position_and_rotation(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 30.0, 0.0));
        body.set_rotation(Vec3::new(0.0, 60.0, 0.0));
    }

    let (position, angles) = scene.body(id).unwrap().position_and_rotation();
    assert!((position - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-4);
    assert!((angles - Vec3::new(0.0, 60.0, 0.0)).length() < 1e-3);
}

#[test]
fn test_multiple_scenes_coexist() {
    let system = system();
    let first = system.create_scene().unwrap();
    let second = system.create_scene().unwrap();
    assert_eq!(system.live_scene_count(), 2);

    system.destroy_scene(first);
    assert_eq!(system.live_scene_count(), 1);
    system.destroy_scene(second);
    system.shutdown();
}

#[test]
#[should_panic(expected = "live scene")]
fn test_shutdown_with_live_scene_panics() {
    let system = system();
    let scene = system.create_scene().unwrap();
    std::mem::forget(scene);
    system.shutdown();
}
