//! Simulate ignores its delta time and always runs the same fixed steps

use engine_physics::prelude::*;

fn config() -> PhysicsConfig {
    PhysicsConfig {
        worker_threads: Some(2),
        temp_arena_bytes: 4 * 1024 * 1024,
        ..Default::default()
    }
}

fn populate(system: &PhysicsSystem, scene: &mut PhysicsScene) -> Vec<BodyId> {
    let vertices = [
        Vec3::new(-512.0, -512.0, 0.0),
        Vec3::new(512.0, -512.0, 0.0),
        Vec3::new(512.0, 512.0, 0.0),
        Vec3::new(-512.0, 512.0, 0.0),
    ];
    scene
        .create_and_add_world_body(&vertices, &[[0, 1, 2], [0, 2, 3]])
        .unwrap();

    let cube = system.create_box_shape(Vec3::splat(8.0));
    let ball = system.create_sphere_shape(6.0);
    let mut ids = Vec::new();
    for i in 0..6 {
        let settings = BodyCreationSettings::new(
            Vec3::new(i as f32 * 4.0, 0.0, 20.0 + i as f32 * 18.0),
            Vec3::new(i as f32 * 15.0, i as f32 * 7.0, 0.0),
            MotionKind::Dynamic,
        )
        .with_restitution(0.3);
        let shape = if i % 2 == 0 { &cube } else { &ball };
        ids.push(scene.create_and_add_body(&settings, shape, i));
    }
    ids
}

fn snapshot(scene: &PhysicsScene, ids: &[BodyId]) -> Vec<(Vec3, Vec3)> {
    ids.iter()
        .map(|id| scene.body(*id).unwrap().position_and_rotation())
        .collect()
}

#[test]
fn test_delta_time_does_not_change_result() {
    let system = PhysicsSystem::init(config()).unwrap();
    let mut fast = system.create_scene().unwrap();
    let mut slow = system.create_scene().unwrap();
    let fast_ids = populate(&system, &mut fast);
    let slow_ids = populate(&system, &mut slow);

    for _ in 0..30 {
        fast.simulate(0.001);
        slow.simulate(0.25);
    }

    assert_eq!(snapshot(&fast, &fast_ids), snapshot(&slow, &slow_ids));
    assert_eq!(fast.steps_taken(), slow.steps_taken());

    system.destroy_scene(fast);
    system.destroy_scene(slow);
    system.shutdown();
}

#[test]
fn test_each_simulate_runs_configured_sub_steps() {
    let system = PhysicsSystem::init(PhysicsConfig {
        sub_steps: 3,
        ..config()
    })
    .unwrap();
    let mut scene = system.create_scene().unwrap();

    scene.simulate(10.0);
    scene.simulate(0.0);
    assert_eq!(scene.steps_taken(), 6);
}

#[test]
fn test_separate_systems_agree() {
    let run = || {
        let system = PhysicsSystem::init(config()).unwrap();
        let mut scene = system.create_scene().unwrap();
        let ids = populate(&system, &mut scene);
        for _ in 0..20 {
            scene.simulate(1.0 / 60.0);
        }
        snapshot(&scene, &ids)
    };

    assert_eq!(run(), run());
}
