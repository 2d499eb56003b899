//! Headless sandbox driving the physics layer from a hecs world

mod arena;

use engine_physics::prelude::*;
use hecs::{Entity, World};
use std::path::Path;
use tracing::{debug, info, warn};

/// Frames to run before shutting down
const FRAMES: u32 = 300;

/// Frame at which one prop is removed mid-simulation
const REMOVE_AT_FRAME: u32 = 120;

/// Link from an entity to its rigid body
#[derive(Debug, Clone, Copy)]
struct PhysicsBody(BodyId);

#[derive(Debug, Clone)]
struct Name(String);

/// Marks the entity standing in for level geometry
#[derive(Debug, Clone, Copy)]
struct LevelGeometry;

fn entity_tag(entity: Entity) -> u64 {
    entity.to_bits().get()
}

fn entity_name(world: &World, tag: u64) -> String {
    Entity::from_bits(tag)
        .and_then(|entity| world.get::<&Name>(entity).ok().map(|name| name.0.clone()))
        .unwrap_or_else(|| format!("<{tag:#x}>"))
}

/// Attach a body link to an entity; false if the entity is gone
fn link_body(world: &mut World, entity: Entity, body: BodyId) -> bool {
    match world.insert_one(entity, PhysicsBody(body)) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, ?body, "Failed to link entity to its physics body");
            false
        }
    }
}

fn load_config() -> PhysicsResult<PhysicsConfig> {
    match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::load_from_file(Path::new(&path)),
        None => Ok(PhysicsConfig::default()),
    }
}

fn spawn_props(
    world: &mut World,
    scene: &mut PhysicsScene,
    cube: &Shape,
    ball: &Shape,
) -> Vec<Entity> {
    arena::prop_positions(12)
        .enumerate()
        .map(|(i, position)| {
            let (shape, label) = if i % 3 == 0 { (ball, "ball") } else { (cube, "crate") };
            let entity = world.spawn((Name(format!("{label}-{i}")),));
            let settings = BodyCreationSettings::new(
                position,
                Vec3::new(0.0, i as f32 * 30.0, 0.0),
                MotionKind::Dynamic,
            )
            .with_friction(0.6)
            .with_restitution(if label == "ball" { 0.5 } else { 0.1 });

            let body = scene.create_and_add_body(&settings, shape, entity_tag(entity));
            link_body(world, entity, body);
            entity
        })
        .collect()
}

fn report_contacts(world: &World, scene: &mut PhysicsScene) {
    for contact in scene.drain_contact_events() {
        debug!(
            a = %entity_name(world, contact.user_data_a),
            b = %entity_name(world, contact.user_data_b),
            normal = ?contact.normal,
            "Contact"
        );
    }
}

fn report_bodies(world: &World, scene: &PhysicsScene, frame: u32) {
    for (_, (body, name)) in world
        .query::<(&PhysicsBody, &Name)>()
        .without::<&LevelGeometry>()
        .iter()
    {
        let Some(view) = scene.body(body.0) else {
            continue;
        };
        let (position, angles) = view.position_and_rotation();
        let (velocity, _) = view.linear_and_angular_velocity();
        info!(
            frame = frame,
            name = %name.0,
            position = ?position,
            angles = ?angles,
            speed = velocity.length(),
            active = view.is_active(),
            "Body state"
        );
    }
}

/// Sweep a player-sized box straight down and report where it would land
fn probe_ground(world: &World, scene: &PhysicsScene, x: f32, y: f32) {
    let query = RayCastQuery::swept_box(
        Vec3::new(x, y, 400.0),
        Vec3::new(0.0, 0.0, -500.0),
        Vec3::new(16.0, 16.0, 36.0),
    );
    let hit = scene.trace(&query, None);
    if hit.result.all_solid {
        warn!(x = x, y = y, "Ground probe started inside geometry");
        return;
    }
    let surface = hit
        .user_data
        .map(|tag| entity_name(world, tag))
        .unwrap_or_else(|| "nothing".to_string());
    info!(
        x = x,
        y = y,
        fraction = hit.result.fraction,
        land_z = hit.result.endpos.z,
        surface = %surface,
        "Ground probe"
    );
}

fn main() -> PhysicsResult<()> {
    engine_physics::init_logging();
    info!("Starting physics sandbox");

    let config = load_config()?;
    let dt = config.fixed_timestep;
    let physics = PhysicsSystem::init(config)?;
    let mut scene = physics.create_scene()?;
    let mut world = World::new();

    let level = world.spawn((Name("level".to_string()), LevelGeometry));
    let (vertices, indices) = arena::level_mesh();
    let level_body = scene.create_and_add_world_body(&vertices, &indices)?;
    scene.set_world_user_data(entity_tag(level));
    link_body(&mut world, level, level_body);

    let cube = physics.create_box_shape(Vec3::splat(12.0));
    let ball = physics.create_sphere_shape(10.0);
    let props = spawn_props(&mut world, &mut scene, &cube, &ball);
    info!(bodies = scene.body_count(), "Scene populated");

    for frame in 0..FRAMES {
        scene.simulate(dt);
        report_contacts(&world, &mut scene);

        if frame == REMOVE_AT_FRAME {
            if let Some(&victim) = props.first() {
                if let Ok(body) = world.get::<&PhysicsBody>(victim).map(|b| *b) {
                    scene.remove_and_destroy_body(body.0);
                }
                info!(name = %entity_name(&world, entity_tag(victim)), "Removed prop");
                if let Err(err) = world.despawn(victim) {
                    warn!(%err, "Failed to despawn removed prop");
                }
            }
        }

        if frame % 60 == 0 {
            report_bodies(&world, &scene, frame);
            probe_ground(&world, &scene, 0.0, 0.0);
            probe_ground(&world, &scene, 600.0, 600.0);
        }
    }

    let bodies: Vec<BodyId> = world
        .query::<&PhysicsBody>()
        .iter()
        .map(|(_, body)| body.0)
        .collect();
    for body in &bodies {
        scene.remove_and_destroy_body(*body);
    }
    debug!(released = bodies.len(), "Released all bodies");

    physics.destroy_shape(cube);
    physics.destroy_shape(ball);
    physics.destroy_scene(scene);
    physics.shutdown();
    info!("Sandbox finished");
    Ok(())
}
