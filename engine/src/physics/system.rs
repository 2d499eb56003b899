//! Process-wide physics runtime
//!
//! [`PhysicsSystem`] is an explicit context object: the caller creates it
//! with [`PhysicsSystem::init`], passes it by reference to whatever needs
//! scenes or shapes, and ends it with [`PhysicsSystem::shutdown`] once every
//! scene is gone. It owns the job scheduler and temp arena shared by all of
//! its scenes.

use crate::config::PhysicsConfig;
use crate::physics::error::PhysicsResult;
use crate::physics::interface::PhysicsBackend;
use crate::physics::scene::PhysicsScene;
use crate::physics::scheduler::JobScheduler;
use crate::physics::shape::Shape;
use crate::physics::trace::{self, RayCastQuery, TraceResult};
use glam::Vec3;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counts one live scene; the count drops when the scene does
#[derive(Debug)]
pub(crate) struct SceneToken(Arc<AtomicUsize>);

impl SceneToken {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(counter))
    }

    fn issued_by(&self, counter: &Arc<AtomicUsize>) -> bool {
        Arc::ptr_eq(&self.0, counter)
    }
}

impl Drop for SceneToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct PhysicsSystem {
    config: PhysicsConfig,
    scheduler: Arc<JobScheduler>,
    live_scenes: Arc<AtomicUsize>,
}

impl PhysicsSystem {
    /// Validate `config`, start the worker pool and reserve the temp arena.
    pub fn init(config: PhysicsConfig) -> PhysicsResult<Self> {
        config.validate()?;
        let scheduler = JobScheduler::new(&config)?;

        info!(
            workers = scheduler.worker_count(),
            sub_steps = config.sub_steps,
            fixed_timestep = config.fixed_timestep,
            gravity = ?config.gravity,
            "Physics system initialized"
        );

        Ok(Self {
            config,
            scheduler: Arc::new(scheduler),
            live_scenes: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Stop the runtime.
    ///
    /// # Panics
    ///
    /// Panics if any scene created by this system is still alive.
    pub fn shutdown(self) {
        let live = self.live_scene_count();
        if live != 0 {
            error!(live_scenes = live, "Physics system shut down with live scenes");
            panic!("physics system shut down with {live} live scene(s)");
        }
        info!("Physics system shut down");
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    pub fn live_scene_count(&self) -> usize {
        self.live_scenes.load(Ordering::Acquire)
    }

    /// Create an empty scene stepping on this system's scheduler.
    ///
    /// Fails with `OutOfMemory` when the temp arena cannot hold another
    /// contact-event queue.
    pub fn create_scene(&self) -> PhysicsResult<PhysicsScene> {
        let token = SceneToken::new(&self.live_scenes);
        PhysicsScene::new(Arc::clone(&self.scheduler), &self.config, token)
    }

    pub fn destroy_scene(&self, scene: PhysicsScene) {
        debug_assert!(
            scene.token().issued_by(&self.live_scenes),
            "scene destroyed through a system that did not create it"
        );
        debug!(bodies = scene.body_count(), "Destroying physics scene");
        drop(scene);
    }

    /// Box with the given half extent in game units
    pub fn create_box_shape(&self, half_extent: Vec3) -> Shape {
        Shape::cuboid(half_extent)
    }

    /// Sphere with the given radius in game units
    pub fn create_sphere_shape(&self, radius: f32) -> Shape {
        Shape::ball(radius)
    }

    /// Release the caller's shape reference.
    ///
    /// The shape must no longer be attached to any body.
    pub fn destroy_shape(&self, shape: Shape) {
        let references = shape.reference_count();
        debug_assert!(
            references == 1,
            "shape destroyed while {} other reference(s) remain",
            references - 1
        );
        if references > 1 {
            warn!(
                references = references,
                kind = ?shape.kind(),
                "Destroying a shape that bodies still reference"
            );
        }
    }

    /// Trace `query` against a single shape at an explicit pose.
    pub fn collision_query(
        &self,
        query: &RayCastQuery,
        shape: &Shape,
        origin: Vec3,
        angles: Vec3,
    ) -> TraceResult {
        trace::collision_query(query, shape, origin, angles)
    }
}

impl Drop for PhysicsSystem {
    fn drop(&mut self) {
        let live = self.live_scene_count();
        if live != 0 {
            error!(live_scenes = live, "Physics system dropped with live scenes");
        }
    }
}

impl std::fmt::Debug for PhysicsSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsSystem")
            .field("scheduler", &self.scheduler)
            .field("live_scenes", &self.live_scene_count())
            .finish()
    }
}

impl PhysicsBackend for PhysicsSystem {
    type Shape = Shape;
    type Scene = PhysicsScene;

    fn create_scene(&self) -> PhysicsResult<PhysicsScene> {
        PhysicsSystem::create_scene(self)
    }

    fn destroy_scene(&self, scene: PhysicsScene) {
        PhysicsSystem::destroy_scene(self, scene)
    }

    fn create_box_shape(&self, half_extent: Vec3) -> Shape {
        PhysicsSystem::create_box_shape(self, half_extent)
    }

    fn create_sphere_shape(&self, radius: f32) -> Shape {
        PhysicsSystem::create_sphere_shape(self, radius)
    }

    fn destroy_shape(&self, shape: Shape) {
        PhysicsSystem::destroy_shape(self, shape)
    }

    fn collision_query(
        &self,
        query: &RayCastQuery,
        shape: &Shape,
        origin: Vec3,
        angles: Vec3,
    ) -> TraceResult {
        PhysicsSystem::collision_query(self, query, shape, origin, angles)
    }
}
