//! One simulated world
//!
//! A [`PhysicsScene`] wraps the full set of rapier structures for a world,
//! plus the bookkeeping that ties engine handles back to game data. Scenes
//! are created by a [`crate::physics::PhysicsSystem`] and step on its shared
//! job scheduler.

use crate::config::PhysicsConfig;
use crate::physics::body::{
    BodyCreationSettings, BodyId, BodyMut, BodyRecord, BodyRef, MotionKind,
};
use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::physics::events::{ContactEvent, ContactListener};
use crate::physics::interface::{PhysicsSceneApi, SceneTrace};
use crate::physics::layers::LayerPairFilter;
use crate::physics::scheduler::{ArenaLease, JobScheduler};
use crate::physics::shape::Shape;
use crate::physics::system::SceneToken;
use crate::physics::trace::{trace_shape, RayCastQuery, TraceResult};
use crate::physics::units::{point_to_sim, pose_to_sim, to_sim, vec_to_sim};
use glam::Vec3;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::parry::mass_properties::MassProperties;
use rapier3d::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Contact events a scene can queue between drains unless configured
pub const DEFAULT_CONTACT_EVENT_CAPACITY: usize = 4096;

/// Density used to derive body mass, kg per cubic meter
const BODY_DENSITY: Real = 1000.0;

/// Extra room around a swept box when culling bodies, in game units
const TRACE_CULL_MARGIN: f32 = 1.0;

pub struct PhysicsScene {
    scheduler: Arc<JobScheduler>,
    token: SceneToken,
    sub_steps: u32,

    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    hooks: LayerPairFilter,
    listener: ContactListener,
    _event_lease: ArenaLease,

    records: HashMap<RigidBodyHandle, BodyRecord>,
    world_body: Option<BodyId>,
    steps_taken: u64,
}

impl PhysicsScene {
    pub(crate) fn new(
        scheduler: Arc<JobScheduler>,
        config: &PhysicsConfig,
        token: SceneToken,
    ) -> PhysicsResult<Self> {
        let capacity = config
            .max_contact_events
            .unwrap_or(DEFAULT_CONTACT_EVENT_CAPACITY);
        let (buffer, lease) = scheduler.arena().lease_vec::<ContactEvent>(capacity)?;

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_timestep;

        info!(
            sub_steps = config.sub_steps,
            dt = config.fixed_timestep,
            contact_capacity = capacity,
            "Creating physics scene"
        );

        Ok(Self {
            scheduler,
            token,
            sub_steps: config.sub_steps,
            gravity: vec_to_sim(config.gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            hooks: LayerPairFilter,
            listener: ContactListener::new(buffer),
            _event_lease: lease,
            records: HashMap::new(),
            world_body: None,
            steps_taken: 0,
        })
    }

    pub(crate) fn token(&self) -> &SceneToken {
        &self.token
    }

    /// Advance the world by `sub_steps` fixed steps.
    ///
    /// `_delta_time` is ignored: every call runs the same fixed schedule, so
    /// results never depend on frame rate. Callers that need motion tied to
    /// wall-clock time accumulate and interpolate on their side. Each sub-step
    /// runs on the job scheduler and this call blocks until all are done.
    pub fn simulate(&mut self, _delta_time: f32) {
        trace!(bodies = self.records.len(), "Physics simulate starting");
        let scheduler = Arc::clone(&self.scheduler);
        for _ in 0..self.sub_steps {
            scheduler.run(|| self.step_once());
        }
        trace!(
            steps = self.steps_taken,
            pending_contacts = self.listener.pending(),
            "Physics simulate completed"
        );
    }

    fn step_once(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.hooks,
            &self.listener,
        );

        for (handle, record) in &self.records {
            if let Some(body) = self.rigid_body_set.get_mut(*handle) {
                record.clamp_velocities(body);
            }
        }
        self.steps_taken += 1;
    }

    /// Total fixed sub-steps run since creation
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Create a body with its own reference to `shape` and add it to the world.
    ///
    /// Static bodies go to the non-moving layer and stay inactive; everything
    /// else goes to the moving layer and starts awake.
    pub fn create_and_add_body(
        &mut self,
        settings: &BodyCreationSettings,
        shape: &Shape,
        user_data: u64,
    ) -> BodyId {
        let settings = settings.sanitized();
        let motion_kind = settings.motion_kind;
        let layer = motion_kind.object_layer();

        let rigid_body = RigidBodyBuilder::new(motion_kind.body_type())
            .position(pose_to_sim(settings.position, settings.rotation))
            .linear_damping(settings.linear_damping)
            .angular_damping(settings.angular_damping)
            .gravity_scale(settings.gravity_factor)
            .user_data(user_data as u128)
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);

        let mut collider = ColliderBuilder::new(shape.shared().clone())
            .friction(settings.friction)
            .restitution(settings.restitution)
            .collision_groups(layer.interaction_groups())
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(layer.to_tag());
        if motion_kind != MotionKind::Static {
            collider = collider.mass_properties(scaled_mass_properties(
                shape,
                settings.inertia_multiplier,
            ));
        }
        let collider =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        if motion_kind != MotionKind::Static {
            if let Some(body) = self.rigid_body_set.get_mut(handle) {
                body.wake_up(true);
            }
        }
        self.query_pipeline.update(&self.collider_set);

        self.records.insert(
            handle,
            BodyRecord {
                shape: shape.clone(),
                collider,
                motion_kind,
                layer,
                max_linear_velocity: to_sim(settings.max_linear_velocity),
                max_angular_velocity: to_sim(settings.max_angular_velocity),
            },
        );

        debug!(
            ?handle,
            ?motion_kind,
            ?layer,
            user_data = user_data,
            "Created physics body"
        );
        BodyId(handle)
    }

    /// Build the persistent level-geometry body from a triangle soup.
    ///
    /// A scene has at most one; a second call fails with
    /// [`PhysicsError::WorldBodyExists`].
    pub fn create_and_add_world_body(
        &mut self,
        vertices: &[Vec3],
        indices: &[[u32; 3]],
    ) -> PhysicsResult<BodyId> {
        if self.world_body.is_some() {
            return Err(PhysicsError::WorldBodyExists);
        }
        let shape = Shape::triangle_mesh(vertices, indices)?;
        let settings = BodyCreationSettings {
            motion_kind: MotionKind::Static,
            ..Default::default()
        };
        let id = self.create_and_add_body(&settings, &shape, 0);
        self.world_body = Some(id);

        info!(
            vertices = vertices.len(),
            triangles = indices.len(),
            "Added world geometry body"
        );
        Ok(id)
    }

    pub fn world_body(&self) -> Option<BodyId> {
        self.world_body
    }

    /// Retag the world body; false if there is none
    pub fn set_world_user_data(&mut self, user_data: u64) -> bool {
        let Some(id) = self.world_body else {
            return false;
        };
        match self.rigid_body_set.get_mut(id.0) {
            Some(body) => {
                body.user_data = user_data as u128;
                true
            }
            None => false,
        }
    }

    /// Remove a body from the world and drop its shape reference.
    ///
    /// Queued contact events naming it are discarded at the next drain.
    pub fn remove_and_destroy_body(&mut self, body: BodyId) {
        let Some(record) = self.records.remove(&body.0) else {
            debug_assert!(false, "removing unknown body {body:?}");
            warn!(?body, "Tried to remove a body that is not in this scene");
            return;
        };

        self.rigid_body_set.remove(
            body.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.query_pipeline.update(&self.collider_set);
        if self.world_body == Some(body) {
            self.world_body = None;
        }
        debug!(?body, collider = ?record.collider, "Destroyed physics body");
    }

    pub fn body(&self, id: BodyId) -> Option<BodyRef<'_>> {
        let record = self.records.get(&id.0)?;
        let body = self.rigid_body_set.get(id.0)?;
        Some(BodyRef { id, body, record })
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<BodyMut<'_>> {
        let record = self.records.get(&id.0)?;
        let body = self.rigid_body_set.get_mut(id.0)?;
        Some(BodyMut {
            id,
            body,
            record,
            colliders: &mut self.collider_set,
            query_pipeline: &mut self.query_pipeline,
            moved: false,
        })
    }

    pub fn contains_body(&self, id: BodyId) -> bool {
        self.records.contains_key(&id.0)
    }

    pub fn body_count(&self) -> usize {
        self.records.len()
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.records.keys().map(|handle| BodyId(*handle))
    }

    /// Take every contact event queued since the last drain
    pub fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        let records = &self.records;
        self.listener.drain_into(&mut events, |event| {
            records.contains_key(&event.body_a.0) && records.contains_key(&event.body_b.0)
        });
        events
    }

    /// Trace against every body in the scene and keep the closest hit.
    ///
    /// `ignore` skips one body, typically the mover's own. Candidates come
    /// from the query pipeline's broad phase; equal fractions go to a solid
    /// start, then to the lower body handle.
    pub fn trace(&self, query: &RayCastQuery, ignore: Option<BodyId>) -> SceneTrace {
        let sweep = swept_aabb(query);
        let mut candidates = Vec::new();
        self.query_pipeline
            .colliders_with_aabb_intersecting_aabb(&sweep, |collider| {
                candidates.push(*collider);
                true
            });

        let mut best: Option<(SceneTrace, RigidBodyHandle)> = None;
        for collider in candidates {
            let Some(handle) = self.collider_set.get(collider).and_then(|c| c.parent()) else {
                continue;
            };
            if ignore == Some(BodyId(handle)) {
                continue;
            }
            let (Some(record), Some(body)) =
                (self.records.get(&handle), self.rigid_body_set.get(handle))
            else {
                continue;
            };

            let result = trace_shape(query, &*record.shape.shared().0, body.position());
            if !result.is_hit() {
                continue;
            }
            let ranks_first = best.as_ref().map_or(true, |(b, b_handle)| {
                trace_rank(&result, handle) < trace_rank(&b.result, *b_handle)
            });
            if ranks_first {
                best = Some((
                    SceneTrace {
                        result,
                        body: Some(BodyId(handle)),
                        user_data: Some(body.user_data as u64),
                    },
                    handle,
                ));
            }
        }

        best.map(|(trace, _)| trace).unwrap_or(SceneTrace {
            result: TraceResult::miss(query),
            body: None,
            user_data: None,
        })
    }
}

/// Ordering key for scene trace hits, smallest wins
fn trace_rank(result: &TraceResult, handle: RigidBodyHandle) -> (f32, bool, (u32, u32)) {
    (result.fraction, !result.all_solid, handle.into_raw_parts())
}

/// Mass properties at [`BODY_DENSITY`] with the principal inertia scaled
fn scaled_mass_properties(shape: &Shape, inertia_multiplier: Real) -> MassProperties {
    let base = shape.shared().mass_properties(BODY_DENSITY);
    MassProperties::with_principal_inertia_frame(
        base.local_com,
        base.mass(),
        base.principal_inertia() * inertia_multiplier,
        base.principal_inertia_local_frame,
    )
}

/// Simulation-space bounds covering the whole sweep
fn swept_aabb(query: &RayCastQuery) -> Aabb {
    let half = vec_to_sim(query.half_extent.abs() + Vec3::splat(TRACE_CULL_MARGIN));
    let start = point_to_sim(query.start);
    let end = point_to_sim(query.end());
    Aabb::new(start.inf(&end) - half, start.sup(&end) + half)
}

impl std::fmt::Debug for PhysicsScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsScene")
            .field("bodies", &self.records.len())
            .field("world_body", &self.world_body)
            .field("sub_steps", &self.sub_steps)
            .field("steps_taken", &self.steps_taken)
            .finish()
    }
}

impl PhysicsSceneApi for PhysicsScene {
    type Shape = Shape;
    type Body<'a> = BodyRef<'a>;
    type BodyMut<'a> = BodyMut<'a>;

    fn simulate(&mut self, delta_time: f32) {
        PhysicsScene::simulate(self, delta_time)
    }

    fn create_and_add_body(
        &mut self,
        settings: &BodyCreationSettings,
        shape: &Shape,
        user_data: u64,
    ) -> BodyId {
        PhysicsScene::create_and_add_body(self, settings, shape, user_data)
    }

    fn create_and_add_world_body(
        &mut self,
        vertices: &[Vec3],
        indices: &[[u32; 3]],
    ) -> PhysicsResult<BodyId> {
        PhysicsScene::create_and_add_world_body(self, vertices, indices)
    }

    fn set_world_user_data(&mut self, user_data: u64) -> bool {
        PhysicsScene::set_world_user_data(self, user_data)
    }

    fn remove_and_destroy_body(&mut self, body: BodyId) {
        PhysicsScene::remove_and_destroy_body(self, body)
    }

    fn body(&self, id: BodyId) -> Option<BodyRef<'_>> {
        PhysicsScene::body(self, id)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<BodyMut<'_>> {
        PhysicsScene::body_mut(self, id)
    }

    fn body_count(&self) -> usize {
        PhysicsScene::body_count(self)
    }

    fn drain_contact_events(&mut self) -> Vec<ContactEvent> {
        PhysicsScene::drain_contact_events(self)
    }

    fn trace(&self, query: &RayCastQuery, ignore: Option<BodyId>) -> SceneTrace {
        PhysicsScene::trace(self, query, ignore)
    }
}
