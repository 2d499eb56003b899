//! Capability traits over the physics backend
//!
//! Game code can be written against these traits so the rigid-body engine
//! underneath can be replaced without touching call sites. The rapier-backed
//! [`crate::physics::PhysicsSystem`] is the implementation shipped here.

use crate::physics::body::{BodyCreationSettings, BodyId, MotionKind};
use crate::physics::error::PhysicsResult;
use crate::physics::events::ContactEvent;
use crate::physics::layers::ObjectLayer;
use crate::physics::trace::{RayCastQuery, TraceResult};
use glam::Vec3;

/// Read access to one body
pub trait PhysicsBodyApi {
    type Shape;

    fn id(&self) -> BodyId;
    /// Opaque back-reference supplied at creation
    fn user_data(&self) -> u64;
    fn motion_kind(&self) -> MotionKind;
    fn object_layer(&self) -> ObjectLayer;
    /// Position in game units and Euler angles in degrees
    fn position_and_rotation(&self) -> (Vec3, Vec3);
    fn linear_and_angular_velocity(&self) -> (Vec3, Vec3);
    fn shape(&self) -> &Self::Shape;
    fn is_active(&self) -> bool;
}

/// Write access to one body
pub trait PhysicsBodyApiMut: PhysicsBodyApi {
    fn set_position_and_rotation(&mut self, position: Vec3, angles: Vec3);
    fn set_rotation(&mut self, angles: Vec3);
    fn set_linear_and_angular_velocity(&mut self, linear: Vec3, angular: Vec3);
    fn add_linear_velocity(&mut self, delta: Vec3);
}

/// Result of tracing against every body in a scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTrace {
    pub result: TraceResult,
    /// Body that stopped the trace
    pub body: Option<BodyId>,
    /// User data of that body
    pub user_data: Option<u64>,
}

/// One simulated world
pub trait PhysicsSceneApi {
    type Shape;
    type Body<'a>: PhysicsBodyApi<Shape = Self::Shape>
    where
        Self: 'a;
    type BodyMut<'a>: PhysicsBodyApiMut<Shape = Self::Shape>
    where
        Self: 'a;

    /// Advance by the fixed sub-step schedule; `delta_time` is ignored
    fn simulate(&mut self, delta_time: f32);
    fn create_and_add_body(
        &mut self,
        settings: &BodyCreationSettings,
        shape: &Self::Shape,
        user_data: u64,
    ) -> BodyId;
    fn create_and_add_world_body(
        &mut self,
        vertices: &[Vec3],
        indices: &[[u32; 3]],
    ) -> PhysicsResult<BodyId>;
    fn set_world_user_data(&mut self, user_data: u64) -> bool;
    fn remove_and_destroy_body(&mut self, body: BodyId);
    fn body(&self, id: BodyId) -> Option<Self::Body<'_>>;
    fn body_mut(&mut self, id: BodyId) -> Option<Self::BodyMut<'_>>;
    fn body_count(&self) -> usize;
    fn drain_contact_events(&mut self) -> Vec<ContactEvent>;
    fn trace(&self, query: &RayCastQuery, ignore: Option<BodyId>) -> SceneTrace;
}

/// Process-wide physics runtime
pub trait PhysicsBackend {
    type Shape;
    type Scene: PhysicsSceneApi<Shape = Self::Shape>;

    fn create_scene(&self) -> PhysicsResult<Self::Scene>;
    fn destroy_scene(&self, scene: Self::Scene);
    fn create_box_shape(&self, half_extent: Vec3) -> Self::Shape;
    fn create_sphere_shape(&self, radius: f32) -> Self::Shape;
    fn destroy_shape(&self, shape: Self::Shape);
    fn collision_query(
        &self,
        query: &RayCastQuery,
        shape: &Self::Shape,
        origin: Vec3,
        angles: Vec3,
    ) -> TraceResult;
}
