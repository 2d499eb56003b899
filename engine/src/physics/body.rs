//! Rigid bodies as seen from game code
//!
//! Bodies live inside a [`crate::physics::PhysicsScene`] and are named by a
//! [`BodyId`]. Reading or writing one goes through a short-lived view that
//! borrows the scene, so body state can only be touched while no step is in
//! flight. All values are in game units and Euler degrees.

use crate::physics::interface::{PhysicsBodyApi, PhysicsBodyApiMut};
use crate::physics::layers::ObjectLayer;
use crate::physics::shape::Shape;
use crate::physics::units::{
    angles_from_sim, angles_to_sim, from_sim, pose_to_sim, vec_from_sim, vec_to_sim,
};
use glam::Vec3;
use rapier3d::prelude::{
    ColliderHandle, ColliderSet, Isometry, QueryPipeline, RigidBody, RigidBodyHandle,
    RigidBodyType,
};
use serde::{Deserialize, Serialize};

/// Opaque handle to a body in a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub(crate) RigidBodyHandle);

impl BodyId {
    pub fn raw_handle(&self) -> RigidBodyHandle {
        self.0
    }
}

/// How the solver moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MotionKind {
    /// Never moves, never activated
    #[default]
    Static,
    /// Moved by its velocity only, unaffected by forces
    Kinematic,
    /// Fully simulated
    Dynamic,
}

impl MotionKind {
    pub fn object_layer(self) -> ObjectLayer {
        match self {
            MotionKind::Static => ObjectLayer::NonMoving,
            MotionKind::Kinematic | MotionKind::Dynamic => ObjectLayer::Moving,
        }
    }

    pub(crate) fn body_type(self) -> RigidBodyType {
        match self {
            MotionKind::Static => RigidBodyType::Fixed,
            MotionKind::Kinematic => RigidBodyType::KinematicVelocityBased,
            MotionKind::Dynamic => RigidBodyType::Dynamic,
        }
    }
}

/// Parameters for a new body, in game units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyCreationSettings {
    pub position: Vec3,
    /// Euler angles in degrees: (pitch, yaw, roll)
    pub rotation: Vec3,
    pub motion_kind: MotionKind,
    pub friction: f32,
    /// Bounciness in [0, 1]
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Game units per second
    pub max_linear_velocity: f32,
    /// Scaled by the unit factor like every other velocity crossing the boundary
    pub max_angular_velocity: f32,
    pub gravity_factor: f32,
    pub inertia_multiplier: f32,
}

impl Default for BodyCreationSettings {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            motion_kind: MotionKind::Dynamic,
            friction: 0.2,
            restitution: 0.0,
            linear_damping: 0.05,
            angular_damping: 0.05,
            max_linear_velocity: from_sim(500.0),
            max_angular_velocity: from_sim(0.25 * std::f32::consts::PI * 60.0),
            gravity_factor: 1.0,
            inertia_multiplier: 1.0,
        }
    }
}

impl BodyCreationSettings {
    pub fn new(position: Vec3, rotation: Vec3, motion_kind: MotionKind) -> Self {
        Self {
            position,
            rotation,
            motion_kind,
            ..Default::default()
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_gravity_factor(mut self, gravity_factor: f32) -> Self {
        self.gravity_factor = gravity_factor;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Clamp values the engine cannot take: negative friction, restitution outside [0, 1]
    pub(crate) fn sanitized(&self) -> Self {
        Self {
            friction: self.friction.max(0.0),
            restitution: self.restitution.clamp(0.0, 1.0),
            linear_damping: self.linear_damping.max(0.0),
            angular_damping: self.angular_damping.max(0.0),
            max_linear_velocity: self.max_linear_velocity.abs(),
            max_angular_velocity: self.max_angular_velocity.abs(),
            inertia_multiplier: self.inertia_multiplier.max(f32::EPSILON),
            ..self.clone()
        }
    }
}

/// Scene-side bookkeeping for one body
#[derive(Debug, Clone)]
pub(crate) struct BodyRecord {
    pub shape: Shape,
    pub collider: ColliderHandle,
    pub motion_kind: MotionKind,
    pub layer: ObjectLayer,
    /// Simulation units per second
    pub max_linear_velocity: f32,
    pub max_angular_velocity: f32,
}

impl BodyRecord {
    /// Clamp a dynamic body's speeds to its limits
    pub(crate) fn clamp_velocities(&self, body: &mut RigidBody) {
        if self.motion_kind != MotionKind::Dynamic || body.is_sleeping() {
            return;
        }
        let linvel = *body.linvel();
        let speed = linvel.norm();
        if speed > self.max_linear_velocity {
            body.set_linvel(linvel * (self.max_linear_velocity / speed), false);
        }
        let angvel = *body.angvel();
        let spin = angvel.norm();
        if spin > self.max_angular_velocity {
            body.set_angvel(angvel * (self.max_angular_velocity / spin), false);
        }
    }
}

fn read_pose(body: &RigidBody) -> (Vec3, Vec3) {
    let pose = body.position();
    (
        vec_from_sim(&pose.translation.vector),
        angles_from_sim(&pose.rotation),
    )
}

fn read_velocity(body: &RigidBody) -> (Vec3, Vec3) {
    (vec_from_sim(body.linvel()), vec_from_sim(body.angvel()))
}

fn is_awake(body: &RigidBody) -> bool {
    !body.is_fixed() && !body.is_sleeping()
}

/// Read-only view of a body
pub struct BodyRef<'a> {
    pub(crate) id: BodyId,
    pub(crate) body: &'a RigidBody,
    pub(crate) record: &'a BodyRecord,
}

/// Mutable view of a body.
///
/// A teleport through this view refreshes the scene's query structure when
/// the view is dropped, so traces see the body at its new pose right away.
pub struct BodyMut<'a> {
    pub(crate) id: BodyId,
    pub(crate) body: &'a mut RigidBody,
    pub(crate) record: &'a BodyRecord,
    pub(crate) colliders: &'a mut ColliderSet,
    pub(crate) query_pipeline: &'a mut QueryPipeline,
    pub(crate) moved: bool,
}

impl Drop for BodyMut<'_> {
    fn drop(&mut self) {
        if !self.moved {
            return;
        }
        if let Some(collider) = self.colliders.get_mut(self.record.collider) {
            let offset = collider
                .position_wrt_parent()
                .copied()
                .unwrap_or_else(Isometry::identity);
            collider.set_position(self.body.position() * offset);
        }
        self.query_pipeline.update(self.colliders);
    }
}

impl PhysicsBodyApi for BodyRef<'_> {
    type Shape = Shape;

    fn id(&self) -> BodyId {
        self.id
    }

    fn user_data(&self) -> u64 {
        self.body.user_data as u64
    }

    fn motion_kind(&self) -> MotionKind {
        self.record.motion_kind
    }

    fn object_layer(&self) -> ObjectLayer {
        self.record.layer
    }

    fn position_and_rotation(&self) -> (Vec3, Vec3) {
        read_pose(self.body)
    }

    fn linear_and_angular_velocity(&self) -> (Vec3, Vec3) {
        read_velocity(self.body)
    }

    fn shape(&self) -> &Shape {
        &self.record.shape
    }

    fn is_active(&self) -> bool {
        is_awake(self.body)
    }
}

impl PhysicsBodyApi for BodyMut<'_> {
    type Shape = Shape;

    fn id(&self) -> BodyId {
        self.id
    }

    fn user_data(&self) -> u64 {
        self.body.user_data as u64
    }

    fn motion_kind(&self) -> MotionKind {
        self.record.motion_kind
    }

    fn object_layer(&self) -> ObjectLayer {
        self.record.layer
    }

    fn position_and_rotation(&self) -> (Vec3, Vec3) {
        read_pose(self.body)
    }

    fn linear_and_angular_velocity(&self) -> (Vec3, Vec3) {
        read_velocity(self.body)
    }

    fn shape(&self) -> &Shape {
        &self.record.shape
    }

    fn is_active(&self) -> bool {
        is_awake(self.body)
    }
}

impl PhysicsBodyApiMut for BodyMut<'_> {
    fn set_position_and_rotation(&mut self, position: Vec3, angles: Vec3) {
        let wake = self.record.motion_kind != MotionKind::Static;
        self.body.set_position(pose_to_sim(position, angles), wake);
        self.moved = true;
    }

    fn set_rotation(&mut self, angles: Vec3) {
        let wake = self.record.motion_kind != MotionKind::Static;
        self.body.set_rotation(angles_to_sim(angles), wake);
        self.moved = true;
    }

    fn set_linear_and_angular_velocity(&mut self, linear: Vec3, angular: Vec3) {
        let wake = self.record.motion_kind != MotionKind::Static;
        self.body.set_linvel(vec_to_sim(linear), wake);
        self.body.set_angvel(vec_to_sim(angular), wake);
    }

    fn add_linear_velocity(&mut self, delta: Vec3) {
        let wake = self.record.motion_kind != MotionKind::Static;
        let linvel = *self.body.linvel() + vec_to_sim(delta);
        self.body.set_linvel(linvel, wake);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_kind_layers() {
        assert_eq!(MotionKind::Static.object_layer(), ObjectLayer::NonMoving);
        assert_eq!(MotionKind::Kinematic.object_layer(), ObjectLayer::Moving);
        assert_eq!(MotionKind::Dynamic.object_layer(), ObjectLayer::Moving);
    }

    #[test]
    fn test_settings_sanitized() {
        let settings = BodyCreationSettings {
            friction: -1.0,
            restitution: 3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.friction, 0.0);
        assert_eq!(settings.restitution, 1.0);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = BodyCreationSettings::new(
            Vec3::new(0.0, 0.0, 64.0),
            Vec3::new(0.0, 45.0, 0.0),
            MotionKind::Kinematic,
        )
        .with_friction(0.8);

        let json = serde_json::to_string(&settings).unwrap();
        let deserialized: BodyCreationSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, deserialized);
    }

    #[test]
    fn test_default_limits_in_game_units() {
        let settings = BodyCreationSettings::default();
        assert!((settings.max_linear_velocity - 500.0 / 0.0254).abs() < 1.0);
        assert_eq!(settings.motion_kind, MotionKind::Dynamic);
    }
}
