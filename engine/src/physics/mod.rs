//! Physics integration layer over rapier3d
//!
//! Game code works in game units (inches, Z-up) and Euler angles in degrees.
//! Everything handed to the rigid-body engine is converted once at the
//! boundary by [`units`]. A [`PhysicsSystem`] owns the worker pool and
//! creates [`PhysicsScene`]s and [`Shape`]s; scenes own their bodies and
//! queue contact events for the game thread to drain after each step.
//! Swept queries return legacy-style [`TraceResult`]s.

pub mod body;
pub(crate) mod diagnostics;
pub mod error;
pub mod events;
pub mod interface;
pub mod layers;
pub mod scene;
pub mod scheduler;
pub mod shape;
pub mod system;
pub mod trace;
pub mod units;


// Re-export commonly used types
pub use body::{BodyCreationSettings, BodyId, BodyMut, BodyRef, MotionKind};
pub use error::{PhysicsError, PhysicsResult};
pub use events::ContactEvent;
pub use interface::{
    PhysicsBackend, PhysicsBodyApi, PhysicsBodyApiMut, PhysicsSceneApi, SceneTrace,
};
pub use layers::{BroadPhaseLayer, ObjectLayer};
pub use scene::PhysicsScene;
pub use scheduler::{JobScheduler, TempArena};
pub use shape::{Shape, ShapeKind};
pub use system::PhysicsSystem;
pub use trace::{collision_query, Plane, RayCastQuery, TraceResult};
