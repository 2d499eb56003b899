//! Physics integration layer for the engine
//!
//! This crate wraps the rapier3d rigid-body engine behind a game-facing API
//! in game units, with fixed-step simulation on a shared worker pool and
//! legacy-compatible swept collision queries.

pub mod config;
pub mod physics;

// Re-export commonly used types
pub mod prelude {
    // Config types
    pub use crate::config::PhysicsConfig;

    // Physics types
    pub use crate::physics::{
        BodyCreationSettings, BodyId, ContactEvent, MotionKind, ObjectLayer, PhysicsError,
        PhysicsResult, PhysicsScene, PhysicsSystem, RayCastQuery, SceneTrace, Shape,
        TraceResult,
    };

    // Capability traits
    pub use crate::physics::{
        PhysicsBackend, PhysicsBodyApi, PhysicsBodyApiMut, PhysicsSceneApi,
    };

    // Math types
    pub use glam::{Quat, Vec3};
}

/// Initialize logging for the engine
///
/// Records emitted through the `log` crate by the rigid-body engine are
/// bridged into the same subscriber.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,engine_physics=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
