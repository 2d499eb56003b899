//! Error types for the physics layer

/// Errors that can occur while building physics state
///
/// Queries never produce these; see [`crate::physics::trace`].
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("Out of memory reserving {0} bytes of physics scratch space")]
    OutOfMemory(usize),

    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid level geometry: {0}")]
    InvalidMesh(String),

    #[error("Scene already has a world body")]
    WorldBodyExists,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for physics construction
pub type PhysicsResult<T> = Result<T, PhysicsError>;
