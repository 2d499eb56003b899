//! Configuration types for the physics layer

use crate::physics::error::{PhysicsError, PhysicsResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Standard gravity in game units per second squared
pub const DEFAULT_GRAVITY: f32 = 9.80665 / crate::physics::units::METERS_PER_UNIT;

/// Runtime configuration for a [`crate::physics::PhysicsSystem`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Worker threads in the job pool; `None` uses all hardware threads but one
    pub worker_threads: Option<usize>,
    /// Byte budget of the temporary arena shared by every scene
    pub temp_arena_bytes: usize,
    /// Gravity in game units per second squared (Z-up)
    pub gravity: Vec3,
    /// Fixed sub-steps run by each `simulate` call
    pub sub_steps: u32,
    /// Duration of one sub-step in seconds
    pub fixed_timestep: f32,
    /// Contact events a scene can hold between drains; `None` uses
    /// [`crate::physics::scene::DEFAULT_CONTACT_EVENT_CAPACITY`]
    pub max_contact_events: Option<usize>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            temp_arena_bytes: 32 * 1024 * 1024,
            gravity: Vec3::new(0.0, 0.0, -DEFAULT_GRAVITY),
            sub_steps: 8,
            fixed_timestep: 1.0 / 60.0,
            max_contact_events: None,
        }
    }
}

impl PhysicsConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> PhysicsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        debug!(config = ?config, "Parsed physics config");
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn load_from_file(path: &Path) -> PhysicsResult<Self> {
        debug!(path = ?path, "Loading physics config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of workers the job pool will actually start
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
        })
        .max(1)
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        if self.sub_steps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "sub_steps must be at least 1".to_string(),
            ));
        }
        if !self.fixed_timestep.is_finite() || self.fixed_timestep <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if self.temp_arena_bytes == 0 {
            return Err(PhysicsError::InvalidConfig(
                "temp_arena_bytes must be non-zero".to_string(),
            ));
        }
        if self.max_contact_events == Some(0) {
            return Err(PhysicsError::InvalidConfig(
                "max_contact_events must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.sub_steps, 8);
        assert_eq!(config.fixed_timestep, 1.0 / 60.0);
        assert!(config.gravity.z < -386.0 && config.gravity.z > -386.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_threads_at_least_one() {
        let config = PhysicsConfig {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert_eq!(config.resolved_worker_threads(), 1);
        assert!(PhysicsConfig::default().resolved_worker_threads() >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PhysicsConfig::from_json_str(r#"{ "worker_threads": 2 }"#).unwrap();
        assert_eq!(config.worker_threads, Some(2));
        assert_eq!(config.sub_steps, 8);
    }

    #[test]
    fn test_rejects_zero_sub_steps() {
        let err = PhysicsConfig::from_json_str(r#"{ "sub_steps": 0 }"#).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_timestep() {
        let config = PhysicsConfig {
            fixed_timestep: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "gravity": [0.0, 0.0, -100.0], "sub_steps": 4 }}"#).unwrap();

        let config = PhysicsConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.gravity, Vec3::new(0.0, 0.0, -100.0));
        assert_eq!(config.sub_steps, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PhysicsConfig::load_from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, PhysicsError::Io(_)));
    }
}
