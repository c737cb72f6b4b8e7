use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skyisle_input::KeyBindings;
use skyisle_motion::MotionParams;
use skyisle_scene::CameraConfig;

/// Errors from loading or validating an [`ExploreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Integrator tuning plus frame timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    #[serde(flatten)]
    pub params: MotionParams,
    /// Longest frame step, in seconds.
    pub max_frame_delta: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            params: MotionParams::default(),
            max_frame_delta: 0.1,
        }
    }
}

impl MovementConfig {
    pub fn max_frame_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_frame_delta)
            .unwrap_or_else(|_| Duration::from_millis(100))
    }
}

/// Everything tunable about the explore view. Every section is optional in
/// the YAML file; missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub bindings: KeyBindings,
}

impl ExploreConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded explore config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.movement;
        if !(m.params.damping.is_finite() && m.params.damping >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "movement.damping must be a non-negative number, got {}",
                m.params.damping
            )));
        }
        if !(m.params.acceleration.is_finite() && m.params.acceleration >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "movement.acceleration must be a non-negative number, got {}",
                m.params.acceleration
            )));
        }
        if !(m.max_frame_delta.is_finite() && m.max_frame_delta > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "movement.max_frame_delta must be positive, got {}",
                m.max_frame_delta
            )));
        }

        let c = &self.camera;
        if !(c.fov_degrees > 0.0 && c.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                c.fov_degrees
            )));
        }
        if !(c.near > 0.0 && c.far > c.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                c.near, c.far
            )));
        }
        if !c.start_position.is_finite() {
            return Err(ConfigError::Invalid("camera.start_position must be finite".into()));
        }

        if self.bindings.is_empty() {
            tracing::warn!("no movement keys bound; the view will not move");
        }
        Ok(())
    }
}
