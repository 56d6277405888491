//! Window and scene configuration.
//!
//! The window is configured in code through [`AppConfig`]. Scene tuning comes
//! from an optional TOML file named by the `FLYTHROUGH_CONFIG` environment
//! variable; any field left out keeps its default.
//!
//! ```toml
//! seed = 42
//! box_count = 55
//! fog_density = 0.3
//!
//! [bloom]
//! strength = 2.0
//!
//! [flight]
//! time_scale = 0.05
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::bloom::BloomSettings;
use crate::flight::FlightPlan;
use crate::geometry::TubeParams;
use crate::path::{ClosedPath, PathError};
use crate::populate::{BOX_COUNT, KNOT_COUNT};

/// Environment variable holding the path of the scene config file.
pub const CONFIG_ENV_VAR: &str = "FLYTHROUGH_CONFIG";

/// Upper bound on `box_count` and `knot_count`.
pub const MAX_DECORATIONS: usize = 100_000;
/// Upper bound on `tube.tubular_segments`.
pub const MAX_TUBULAR_SEGMENTS: usize = 2048;
/// Upper bound on `tube.radial_segments`.
pub const MAX_RADIAL_SEGMENTS: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the app window.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Flythrough".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Tunable parameters of the scene.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Seed for decoration placement; a fresh seed is drawn when unset.
    pub seed: Option<u64>,
    pub box_count: usize,
    pub knot_count: usize,
    pub fog_density: f32,
    /// Replacement control points for the flight path.
    pub control_points: Option<Vec<[f32; 3]>>,
    pub tube: TubeParams,
    pub bloom: BloomSettings,
    pub flight: FlightPlan,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            box_count: BOX_COUNT,
            knot_count: KNOT_COUNT,
            fog_density: 0.3,
            control_points: None,
            tube: TubeParams::default(),
            bloom: BloomSettings::default(),
            flight: FlightPlan::default(),
        }
    }
}

impl SceneConfig {
    /// Loads the file named by `FLYTHROUGH_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load(path.as_deref())
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                info!("no scene config given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reads, parses and validates a TOML scene config.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.fog_density.is_finite() || self.fog_density < 0.0 {
            return invalid(format!("fog_density must be >= 0, got {}", self.fog_density));
        }
        if !self.tube.radius.is_finite() || self.tube.radius <= 0.0 {
            return invalid(format!("tube.radius must be > 0, got {}", self.tube.radius));
        }
        if self.box_count > MAX_DECORATIONS || self.knot_count > MAX_DECORATIONS {
            return invalid(format!(
                "box_count and knot_count must be <= {MAX_DECORATIONS}, got {} and {}",
                self.box_count, self.knot_count
            ));
        }
        if self.tube.tubular_segments < 3 || self.tube.radial_segments < 3 {
            return invalid("tube needs at least 3 tubular and 3 radial segments".into());
        }
        // Keeps every tube vertex index well inside u32
        if self.tube.tubular_segments > MAX_TUBULAR_SEGMENTS
            || self.tube.radial_segments > MAX_RADIAL_SEGMENTS
        {
            return invalid(format!(
                "tube segments must be <= {MAX_TUBULAR_SEGMENTS} tubular and <= {MAX_RADIAL_SEGMENTS} radial, got {} and {}",
                self.tube.tubular_segments, self.tube.radial_segments
            ));
        }
        if !self.flight.loop_duration_ms.is_finite() || self.flight.loop_duration_ms <= 0.0 {
            return invalid(format!(
                "flight.loop_duration_ms must be > 0, got {}",
                self.flight.loop_duration_ms
            ));
        }
        if !self.flight.time_scale.is_finite() || !self.flight.look_ahead.is_finite() {
            return invalid("flight values must be finite".into());
        }
        self.bloom.validate().map_err(ConfigError::Invalid)?;
        self.path()
            .map_err(|e| ConfigError::Invalid(format!("control_points: {e}")))?;
        Ok(())
    }

    /// Builds the flight path from the configured or built-in control points.
    pub fn path(&self) -> Result<ClosedPath, PathError> {
        match &self.control_points {
            Some(points) => ClosedPath::from_arrays(points),
            None => Ok(ClosedPath::default_loop()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_the_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.box_count, 55);
        assert_eq!(config.knot_count, 25);
        assert_eq!(config.fog_density, 0.3);
        assert_eq!(config.bloom.threshold, 0.002);
        assert_eq!(config.bloom.strength, 3.5);
        assert_eq!(config.bloom.radius, 0.0);
        assert!(config.validate().is_ok());

        let app = AppConfig::default();
        assert_eq!((app.width, app.height), (1280, 720));
        assert_eq!(app.title, "Flythrough");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config("seed = 7\n\n[bloom]\nstrength = 2.0\n");
        let config = SceneConfig::from_path(file.path()).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.bloom.strength, 2.0);
        assert_eq!(config.bloom.threshold, 0.002);
        assert_eq!(config.flight, FlightPlan::default());
    }

    #[test]
    fn control_points_replace_the_loop() {
        let file = write_config("control_points = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 0.0, 4.0]]\n");
        let config = SceneConfig::from_path(file.path()).unwrap();
        let path = config.path().unwrap();
        assert_eq!(path.control_points().len(), 3);
    }

    #[test]
    fn single_control_point_is_rejected() {
        let file = write_config("control_points = [[1.0, 2.0, 3.0]]\n");
        let err = SceneConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn negative_fog_is_rejected() {
        let config = SceneConfig {
            fog_density: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn huge_counts_are_rejected() {
        let file = write_config("box_count = 9223372036854775807\n");
        let err = SceneConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = SceneConfig {
            knot_count: MAX_DECORATIONS + 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let at_limit = SceneConfig {
            box_count: MAX_DECORATIONS,
            knot_count: MAX_DECORATIONS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn oversized_tube_is_rejected() {
        let file = write_config("[tube]\ntubular_segments = 4294967296\n");
        let err = SceneConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = SceneConfig {
            tube: TubeParams {
                radial_segments: MAX_RADIAL_SEGMENTS + 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let at_limit = SceneConfig {
            tube: TubeParams {
                tubular_segments: MAX_TUBULAR_SEGMENTS,
                radial_segments: MAX_RADIAL_SEGMENTS,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
        let vertices = (MAX_TUBULAR_SEGMENTS + 1) * (MAX_RADIAL_SEGMENTS + 1);
        assert!(u32::try_from(vertices * 6).is_ok());
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let file = write_config("bloom_strength = 2.0\n");
        let err = SceneConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(SceneConfig::load(None).unwrap(), SceneConfig::default());
    }
}
