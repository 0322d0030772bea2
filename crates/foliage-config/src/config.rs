//! Configuration sections with defaults, RON persistence, and range checks.

use std::f32::consts::FRAC_PI_4;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level driver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Viewport and projection.
    pub view: ViewConfig,
    /// LOD selection.
    pub lod: LodConfig,
    /// Scripted camera flight.
    pub camera: CameraConfig,
    /// Procedural forest layout.
    pub forest: ForestConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Viewport and projection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip distance.
    pub z_near: f32,
    /// Far clip distance. Also the distance host distances are clamped to.
    pub z_far: f32,
}

/// LOD selection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Target instance budget steering the depth-complexity correction.
    pub target_instance_budget: u32,
}

/// Scripted camera settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Forward speed in meters per second.
    pub speed_m_s: f32,
    /// Turn rate in radians per second.
    pub spin_rad_s: f32,
    /// Eye height above the ground.
    pub eye_height: f32,
}

/// Procedural forest settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    /// Trees along Z.
    pub rows: u32,
    /// Trees along X.
    pub columns: u32,
    /// Grid spacing in meters; trees are jittered within their cell.
    pub spacing: f32,
    /// Seed for the forest generator.
    pub seed: u64,
    /// Distinct tree models generated.
    pub tree_models: u32,
    /// Foliage meshes per tree model.
    pub meshes_per_tree: u32,
    /// Leaf instances per foliage mesh.
    pub leaves_per_mesh: u32,
    /// Full-density distance of each foliage mesh.
    pub base_distance: f32,
    /// Ratio of base distance to the distance where density halves.
    pub half_distance_ratio: f32,
}

/// Debug/development settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Frames between statistics log lines. Zero disables them.
    pub stats_interval_frames: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fov_y_degrees: 72.0,
            z_near: 1.0,
            z_far: 1000.0,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            target_instance_budget: 50,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed_m_s: 100.0,
            spin_rad_s: FRAC_PI_4,
            eye_height: 1.5,
        }
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            rows: 24,
            columns: 24,
            spacing: 15.0,
            seed: 0x5EED,
            tree_models: 3,
            meshes_per_tree: 2,
            leaves_per_mesh: 1024,
            base_distance: 40.0,
            half_distance_ratio: 0.4,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval_frames: 60,
        }
    }
}

impl ViewConfig {
    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let contents =
            std::fs::read_to_string(config_dir.join(CONFIG_FILE)).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Check the settings the frame pipeline treats as preconditions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let view = &self.view;
        if view.width == 0 || view.height == 0 {
            return Err(invalid("view.width", "viewport must not be empty"));
        }
        if !(view.fov_y_degrees > 0.0 && view.fov_y_degrees < 180.0) {
            return Err(invalid("view.fov_y_degrees", "must lie in (0, 180)"));
        }
        if !(view.z_near > 0.0) {
            return Err(invalid("view.z_near", "must be positive"));
        }
        if !(view.z_far > view.z_near) {
            return Err(invalid("view.z_far", "must exceed view.z_near"));
        }

        let forest = &self.forest;
        if !(forest.spacing > 0.0) {
            return Err(invalid("forest.spacing", "must be positive"));
        }
        if forest.tree_models == 0 {
            return Err(invalid("forest.tree_models", "at least one model is required"));
        }
        if !(forest.base_distance > 0.0) {
            return Err(invalid("forest.base_distance", "must be positive"));
        }
        if !(forest.half_distance_ratio > 0.0 && forest.half_distance_ratio < 1.0) {
            return Err(invalid("forest.half_distance_ratio", "must lie in (0, 1)"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
