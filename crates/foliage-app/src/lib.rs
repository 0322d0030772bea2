//! Headless driver for the foliage LOD pipeline.
//!
//! Generates a procedural forest, flies a scripted camera over it on a
//! fixed-timestep loop, and evaluates visibility and LOD every frame.

pub mod flight;
pub mod forest;
pub mod game_loop;
pub mod platform;
pub mod simulation;

use foliage_config::ConfigError;
use foliage_lod::SceneError;

pub use platform::PlatformError;

/// Anything that can stop the driver before its first frame.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Directory resolution or creation failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
    /// The config could not be loaded or is out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The forest could not be assembled.
    #[error(transparent)]
    Scene(#[from] SceneError),
}
