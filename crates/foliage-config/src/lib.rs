//! Configuration for the foliage LOD driver.
//!
//! Settings persist to disk as RON and tolerate missing or unknown fields, so
//! older and newer config files keep loading. CLI flags override loaded
//! values, and a reload call reports whether the file changed.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CameraConfig, Config, DebugConfig, ForestConfig, LodConfig, ViewConfig};
pub use error::ConfigError;
