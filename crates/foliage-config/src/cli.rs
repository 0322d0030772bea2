//! Command-line argument parsing for the foliage driver.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Foliage driver command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "foliage", about = "Headless foliage LOD driver")]
pub struct CliArgs {
    /// Viewport width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Far clip distance.
    #[arg(long)]
    pub z_far: Option<f32>,

    /// Target instance budget.
    #[arg(long)]
    pub budget: Option<u32>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Pace frames on the wall clock instead of stepping simulated time.
    #[arg(long)]
    pub realtime: bool,

    /// Forest generator seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.view.width = w;
        }
        if let Some(h) = args.height {
            self.view.height = h;
        }
        if let Some(far) = args.z_far {
            self.view.z_far = far;
        }
        if let Some(budget) = args.budget {
            self.lod.target_instance_budget = budget;
        }
        if let Some(seed) = args.seed {
            self.forest.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
