//! Binary entry point: `cargo run -p foliage-app -- --frames 1200 --budget 80`.

use clap::Parser;
use foliage_app::AppError;
use foliage_app::platform::PlatformDirs;
use foliage_app::simulation::Simulation;
use foliage_config::{CliArgs, Config};
use tracing::info;

/// Frames between checks for an edited `config.ron`.
const RELOAD_INTERVAL_FRAMES: u64 = 120;

fn main() {
    if let Err(e) = run() {
        eprintln!("foliage: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let dirs = match args.config.clone() {
        Some(config_dir) => PlatformDirs::with_config_override(config_dir),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(&args);
    config.validate()?;

    foliage_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!("Foliage LOD driver");
    info!("  config: {}", dirs.config_dir.display());
    info!("  logs:   {}", dirs.log_dir.display());
    info!(
        "View: {}x{}, far {:.0} | Forest: {}x{} trees, seed {}",
        config.view.width,
        config.view.height,
        config.view.z_far,
        config.forest.columns,
        config.forest.rows,
        config.forest.seed
    );

    let mut simulation = Simulation::new(config)?;
    let mut remaining = args.frames;
    while remaining > 0 {
        let batch = remaining.min(RELOAD_INTERVAL_FRAMES);
        if args.realtime {
            simulation.run_realtime(batch);
        } else {
            simulation.run(batch);
        }
        remaining -= batch;
        simulation.reload(&dirs.config_dir);
    }

    let summary = simulation.summary();
    info!(
        "Done: {} frames, {} steps, {:.1} hosts and {:.0} of {} instances per frame (peak {})",
        summary.frames,
        summary.updates,
        summary.mean_hosts_visible(),
        summary.mean_instances(),
        summary.full_density_instances,
        summary.peak_instances
    );
    Ok(())
}
