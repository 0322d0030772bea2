//! Headless frame driver: flies the camera over the forest and runs the LOD
//! pipeline once per rendered frame.

use std::path::Path;
use std::time::{Duration, Instant};

use foliage_config::{Config, ForestConfig};
use foliage_lod::{
    FrameStats, LodAdjustment, LodParams, ModelId, Scene, SceneError, SceneLighting, ViewParams,
};
use glam::Vec3;
use tracing::{debug, info, warn};

use crate::flight::Flight;
use crate::forest::{ForestGenerator, mesh_base_distance};
use crate::game_loop::{FIXED_DT, GameLoop};

/// Aggregates over a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Frames rendered.
    pub frames: u64,
    /// Fixed simulation steps taken.
    pub updates: u64,
    /// Instances the forest holds at full density.
    pub full_density_instances: u64,
    /// Instances submitted, summed over all frames.
    pub instances_submitted: u64,
    /// Most instances submitted in a single frame.
    pub peak_instances: u64,
    /// Visible hosts, summed over all frames.
    pub hosts_visible: u64,
}

impl RunSummary {
    fn record(&mut self, stats: &FrameStats) {
        self.frames += 1;
        self.instances_submitted += stats.instances_submitted;
        self.peak_instances = self.peak_instances.max(stats.instances_submitted);
        self.hosts_visible += stats.hosts_visible as u64;
    }

    /// Mean instances per frame.
    pub fn mean_instances(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.instances_submitted as f64 / self.frames as f64
        }
    }

    /// Mean visible hosts per frame.
    pub fn mean_hosts_visible(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.hosts_visible as f64 / self.frames as f64
        }
    }
}

/// The forest scene plus everything that moves through it.
pub struct Simulation {
    config: Config,
    scene: Scene,
    flight: Flight,
    game_loop: GameLoop,
    summary: RunSummary,
}

impl Simulation {
    /// Generate the forest and place the camera.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if the forest settings produce invalid LOD
    /// parameters.
    pub fn new(config: Config) -> Result<Self, SceneError> {
        let mut builder = Scene::builder();
        builder
            .instance_budget(config.lod.target_instance_budget)
            .lighting(SceneLighting {
                direction: Vec3::new(0.3, -1.0, 0.2).normalize(),
                ..SceneLighting::default()
            });
        ForestGenerator::new(&config.forest).populate(&mut builder)?;
        let scene = builder.build();

        let flight = Flight::new(&config.view, &config.camera);
        let summary = RunSummary {
            full_density_instances: scene.full_density_instances(),
            ..RunSummary::default()
        };
        info!(
            "Simulation ready: {} hosts, {} instances at full density, budget {}",
            scene.hosts().len(),
            summary.full_density_instances,
            scene.instance_budget()
        );

        Ok(Self {
            config,
            scene,
            flight,
            game_loop: GameLoop::new(),
            summary,
        })
    }

    /// The scene being driven.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Render one frame after `frame_time` seconds of simulated time.
    pub fn step(&mut self, frame_time: f64) -> FrameStats {
        let flight = &mut self.flight;
        let mut alpha = 0.0;
        self.game_loop
            .advance(frame_time, |dt, _| flight.update(dt as f32), |a| alpha = a);
        self.present(alpha)
    }

    /// Render one frame after however much wall-clock time has passed since
    /// the previous one.
    pub fn tick(&mut self) -> FrameStats {
        let flight = &mut self.flight;
        let mut alpha = 0.0;
        self.game_loop.tick(|dt, _| flight.update(dt as f32), |a| alpha = a);
        self.present(alpha)
    }

    fn present(&mut self, alpha: f64) -> FrameStats {
        let camera = self.flight.camera(alpha as f32);
        let view = ViewParams::from_camera(&camera);
        let stats = self.scene.run_frame(&camera.frustum(), &view).stats;

        self.summary.record(&stats);
        self.summary.updates = self.game_loop.update_count();

        let interval = u64::from(self.config.debug.stats_interval_frames);
        if interval > 0 && self.game_loop.frame_count() % interval == 0 {
            info!(
                "frame {}: {} of {} hosts visible, {} meshes, {} instances",
                self.game_loop.frame_count(),
                stats.hosts_visible,
                stats.objects_tested,
                stats.meshes_active,
                stats.instances_submitted
            );
        }
        stats
    }

    /// Render `frames` frames at the fixed timestep and return the summary.
    pub fn run(&mut self, frames: u64) -> RunSummary {
        for _ in 0..frames {
            self.step(FIXED_DT);
        }
        self.summary
    }

    /// Render `frames` frames on the wall clock, paced to one frame per
    /// fixed step, and return the summary.
    pub fn run_realtime(&mut self, frames: u64) -> RunSummary {
        let frame_interval = Duration::from_secs_f64(FIXED_DT);
        for _ in 0..frames {
            let started = Instant::now();
            self.tick();
            if let Some(rest) = frame_interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        self.summary
    }

    /// Pick up a changed `config.ron` from `config_dir`.
    ///
    /// The instance budget, log interval and the forest's falloff settings
    /// apply at once; the rest of the forest, the view and the camera need a
    /// restart. Returns whether the file differed from the running config.
    pub fn reload(&mut self, config_dir: &Path) -> bool {
        let new_config = match self.config.reload(config_dir) {
            Ok(Some(new_config)) => new_config,
            Ok(None) => return false,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return false;
            }
        };
        if let Err(e) = new_config.validate() {
            warn!("Ignoring reloaded config: {e}");
            return false;
        }

        let layout_unchanged = ForestConfig {
            base_distance: new_config.forest.base_distance,
            half_distance_ratio: new_config.forest.half_distance_ratio,
            ..self.config.forest.clone()
        } == new_config.forest;
        if !layout_unchanged
            || new_config.view != self.config.view
            || new_config.camera != self.config.camera
        {
            warn!("Forest layout, view and camera changes take effect on restart");
        }

        if new_config.forest.base_distance != self.config.forest.base_distance
            || new_config.forest.half_distance_ratio != self.config.forest.half_distance_ratio
        {
            self.retune_foliage(&new_config.forest);
        }

        self.scene
            .set_instance_budget(new_config.lod.target_instance_budget);
        debug!("Instance budget now {}", self.scene.instance_budget());
        self.config = new_config;
        true
    }

    /// Move every foliage mesh's falloff to what `forest` asks for.
    fn retune_foliage(&mut self, forest: &ForestConfig) {
        let ratio_changed = forest.half_distance_ratio != self.config.forest.half_distance_ratio;
        let targets: Vec<(ModelId, usize, LodParams)> = self
            .scene
            .models()
            .iter()
            .flat_map(|model| {
                let id = model.id();
                model
                    .foliage()
                    .iter()
                    .enumerate()
                    .map(move |(mesh, foliage)| (id, mesh, foliage.lod))
            })
            .collect();

        let mut ratio_capped = false;
        for (id, mesh, lod) in targets {
            let base = LodAdjustment::BaseDistance(
                mesh_base_distance(forest, mesh) - lod.base_distance(),
            );
            if let Err(e) = self.scene.tune_lod(id, mesh, base) {
                warn!("Retuning {id:?} mesh {mesh} failed: {e}");
                continue;
            }
            if ratio_changed {
                let ratio = LodAdjustment::HalfDistanceRatio(
                    forest.half_distance_ratio - lod.half_distance_ratio(),
                );
                match self.scene.tune_lod(id, mesh, ratio) {
                    Ok(tuned) => {
                        ratio_capped |=
                            (tuned.half_distance_ratio() - forest.half_distance_ratio).abs() > 1e-4;
                    }
                    Err(e) => warn!("Retuning {id:?} mesh {mesh} failed: {e}"),
                }
            }
        }

        if ratio_capped {
            warn!(
                "Half-distance ratio {} capped for live tuning; restart to apply it in full",
                forest.half_distance_ratio
            );
        }
        info!(
            "Foliage retuned: base distance {}, half-distance ratio {}",
            forest.base_distance, forest.half_distance_ratio
        );
    }

    /// Totals so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}
