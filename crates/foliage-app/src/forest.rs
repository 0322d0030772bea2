//! Deterministic procedural forest: a few tree models with trunk and leaf
//! meshes, placed on a jittered grid.

use std::f32::consts::TAU;
use std::sync::Arc;

use foliage_config::ForestConfig;
use foliage_lod::{
    Geometry, InstanceTransform, LodParams, Material, Model, Scene, SceneBuilder, SceneError,
};
use foliage_view::OrientedBox;
use glam::{Quat, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Each further foliage mesh of a tree keeps full density this much longer,
/// as a fraction of the configured base distance.
const BASE_DISTANCE_STEP: f32 = 0.5;

/// Share of a grid cell a tree may be pushed off its cell center.
const JITTER: f32 = 0.3;

/// Generates the same forest for the same config.
pub struct ForestGenerator<'a> {
    config: &'a ForestConfig,
}

impl<'a> ForestGenerator<'a> {
    /// Prepare a generator for `config`.
    pub fn new(config: &'a ForestConfig) -> Self {
        Self { config }
    }

    /// Register the tree models and place every tree into `builder`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] if the configured LOD parameters are invalid.
    pub fn populate(&self, builder: &mut SceneBuilder) -> Result<(), SceneError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut model_ids = Vec::with_capacity(self.config.tree_models as usize);
        for index in 0..self.config.tree_models {
            let model = self.tree_model(index, &mut rng)?;
            model_ids.push(builder.add_model(model)?);
        }
        if model_ids.is_empty() {
            return Ok(());
        }

        let spacing = self.config.spacing;
        let half_width = self.config.columns.saturating_sub(1) as f32 * spacing * 0.5;
        let half_depth = self.config.rows.saturating_sub(1) as f32 * spacing * 0.5;
        for row in 0..self.config.rows {
            for column in 0..self.config.columns {
                let jitter_x = rng.random_range(-JITTER..=JITTER) * spacing;
                let jitter_z = rng.random_range(-JITTER..=JITTER) * spacing;
                let position = Vec3::new(
                    column as f32 * spacing - half_width + jitter_x,
                    0.0,
                    row as f32 * spacing - half_depth + jitter_z,
                );
                let orientation = Quat::from_rotation_y(rng.random::<f32>() * TAU);
                let model = model_ids[rng.random_range(0..model_ids.len())];
                builder.place(model, position, orientation)?;
            }
        }

        info!(
            "Forest generated: {} models, {} trees, seed {}",
            model_ids.len(),
            self.config.rows * self.config.columns,
            self.config.seed
        );
        Ok(())
    }

    /// Build a complete scene from the forest alone.
    pub fn build(&self, instance_budget: u32) -> Result<Scene, SceneError> {
        let mut builder = Scene::builder();
        builder.instance_budget(instance_budget);
        self.populate(&mut builder)?;
        Ok(builder.build())
    }

    fn tree_model(&self, index: u32, rng: &mut ChaCha8Rng) -> Result<Model, SceneError> {
        let height = rng.random_range(6.0..12.0_f32);
        let crown_radius = height * rng.random_range(0.25..0.4_f32);
        let crown_center = Vec3::new(0.0, height * 0.65, 0.0);

        let trunk = Arc::new(Geometry {
            name: format!("tree-{index}/trunk"),
            vertex_count: 24,
            index_count: 36,
            material: Material {
                ka: 0.2,
                kd: 0.6,
                ks: 0.05,
                ns: 4.0,
                texture_id: 0,
            },
            instances: Vec::new(),
        });

        let bounds = OrientedBox::axis_aligned(
            Vec3::new(0.0, height * 0.5, 0.0),
            Vec3::new(crown_radius, height * 0.5, crown_radius),
        );
        let mut model = Model::new(format!("tree-{index}"), bounds).with_coarse_mesh(trunk);

        for mesh in 0..self.config.meshes_per_tree {
            let leaves = Arc::new(Geometry {
                name: format!("tree-{index}/leaves-{mesh}"),
                vertex_count: 4,
                index_count: 6,
                material: Material {
                    texture_id: mesh + 1,
                    ..Material::default()
                },
                instances: leaf_instances(
                    rng,
                    self.config.leaves_per_mesh as usize,
                    crown_center,
                    crown_radius,
                ),
            });
            let lod = LodParams::new(
                mesh_base_distance(self.config, mesh as usize),
                self.config.half_distance_ratio,
            )?;
            model = model.with_foliage(leaves, lod);
        }
        Ok(model)
    }
}

/// Full-density distance of foliage mesh `mesh` for the given settings.
pub fn mesh_base_distance(config: &ForestConfig, mesh: usize) -> f32 {
    config.base_distance * (1.0 + BASE_DISTANCE_STEP * mesh as f32)
}

/// Leaves scattered through an ellipsoidal crown, in random order so every
/// prefix is an unbiased subsample of the crown.
pub fn leaf_instances(
    rng: &mut ChaCha8Rng,
    count: usize,
    crown_center: Vec3,
    crown_radius: f32,
) -> Vec<InstanceTransform> {
    let mut instances: Vec<InstanceTransform> = (0..count)
        .map(|_| {
            // Uniform over the crown volume, flattened vertically.
            let theta = rng.random::<f32>() * TAU;
            let phi = (1.0 - 2.0 * rng.random::<f32>()).acos();
            let r = crown_radius * rng.random::<f32>().cbrt();
            let offset = Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.cos() * 0.7,
                r * phi.sin() * theta.sin(),
            );
            let axis = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            )
            .try_normalize()
            .unwrap_or(Vec3::Y);
            let rotation = Quat::from_axis_angle(axis, rng.random::<f32>() * TAU);
            InstanceTransform::new(crown_center + offset, rotation)
        })
        .collect();
    instances.shuffle(rng);
    instances
}
