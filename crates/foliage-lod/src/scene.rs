//! Scene assembly, shared model registry, lighting pass-through, and runtime LOD tuning.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use tracing::{debug, info};

use crate::{DEFAULT_INSTANCE_BUDGET, HostObject, LodParams, Model, ModelId, SceneError};

/// One directional light plus an ambient term. The LOD core never reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLighting {
    /// Direction the light travels.
    pub direction: Vec3,
    /// Light color.
    pub color: Vec3,
    /// Ambient color.
    pub ambient: Vec3,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            ambient: Vec3::ONE,
        }
    }
}

impl SceneLighting {
    /// Pack the lighting into its uniform block.
    pub fn uniform(&self) -> LightingUniform {
        LightingUniform {
            direction: self.direction.extend(0.0).to_array(),
            color: self.color.extend(1.0).to_array(),
            ambient: self.ambient.extend(1.0).to_array(),
        }
    }
}

/// Lighting constants as uploaded once per frame (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightingUniform {
    /// Light direction, `w = 0`.
    pub direction: [f32; 4],
    /// Light color, `w = 1`.
    pub color: [f32; 4],
    /// Ambient color, `w = 1`.
    pub ambient: [f32; 4],
}

static_assertions::assert_eq_size!(LightingUniform, [u8; 48]);

/// A runtime change to one foliage mesh's falloff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LodAdjustment {
    /// Move the full-density distance `d0` by this many world units.
    BaseDistance(f32),
    /// Move the half-distance ratio by this amount.
    HalfDistanceRatio(f32),
}

/// Collects models and placements, then bakes them into a [`Scene`].
#[derive(Debug, Default)]
pub struct SceneBuilder {
    models: Vec<Arc<Model>>,
    by_name: HashMap<String, ModelId>,
    placements: Vec<(ModelId, Vec3, Quat)>,
    instance_budget: Option<u32>,
    lighting: SceneLighting,
}

impl SceneBuilder {
    /// Register a model and return its id.
    ///
    /// Models are deduplicated by name: registering a name a second time
    /// returns the first registration's id and drops the new copy, so every
    /// placement of that name shares one set of geometry.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EmptyModel`] if the model has neither coarse nor
    /// foliage meshes.
    pub fn add_model(&mut self, mut model: Model) -> Result<ModelId, SceneError> {
        if let Some(&id) = self.by_name.get(model.name()) {
            debug!("model \"{}\" already registered as {:?}", model.name(), id);
            return Ok(id);
        }
        if model.coarse_meshes().is_empty() && model.foliage().is_empty() {
            return Err(SceneError::EmptyModel(model.name().to_string()));
        }

        let id = ModelId(self.models.len() as u32);
        model.id = id;
        self.by_name.insert(model.name().to_string(), id);
        self.models.push(Arc::new(model));
        Ok(id)
    }

    /// Look up a registered model by name.
    pub fn model_id(&self, name: &str) -> Option<ModelId> {
        self.by_name.get(name).copied()
    }

    /// Place a host object of a registered model.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownModel`] if `model` was not registered.
    pub fn place(
        &mut self,
        model: ModelId,
        position: Vec3,
        orientation: Quat,
    ) -> Result<&mut Self, SceneError> {
        if model.0 as usize >= self.models.len() {
            return Err(SceneError::UnknownModel(model));
        }
        self.placements.push((model, position, orientation));
        Ok(self)
    }

    /// Override the target instance budget.
    pub fn instance_budget(&mut self, budget: u32) -> &mut Self {
        self.instance_budget = Some(budget);
        self
    }

    /// Override the scene lighting.
    pub fn lighting(&mut self, lighting: SceneLighting) -> &mut Self {
        self.lighting = lighting;
        self
    }

    /// Bake placements into host objects, grouped by model.
    pub fn build(self) -> Scene {
        let mut placements = self.placements;
        // Stable: placement order is kept within a model.
        placements.sort_by_key(|(model, _, _)| *model);

        let hosts: Vec<HostObject> = placements
            .into_iter()
            .map(|(model, position, orientation)| {
                HostObject::new(self.models[model.0 as usize].clone(), position, orientation)
            })
            .collect();

        info!(
            "Scene built: {} models, {} hosts",
            self.models.len(),
            hosts.len()
        );

        Scene {
            models: self.models,
            hosts,
            instance_budget: self.instance_budget.unwrap_or(DEFAULT_INSTANCE_BUDGET),
            lighting: self.lighting,
        }
    }
}

/// The host objects of a scene plus the settings the frame pipeline reads.
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) models: Vec<Arc<Model>>,
    pub(crate) hosts: Vec<HostObject>,
    pub(crate) instance_budget: u32,
    pub(crate) lighting: SceneLighting,
}

impl Scene {
    /// Start assembling a scene.
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    /// All host objects in draw order.
    pub fn hosts(&self) -> &[HostObject] {
        &self.hosts
    }

    /// Mutable access for driving the stages individually.
    pub fn hosts_mut(&mut self) -> &mut [HostObject] {
        &mut self.hosts
    }

    /// Registered models, indexed by [`ModelId`].
    pub fn models(&self) -> &[Arc<Model>] {
        &self.models
    }

    /// Look up a model.
    pub fn model(&self, id: ModelId) -> Option<&Arc<Model>> {
        self.models.get(id.0 as usize)
    }

    /// The target instance budget steering the depth-complexity correction.
    pub fn instance_budget(&self) -> u32 {
        self.instance_budget
    }

    /// Change the target instance budget.
    pub fn set_instance_budget(&mut self, budget: u32) {
        self.instance_budget = budget;
    }

    /// Scene lighting, for the backend.
    pub fn lighting(&self) -> &SceneLighting {
        &self.lighting
    }

    /// Total instances the scene would draw with every mesh at full density.
    pub fn full_density_instances(&self) -> u64 {
        self.hosts
            .iter()
            .flat_map(|host| host.model().foliage())
            .map(|mesh| u64::from(mesh.total_instances()))
            .sum()
    }

    /// Adjust one foliage mesh's falloff and return the new parameters.
    ///
    /// Every host of the model sees the change: the model is rebuilt once and
    /// swapped into all of them.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownModel`] or [`SceneError::UnknownMesh`]
    /// when the target does not exist.
    pub fn tune_lod(
        &mut self,
        model: ModelId,
        mesh: usize,
        adjustment: LodAdjustment,
    ) -> Result<LodParams, SceneError> {
        let current = self
            .models
            .get(model.0 as usize)
            .ok_or(SceneError::UnknownModel(model))?;

        let mut tuned = Model::clone(current);
        let target = tuned
            .foliage_mut()
            .get_mut(mesh)
            .ok_or(SceneError::UnknownMesh { model, mesh })?;
        target.lod = match adjustment {
            LodAdjustment::BaseDistance(delta) => target.lod.offset_base_distance(delta),
            LodAdjustment::HalfDistanceRatio(delta) => target.lod.offset_half_distance_ratio(delta),
        };
        let lod = target.lod;

        let tuned = Arc::new(tuned);
        for host in self.hosts.iter_mut().filter(|host| host.model_id() == model) {
            host.replace_model(tuned.clone());
        }
        self.models[model.0 as usize] = tuned;

        debug!(
            "Tuned {:?} mesh {}: d0={:.1}, ratio={:.2}",
            model,
            mesh,
            lod.base_distance(),
            lod.half_distance_ratio()
        );
        Ok(lod)
    }
}
