//! Host objects: placed model instances carrying their own per-frame state.

use std::sync::Arc;

use foliage_view::OrientedBox;
use glam::{Mat4, Quat, Vec3};

use crate::{FoliageMesh, Model, ModelId};

/// A positioned instance of a [`Model`].
///
/// The model (and through it all geometry) is shared with every other host
/// placed from the same model. Visibility, distance, and the per-mesh
/// instance fractions belong to this host alone and are overwritten every
/// frame.
#[derive(Debug, Clone)]
pub struct HostObject {
    model: Arc<Model>,
    position: Vec3,
    orientation: Quat,
    transform: Mat4,
    bounds: OrientedBox,

    // per-frame
    pub(crate) visible: bool,
    pub(crate) distance: f32,
    pub(crate) lambdas: Vec<f32>,
}

impl HostObject {
    /// Place `model` in the world. World bounds and transform are baked here.
    pub fn new(model: Arc<Model>, position: Vec3, orientation: Quat) -> Self {
        let orientation = orientation.normalize();
        let bounds = model.local_bounds().transformed(orientation, position);
        let transform = Mat4::from_rotation_translation(orientation, position);
        let lambdas = vec![0.0; model.foliage().len()];
        Self {
            model,
            position,
            orientation,
            transform,
            bounds,
            visible: false,
            distance: 0.0,
            lambdas,
        }
    }

    /// Id of the model this host instantiates.
    pub fn model_id(&self) -> ModelId {
        self.model.id()
    }

    /// The shared model.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// World position of the model origin.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World orientation.
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Model-to-world transform, passed through to the backend.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// World-space oriented bounds.
    pub fn bounds(&self) -> &OrientedBox {
        &self.bounds
    }

    /// Whether the host survived this frame's culling and LOD.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Eye distance of the last frame, clamped to the far plane.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Instance fraction of each foliage mesh, in model order.
    pub fn lambdas(&self) -> &[f32] {
        &self.lambdas
    }

    /// Foliage meshes paired with this host's current instance fraction.
    pub fn foliage(&self) -> impl Iterator<Item = (&FoliageMesh, f32)> {
        self.model
            .foliage()
            .iter()
            .zip(self.lambdas.iter().copied())
    }

    /// The model's foliage meshes next to this host's writable fractions.
    pub(crate) fn foliage_and_lambdas_mut(&mut self) -> (&[FoliageMesh], &mut [f32]) {
        (self.model.foliage(), &mut self.lambdas)
    }

    /// Swap in a retuned model with the same id and mesh layout.
    pub(crate) fn replace_model(&mut self, model: Arc<Model>) {
        debug_assert_eq!(model.id(), self.model.id());
        debug_assert_eq!(model.foliage().len(), self.lambdas.len());
        self.model = model;
    }
}
