//! Per-frame visibility and level-of-detail selection for instanced foliage.
//!
//! Each frame runs three stages over the scene's host objects, in order:
//!
//! 1. [`compute_visibility`] tests every host's oriented bounding box against
//!    the view volume.
//! 2. [`compute_lods`] assigns every foliage mesh of a visible host an
//!    instance fraction (lambda) from a power-law distance falloff, then
//!    rebalances all fractions with a depth-complexity correction so the
//!    total instance count tracks the scene's budget.
//! 3. [`emit_draw_requests`] turns the fractions into instance counts and
//!    scale parameters for a rendering backend.
//!
//! [`Scene::run_frame`] chains the three.

mod draw;
mod error;
mod frame;
mod host;
mod model;
mod scene;
mod selector;
mod visibility;

pub use draw::{DrawRequest, HostDraw, MeshUniform, emit_draw_requests};
pub use error::SceneError;
pub use frame::{FrameOutput, FrameStats};
pub use host::HostObject;
pub use model::{
    FoliageMesh, Geometry, GeometryHandle, InstanceTransform, LodParams, Material, Model, ModelId,
};
pub use scene::{LightingUniform, LodAdjustment, Scene, SceneBuilder, SceneLighting};
pub use selector::{
    CORRECTION_STRENGTH, CUTOFF_FRACTION, CULL_EPSILON, DEFAULT_INSTANCE_BUDGET, ViewParams,
    compute_lods,
};
pub use visibility::{VolumeTest, compute_visibility};
