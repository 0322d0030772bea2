//! Shared, immutable model data: geometry handles, foliage LOD parameters, and
//! the model templates that host objects instantiate.

use std::sync::Arc;

use foliage_view::OrientedBox;
use glam::{Mat3, Quat, Vec3};

use crate::SceneError;

/// Identifies a model template. Host objects placed from the same model share
/// its id and its geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(pub u32);

/// Per-instance placement of one foliage element within its model.
///
/// Layout (48 bytes): translation followed by a column-major 3x3 rotation.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceTransform {
    /// Offset from the model origin.
    pub translation: [f32; 3],
    /// Rotation columns.
    pub rotation: [[f32; 3]; 3],
}

static_assertions::assert_eq_size!(InstanceTransform, [u8; 48]);

impl InstanceTransform {
    /// Build an instance transform from a translation and rotation.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation: translation.to_array(),
            rotation: Mat3::from_quat(rotation).to_cols_array_2d(),
        }
    }
}

/// Phong material coefficients and a texture slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Ambient coefficient.
    pub ka: f32,
    /// Diffuse coefficient.
    pub kd: f32,
    /// Specular coefficient.
    pub ks: f32,
    /// Specular exponent.
    pub ns: f32,
    /// Index into the model's texture table.
    pub texture_id: u32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ka: 0.2,
            kd: 0.8,
            ks: 0.0,
            ns: 1.0,
            texture_id: 0,
        }
    }
}

/// Mesh data as the rendering backend sees it. The LOD core only reads the
/// instance count; buffers live on the backend side.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Mesh name, for diagnostics.
    pub name: String,
    /// Number of vertices in the backend's vertex buffer.
    pub vertex_count: u32,
    /// Number of indices in the backend's index buffer.
    pub index_count: u32,
    /// Surface material.
    pub material: Material,
    /// Instance placements. Empty for non-instanced (coarse) geometry.
    ///
    /// For foliage the list is expected in an order where every prefix is an
    /// unbiased subsample of the whole, since LOD draws only the first K.
    pub instances: Vec<InstanceTransform>,
}

impl Geometry {
    /// Total number of instances this geometry carries.
    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }
}

/// Reference-counted, read-only geometry shared by every host that
/// instantiates the same model.
pub type GeometryHandle = Arc<Geometry>;

/// Distance falloff parameters of one foliage mesh.
///
/// Below `base_distance` the mesh is drawn at full density. Beyond it the
/// density follows `(base_distance / distance)^falloff_exponent`, where the
/// exponent is chosen so density is exactly one half at
/// `base_distance / half_distance_ratio`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodParams {
    base_distance: f32,
    half_distance_ratio: f32,
    falloff_exponent: f32,
}

/// Smallest base distance tuning can reach.
const MIN_BASE_DISTANCE: f32 = 1e-3;

/// Largest half-distance ratio tuning can reach.
const MAX_TUNED_RATIO: f32 = 0.5;

impl LodParams {
    /// Validate and pre-transform LOD parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidBaseDistance`] unless `base_distance > 0`,
    /// and [`SceneError::InvalidHalfDistanceRatio`] unless
    /// `0 < half_distance_ratio < 1`.
    pub fn new(base_distance: f32, half_distance_ratio: f32) -> Result<Self, SceneError> {
        if !(base_distance.is_finite() && base_distance > 0.0) {
            return Err(SceneError::InvalidBaseDistance(base_distance));
        }
        if !(half_distance_ratio > 0.0 && half_distance_ratio < 1.0) {
            return Err(SceneError::InvalidHalfDistanceRatio(half_distance_ratio));
        }
        Ok(Self::from_validated(base_distance, half_distance_ratio))
    }

    fn from_validated(base_distance: f32, half_distance_ratio: f32) -> Self {
        Self {
            base_distance,
            half_distance_ratio,
            // log_r(1/2) = log2(1/2) / log2(r)
            falloff_exponent: -1.0 / half_distance_ratio.log2(),
        }
    }

    /// Distance below which full density is used (`d0`).
    pub fn base_distance(&self) -> f32 {
        self.base_distance
    }

    /// The ratio `d0 / d_half` this mesh was configured with.
    pub fn half_distance_ratio(&self) -> f32 {
        self.half_distance_ratio
    }

    /// The pre-transformed falloff exponent (`h`).
    pub fn falloff_exponent(&self) -> f32 {
        self.falloff_exponent
    }

    /// Instance fraction from distance alone, before any scene-level correction.
    pub fn base_lambda(&self, distance: f32) -> f32 {
        if distance <= self.base_distance {
            1.0
        } else {
            (self.base_distance / distance).powf(self.falloff_exponent)
        }
    }

    /// Shift the base distance, keeping it positive.
    pub fn offset_base_distance(self, delta: f32) -> Self {
        let base_distance = (self.base_distance + delta).max(MIN_BASE_DISTANCE);
        Self::from_validated(base_distance, self.half_distance_ratio)
    }

    /// Shift the half-distance ratio, clamping it to `(0, 0.5]`.
    pub fn offset_half_distance_ratio(self, delta: f32) -> Self {
        let ratio = (self.half_distance_ratio + delta).clamp(f32::EPSILON, MAX_TUNED_RATIO);
        Self::from_validated(self.base_distance, ratio)
    }
}

/// One instanced foliage mesh of a model: shared geometry plus its falloff.
#[derive(Debug, Clone)]
pub struct FoliageMesh {
    /// Shared geometry including the instance list.
    pub geometry: GeometryHandle,
    /// Distance falloff parameters.
    pub lod: LodParams,
}

impl FoliageMesh {
    /// Pair geometry with LOD parameters.
    pub fn new(geometry: GeometryHandle, lod: LodParams) -> Self {
        Self { geometry, lod }
    }

    /// Number of instances drawn at full density.
    pub fn total_instances(&self) -> u32 {
        self.geometry.instance_count()
    }
}

/// A model template: everything host objects placed from it have in common.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) id: ModelId,
    name: String,
    local_bounds: OrientedBox,
    coarse: Vec<GeometryHandle>,
    foliage: Vec<FoliageMesh>,
}

impl Model {
    /// Start a model with its bounds in model space.
    pub fn new(name: impl Into<String>, local_bounds: OrientedBox) -> Self {
        Self {
            id: ModelId(0),
            name: name.into(),
            local_bounds,
            coarse: Vec::new(),
            foliage: Vec::new(),
        }
    }

    /// Add non-instanced geometry (trunk, branches).
    pub fn with_coarse_mesh(mut self, geometry: GeometryHandle) -> Self {
        self.coarse.push(geometry);
        self
    }

    /// Add an instanced foliage mesh.
    pub fn with_foliage(mut self, geometry: GeometryHandle, lod: LodParams) -> Self {
        self.foliage.push(FoliageMesh::new(geometry, lod));
        self
    }

    /// The id assigned when the model was registered with a scene.
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The model name used for deduplication.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounds in model space.
    pub fn local_bounds(&self) -> &OrientedBox {
        &self.local_bounds
    }

    /// Non-instanced geometry.
    pub fn coarse_meshes(&self) -> &[GeometryHandle] {
        &self.coarse
    }

    /// Instanced foliage meshes.
    pub fn foliage(&self) -> &[FoliageMesh] {
        &self.foliage
    }

    pub(crate) fn foliage_mut(&mut self) -> &mut [FoliageMesh] {
        &mut self.foliage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_ratio_of_one_half_gives_unit_exponent() {
        let lod = LodParams::new(10.0, 0.5).unwrap();
        assert!((lod.falloff_exponent() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_density_halves_at_half_distance() {
        for ratio in [0.1, 0.25, 0.5, 0.8] {
            let lod = LodParams::new(20.0, ratio).unwrap();
            let lambda = lod.base_lambda(20.0 / ratio);
            assert!(
                (lambda - 0.5).abs() < 1e-4,
                "ratio {ratio}: expected 0.5, got {lambda}"
            );
        }
    }

    #[test]
    fn test_full_density_within_base_distance() {
        let lod = LodParams::new(50.0, 0.3).unwrap();
        assert_eq!(lod.base_lambda(0.0), 1.0);
        assert_eq!(lod.base_lambda(25.0), 1.0);
        assert_eq!(lod.base_lambda(50.0), 1.0);
        assert!(lod.base_lambda(50.5) < 1.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(matches!(
            LodParams::new(0.0, 0.5),
            Err(SceneError::InvalidBaseDistance(_))
        ));
        assert!(matches!(
            LodParams::new(-3.0, 0.5),
            Err(SceneError::InvalidBaseDistance(_))
        ));
        assert!(matches!(
            LodParams::new(10.0, 1.0),
            Err(SceneError::InvalidHalfDistanceRatio(_))
        ));
        assert!(matches!(
            LodParams::new(10.0, 0.0),
            Err(SceneError::InvalidHalfDistanceRatio(_))
        ));
        assert!(matches!(
            LodParams::new(10.0, f32::NAN),
            Err(SceneError::InvalidHalfDistanceRatio(_))
        ));
    }

    #[test]
    fn test_offset_base_distance_stays_positive() {
        let lod = LodParams::new(100.0, 0.5).unwrap();
        assert_eq!(lod.offset_base_distance(100.0).base_distance(), 200.0);
        assert!(lod.offset_base_distance(-500.0).base_distance() > 0.0);
    }

    #[test]
    fn test_offset_half_ratio_clamps_and_recomputes_exponent() {
        let lod = LodParams::new(100.0, 0.45).unwrap();
        let raised = lod.offset_half_distance_ratio(0.2);
        assert_eq!(raised.half_distance_ratio(), 0.5);
        assert!((raised.falloff_exponent() - 1.0).abs() < 1e-6);

        let lowered = lod.offset_half_distance_ratio(-1.0);
        assert!(lowered.half_distance_ratio() > 0.0);
        assert!(lowered.falloff_exponent() > 0.0);
    }

    #[test]
    fn test_instance_transform_layout() {
        let t = InstanceTransform::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let bytes: &[u8] = bytemuck::bytes_of(&t);
        assert_eq!(bytes.len(), 48);
        assert_eq!(t.translation, [1.0, 2.0, 3.0]);
        assert_eq!(t.rotation[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_model_builder_collects_meshes() {
        let leaves = Arc::new(Geometry {
            name: "leaves".to_string(),
            vertex_count: 4,
            index_count: 6,
            material: Material::default(),
            instances: vec![InstanceTransform::new(Vec3::ZERO, Quat::IDENTITY); 10],
        });
        let trunk = Arc::new(Geometry {
            name: "trunk".to_string(),
            vertex_count: 24,
            index_count: 36,
            material: Material::default(),
            instances: Vec::new(),
        });
        let model = Model::new("oak", OrientedBox::axis_aligned(Vec3::ZERO, Vec3::ONE))
            .with_coarse_mesh(trunk)
            .with_foliage(leaves, LodParams::new(10.0, 0.5).unwrap());
        assert_eq!(model.name(), "oak");
        assert_eq!(model.coarse_meshes().len(), 1);
        assert_eq!(model.foliage().len(), 1);
        assert_eq!(model.foliage()[0].total_instances(), 10);
    }
}
