//! Draw request emission: final instance fractions become backend-ready counts.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::{CUTOFF_FRACTION, GeometryHandle, HostObject, Material, ModelId};

/// One instanced draw of a foliage mesh.
#[derive(Debug, Clone)]
pub struct DrawRequest {
    /// Index of the mesh within its model's foliage list.
    pub mesh_index: usize,
    /// Shared geometry to draw.
    pub geometry: GeometryHandle,
    /// Number of leading instances to draw.
    pub instance_count: u32,
    /// Reciprocal of the instance fraction. The backend scales the drawn
    /// instances by it so the thinned foliage keeps its overall coverage.
    pub scale: f32,
    /// Instance index where the dissolve band toward the cut begins.
    pub cutoff_index: u32,
}

impl DrawRequest {
    /// Build a request for `lambda` of the geometry's instances.
    ///
    /// Returns `None` when `lambda` is zero, i.e. the mesh is culled.
    pub fn from_lambda(mesh_index: usize, geometry: &GeometryHandle, lambda: f32) -> Option<Self> {
        if lambda <= 0.0 {
            return None;
        }
        let total = geometry.instance_count() as f32;
        Some(Self {
            mesh_index,
            geometry: geometry.clone(),
            instance_count: (lambda * total).floor() as u32,
            scale: 1.0 / lambda,
            cutoff_index: (CUTOFF_FRACTION * lambda * total).floor() as u32,
        })
    }

    /// The per-mesh constant block for this draw.
    pub fn uniform(&self) -> MeshUniform {
        MeshUniform::new(&self.geometry.material, self)
    }
}

/// Per-mesh constants uploaded by the backend before each instanced draw.
///
/// Layout (32 bytes): material `[Ka, Kd, Ks, Ns]`, scale, cutoff index,
/// instance count, padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshUniform {
    /// Phong coefficients.
    pub material: [f32; 4],
    /// Instance scale (`1 / lambda`).
    pub scale: f32,
    /// Start of the dissolve band.
    pub cutoff_index: u32,
    /// Instances drawn.
    pub instance_count: u32,
    /// Reserved, keeps the block 16-byte aligned.
    pub _pad: u32,
}

static_assertions::assert_eq_size!(MeshUniform, [u8; 32]);

impl MeshUniform {
    fn new(material: &Material, request: &DrawRequest) -> Self {
        Self {
            material: [material.ka, material.kd, material.ks, material.ns],
            scale: request.scale,
            cutoff_index: request.cutoff_index,
            instance_count: request.instance_count,
            _pad: 0,
        }
    }
}

/// Everything the backend needs to draw one visible host.
#[derive(Debug, Clone)]
pub struct HostDraw {
    /// Index of the host within the scene.
    pub host_index: usize,
    /// Model the host instantiates.
    pub model_id: ModelId,
    /// Model-to-world transform, passed through untouched.
    pub transform: Mat4,
    /// Non-instanced geometry, drawn whole.
    pub coarse: Vec<GeometryHandle>,
    /// Instanced foliage draws; culled meshes are absent.
    pub requests: Vec<DrawRequest>,
}

impl HostDraw {
    /// Sum of instances over all foliage requests.
    pub fn instance_total(&self) -> u64 {
        self.requests
            .iter()
            .map(|request| u64::from(request.instance_count))
            .sum()
    }
}

/// Emit draws for every visible host, in scene order.
pub fn emit_draw_requests(hosts: &[HostObject]) -> Vec<HostDraw> {
    hosts
        .iter()
        .enumerate()
        .filter(|(_, host)| host.is_visible())
        .map(|(host_index, host)| HostDraw {
            host_index,
            model_id: host.model_id(),
            transform: host.transform(),
            coarse: host.model().coarse_meshes().to_vec(),
            requests: host
                .foliage()
                .enumerate()
                .filter_map(|(mesh_index, (mesh, lambda))| {
                    DrawRequest::from_lambda(mesh_index, &mesh.geometry, lambda)
                })
                .collect(),
        })
        .collect()
}
