//! The per-frame pipeline: visibility, LOD selection, draw emission.

use tracing::trace;

use crate::{
    HostDraw, Scene, ViewParams, VolumeTest, compute_lods, compute_visibility, emit_draw_requests,
};

/// Counters describing one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Hosts tested against the view volume.
    pub objects_tested: usize,
    /// Hosts drawn after culling and LOD.
    pub hosts_visible: usize,
    /// Foliage meshes drawn with non-zero density.
    pub meshes_active: usize,
    /// Foliage instances submitted across all draws.
    pub instances_submitted: u64,
}

/// Result of [`Scene::run_frame`].
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// One entry per visible host, in scene order.
    pub draws: Vec<HostDraw>,
    /// Frame counters.
    pub stats: FrameStats,
}

impl Scene {
    /// Run the three stages for one frame and collect the draws.
    ///
    /// Every host's visibility, distance, and instance fractions are
    /// overwritten; nothing carries over from the previous frame.
    pub fn run_frame<V: VolumeTest + ?Sized>(&mut self, volume: &V, view: &ViewParams) -> FrameOutput {
        let objects_tested = compute_visibility(volume, &mut self.hosts);
        let meshes_active = compute_lods(view, self.instance_budget, &mut self.hosts);
        let draws = emit_draw_requests(&self.hosts);

        let stats = FrameStats {
            objects_tested,
            hosts_visible: draws.len(),
            meshes_active,
            instances_submitted: draws.iter().map(HostDraw::instance_total).sum(),
        };
        trace!(
            tested = stats.objects_tested,
            visible = stats.hosts_visible,
            meshes = stats.meshes_active,
            instances = stats.instances_submitted,
            "frame complete"
        );

        FrameOutput { draws, stats }
    }
}
