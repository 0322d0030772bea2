//! LOD stage: per-mesh instance fractions from distance, rebalanced by scene depth complexity.
//!
//! The stage runs two passes over the visible hosts. The first assigns each
//! foliage mesh a fraction from its own power-law falloff and gathers the
//! nearest and farthest host distance. The second scales fractions down
//! toward the back of the visible depth range, harder when the range is deep
//! and when few meshes compete for the instance budget. Fractions that end
//! up negligible are culled together with their host.

use foliage_view::Camera;
use glam::Vec3;
use tracing::{debug, trace};

use crate::HostObject;

/// Fractions below this are dropped to zero and hide their host.
pub const CULL_EPSILON: f32 = 0.005;

/// Largest share the depth-complexity correction can remove, reached at the
/// back of a depth range that spans the whole view distance.
pub const CORRECTION_STRENGTH: f32 = 0.5;

/// Position of the dissolve band within a mesh's drawn instances.
pub const CUTOFF_FRACTION: f32 = 0.95;

/// Default target for the scene's instance budget.
pub const DEFAULT_INSTANCE_BUDGET: u32 = 50;

/// Eye state supplied to the LOD stage once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewParams {
    /// World-space eye position.
    pub eye_position: Vec3,
    /// Viewing direction. Accepted for interface stability; the falloff does
    /// not depend on it.
    pub eye_direction: Vec3,
    /// Far clip distance. Host distances are clamped to it.
    pub far: f32,
}

impl ViewParams {
    /// Take eye position, direction, and far plane from a camera.
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            eye_position: camera.position,
            eye_direction: camera.forward(),
            far: camera.far,
        }
    }
}

/// Aggregates gathered by the first pass and consumed by the second.
#[derive(Clone, Copy, Debug, PartialEq)]
struct DepthStats {
    nearest: f32,
    farthest: f32,
    mesh_count: usize,
}

impl DepthStats {
    fn range(&self) -> f32 {
        self.farthest - self.nearest
    }
}

/// Compute the final instance fraction of every foliage mesh on a visible host.
///
/// Only hosts flagged visible by the visibility stage are processed; others
/// have their fractions zeroed. A host whose foliage collapses below
/// [`CULL_EPSILON`] is flagged invisible. Returns the number of foliage
/// meshes still drawn with non-zero density.
///
/// # Panics
///
/// Panics if the far distance is not positive or an eye-to-host distance is
/// NaN, which means the eye position was malformed.
pub fn compute_lods(view: &ViewParams, instance_budget: u32, hosts: &mut [HostObject]) -> usize {
    assert!(
        view.far > 0.0,
        "far plane distance must be positive, got {}",
        view.far
    );

    let stats = assign_base_lambdas(view, hosts);
    if stats.mesh_count == 0 {
        return 0;
    }

    apply_depth_complexity(&stats, view.far, instance_budget, hosts);
    let culled = cull_collapsed(hosts);

    let active = stats.mesh_count - culled;
    debug!(
        active,
        culled,
        nearest = stats.nearest,
        farthest = stats.farthest,
        "LOD selection complete"
    );
    active
}

/// First pass: clamped distance per visible host, distance-only fraction per mesh.
fn assign_base_lambdas(view: &ViewParams, hosts: &mut [HostObject]) -> DepthStats {
    let mut stats = DepthStats {
        nearest: view.far,
        farthest: 0.0,
        mesh_count: 0,
    };

    for host in hosts.iter_mut() {
        if !host.visible {
            host.lambdas.fill(0.0);
            continue;
        }

        let distance = host.position().distance(view.eye_position);
        assert!(
            distance >= 0.0,
            "eye-to-host distance must be a non-negative number, got {distance}"
        );
        let distance = distance.min(view.far);
        host.distance = distance;

        stats.nearest = stats.nearest.min(distance);
        stats.farthest = stats.farthest.max(distance);

        let (foliage, lambdas) = host.foliage_and_lambdas_mut();
        for (lambda, mesh) in lambdas.iter_mut().zip(foliage) {
            *lambda = mesh.lod.base_lambda(distance);
            stats.mesh_count += 1;
        }
    }

    stats
}

/// Second pass: scale every visible host's fractions by its depth-complexity factor.
fn apply_depth_complexity(
    stats: &DepthStats,
    far: f32,
    instance_budget: u32,
    hosts: &mut [HostObject],
) {
    let range = stats.range();
    if range <= 0.0 {
        trace!("all visible hosts equidistant, skipping depth-complexity correction");
        return;
    }

    let sharpness = instance_budget as f32 / stats.mesh_count as f32;
    let weight = range / far;

    for host in hosts.iter_mut().filter(|host| host.visible) {
        let depth = (host.distance - stats.nearest) / range;
        let factor = depth_complexity_factor(depth, weight, sharpness);
        for lambda in &mut host.lambdas {
            *lambda *= factor;
        }
    }
}

/// Multiplier applied to a host's fractions.
///
/// `depth` is the host's position in the visible depth range (0 nearest,
/// 1 farthest), `weight` the depth range as a share of the far distance, and
/// `sharpness` the budget per competing mesh. The result lies in
/// `[1 - CORRECTION_STRENGTH * weight, 1]`.
pub(crate) fn depth_complexity_factor(depth: f32, weight: f32, sharpness: f32) -> f32 {
    1.0 - CORRECTION_STRENGTH * weight * depth.powf(sharpness)
}

/// Zero negligible fractions and hide their hosts. Returns the meshes culled.
///
/// Hosts have no coarse LOD of their own, so a host with any collapsed mesh
/// is hidden whole rather than drawn bare.
fn cull_collapsed(hosts: &mut [HostObject]) -> usize {
    let mut culled = 0;
    for host in hosts.iter_mut().filter(|host| host.visible) {
        let mut collapsed = false;
        for lambda in &mut host.lambdas {
            if *lambda < CULL_EPSILON {
                *lambda = 0.0;
                collapsed = true;
                culled += 1;
            }
        }
        if collapsed {
            host.visible = false;
            trace!(
                model = host.model().name(),
                distance = host.distance,
                "foliage collapsed, hiding host"
            );
        }
    }
    culled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Geometry, LodParams, Material, Model};
    use foliage_view::OrientedBox;
    use glam::Quat;
    use std::sync::Arc;

    const FAR: f32 = 1000.0;

    fn view() -> ViewParams {
        ViewParams {
            eye_position: Vec3::ZERO,
            eye_direction: Vec3::NEG_Z,
            far: FAR,
        }
    }

    fn model_with(lods: &[LodParams]) -> Arc<Model> {
        let leaves = Arc::new(Geometry {
            name: "leaves".to_string(),
            vertex_count: 4,
            index_count: 6,
            material: Material::default(),
            instances: Vec::new(),
        });
        let model = lods.iter().fold(
            Model::new("tree", OrientedBox::axis_aligned(Vec3::ZERO, Vec3::ONE)),
            |model, &lod| model.with_foliage(leaves.clone(), lod),
        );
        Arc::new(model)
    }

    /// Hosts along -Z at the given distances, all flagged visible.
    fn visible_hosts(model: &Arc<Model>, distances: &[f32]) -> Vec<HostObject> {
        distances
            .iter()
            .map(|&d| {
                let position = Vec3::new(0.0, 0.0, -d);
                let mut host = HostObject::new(model.clone(), position, Quat::IDENTITY);
                host.visible = true;
                host
            })
            .collect()
    }

    fn lod(d0: f32, ratio: f32) -> LodParams {
        LodParams::new(d0, ratio).unwrap()
    }

    #[test]
    fn test_lambda_stays_in_unit_interval() {
        let model = model_with(&[lod(5.0, 0.5), lod(40.0, 0.2), lod(150.0, 0.7)]);
        for budget in [0, 1, 10, 50, 1000] {
            let distances = [0.0, 3.0, 20.0, 90.0, 300.0, 640.0, 999.0, 5000.0];
            let mut hosts = visible_hosts(&model, &distances);
            compute_lods(&view(), budget, &mut hosts);
            for host in &hosts {
                for &lambda in host.lambdas() {
                    assert!(
                        (0.0..=1.0).contains(&lambda),
                        "budget {budget}: lambda {lambda} out of range at d={}",
                        host.distance()
                    );
                }
            }
        }
    }

    #[test]
    fn test_full_density_within_base_distance() {
        let model = model_with(&[lod(100.0, 0.5), lod(0.001, 0.5)]);
        let mut hosts = visible_hosts(&model, &[100.0]);
        compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
        assert_eq!(hosts[0].lambdas()[0], 1.0);
        assert!(hosts[0].lambdas()[1] < 1.0);
    }

    #[test]
    fn test_lambda_non_increasing_with_distance() {
        let model = model_with(&[lod(10.0, 0.35)]);
        let mut previous = 1.0;
        for d in [0.0, 5.0, 10.0, 12.0, 20.0, 50.0, 100.0, 400.0, 999.0] {
            // One host per run: the correction is a no-op and only the falloff is measured.
            let mut hosts = visible_hosts(&model, &[d]);
            compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
            let lambda = hosts[0].lambdas()[0];
            assert!(
                lambda <= previous,
                "lambda rose from {previous} to {lambda} at d={d}"
            );
            previous = lambda;
        }
    }

    #[test]
    fn test_equidistant_hosts_skip_correction() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let mut hosts = visible_hosts(&model, &[200.0]);
        hosts.push({
            let position = Vec3::new(200.0, 0.0, 0.0);
            let mut host = HostObject::new(model.clone(), position, Quat::IDENTITY);
            host.visible = true;
            host
        });
        let active = compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
        let expected = lod(10.0, 0.5).base_lambda(200.0);
        assert_eq!(active, 2);
        for host in &hosts {
            assert_eq!(host.lambdas()[0], expected);
        }
    }

    #[test]
    fn test_correction_factor_is_identity_at_front() {
        assert_eq!(depth_complexity_factor(0.0, 1.0, 4.0), 1.0);
        assert_eq!(depth_complexity_factor(1.0, 1.0, 4.0), 1.0 - CORRECTION_STRENGTH);
        assert_eq!(depth_complexity_factor(0.7, 0.0, 4.0), 1.0);
    }

    #[test]
    fn test_farther_host_reduced_by_correction() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let mut hosts = visible_hosts(&model, &[0.5 * FAR, FAR]);
        let active = compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);

        let uncorrected_far = lod(10.0, 0.5).base_lambda(FAR);
        let uncorrected_near = lod(10.0, 0.5).base_lambda(0.5 * FAR);
        assert_eq!(active, 2);
        assert_eq!(hosts[0].lambdas()[0], uncorrected_near);
        assert!(hosts[1].lambdas()[0] < uncorrected_far);
        // depth 1, weight 0.5: factor 1 - 0.5 * 0.5 = 0.75
        assert!((hosts[1].lambdas()[0] - 0.75 * uncorrected_far).abs() < 1e-7);
    }

    #[test]
    fn test_collapsed_mesh_hides_whole_host() {
        // Second mesh falls off steeply and collapses; the first stays healthy.
        let model = model_with(&[lod(100.0, 0.5), lod(20.0, 0.8)]);
        let mut hosts = visible_hosts(&model, &[10.0, 600.0]);
        let active = compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);

        assert!(hosts[0].is_visible());
        assert!(!hosts[1].is_visible());
        assert_eq!(hosts[1].lambdas()[1], 0.0);
        assert!(hosts[1].lambdas()[0] > 0.0);
        // Four meshes considered, one culled.
        assert_eq!(active, 3);
    }

    #[test]
    fn test_cull_threshold_boundary() {
        // h = 1, so lambda = d0 / d with no correction for a single host.
        let model = model_with(&[lod(1.0, 0.5)]);

        let mut kept = visible_hosts(&model, &[199.0]);
        assert_eq!(compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut kept), 1);
        assert!(kept[0].is_visible());

        let mut at_threshold = visible_hosts(&model, &[200.0]);
        assert_eq!(compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut at_threshold), 1);
        assert_eq!(at_threshold[0].lambdas()[0], CULL_EPSILON);
        assert!(at_threshold[0].is_visible());

        let mut dropped = visible_hosts(&model, &[201.0]);
        assert_eq!(compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut dropped), 0);
        assert_eq!(dropped[0].lambdas()[0], 0.0);
        assert!(!dropped[0].is_visible());
    }

    #[test]
    fn test_invisible_hosts_do_not_count() {
        let model = model_with(&[lod(10.0, 0.5), lod(10.0, 0.5)]);
        let mut hosts = visible_hosts(&model, &[50.0, 80.0]);
        hosts[1].visible = false;
        hosts[1].lambdas = vec![0.9, 0.9];
        let active = compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
        assert_eq!(active, 2);
        assert_eq!(hosts[1].lambdas(), &[0.0, 0.0]);
    }

    #[test]
    fn test_no_visible_meshes_short_circuits() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let mut hosts = visible_hosts(&model, &[50.0, 500.0]);
        for host in &mut hosts {
            host.visible = false;
        }
        assert_eq!(compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts), 0);

        let bare = model_with(&[]);
        let mut hosts = visible_hosts(&bare, &[50.0, 500.0]);
        assert_eq!(compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts), 0);
        assert!(hosts.iter().all(HostObject::is_visible));
    }

    #[test]
    fn test_distance_clamped_to_far_plane() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let mut hosts = visible_hosts(&model, &[5000.0]);
        compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
        assert_eq!(hosts[0].distance(), FAR);
        assert_eq!(hosts[0].lambdas()[0], lod(10.0, 0.5).base_lambda(FAR));
    }

    #[test]
    fn test_repeated_frames_are_identical() {
        let model = model_with(&[lod(10.0, 0.5), lod(30.0, 0.25)]);
        let mut hosts = visible_hosts(&model, &[15.0, 60.0, 250.0, 700.0]);

        let first_count = compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
        let first: Vec<Vec<f32>> = hosts.iter().map(|h| h.lambdas().to_vec()).collect();

        for host in &mut hosts {
            host.visible = true;
        }
        let second_count = compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut hosts);
        let second: Vec<Vec<f32>> = hosts.iter().map(|h| h.lambdas().to_vec()).collect();

        assert_eq!(first_count, second_count);
        assert_eq!(first, second);
    }

    #[test]
    fn test_eye_direction_does_not_affect_result() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let mut a = visible_hosts(&model, &[40.0, 400.0]);
        let mut b = visible_hosts(&model, &[40.0, 400.0]);
        compute_lods(&view(), DEFAULT_INSTANCE_BUDGET, &mut a);
        let turned = ViewParams {
            eye_direction: Vec3::X,
            ..view()
        };
        compute_lods(&turned, DEFAULT_INSTANCE_BUDGET, &mut b);
        assert_eq!(a[1].lambdas(), b[1].lambdas());
    }

    #[test]
    fn test_larger_budget_softens_correction() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let distances = [20.0, 300.0, 600.0];

        let mut tight = visible_hosts(&model, &distances);
        compute_lods(&view(), 1, &mut tight);
        let mut loose = visible_hosts(&model, &distances);
        compute_lods(&view(), 300, &mut loose);

        // The middle host sits at depth ~0.5: a sharper exponent spares it.
        assert!(loose[1].lambdas()[0] > tight[1].lambdas()[0]);
    }

    #[test]
    #[should_panic(expected = "non-negative number")]
    fn test_nan_eye_position_panics() {
        let model = model_with(&[lod(10.0, 0.5)]);
        let mut hosts = visible_hosts(&model, &[40.0]);
        let broken = ViewParams {
            eye_position: Vec3::new(f32::NAN, 0.0, 0.0),
            ..view()
        };
        compute_lods(&broken, DEFAULT_INSTANCE_BUDGET, &mut hosts);
    }
}
