//! Visibility stage: whole-host culling against the view volume.

use foliage_view::{Frustum, Intersection, OrientedBox};

use crate::HostObject;

/// A containment test over oriented bounding boxes, supplied by the view.
pub trait VolumeTest {
    /// Classify `bounds` as outside, intersecting, or inside the volume.
    fn classify(&self, bounds: &OrientedBox) -> Intersection;
}

impl VolumeTest for Frustum {
    fn classify(&self, bounds: &OrientedBox) -> Intersection {
        self.classify_obb(bounds)
    }
}

/// Set every host's visible flag from its bounds.
///
/// Hosts that intersect or lie inside the volume become visible, all others
/// invisible. Returns the number of hosts tested, which is always
/// `hosts.len()`.
pub fn compute_visibility<V: VolumeTest + ?Sized>(volume: &V, hosts: &mut [HostObject]) -> usize {
    let mut tested = 0;
    for host in hosts.iter_mut() {
        host.visible = volume.classify(host.bounds()).is_visible();
        tested += 1;
    }
    tested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Geometry, LodParams, Material, Model};
    use foliage_view::Camera;
    use glam::{Quat, Vec3};
    use std::sync::Arc;

    /// Accepts boxes whose center has negative x.
    struct HalfSpace;

    impl VolumeTest for HalfSpace {
        fn classify(&self, bounds: &OrientedBox) -> Intersection {
            if bounds.center.x < 0.0 {
                Intersection::Inside
            } else {
                Intersection::Outside
            }
        }
    }

    fn hosts_at(positions: &[Vec3]) -> Vec<HostObject> {
        let leaves = Arc::new(Geometry {
            name: "leaves".to_string(),
            vertex_count: 4,
            index_count: 6,
            material: Material::default(),
            instances: Vec::new(),
        });
        let model = Arc::new(
            Model::new("tree", OrientedBox::axis_aligned(Vec3::ZERO, Vec3::ONE))
                .with_foliage(leaves, LodParams::new(10.0, 0.5).unwrap()),
        );
        positions
            .iter()
            .map(|&p| HostObject::new(model.clone(), p, Quat::IDENTITY))
            .collect()
    }

    #[test]
    fn test_returns_count_tested_not_count_visible() {
        let mut hosts = hosts_at(&[Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)]);
        assert_eq!(compute_visibility(&HalfSpace, &mut hosts), 2);
        assert!(hosts[0].is_visible());
        assert!(!hosts[1].is_visible());
    }

    #[test]
    fn test_empty_scene() {
        let mut hosts = Vec::new();
        assert_eq!(compute_visibility(&HalfSpace, &mut hosts), 0);
    }

    #[test]
    fn test_previous_flags_are_overwritten() {
        let mut hosts = hosts_at(&[Vec3::new(5.0, 0.0, 0.0)]);
        hosts[0].visible = true;
        compute_visibility(&HalfSpace, &mut hosts);
        assert!(!hosts[0].is_visible());
    }

    #[test]
    fn test_frustum_culls_hosts_behind_camera() {
        let camera = Camera::look_to(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let frustum = camera.frustum();
        let mut hosts = hosts_at(&[
            Vec3::new(0.0, 0.0, -50.0),
            Vec3::new(0.0, 0.0, 50.0),
            Vec3::new(0.0, 0.0, -5000.0),
        ]);
        assert_eq!(compute_visibility(&frustum, &mut hosts), 3);
        let flags: Vec<bool> = hosts.iter().map(HostObject::is_visible).collect();
        assert_eq!(flags, vec![true, false, false]);
    }
}
