//! Oriented bounding boxes for host objects.

use glam::{Quat, Vec3};

/// A box with arbitrary orientation, described by its center, half-size along
/// each local axis, and a rotation from local to world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedBox {
    /// Center of the box.
    pub center: Vec3,
    /// Half-size along each local axis (always non-negative).
    pub half_extents: Vec3,
    /// Rotation of the local axes.
    pub orientation: Quat,
}

impl OrientedBox {
    /// Create a new oriented box.
    pub fn new(center: Vec3, half_extents: Vec3, orientation: Quat) -> Self {
        Self {
            center,
            half_extents,
            orientation,
        }
    }

    /// An axis-aligned box with the given center and half extents.
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, half_extents, Quat::IDENTITY)
    }

    /// The three unit axes of the box in world space: local X, Y, Z.
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.orientation * Vec3::X,
            self.orientation * Vec3::Y,
            self.orientation * Vec3::Z,
        ]
    }

    /// Place a box defined in model space into the world.
    ///
    /// The center is rotated about the model origin and then translated, and
    /// the orientation is composed with `rotation`.
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Self {
        Self {
            center: rotation * self.center + translation,
            half_extents: self.half_extents,
            orientation: (rotation * self.orientation).normalize(),
        }
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let [ax, ay, az] = self.axes();
        let ex = ax * self.half_extents.x;
        let ey = ay * self.half_extents.y;
        let ez = az * self.half_extents.z;
        let c = self.center;
        [
            c - ex - ey - ez,
            c + ex - ey - ez,
            c - ex + ey - ez,
            c + ex + ey - ez,
            c - ex - ey + ez,
            c + ex - ey + ez,
            c - ex + ey + ez,
            c + ex + ey + ez,
        ]
    }

    /// Radius of the box projected onto a unit direction.
    pub fn projected_radius(&self, direction: Vec3) -> f32 {
        let [ax, ay, az] = self.axes();
        self.half_extents.x * direction.dot(ax).abs()
            + self.half_extents.y * direction.dot(ay).abs()
            + self.half_extents.z * direction.dot(az).abs()
    }
}
