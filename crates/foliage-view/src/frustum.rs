//! View-frustum extraction and oriented-box containment tests.
//!
//! Planes are extracted from the camera's combined view-projection matrix
//! with the Gribb-Hartmann method, adapted to the reverse-Z `[0, 1]` depth
//! range produced by [`Camera`](crate::Camera).

use glam::{Mat4, Vec3, Vec4};

use crate::OrientedBox;

const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Result of testing a volume against the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// The volume is entirely outside the frustum.
    Outside,
    /// The volume straddles one or more frustum planes.
    Intersecting,
    /// The volume is entirely inside the frustum.
    Inside,
}

impl Intersection {
    /// Collapse the tri-state to "at least partially visible".
    pub fn is_visible(self) -> bool {
        self != Intersection::Outside
    }
}

/// A view frustum defined by six inward-pointing planes.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `Vec4(a, b, c, d)` holds the unit inward normal in `xyz` and the
    /// signed distance term in `w`.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a reverse-Z view-projection matrix.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // Reverse-Z maps the near plane to z = w and the far plane to z = 0.
        planes[NEAR] = rows[3] - rows[2];
        planes[FAR] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Access the six planes (left, right, bottom, top, near, far).
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Test whether a point lies inside all six planes.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }

    /// Classify an oriented box against the frustum.
    ///
    /// For each plane the box is reduced to its center and its radius
    /// projected onto the plane normal. A center further than that radius
    /// behind any plane puts the box outside; a center within the radius of
    /// any plane makes it intersecting.
    ///
    /// Like every plane-only test this is conservative near frustum corners:
    /// it can report `Intersecting` for a box that is just outside.
    pub fn classify_obb(&self, obb: &OrientedBox) -> Intersection {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();
            let distance = normal.dot(obb.center) + plane.w;
            let radius = obb.projected_radius(normal);

            if distance < -radius {
                return Intersection::Outside;
            }
            if distance < radius {
                all_inside = false;
            }
        }

        if all_inside {
            Intersection::Inside
        } else {
            Intersection::Intersecting
        }
    }
}
