//! Perspective camera producing view, projection, and frustum data.

use glam::{Mat4, Quat, Vec3};

use crate::Frustum;

/// A perspective camera looking down its local -Z axis.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Create a camera at `position` looking along `direction` with the given up vector.
    pub fn look_to(position: Vec3, direction: Vec3, up: Vec3) -> Self {
        let view = Mat4::look_to_rh(position, direction, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position,
            rotation: rotation.normalize(),
            ..Self::default()
        }
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.up())
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        // Swapping near and far maps the near plane to z=1 and the far plane to z=0.
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The world-space view frustum of this camera.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turn about the camera's own up axis. Positive angles turn right.
    pub fn yaw(&mut self, angle: f32) {
        self.rotation = (Quat::from_axis_angle(self.up(), -angle) * self.rotation).normalize();
    }

    /// Tilt about the camera's right axis. Positive angles look up.
    pub fn pitch(&mut self, angle: f32) {
        self.rotation = (Quat::from_axis_angle(self.right(), angle) * self.rotation).normalize();
    }

    /// Roll about the viewing direction.
    pub fn roll(&mut self, angle: f32) {
        self.rotation = (Quat::from_axis_angle(self.forward(), angle) * self.rotation).normalize();
    }

    /// Update the aspect ratio.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 0.0),
            rotation: Quat::IDENTITY,
            fov_y: 0.4 * std::f32::consts::PI,
            aspect_ratio: 16.0 / 9.0,
            near: 1.0,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_default_camera_looks_down_neg_z() {
        let camera = Camera::default();
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert!(approx(camera.up(), Vec3::Y));
        assert!(approx(camera.right(), Vec3::X));
    }

    #[test]
    fn test_look_to_recovers_direction() {
        let camera = Camera::look_to(Vec3::new(5.0, 2.0, 0.0), Vec3::X, Vec3::Y);
        assert!(approx(camera.forward(), Vec3::X));
        assert!(approx(camera.up(), Vec3::Y));
        assert_eq!(camera.position, Vec3::new(5.0, 2.0, 0.0));
    }

    #[test]
    fn test_yaw_turns_right() {
        let mut camera = Camera::default();
        camera.yaw(FRAC_PI_2);
        assert!(approx(camera.forward(), Vec3::X));
    }

    #[test]
    fn test_pitch_looks_up() {
        let mut camera = Camera::default();
        camera.pitch(FRAC_PI_2);
        assert!(approx(camera.forward(), Vec3::Y));
    }

    #[test]
    fn test_roll_keeps_forward() {
        let mut camera = Camera::default();
        camera.roll(0.3);
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert!(!approx(camera.up(), Vec3::Y));
    }

    #[test]
    fn test_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_z_maps_near_to_one_and_far_to_zero() {
        let camera = Camera {
            position: Vec3::ZERO,
            ..Camera::default()
        };
        let vp = camera.view_projection_matrix();
        let near = vp.project_point3(Vec3::new(0.0, 0.0, -camera.near));
        let far = vp.project_point3(Vec3::new(0.0, 0.0, -camera.far));
        assert!((near.z - 1.0).abs() < 1e-4);
        assert!(far.z.abs() < 1e-4);
    }

    #[test]
    fn test_frustum_follows_camera() {
        let camera = Camera::look_to(Vec3::new(100.0, 0.0, 0.0), Vec3::X, Vec3::Y);
        let frustum = camera.frustum();
        assert!(frustum.contains_point(Vec3::new(150.0, 0.0, 0.0)));
        assert!(!frustum.contains_point(Vec3::new(50.0, 0.0, 0.0)));
        assert!(!frustum.contains_point(Vec3::new(1200.0, 0.0, 0.0)));
    }
}
