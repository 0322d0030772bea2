//! Scripted camera flight: a constant-speed level circle over the forest.

use foliage_config::{CameraConfig, ViewConfig};
use foliage_view::Camera;
use glam::Vec3;

/// Moves a camera forward at a fixed speed while yawing at a fixed rate,
/// which traces a circle of radius `speed / spin`.
#[derive(Debug, Clone)]
pub struct Flight {
    previous: Camera,
    current: Camera,
    speed: f32,
    spin: f32,
}

impl Flight {
    /// Start on the circle's edge, heading along -Z, so the circle stays
    /// centered on the origin.
    pub fn new(view: &ViewConfig, camera: &CameraConfig) -> Self {
        let radius = if camera.spin_rad_s.abs() > f32::EPSILON {
            camera.speed_m_s / camera.spin_rad_s
        } else {
            0.0
        };
        let mut start = Camera::look_to(
            Vec3::new(-radius, camera.eye_height, 0.0),
            Vec3::NEG_Z,
            Vec3::Y,
        );
        start.fov_y = view.fov_y_degrees.to_radians();
        start.near = view.z_near;
        start.far = view.z_far;
        start.set_aspect_ratio(view.width as f32, view.height as f32);

        Self {
            previous: start.clone(),
            current: start,
            speed: camera.speed_m_s,
            spin: camera.spin_rad_s,
        }
    }

    /// Advance the flight by one simulation step.
    pub fn update(&mut self, dt: f32) {
        self.previous = self.current.clone();
        // Positive spin turns right, toward the circle center.
        self.current.yaw(self.spin * dt);
        let forward = self.current.forward();
        self.current.position += forward * self.speed * dt;
    }

    /// The camera blended between the last two steps.
    pub fn camera(&self, alpha: f32) -> Camera {
        let mut camera = self.current.clone();
        camera.position = self.previous.position.lerp(self.current.position, alpha);
        camera.rotation = self.previous.rotation.slerp(self.current.rotation, alpha);
        camera
    }

    /// The camera after the most recent step.
    pub fn current(&self) -> &Camera {
        &self.current
    }
}
