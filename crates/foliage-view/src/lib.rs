//! View-space primitives: camera, oriented bounding boxes, and frustum containment.

mod camera;
mod frustum;
mod obb;

pub use camera::Camera;
pub use frustum::{Frustum, Intersection};
pub use obb::OrientedBox;
