pub mod camera_utils;
pub mod first_person_camera;
pub mod orientation;

// Re-export main types
pub use camera_utils::{Camera, CameraManager, CameraUniform};
pub use first_person_camera::FirstPersonCamera;
pub use orientation::CameraOrientation;
