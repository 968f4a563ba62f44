use cgmath::{Matrix4, SquareMatrix};
use winit::{dpi::PhysicalPosition, event::TouchPhase};

use super::first_person_camera::FirstPersonCamera;
use crate::input::{Controls, InputMode};

/// Owns the camera and whichever input handler drives it
pub struct CameraManager {
    pub camera: FirstPersonCamera,
    pub controls: Controls,
}

impl CameraManager {
    pub fn new(camera: FirstPersonCamera, controls: Controls) -> Self {
        Self { camera, controls }
    }

    pub fn input_mode(&self) -> InputMode {
        self.controls.mode()
    }

    /// Raw mouse motion; only the desktop handler reacts, and only while pointer-locked
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) -> bool {
        match &mut self.controls {
            Controls::Desktop(desktop) => desktop.process_mouse_motion(delta, &mut self.camera),
            Controls::Touch(_) => false,
        }
    }

    /// Touch event in window pixels; gestures are tuned per logical pixel
    pub fn process_touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        location: PhysicalPosition<f64>,
        scale_factor: f64,
    ) {
        if let Controls::Touch(touch) = &mut self.controls {
            touch.process_touch(id, phase, location.to_logical(scale_factor), &mut self.camera);
        }
    }

    /// Per-frame work: keyboard movement in desktop mode
    pub fn update(&mut self) {
        if let Controls::Desktop(desktop) = &self.controls {
            desktop.update_movement(&mut self.camera);
        }
        self.camera.update_view_proj();
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
