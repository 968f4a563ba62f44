use std::collections::HashSet;

use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::ElementState,
    keyboard::KeyCode,
};

use crate::gfx::camera::FirstPersonCamera;

/// Tuning for mouse look and keyboard movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    /// Radians of rotation per pixel of raw mouse motion
    pub look_sensitivity: f32,
    /// World units moved per frame while a movement key is held
    pub move_speed: f32,
    pub sprint_multiplier: f32,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.002,
            move_speed: 0.045,
            sprint_multiplier: 1.8,
        }
    }
}

/// What the window must do after a click on the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerLockRequest {
    Lock,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeAction {
    ReleasePointer,
    Exit,
}

pub struct DesktopControls {
    pub settings: DesktopSettings,
    pub invert_mouse: bool,
    held_keys: HashSet<KeyCode>,
    pointer_locked: bool,
    last_cursor: PhysicalPosition<f64>,
    mouse_ndc: Vector2<f32>,
}

impl DesktopControls {
    pub fn new(settings: DesktopSettings, invert_mouse: bool) -> Self {
        Self {
            settings,
            invert_mouse,
            held_keys: HashSet::new(),
            pointer_locked: false,
            last_cursor: PhysicalPosition::new(0.0, 0.0),
            mouse_ndc: Vector2::new(0.0, 0.0),
        }
    }

    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.held_keys.insert(key);
            }
            ElementState::Released => {
                self.held_keys.remove(&key);
            }
        }
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    pub fn is_sprinting(&self) -> bool {
        self.is_held(KeyCode::ShiftLeft) || self.is_held(KeyCode::ShiftRight)
    }

    /// Forgets every held key, e.g. when the window loses focus
    pub fn release_all_keys(&mut self) {
        self.held_keys.clear();
    }

    pub fn is_pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Flips the pointer-lock state on a viewport click
    pub fn toggle_pointer_lock(&mut self) -> PointerLockRequest {
        self.pointer_locked = !self.pointer_locked;
        if self.pointer_locked {
            PointerLockRequest::Lock
        } else {
            PointerLockRequest::Release
        }
    }

    /// Records the real lock state when the window grants or drops the grab
    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    pub fn handle_escape(&mut self) -> EscapeAction {
        if self.pointer_locked {
            self.pointer_locked = false;
            EscapeAction::ReleasePointer
        } else {
            EscapeAction::Exit
        }
    }

    /// +1 when invert is on, -1 otherwise. Only pitch is affected.
    pub fn pitch_sign(&self) -> f32 {
        if self.invert_mouse {
            1.0
        } else {
            -1.0
        }
    }

    /// Applies raw mouse motion while the pointer is locked.
    ///
    /// Returns true if the camera orientation changed.
    pub fn process_mouse_motion(
        &mut self,
        delta: (f64, f64),
        camera: &mut FirstPersonCamera,
    ) -> bool {
        if !self.pointer_locked {
            return false;
        }

        let sensitivity = self.settings.look_sensitivity;
        let delta_yaw = delta.0 as f32 * sensitivity * -1.0;
        let delta_pitch = delta.1 as f32 * sensitivity * self.pitch_sign();
        camera.rotate(delta_yaw, delta_pitch);
        true
    }

    /// Tracks the free cursor in normalized device coordinates
    pub fn process_cursor_moved(
        &mut self,
        position: PhysicalPosition<f64>,
        window_size: PhysicalSize<u32>,
    ) {
        if self.pointer_locked || window_size.width == 0 || window_size.height == 0 {
            return;
        }

        self.mouse_ndc = Vector2::new(
            (position.x / window_size.width as f64) as f32 * 2.0 - 1.0,
            -((position.y / window_size.height as f64) as f32) * 2.0 + 1.0,
        );
        self.last_cursor = position;
    }

    pub fn mouse_ndc(&self) -> Vector2<f32> {
        self.mouse_ndc
    }

    pub fn last_cursor(&self) -> PhysicalPosition<f64> {
        self.last_cursor
    }

    /// Moves the camera for every held movement key; called once per frame
    pub fn update_movement(&self, camera: &mut FirstPersonCamera) {
        let forward = camera.forward();
        let right = camera.right();
        let up = camera.up();

        let speed = if self.is_sprinting() {
            self.settings.move_speed * self.settings.sprint_multiplier
        } else {
            self.settings.move_speed
        };

        if self.is_held(KeyCode::KeyW) {
            camera.translate(forward, speed);
        }
        if self.is_held(KeyCode::KeyS) {
            camera.translate(forward, -speed);
        }
        if self.is_held(KeyCode::KeyA) {
            camera.translate(right, -speed);
        }
        if self.is_held(KeyCode::KeyD) {
            camera.translate(right, speed);
        }
        if self.is_held(KeyCode::Space) {
            camera.translate(up, speed);
        }
        if self.is_held(KeyCode::KeyC) {
            camera.translate(up, -speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::CameraOrientation;
    use approx::assert_relative_eq;
    use cgmath::{Vector3, Zero};

    fn camera() -> FirstPersonCamera {
        FirstPersonCamera::new(Vector3::zero(), CameraOrientation::default(), 1.0)
    }

    fn controls() -> DesktopControls {
        DesktopControls::new(DesktopSettings::default(), false)
    }

    #[test]
    fn test_mouse_motion_requires_pointer_lock() {
        let mut controls = controls();
        let mut camera = camera();
        assert!(!controls.process_mouse_motion((100.0, 100.0), &mut camera));
        assert_eq!(camera.orientation, CameraOrientation::default());
    }

    #[test]
    fn test_mouse_look_signs() {
        let mut controls = controls();
        let mut camera = camera();
        assert_eq!(controls.toggle_pointer_lock(), PointerLockRequest::Lock);

        assert!(controls.process_mouse_motion((10.0, 5.0), &mut camera));
        // Moving right turns right (negative yaw), moving down looks down
        assert_relative_eq!(camera.orientation.yaw, -0.02, epsilon = 1e-6);
        assert_relative_eq!(camera.orientation.pitch, -0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_invert_mouse_flips_pitch_only() {
        let mut controls = DesktopControls::new(DesktopSettings::default(), true);
        let mut camera = camera();
        controls.toggle_pointer_lock();

        controls.process_mouse_motion((10.0, 5.0), &mut camera);
        assert_relative_eq!(camera.orientation.yaw, -0.02, epsilon = 1e-6);
        assert_relative_eq!(camera.orientation.pitch, 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_mouse_look_clamps_pitch() {
        let mut controls = controls();
        let mut camera = camera();
        controls.toggle_pointer_lock();
        controls.process_mouse_motion((0.0, 100_000.0), &mut camera);
        assert_eq!(camera.orientation.pitch, CameraOrientation::MIN_PITCH);
        assert_eq!(camera.rotation, camera.orientation.quaternion());
    }

    #[test]
    fn test_click_toggles_pointer_lock() {
        let mut controls = controls();
        assert_eq!(controls.toggle_pointer_lock(), PointerLockRequest::Lock);
        assert!(controls.is_pointer_locked());
        assert_eq!(controls.toggle_pointer_lock(), PointerLockRequest::Release);
        assert!(!controls.is_pointer_locked());
    }

    #[test]
    fn test_escape_releases_before_exiting() {
        let mut controls = controls();
        controls.toggle_pointer_lock();
        assert_eq!(controls.handle_escape(), EscapeAction::ReleasePointer);
        assert!(!controls.is_pointer_locked());
        assert_eq!(controls.handle_escape(), EscapeAction::Exit);
    }

    #[test]
    fn test_cursor_ndc() {
        let mut controls = controls();
        let size = PhysicalSize::new(800, 600);

        controls.process_cursor_moved(PhysicalPosition::new(0.0, 0.0), size);
        assert_eq!(controls.mouse_ndc(), Vector2::new(-1.0, 1.0));

        controls.process_cursor_moved(PhysicalPosition::new(400.0, 300.0), size);
        assert_eq!(controls.mouse_ndc(), Vector2::new(0.0, 0.0));

        controls.process_cursor_moved(PhysicalPosition::new(800.0, 600.0), size);
        assert_eq!(controls.mouse_ndc(), Vector2::new(1.0, -1.0));
        assert_eq!(controls.last_cursor(), PhysicalPosition::new(800.0, 600.0));
    }

    #[test]
    fn test_cursor_ignored_while_locked() {
        let mut controls = controls();
        controls.toggle_pointer_lock();
        controls.process_cursor_moved(PhysicalPosition::new(0.0, 0.0), PhysicalSize::new(800, 600));
        assert_eq!(controls.mouse_ndc(), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn test_forward_movement() {
        let mut controls = controls();
        let mut camera = camera();
        controls.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        controls.update_movement(&mut camera);
        assert_relative_eq!(camera.position.z, -0.045, epsilon = 1e-6);

        controls.process_keyboard(KeyCode::KeyW, ElementState::Released);
        controls.update_movement(&mut camera);
        assert_relative_eq!(camera.position.z, -0.045, epsilon = 1e-6);
    }

    #[test]
    fn test_sprint_multiplies_speed() {
        let mut controls = controls();
        let mut camera = camera();
        controls.process_keyboard(KeyCode::ShiftRight, ElementState::Pressed);
        controls.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        controls.update_movement(&mut camera);
        assert_relative_eq!(camera.position.x, 0.045 * 1.8, epsilon = 1e-6);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut controls = controls();
        let mut camera = camera();
        for key in [KeyCode::KeyA, KeyCode::KeyD, KeyCode::Space, KeyCode::KeyC] {
            controls.process_keyboard(key, ElementState::Pressed);
        }
        controls.update_movement(&mut camera);
        assert_relative_eq!(camera.position.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_vertical_movement_uses_world_up() {
        let mut controls = controls();
        let mut camera = camera();
        camera.rotate(0.0, -1.0);
        controls.process_keyboard(KeyCode::Space, ElementState::Pressed);
        controls.update_movement(&mut camera);
        assert_relative_eq!(camera.position.y, 0.045, epsilon = 1e-6);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_release_all_keys() {
        let mut controls = controls();
        controls.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        controls.release_all_keys();
        assert!(!controls.is_held(KeyCode::KeyW));
    }
}
