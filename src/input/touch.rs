use cgmath::{InnerSpace, Vector2};
use serde::{Deserialize, Serialize};
use winit::{dpi::LogicalPosition, event::TouchPhase};

use crate::gfx::camera::FirstPersonCamera;

/// Tuning for touch gestures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchSettings {
    /// Radians of rotation per logical pixel of single-finger drag
    pub rotate_sensitivity: f32,
    /// World units per logical pixel of two-finger drag
    pub pan_speed: f32,
    /// World units per logical pixel of pinch distance change
    pub pinch_speed: f32,
}

impl Default for TouchSettings {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.005,
            pan_speed: 0.03,
            pinch_speed: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveTouch {
    id: u64,
    position: Vector2<f32>,
}

/// Touch gesture handler.
///
/// One finger rotates the view, two fingers pan and pinch. Anchors are
/// re-seeded whenever the finger count changes so the camera never jumps.
#[derive(Debug, Clone)]
pub struct TouchControls {
    pub settings: TouchSettings,
    /// Active touches in arrival order
    touches: Vec<ActiveTouch>,
    last_touch: Vector2<f32>,
    last_pan: Vector2<f32>,
    last_pinch_distance: f32,
    last_touch_count: usize,
}

fn touch_distance(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    (a - b).magnitude()
}

fn touch_center(a: Vector2<f32>, b: Vector2<f32>) -> Vector2<f32> {
    (a + b) / 2.0
}

impl TouchControls {
    pub fn new(settings: TouchSettings) -> Self {
        Self {
            settings,
            touches: Vec::new(),
            last_touch: Vector2::new(0.0, 0.0),
            last_pan: Vector2::new(0.0, 0.0),
            last_pinch_distance: 0.0,
            last_touch_count: 0,
        }
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Feeds one touch event, in logical pixels, through the gesture state machine
    pub fn process_touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        location: LogicalPosition<f64>,
        camera: &mut FirstPersonCamera,
    ) {
        let position = Vector2::new(location.x as f32, location.y as f32);

        match phase {
            TouchPhase::Started => {
                self.upsert(id, position);
                self.on_touch_start();
            }
            TouchPhase::Moved => {
                self.upsert(id, position);
                self.on_touch_move(camera);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.retain(|t| t.id != id);
                self.on_touch_end();
            }
        }
    }

    fn upsert(&mut self, id: u64, position: Vector2<f32>) {
        match self.touches.iter_mut().find(|t| t.id == id) {
            Some(existing) => existing.position = position,
            None => self.touches.push(ActiveTouch { id, position }),
        }
    }

    fn on_touch_start(&mut self) {
        self.last_touch_count = self.touches.len();

        match self.touches.as_slice() {
            [single] => self.last_touch = single.position,
            [first, second] => {
                self.last_pinch_distance = touch_distance(first.position, second.position);
                self.last_pan = touch_center(first.position, second.position);
            }
            _ => {}
        }
    }

    fn on_touch_move(&mut self, camera: &mut FirstPersonCamera) {
        if self.touches.len() != self.last_touch_count {
            self.last_touch_count = self.touches.len();
            self.reseed_anchors();
            return;
        }

        match self.touches.as_slice() {
            [single] => {
                let current = single.position;
                let delta = current - self.last_touch;
                let sensitivity = self.settings.rotate_sensitivity;

                // Drag right rotates right, drag down rotates down
                camera.rotate(delta.x * sensitivity, delta.y * sensitivity);

                self.last_touch = current;
            }
            [first, second] => {
                let center = touch_center(first.position, second.position);
                let distance = touch_distance(first.position, second.position);

                let pan_delta = center - self.last_pan;
                let pan_speed = self.settings.pan_speed;
                let right = camera.right();
                let up = camera.up();
                camera.translate(right, -pan_delta.x * pan_speed);
                camera.translate(up, pan_delta.y * pan_speed);
                self.last_pan = center;

                if self.last_pinch_distance > 0.0 {
                    let pinch_delta = distance - self.last_pinch_distance;
                    let forward = camera.forward();
                    camera.translate(forward, pinch_delta * self.settings.pinch_speed);
                }
                self.last_pinch_distance = distance;
            }
            _ => {}
        }
    }

    fn on_touch_end(&mut self) {
        self.last_touch_count = self.touches.len();
        self.last_pinch_distance = 0.0;
        self.reseed_anchors();
    }

    fn reseed_anchors(&mut self) {
        match self.touches.as_slice() {
            [single] => self.last_touch = single.position,
            [first, second] => {
                self.last_pan = touch_center(first.position, second.position);
                self.last_pinch_distance = touch_distance(first.position, second.position);
            }
            _ => {}
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

    fn at(x: f64, y: f64) -> LogicalPosition<f64> {
        LogicalPosition::new(x, y)
    }

    #[test]
    fn test_single_finger_rotates() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(100.0, 100.0), &mut camera);
        controls.process_touch(1, TouchPhase::Moved, at(120.0, 110.0), &mut camera);

        assert_relative_eq!(camera.orientation.yaw, 0.1, epsilon = 1e-6);
        assert_relative_eq!(camera.orientation.pitch, 0.05, epsilon = 1e-6);
        assert_eq!(camera.position, Vector3::zero());

        // Deltas are taken from the previous move, not the start
        controls.process_touch(1, TouchPhase::Moved, at(130.0, 110.0), &mut camera);
        assert_relative_eq!(camera.orientation.yaw, 0.15, epsilon = 1e-6);
    }

    #[test]
    fn test_single_finger_clamps_pitch() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(0.0, 0.0), &mut camera);
        controls.process_touch(1, TouchPhase::Moved, at(0.0, 5000.0), &mut camera);
        assert_eq!(camera.orientation.pitch, CameraOrientation::MAX_PITCH);
    }

    #[test]
    fn test_two_finger_pan() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(100.0, 100.0), &mut camera);
        controls.process_touch(2, TouchPhase::Started, at(200.0, 100.0), &mut camera);

        // Both fingers move right by 10 and down by 20: distance unchanged
        controls.process_touch(1, TouchPhase::Moved, at(110.0, 120.0), &mut camera);
        controls.process_touch(2, TouchPhase::Moved, at(210.0, 120.0), &mut camera);

        assert_relative_eq!(camera.position.x, -10.0 * 0.03, epsilon = 1e-5);
        assert_relative_eq!(camera.position.y, 20.0 * 0.03, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-5);
        assert_eq!(camera.orientation, CameraOrientation::default());
    }

    #[test]
    fn test_pinch_moves_forward() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(100.0, 100.0), &mut camera);
        controls.process_touch(2, TouchPhase::Started, at(200.0, 100.0), &mut camera);

        // Symmetric spread keeps the center fixed
        controls.process_touch(1, TouchPhase::Moved, at(90.0, 100.0), &mut camera);
        controls.process_touch(2, TouchPhase::Moved, at(210.0, 100.0), &mut camera);

        // Total spread 20px, forward is -Z
        assert_relative_eq!(camera.position.z, -20.0 * 0.1, epsilon = 1e-4);
        assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_lifting_finger_does_not_jump() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(100.0, 100.0), &mut camera);
        controls.process_touch(2, TouchPhase::Started, at(300.0, 300.0), &mut camera);
        controls.process_touch(1, TouchPhase::Ended, at(100.0, 100.0), &mut camera);
        assert_eq!(controls.touch_count(), 1);

        // The remaining finger is the rotate anchor, so a tiny move rotates a tiny bit
        controls.process_touch(2, TouchPhase::Moved, at(302.0, 300.0), &mut camera);
        assert_relative_eq!(camera.orientation.yaw, 0.01, epsilon = 1e-6);
        assert_eq!(camera.position, Vector3::zero());
    }

    #[test]
    fn test_count_change_on_move_only_reseeds() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(100.0, 100.0), &mut camera);
        // A move for a finger whose start was never seen changes the count
        controls.process_touch(7, TouchPhase::Moved, at(200.0, 100.0), &mut camera);
        assert_eq!(controls.touch_count(), 2);
        assert_eq!(camera.orientation, CameraOrientation::default());
        assert_eq!(camera.position, Vector3::zero());

        // The next move pans from the re-seeded center
        controls.process_touch(7, TouchPhase::Moved, at(220.0, 100.0), &mut camera);
        assert!(camera.position.x < 0.0);
    }

    #[test]
    fn test_touch_end_resets_pinch_distance() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(0.0, 0.0), &mut camera);
        controls.process_touch(2, TouchPhase::Started, at(100.0, 0.0), &mut camera);
        controls.process_touch(3, TouchPhase::Started, at(50.0, 50.0), &mut camera);
        controls.process_touch(3, TouchPhase::Cancelled, at(50.0, 50.0), &mut camera);

        // Two fingers remain; the end handler re-seeded from them
        controls.process_touch(2, TouchPhase::Moved, at(100.0, 0.0), &mut camera);
        assert_eq!(camera.position, Vector3::zero());
    }

    #[test]
    fn test_three_fingers_ignored() {
        let mut controls = TouchControls::new(TouchSettings::default());
        let mut camera = camera();

        controls.process_touch(1, TouchPhase::Started, at(0.0, 0.0), &mut camera);
        controls.process_touch(2, TouchPhase::Started, at(100.0, 0.0), &mut camera);
        controls.process_touch(3, TouchPhase::Started, at(50.0, 50.0), &mut camera);
        controls.process_touch(3, TouchPhase::Moved, at(80.0, 90.0), &mut camera);

        assert_eq!(camera.orientation, CameraOrientation::default());
        assert_eq!(camera.position, Vector3::zero());
    }
}
