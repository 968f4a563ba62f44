use std::f32::consts::FRAC_PI_2;

use cgmath::{Quaternion, Rad, Rotation3};

/// Yaw/pitch record shared by whichever input handler is active.
///
/// Pitch stays within `[-π/2, π/2]`; yaw is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOrientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraOrientation {
    pub const MIN_PITCH: f32 = -FRAC_PI_2;
    pub const MAX_PITCH: f32 = FRAC_PI_2;

    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(Self::MIN_PITCH, Self::MAX_PITCH),
        }
    }

    /// Adds the deltas, then clamps pitch to the vertical range
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(Self::MIN_PITCH, Self::MAX_PITCH);
    }

    /// Rotation for Euler order YXZ: yaw about world Y, then pitch about local X.
    pub fn quaternion(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Rad(self.yaw)) * Quaternion::from_angle_x(Rad(self.pitch))
    }
}

impl Default for CameraOrientation {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector3;

    #[test]
    fn test_new_clamps_pitch() {
        let orientation = CameraOrientation::new(0.3, 4.0);
        assert_eq!(orientation.yaw, 0.3);
        assert_eq!(orientation.pitch, FRAC_PI_2);
    }

    #[test]
    fn test_rotate_clamps_pitch_both_ways() {
        let mut orientation = CameraOrientation::default();
        orientation.rotate(0.0, 10.0);
        assert_eq!(orientation.pitch, FRAC_PI_2);
        orientation.rotate(0.0, -20.0);
        assert_eq!(orientation.pitch, -FRAC_PI_2);
    }

    #[test]
    fn test_yaw_is_unbounded() {
        let mut orientation = CameraOrientation::default();
        for _ in 0..10 {
            orientation.rotate(1.0, 0.0);
        }
        assert_relative_eq!(orientation.yaw, 10.0);
    }

    #[test]
    fn test_quaternion_yaw_turns_forward_left() {
        // Positive yaw turns -Z towards -X (counter-clockwise seen from above)
        let orientation = CameraOrientation::new(FRAC_PI_2, 0.0);
        let forward = orientation.quaternion() * Vector3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(forward.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_quaternion_negative_pitch_looks_down() {
        let orientation = CameraOrientation::new(0.0, (-0.5f32).asin());
        let forward = orientation.quaternion() * Vector3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(forward.y, -0.5, epsilon = 1e-6);
        assert!(forward.z < 0.0);
    }

    #[test]
    fn test_pitch_is_applied_after_yaw() {
        // Right vector never picks up a vertical component under YXZ order
        let orientation = CameraOrientation::new(0.7, -0.4);
        let right = orientation.quaternion() * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(right.y, 0.0, epsilon = 1e-6);
    }
}
