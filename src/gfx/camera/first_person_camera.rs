use cgmath::*;

use super::{
    camera_utils::{convert_matrix4_to_array, Camera, CameraUniform},
    orientation::CameraOrientation,
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Free-flying perspective camera with a Y-up world
///
/// The rotation is always derived from [`CameraOrientation`]; input handlers
/// mutate the record and then call [`FirstPersonCamera::apply_orientation`].
#[derive(Debug, Clone, Copy)]
pub struct FirstPersonCamera {
    pub position: Vector3<f32>,
    pub orientation: CameraOrientation,
    pub rotation: Quaternion<f32>,
    pub aspect: f32,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for FirstPersonCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let view = Matrix4::from(self.rotation.conjugate())
            * Matrix4::from_translation(-self.position);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl FirstPersonCamera {
    pub fn new(position: Vector3<f32>, orientation: CameraOrientation, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            orientation,
            rotation: Quaternion::one(),
            aspect,
            fovy: Deg(75.0),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
        };
        camera.apply_orientation();
        camera
    }

    /// Writes the orientation record into the camera rotation
    pub fn apply_orientation(&mut self) {
        self.rotation = self.orientation.quaternion();
    }

    /// Applies yaw/pitch deltas to the record and updates the rotation
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.orientation.rotate(delta_yaw, delta_pitch);
        self.apply_orientation();
    }

    /// Camera-relative forward direction (-Z in camera space)
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * -Vector3::unit_z()
    }

    /// Camera-relative right direction (+X in camera space)
    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_x()
    }

    /// World up; vertical movement never follows the camera tilt
    pub fn up(&self) -> Vector3<f32> {
        Vector3::unit_y()
    }

    /// Moves the camera along `direction` scaled by `amount`
    pub fn translate(&mut self, direction: Vector3<f32>, amount: f32) {
        self.position += direction * amount;
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.position.x, self.position.y, self.position.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> FirstPersonCamera {
        FirstPersonCamera::new(Vector3::zero(), CameraOrientation::default(), 1.0)
    }

    #[test]
    fn test_default_basis() {
        let camera = camera();
        assert_relative_eq!(camera.forward().z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.right().x, 1.0, epsilon = 1e-6);
        assert_eq!(camera.up(), Vector3::unit_y());
    }

    #[test]
    fn test_up_ignores_pitch() {
        let mut camera = camera();
        camera.rotate(0.4, -1.2);
        assert_eq!(camera.up(), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_translate_scales_direction() {
        let mut camera = camera();
        let forward = camera.forward();
        camera.translate(forward, 2.5);
        assert_relative_eq!(camera.position.z, -2.5, epsilon = 1e-6);
        camera.translate(forward, -0.5);
        assert_relative_eq!(camera.position.z, -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_resize_ignores_zero() {
        let mut camera = camera();
        camera.resize_projection(1600, 800);
        assert_relative_eq!(camera.aspect, 2.0);
        camera.resize_projection(0, 800);
        assert_relative_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_point_ahead_projects_to_center() {
        let mut camera = FirstPersonCamera::new(
            Vector3::new(1.0, 2.0, 3.0),
            CameraOrientation::new(0.6, -0.3),
            1.5,
        );
        let target = camera.position + camera.forward() * 10.0;
        let clip = camera.build_view_projection_matrix() * target.extend(1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-4);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);

        camera.update_view_proj();
        assert_eq!(camera.uniform.view_position, [1.0, 2.0, 3.0, 1.0]);
    }
}
