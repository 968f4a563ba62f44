//! Global uniform bindings for camera and scene data
//!
//! Manages GPU uniform buffers and bind groups for global rendering state
//! that is shared across all objects in a scene: camera matrices and the
//! light rig. A second small uniform carries the edge overlay colour.

use crate::{
    gfx::{
        camera::camera_utils::CameraUniform,
        scene::{edges::EdgeStyle, lighting::LightingRaw},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],  // Camera position (homogeneous coordinates)
    view_proj: [[f32; 4]; 4], // Camera view-projection matrix
    lighting: LightingRaw,
}
// Total: 16 + 64 + 160 = 240 bytes

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data
///
/// Called once per frame; unchanged content is not re-uploaded.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    lighting: LightingRaw,
) {
    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        lighting,
    };

    ubo.update_content(queue, content);
}

/// Colour of the edge overlay, matches `EdgeUniform` in edges.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EdgeUniform {
    pub color: [f32; 4],
}

impl From<&EdgeStyle> for EdgeUniform {
    fn from(style: &EdgeStyle) -> Self {
        Self {
            color: style.rgba(),
        }
    }
}

/// A single-uniform bind group and its layout
///
/// Bound to slot 0 (globals) in every pipeline, or slot 1 (edge style) in
/// the edge pipeline.
pub struct UniformBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl UniformBindings {
    pub fn new<T: bytemuck::Pod>(device: &wgpu::Device, ubo: &UniformBuffer<T>, label: &str) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, &format!("{} Layout", label));

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, label);

        Self {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that read this uniform
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_layout_size() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 240);
        assert_eq!(std::mem::size_of::<EdgeUniform>(), 16);
    }

    #[test]
    fn test_edge_uniform_from_style() {
        let uniform = EdgeUniform::from(&EdgeStyle {
            color: 0xff0000,
            opacity: 0.5,
            ..Default::default()
        });
        assert_eq!(uniform.color, [1.0, 0.0, 0.0, 0.5]);
    }
}
