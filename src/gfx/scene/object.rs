use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::{util::DeviceExt, Device};

use super::{edges::EdgeOverlay, vertex::Vertex3D};
use crate::{
    gfx::loader::MeshData,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(positions: &[[f32; 3]], normals: &[[f32; 3]], indices: Vec<u32>) -> Self {
        let vertices = positions
            .iter()
            .zip(normals.iter().chain(std::iter::repeat(&[0.0, 1.0, 0.0])))
            .map(|(position, normal)| Vertex3D {
                position: *position,
                normal: *normal,
            })
            .collect();

        Self {
            vertices,
            index_count: indices.len() as u32,
            indices,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn init_gpu_resources(&mut self, device: &Device) {
        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Per-object uniform: must match `ObjectUniform` in lit.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, for normals under non-uniform scale
    pub normal: [[f32; 4]; 4],
    pub base_color: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: Matrix4<f32>, base_color: [f32; 4]) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(world);

        Self {
            model: world.into(),
            normal: normal.into(),
            base_color,
        }
    }
}

/// Bind group layout shared by every object (group 1 of the lit pipeline)
pub fn object_bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_rendering(binding_types::uniform())
        .create(device, "Object Bind Group Layout")
}

// GPU resources struct to hold the uniform buffer and its bind group
pub struct ObjectGpuResources {
    pub uniform_buffer: UniformBuffer<ObjectUniform>,
    pub bind_group: wgpu::BindGroup,
}

/// One drawable mesh of the loaded model
pub struct Object {
    pub name: String,
    pub mesh: Mesh,
    pub transform: Matrix4<f32>,
    pub base_color: [f32; 4],
    pub visible: bool,
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    pub fn from_mesh_data(data: &MeshData) -> Self {
        Self {
            name: data.name.clone(),
            mesh: Mesh::new(&data.positions, &data.normals, data.indices.clone()),
            transform: data.world,
            base_color: data.base_color,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn uniform(&self) -> ObjectUniform {
        ObjectUniform::new(self.transform, self.base_color)
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu_resources.is_some()
    }

    pub fn init_gpu_resources(&mut self, device: &Device, layout: &BindGroupLayoutWithDesc) {
        self.mesh.init_gpu_resources(device);

        let uniform_buffer = UniformBuffer::new_with_data(device, &self.uniform());
        let bind_group = BindGroupBuilder::new(layout)
            .resource(uniform_buffer.binding_resource())
            .create(device, &format!("Object Bind Group: {}", self.name));

        self.gpu_resources = Some(ObjectGpuResources {
            uniform_buffer,
            bind_group,
        });
    }

    /// Get the object bind group for rendering
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }
}

pub trait DrawObject {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_object(&mut self, object: &Object);
    fn draw_edges(&mut self, edges: &EdgeOverlay);
}

impl DrawObject for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_object(&mut self, object: &Object) {
        let Some(bind_group) = object.bind_group() else {
            return;
        };
        self.set_bind_group(1, bind_group, &[]);
        self.draw_mesh(&object.mesh);
    }

    fn draw_edges(&mut self, edges: &EdgeOverlay) {
        let Some(vertex_buffer) = edges.vertex_buffer() else {
            return;
        };
        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.draw(0..edges.vertex_count(), 0..1);
    }
}
