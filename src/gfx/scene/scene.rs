use std::path::PathBuf;

use wgpu::Device;

use super::{
    edges::{EdgeOverlay, EdgeStyle},
    lighting::Lighting,
    object::Object,
};
use crate::{
    gfx::{camera::camera_utils::CameraManager, loader::ModelData},
    wgpu_utils::binding_builder::BindGroupLayoutWithDesc,
};

/// Counts shown in the info dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatistics {
    pub objects: usize,
    pub triangles: usize,
    pub vertices: usize,
    pub edge_segments: usize,
}

/// Main scene containing the loaded model, camera, lights, and edge overlay
pub struct Scene {
    pub camera_manager: CameraManager,
    pub objects: Vec<Object>,
    pub lighting: Lighting,
    pub edges: EdgeOverlay,
    /// Clear colour, 0xRRGGBB
    pub background: u32,
    pub model_path: Option<PathBuf>,
}

impl Scene {
    pub fn new(
        camera_manager: CameraManager,
        lighting: Lighting,
        edge_style: EdgeStyle,
        background: u32,
    ) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
            lighting,
            edges: EdgeOverlay::new(edge_style),
            background,
            model_path: None,
        }
    }

    /// Updates the scene (camera movement and matrices)
    pub fn update(&mut self) {
        self.camera_manager.update();
    }

    /// Installs a freshly loaded model, replacing whatever was shown before.
    ///
    /// The model is centered on the origin first, so the edge overlay and
    /// lights see the same coordinates as the meshes. Every object is drawn
    /// front-face only; double-sided materials are not honoured.
    pub fn set_model(&mut self, mut model: ModelData, path: Option<PathBuf>) {
        let offset = model.center_at_origin();
        log::debug!(
            "Centered model by ({:.3}, {:.3}, {:.3})",
            offset.x,
            offset.y,
            offset.z
        );

        self.objects = model.meshes.iter().map(Object::from_mesh_data).collect();
        self.edges.rebuild(&model);
        self.model_path = path;

        self.camera_manager.camera.apply_orientation();

        let stats = self.statistics();
        log::info!(
            "Scene ready: {} objects, {} triangles, {} edge segments",
            stats.objects,
            stats.triangles,
            stats.edge_segments
        );
    }

    /// Drops the current model and its overlay
    pub fn clear_model(&mut self) {
        self.objects.clear();
        self.edges.clear();
        self.model_path = None;
    }

    /// Uploads objects and overlay segments that are not on the GPU yet
    pub fn init_gpu_resources(&mut self, device: &Device, object_layout: &BindGroupLayoutWithDesc) {
        for object in self.objects.iter_mut().filter(|o| !o.has_gpu_resources()) {
            object.init_gpu_resources(device, object_layout);
        }
        self.edges.upload(device);
    }

    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            objects: self.objects.len(),
            triangles: self.objects.iter().map(|o| o.mesh.triangle_count()).sum(),
            vertices: self.objects.iter().map(|o| o.mesh.vertex_count()).sum(),
            edge_segments: self.edges.segment_count(),
        }
    }
}
