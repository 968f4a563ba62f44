//! # Model Loading
//!
//! Decodes a static scene asset into CPU-side [`ModelData`]: a flat list of
//! triangle meshes, each with its world matrix and base colour.
//!
//! - glTF 2.0 (`.glb`, `.gltf`) via the `gltf` crate, see [`gltf_import`]
//! - Wavefront OBJ (`.obj`) via `tobj`, see [`obj_import`]
//!
//! Loading never touches the GPU, so it can run on a worker thread.

pub mod gltf_import;
pub mod obj_import;

use std::path::{Path, PathBuf};

use cgmath::{Matrix4, Vector3};

use crate::{
    error::{Result, ViewerError},
    gfx::scene::bounds::Aabb,
};

/// One triangle mesh in world space
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub world: Matrix4<f32>,
    pub base_color: [f32; 4],
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local bounds carried into world space through their corners
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions).map(|local| local.transformed(&self.world))
    }
}

/// A decoded asset
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
}

impl ModelData {
    /// World bounds across every mesh
    pub fn bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .filter_map(MeshData::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Translates the whole model so its bounding-box center is the origin.
    ///
    /// Returns the applied offset.
    pub fn center_at_origin(&mut self) -> Vector3<f32> {
        let Some(bounds) = self.bounds() else {
            return Vector3::new(0.0, 0.0, 0.0);
        };

        let offset = -bounds.center();
        let shift = Matrix4::from_translation(offset);
        for mesh in &mut self.meshes {
            mesh.world = shift * mesh.world;
        }
        offset
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }
}

/// Progress of a running load, reported once per decoded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

/// Resolves the model location against an optional asset base directory.
///
/// With a base, only the file name of `model` is kept.
pub fn resolve_model_path(model: &Path, asset_base: Option<&Path>) -> PathBuf {
    match asset_base {
        Some(base) => match model.file_name() {
            Some(file_name) => base.join(file_name),
            None => base.join(model),
        },
        None => model.to_path_buf(),
    }
}

/// Loads a model, choosing the decoder from the file extension
pub fn load_model(path: &Path, progress: &mut dyn FnMut(LoadProgress)) -> Result<ModelData> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let model = match extension.as_deref() {
        Some("glb") | Some("gltf") => gltf_import::load_gltf(path, progress)?,
        Some("obj") => obj_import::load_obj(path, progress)?,
        _ => return Err(ViewerError::UnsupportedFormat(path.to_path_buf())),
    };

    if model.meshes.is_empty() {
        return Err(ViewerError::EmptyModel);
    }

    log::info!(
        "Loaded {} ({} meshes, {} triangles)",
        path.display(),
        model.meshes.len(),
        model.triangle_count()
    );
    Ok(model)
}

/// Averaged face normals for meshes that ship without normals
pub fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let v0 = Vector3::from(positions[i0]);
        let v1 = Vector3::from(positions[i1]);
        let v2 = Vector3::from(positions[i2]);
        let face_normal = (v1 - v0).cross(v2 - v0);

        for index in [i0, i1, i2] {
            normals[index][0] += face_normal.x;
            normals[index][1] += face_normal.y;
            normals[index][2] += face_normal.z;
        }
    }

    for normal in &mut normals {
        let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
        if length > 0.0 {
            normal[0] /= length;
            normal[1] /= length;
            normal[2] /= length;
        }
    }

    normals
}
