use std::{io::BufRead, path::Path};

use cgmath::{Matrix4, SquareMatrix};

use super::{compute_vertex_normals, LoadProgress, MeshData, ModelData};
use crate::{error::Result, gfx::scene::lighting::srgb_to_linear};

const DEFAULT_DIFFUSE: [f32; 3] = [0.8, 0.8, 0.8];

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Loads an OBJ file and its MTL materials when present
pub fn load_obj(path: &Path, progress: &mut dyn FnMut(LoadProgress)) -> Result<ModelData> {
    let (models, materials) = tobj::load_obj(path, &load_options())?;
    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No usable MTL for {}: {}", path.display(), err);
        Vec::new()
    });
    Ok(model_from_obj(&models, &materials, progress))
}

/// Loads OBJ data from a reader; material libraries are ignored
pub fn load_obj_reader<R: BufRead>(
    reader: &mut R,
    progress: &mut dyn FnMut(LoadProgress),
) -> Result<ModelData> {
    let (models, _) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    Ok(model_from_obj(&models, &[], progress))
}

fn model_from_obj(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    progress: &mut dyn FnMut(LoadProgress),
) -> ModelData {
    let total = models.len();
    let mut model = ModelData::default();

    for (i, m) in models.iter().enumerate() {
        let mesh = &m.mesh;

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        if !positions.is_empty() && !mesh.indices.is_empty() {
            // Use normals from OBJ if available, otherwise calculate them
            let normals = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect()
            } else {
                compute_vertex_normals(&positions, &mesh.indices)
            };

            let diffuse = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|mtl| (mtl.diffuse.unwrap_or(DEFAULT_DIFFUSE), mtl.dissolve.unwrap_or(1.0)))
                .unwrap_or((DEFAULT_DIFFUSE, 1.0));
            // MTL colours are authored in sRGB
            let [r, g, b] = diffuse.0.map(srgb_to_linear);

            let name = if m.name.is_empty() {
                format!("mesh_{}", i)
            } else {
                m.name.clone()
            };

            model.meshes.push(MeshData {
                name,
                positions,
                normals,
                indices: mesh.indices.clone(),
                world: Matrix4::identity(),
                base_color: [r, g, b, diffuse.1],
            });
        }

        progress(LoadProgress {
            loaded: i + 1,
            total,
        });
    }

    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const QUAD: &str = "\
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";

    #[test]
    fn test_quad_is_triangulated() {
        let mut progress = Vec::new();
        let model = load_obj_reader(&mut Cursor::new(QUAD), &mut |p| progress.push(p)).unwrap();

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.name, "quad");
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_relative_eq!(mesh.base_color[0], 0.6038, epsilon = 1e-4);
        assert_eq!(mesh.base_color[1], mesh.base_color[0]);
        assert_eq!(mesh.base_color[3], 1.0);
        assert_eq!(mesh.normals.len(), 4);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(progress, vec![LoadProgress { loaded: 1, total: 1 }]);
    }

    #[test]
    fn test_empty_obj_has_no_meshes() {
        let model = load_obj_reader(&mut Cursor::new("# nothing here\n"), &mut |_| {}).unwrap();
        assert!(model.meshes.is_empty());
    }
}
