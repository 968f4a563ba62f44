// glTF 2.0 importer: flattens the default scene's node hierarchy into world-space meshes.
// Supports .glb, embedded (data URI) and external buffers. Textures are not decoded.

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix};
use gltf::mesh::Mode;

use super::{compute_vertex_normals, LoadProgress, MeshData, ModelData};
use crate::error::{Result, ViewerError};

pub fn load_gltf(path: &Path, progress: &mut dyn FnMut(LoadProgress)) -> Result<ModelData> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    model_from_document(&document, &buffers, progress)
}

/// Decodes a glTF held in memory; external buffer URIs are not resolvable here
pub fn load_gltf_slice(bytes: &[u8], progress: &mut dyn FnMut(LoadProgress)) -> Result<ModelData> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, None, blob)?;
    model_from_document(&document, &buffers, progress)
}

fn model_from_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    progress: &mut dyn FnMut(LoadProgress),
) -> Result<ModelData> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ViewerError::EmptyModel)?;

    let mut instances = Vec::new();
    for node in scene.nodes() {
        collect_mesh_nodes(&node, Matrix4::identity(), &mut instances);
    }

    let total = instances
        .iter()
        .map(|(_, mesh, _)| mesh.primitives().count())
        .sum();
    let mut loaded = 0;
    let mut model = ModelData::default();

    for (node, mesh, world) in instances {
        for (primitive_index, primitive) in mesh.primitives().enumerate() {
            loaded += 1;
            if let Some(mesh_data) = read_primitive(&node, &mesh, &primitive, primitive_index, world, buffers) {
                model.meshes.push(mesh_data);
            }
            progress(LoadProgress { loaded, total });
        }
    }

    Ok(model)
}

/// Depth-first walk accumulating `parent * local` transforms
fn collect_mesh_nodes<'a>(
    node: &gltf::Node<'a>,
    parent_world: Matrix4<f32>,
    out: &mut Vec<(gltf::Node<'a>, gltf::Mesh<'a>, Matrix4<f32>)>,
) {
    let world = parent_world * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        out.push((node.clone(), mesh, world));
    }

    for child in node.children() {
        collect_mesh_nodes(&child, world, out);
    }
}

fn read_primitive(
    node: &gltf::Node,
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    primitive_index: usize,
    world: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let Some(indices) = triangle_list(primitive.mode(), indices) else {
        log::debug!(
            "Skipping primitive {} of mesh {}: mode {:?} has no faces",
            primitive_index,
            mesh.index(),
            primitive.mode()
        );
        return None;
    };

    let normals = match reader.read_normals() {
        Some(normals) => {
            let normals: Vec<[f32; 3]> = normals.collect();
            if normals.len() == positions.len() {
                normals
            } else {
                compute_vertex_normals(&positions, &indices)
            }
        }
        None => compute_vertex_normals(&positions, &indices),
    };

    let base_color = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_factor();

    let name = mesh
        .name()
        .or_else(|| node.name())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

    Some(MeshData {
        name,
        positions,
        normals,
        indices,
        world,
        base_color,
    })
}

/// Expands strip and fan index streams into a triangle list.
///
/// Odd strip triangles are reversed so every face keeps the strip's winding.
/// Point and line modes return `None`.
fn triangle_list(mode: Mode, indices: Vec<u32>) -> Option<Vec<u32>> {
    match mode {
        Mode::Triangles => Some(indices),
        Mode::TriangleStrip => Some(
            (0..indices.len().saturating_sub(2))
                .flat_map(|i| {
                    if i % 2 == 0 {
                        [indices[i], indices[i + 1], indices[i + 2]]
                    } else {
                        [indices[i + 2], indices[i + 1], indices[i]]
                    }
                })
                .collect(),
        ),
        Mode::TriangleFan => Some(
            (1..indices.len().saturating_sub(1))
                .flat_map(|i| [indices[0], indices[i], indices[i + 1]])
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Transform};

    const NESTED_TRIANGLE: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/nested_triangle.gltf"
    ));

    const STRIP_AND_FAN: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/strip_and_fan.gltf"
    ));

    #[test]
    fn test_nested_node_transforms_accumulate() {
        let mut reports = Vec::new();
        let model = load_gltf_slice(NESTED_TRIANGLE.as_bytes(), &mut |p| reports.push(p)).unwrap();

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.name, "triangle");
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.base_color, [0.5, 0.25, 1.0, 1.0]);

        // root translates by +10 on X, leaf scales by 2
        let corner = mesh.world.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_eq!(corner, Point3::new(12.0, 0.0, 0.0));

        assert_eq!(reports, vec![LoadProgress { loaded: 1, total: 1 }]);
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let model = load_gltf_slice(NESTED_TRIANGLE.as_bytes(), &mut |_| {}).unwrap();
        let mesh = &model.meshes[0];
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_strip_and_fan_become_triangle_lists() {
        let mut reports = Vec::new();
        let model = load_gltf_slice(STRIP_AND_FAN.as_bytes(), &mut |p| reports.push(p)).unwrap();

        // The points primitive is dropped but still counted as progress
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(reports.last(), Some(&LoadProgress { loaded: 3, total: 3 }));

        let strip = &model.meshes[0];
        assert_eq!(strip.indices, vec![0, 1, 2, 3, 2, 1]);
        assert_eq!(strip.triangle_count(), 2);

        let fan = &model.meshes[1];
        assert_eq!(fan.indices, vec![0, 1, 3, 0, 3, 2]);

        // Both expansions keep a consistent counter-clockwise winding
        for mesh in &model.meshes {
            for normal in &mesh.normals {
                assert_eq!(*normal, [0.0, 0.0, 1.0]);
            }
        }
    }

    #[test]
    fn test_triangle_list_expansion() {
        assert_eq!(
            triangle_list(Mode::TriangleStrip, vec![4, 5, 6, 7, 8]),
            Some(vec![4, 5, 6, 7, 6, 5, 6, 7, 8])
        );
        assert_eq!(
            triangle_list(Mode::TriangleFan, vec![0, 1, 2, 3]),
            Some(vec![0, 1, 2, 0, 2, 3])
        );
        assert_eq!(triangle_list(Mode::Triangles, vec![2, 1, 0]), Some(vec![2, 1, 0]));

        // Too short to form a face
        assert_eq!(triangle_list(Mode::TriangleStrip, vec![0, 1]), Some(vec![]));
        assert_eq!(triangle_list(Mode::TriangleFan, vec![]), Some(vec![]));

        assert_eq!(triangle_list(Mode::Lines, vec![0, 1]), None);
        assert_eq!(triangle_list(Mode::Points, vec![0]), None);
    }

    #[test]
    fn test_invalid_document() {
        let result = load_gltf_slice(b"{ not gltf", &mut |_| {});
        assert!(matches!(result, Err(ViewerError::Gltf(_))));
    }
}
