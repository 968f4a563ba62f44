//! # Edge Overlay
//!
//! Feature-edge extraction and the line geometry drawn over the loaded model.
//!
//! An edge is kept when it lies on a mesh boundary or when the two faces
//! sharing it meet at an angle of at least `threshold_angle` degrees. With the
//! default 1° threshold this yields every crease of a faceted CAD-style model
//! while hiding the diagonals of flat quads.

use std::collections::HashMap;

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Transform, Vector3};
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

use super::vertex::LineVertex;
use crate::gfx::loader::ModelData;

/// Vertices closer than `1 / WELD_PRECISION` on every axis are treated as one
const WELD_PRECISION: f64 = 1e4;

/// Appearance of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyle {
    pub enabled: bool,
    /// Minimum dihedral angle in degrees for an interior edge to be drawn
    pub threshold_angle: f32,
    /// 0xRRGGBB
    pub color: u32,
    pub opacity: f32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_angle: 1.0,
            color: 0x1c1c1c,
            opacity: 0.9,
        }
    }
}

impl EdgeStyle {
    /// Normalized RGBA colour handed to the edge shader
    pub fn rgba(&self) -> [f32; 4] {
        let [r, g, b] = crate::gfx::scene::lighting::linear_rgb_from_hex(self.color);
        [r, g, b, self.opacity.clamp(0.0, 1.0)]
    }
}

type WeldKey = [i64; 3];

/// Quantized in f64, rounding halves toward positive infinity
fn weld_key(p: Vector3<f32>) -> WeldKey {
    let quantize = |v: f32| (f64::from(v) * WELD_PRECISION + 0.5).floor() as i64;
    [quantize(p.x), quantize(p.y), quantize(p.z)]
}

struct EdgeRecord {
    index0: usize,
    index1: usize,
    normal: Vector3<f32>,
    live: bool,
}

fn face_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Vector3<f32> {
    let normal = (c - b).cross(a - b);
    let length_sq = normal.magnitude2();
    if length_sq > 0.0 {
        normal / length_sq.sqrt()
    } else {
        Vector3::new(0.0, 0.0, 0.0)
    }
}

/// Extracts boundary and crease edges of an indexed triangle mesh.
///
/// When `indices` is empty the positions are read as a plain triangle list.
/// Segments shared by two faces come first, in discovery order, followed by
/// boundary segments in the order they were first seen.
pub fn extract_edges(
    positions: &[[f32; 3]],
    indices: &[u32],
    threshold_angle_deg: f32,
) -> Vec<[Point3<f32>; 2]> {
    let threshold_dot = threshold_angle_deg.to_radians().cos();
    let index_count = if indices.is_empty() {
        positions.len()
    } else {
        indices.len()
    };
    let vertex_at = |i: usize| -> Option<usize> {
        let index = if indices.is_empty() { i } else { indices[i] as usize };
        (index < positions.len()).then_some(index)
    };

    let mut segments = Vec::new();
    let mut records: Vec<EdgeRecord> = Vec::new();
    let mut lookup: HashMap<(WeldKey, WeldKey), usize> = HashMap::new();

    for start in (0..index_count.saturating_sub(2)).step_by(3) {
        let (Some(i0), Some(i1), Some(i2)) =
            (vertex_at(start), vertex_at(start + 1), vertex_at(start + 2))
        else {
            continue;
        };
        let corner_indices = [i0, i1, i2];
        let corners = corner_indices.map(|i| Vector3::from(positions[i]));
        let normal = face_normal(corners[0], corners[1], corners[2]);
        let keys = corners.map(weld_key);

        if keys[0] == keys[1] || keys[1] == keys[2] || keys[2] == keys[0] {
            continue;
        }

        for j in 0..3 {
            let next = (j + 1) % 3;
            let forward = (keys[j], keys[next]);
            let reverse = (keys[next], keys[j]);

            let shared = lookup
                .get(&reverse)
                .copied()
                .filter(|&record| records[record].live);

            if let Some(record) = shared {
                if normal.dot(records[record].normal) <= threshold_dot {
                    segments.push([Point3::from_vec(corners[j]), Point3::from_vec(corners[next])]);
                }
                records[record].live = false;
            } else if !lookup.contains_key(&forward) {
                lookup.insert(forward, records.len());
                records.push(EdgeRecord {
                    index0: corner_indices[j],
                    index1: corner_indices[next],
                    normal,
                    live: true,
                });
            }
        }
    }

    segments.extend(records.iter().filter(|r| r.live).map(|r| {
        [
            Point3::from(positions[r.index0]),
            Point3::from(positions[r.index1]),
        ]
    }));
    segments
}

/// World-space line segments for the whole model, plus their GPU buffer
pub struct EdgeOverlay {
    pub style: EdgeStyle,
    vertices: Vec<LineVertex>,
    vertex_buffer: Option<wgpu::Buffer>,
    dirty: bool,
}

impl EdgeOverlay {
    pub fn new(style: EdgeStyle) -> Self {
        Self {
            style,
            vertices: Vec::new(),
            vertex_buffer: None,
            dirty: false,
        }
    }

    /// Replaces every segment with the edges of `model`
    pub fn rebuild(&mut self, model: &ModelData) {
        self.clear();

        if !self.style.enabled {
            return;
        }

        for mesh in &model.meshes {
            let edges = extract_edges(&mesh.positions, &mesh.indices, self.style.threshold_angle);
            self.append_transformed(&edges, &mesh.world);
        }

        log::debug!("Edge overlay rebuilt with {} segments", self.segment_count());
    }

    fn append_transformed(&mut self, edges: &[[Point3<f32>; 2]], world: &Matrix4<f32>) {
        self.vertices.reserve(edges.len() * 2);
        for segment in edges {
            for point in segment {
                let p = world.transform_point(*point);
                self.vertices.push(LineVertex {
                    position: [p.x, p.y, p.z],
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.vertex_buffer = None;
        self.dirty = true;
    }

    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex_buffer.as_ref()
    }

    /// Number of vertices to draw, zero until uploaded
    pub fn vertex_count(&self) -> u32 {
        if self.vertex_buffer.is_some() {
            self.vertices.len() as u32
        } else {
            0
        }
    }

    /// Creates the vertex buffer after a rebuild; no-op when nothing changed
    pub fn upload(&mut self, device: &wgpu::Device) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        if self.vertices.is_empty() {
            self.vertex_buffer = None;
            return;
        }

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Edge Overlay Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }
}
