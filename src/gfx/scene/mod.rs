//! # Scene Management Module
//!
//! Holds everything drawn in a frame: the loaded model's objects, the light
//! rig, and the edge overlay derived from the model.
//!
//! ## Key Components
//!
//! - [`Scene`] - The scene container, owner of the camera manager
//! - [`Object`] - One uploaded mesh with its world transform and base colour
//! - [`EdgeOverlay`] - Crease and boundary lines drawn over the meshes
//! - [`Lighting`] - Ambient plus directional studio lights
//! - [`Vertex3D`] / [`LineVertex`] - GPU vertex formats
//!
//! ## Model Swaps
//!
//! [`Scene::set_model`] replaces the objects wholesale, centers the model
//! on the origin and rebuilds the overlay. GPU buffers are created later by
//! [`Scene::init_gpu_resources`], so the swap itself never touches wgpu.

pub mod bounds;
pub mod edges;
pub mod lighting;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use bounds::Aabb;
pub use edges::{extract_edges, EdgeOverlay, EdgeStyle};
pub use lighting::{AmbientLight, DirectionalLight, Lighting};
pub use object::{DrawObject, Object};
pub use scene::{Scene, SceneStatistics};
pub use vertex::{LineVertex, Vertex3D};
