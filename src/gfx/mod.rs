//! # Graphics Module
//!
//! All graphics-related functionality of the viewer: camera, asset loading,
//! scene management, GPU resources, and the render loop.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - First-person camera driven by desktop or touch input
//! - **Model Loading** ([`loader`]) - glTF and OBJ decoding into CPU-side mesh data
//! - **Scene Management** ([`scene`]) - Objects, light rig, and the edge overlay
//! - **Rendering Pipeline** ([`rendering`]) - Lit meshes plus blended edge lines
//! - **Resource Management** ([`resources`]) - Depth buffer and uniform bindings
//!
//! Loading never touches the GPU: a decoded [`loader::ModelData`] is handed to
//! [`scene::Scene::set_model`] and uploaded on the next frame.

pub mod camera;
pub mod loader;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::FirstPersonCamera;
pub use rendering::render_engine::RenderEngine;
