// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles the depth buffer, uniform buffers, and bind groups for rendering.

pub mod global_bindings;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, EdgeUniform, GlobalUBO, UniformBindings};
pub use texture_resource::TextureResource;
