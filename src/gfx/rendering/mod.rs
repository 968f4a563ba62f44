//! Rendering pipelines and the frame loop

pub mod pipeline_manager;
pub mod render_engine;

pub use pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
pub use render_engine::RenderEngine;
