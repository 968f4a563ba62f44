//! # User Interface Module
//!
//! Dear ImGui overlay drawn after the scene.
//!
//! - [`UiManager`] - ImGui context, winit platform glue and wgpu renderer
//! - [`panel`] - The controls card, disclaimer and info window
//!
//! While ImGui wants the mouse or keyboard, the app keeps those events away
//! from the camera handlers.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{viewer_panels, LoadStatus, UiState};
