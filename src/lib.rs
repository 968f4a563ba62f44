//! Stella 3D Viewer
//!
//! A real-time viewer for a single static glTF or OBJ model, with
//! first-person desktop and touch navigation and an edge-line overlay.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod ui;
pub mod wgpu_utils;

pub use app::ViewerApp;
pub use config::{Preferences, ViewerConfig};
pub use error::{Result, ViewerError};
