//! Viewer configuration and persisted user preferences.
//!
//! Both are TOML. Every field has a default, so an empty or partial file is
//! valid and a missing config file simply means "use the defaults".

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, ViewerError},
    gfx::scene::{edges::EdgeStyle, lighting::Lighting},
    input::{DesktopSettings, InputModePreference, TouchSettings},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model to load at startup (.glb, .gltf or .obj)
    pub path: PathBuf,
    /// Directory the model file name is resolved against, if set
    pub asset_base: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/stella-3d-reference.glb"),
            asset_base: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Stella 3D Viewer".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

/// Startup pose and projection; angles in radians except `fov`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [-1.23, 23.44, 50.22],
            yaw: 0.0,
            pitch: (-0.5f32).asin(),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub input_mode: InputModePreference,
    pub desktop: DesktopSettings,
    pub touch: TouchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model: ModelConfig,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub edges: EdgeStyle,
    pub lighting: Lighting,
    /// Clear colour, 0xRRGGBB
    pub background: u32,
    pub preferences_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            edges: EdgeStyle::default(),
            lighting: Lighting::default(),
            background: 0x1a1a1a,
            preferences_path: PathBuf::from("stella-viewer-preferences.toml"),
        }
    }
}

impl ViewerConfig {
    /// Reads a config file; there is no fallback when an explicit path is unreadable
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;
        let config = toml::from_str(&content).map_err(|source| ViewerError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults when `path` is `None`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line values win over the file
    pub fn apply_overrides(
        &mut self,
        model: Option<PathBuf>,
        asset_base: Option<PathBuf>,
        input_mode: Option<InputModePreference>,
    ) {
        if let Some(model) = model {
            self.model.path = model;
        }
        if asset_base.is_some() {
            self.model.asset_base = asset_base;
        }
        if let Some(input_mode) = input_mode {
            self.controls.input_mode = input_mode;
        }
    }

    /// Model location after applying the asset base directory
    pub fn model_path(&self) -> PathBuf {
        crate::gfx::loader::resolve_model_path(&self.model.path, self.model.asset_base.as_deref())
    }
}

/// Settings the user changes from inside the viewer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub invert_mouse: bool,
}

impl Preferences {
    /// Missing file yields the defaults; a malformed one is an error
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ViewerError::Config {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ViewerError::io(path, e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ViewerError::io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| ViewerError::io(path, e))?;
        log::debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}
