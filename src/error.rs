//! Error types for the viewer library

use std::path::PathBuf;

/// Errors produced while loading assets or configuration
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode glTF asset: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("failed to load OBJ asset: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("model contains no triangle meshes")]
    EmptyModel,
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
