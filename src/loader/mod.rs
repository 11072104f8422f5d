//! Model loading.
//!
//! [`AssetLoader`] turns a URL into a [`SceneNode`] tree or a
//! [`LoadError`]. [`GltfLoader`] is the production implementation;
//! [`LoadWorker`] runs any loader on a background thread so the event loop
//! never blocks on disk or network.

/// glTF / GLB loading into scene nodes.
pub mod gltf_loader;
/// Background load thread.
pub mod worker;

use std::fmt;
use std::sync::Arc;

pub use gltf_loader::GltfLoader;
pub use worker::{LoadOutcome, LoadRequest, LoadWorker};
use crate::options::AssetOptions;
use crate::scene::SceneNode;

/// Why a model could not be loaded. Every variant is recovered by showing
/// the procedural stand-in.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// Nothing exists at the URL.
    NotFound(String),
    /// Reading the file failed.
    Io(Arc<std::io::Error>),
    /// Fetching a remote URL failed, or remote loading is not compiled in.
    Network(String),
    /// The bytes are not a valid glTF asset.
    Parse(String),
    /// The asset parsed but holds no triangle meshes.
    NoGeometry(String),
    /// The URL does not name a `glb`/`gltf` file.
    UnsupportedExtension(String),
    /// The loader panicked while reading the URL.
    LoaderPanicked(String),
    /// The load worker is no longer running.
    WorkerStopped,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(url) => write!(f, "model not found: {url}"),
            Self::Io(e) => write!(f, "model read failed: {e}"),
            Self::Network(msg) => write!(f, "model download failed: {msg}"),
            Self::Parse(msg) => write!(f, "invalid glTF: {msg}"),
            Self::NoGeometry(url) => {
                write!(f, "model has no triangle meshes: {url}")
            }
            Self::UnsupportedExtension(ext) => {
                write!(f, "unsupported model extension: {ext:?}")
            }
            Self::LoaderPanicked(msg) => write!(f, "model loader panicked: {msg}"),
            Self::WorkerStopped => write!(f, "model load worker is not running"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

/// Something that can turn a model URL into a scene subtree.
///
/// Implementations run on the load worker thread.
pub trait AssetLoader: Send + Sync {
    /// Load the model at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] describing why no scene could be produced.
    fn load(&self, url: &str) -> Result<SceneNode, LoadError>;
}

/// Model file formats the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Binary glTF.
    Glb,
    /// JSON glTF with external or embedded buffers.
    Gltf,
}

impl ModelFormat {
    /// Parse a file extension, ignoring case and a leading dot.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if ext.eq_ignore_ascii_case("glb") {
            Some(Self::Glb)
        } else if ext.eq_ignore_ascii_case("gltf") {
            Some(Self::Gltf)
        } else {
            None
        }
    }
}

/// Resolves the model URL for each health state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCatalog {
    root: String,
    extension: String,
}

impl AssetCatalog {
    /// File stem of the healthy model.
    pub const HEALTHY_STEM: &'static str = "human_kidney";
    /// File stem of the polycystic model.
    pub const PATHOLOGICAL_STEM: &'static str = "polycystic_kidney";

    /// Catalog rooted at the configured asset location.
    #[must_use]
    pub fn new(options: &AssetOptions) -> Self {
        Self {
            root: options.root.trim_end_matches('/').to_owned(),
            extension: options.extension.trim_start_matches('.').to_owned(),
        }
    }

    /// `<root>/human_kidney.<ext>` or `<root>/polycystic_kidney.<ext>`.
    #[must_use]
    pub fn url_for(&self, healthy: bool) -> String {
        let stem = if healthy {
            Self::HEALTHY_STEM
        } else {
            Self::PATHOLOGICAL_STEM
        };
        if self.root.is_empty() {
            format!("{stem}.{}", self.extension)
        } else {
            format!("{}/{stem}.{}", self.root, self.extension)
        }
    }

    /// Format of the configured extension.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnsupportedExtension`] for anything other than
    /// `glb` or `gltf`.
    pub fn format(&self) -> Result<ModelFormat, LoadError> {
        ModelFormat::from_extension(&self.extension).ok_or_else(|| {
            LoadError::UnsupportedExtension(self.extension.clone())
        })
    }
}
