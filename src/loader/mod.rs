//! Model loading.
//!
//! Loading is one async operation per model: fetch the bytes through an
//! [`AssetFetcher`], parse them, and resolve to a [`SceneNode`]. Transfer
//! progress is reported separately, in order, to a [`ProgressObserver`].
//! Hosts forward both to the UI thread as [`LoadEvent`]s.

mod fetch;
mod gltf;
mod obj;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::fetch::{AssetFetcher, MemoryFetcher};
#[cfg(not(target_arch = "wasm32"))]
pub use self::fetch::{FileFetcher, NativeFetcher};
#[cfg(any(feature = "viewer", all(feature = "web", target_arch = "wasm32")))]
pub use self::fetch::HttpFetcher;
pub use self::gltf::{CompressedPrimitive, DecodedMesh, MeshDecoder, DRACO_EXTENSION};
use crate::progress::LoadProgress;
use crate::scene::SceneNode;

/// Which model to load and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ModelSource {
    /// Binary (`.glb`) or self-contained (`.gltf` with data URIs) glTF.
    Gltf {
        /// Path or URL of the model file.
        path: String,
        /// Path of the mesh-compression decoder asset, when the model uses
        /// compressed primitives.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decoder: Option<String>,
    },
    /// Wavefront OBJ geometry with its MTL material library.
    Obj {
        /// Path or URL of the `.obj` file.
        obj: String,
        /// Path or URL of the `.mtl` file.
        mtl: String,
    },
}

impl Default for ModelSource {
    fn default() -> Self {
        Self::Gltf {
            path: "resources/horndølbrua_2.glb".into(),
            decoder: None,
        }
    }
}

impl ModelSource {
    /// Path whose transfer progress is reported.
    #[must_use]
    pub fn primary_path(&self) -> &str {
        match self {
            Self::Gltf { path, .. } => path,
            Self::Obj { obj, .. } => obj,
        }
    }
}

/// Why a model failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Bytes could not be fetched (I/O, HTTP status, network).
    Transfer(String),
    /// Bytes arrived but could not be parsed.
    Parse(String),
    /// The model parsed but holds no triangles.
    Empty,
    /// The model uses mesh compression and no decoder is registered.
    UnsupportedCompression(String),
    /// A decoder asset is configured but no decoder is registered to use it.
    MissingDecoder(String),
    /// The registered decoder rejected its asset.
    Decoder(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer(msg) => write!(f, "failed to fetch model: {msg}"),
            Self::Parse(msg) => write!(f, "failed to parse model: {msg}"),
            Self::Empty => f.write_str("model contains no geometry"),
            Self::UnsupportedCompression(ext) => {
                write!(f, "model requires {ext} but no mesh decoder is configured")
            }
            Self::MissingDecoder(asset) => {
                write!(f, "mesh decoder asset {asset} is set but no mesh decoder is registered")
            }
            Self::Decoder(msg) => write!(f, "mesh decoder failed: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Something that wants transfer progress.
pub trait ProgressObserver {
    /// Called once per received chunk, in order.
    fn on_progress(&mut self, progress: LoadProgress);
}

impl<F: FnMut(LoadProgress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: LoadProgress) {
        self(progress);
    }
}

/// What a host hands back to the UI thread while a load runs.
#[derive(Debug)]
pub enum LoadEvent {
    /// A transfer progress tick.
    Progress(LoadProgress),
    /// The load finished.
    Finished(Result<SceneNode, LoadError>),
}

/// Fetches and parses models.
#[derive(Default)]
pub struct ModelLoader {
    decoder: Option<Box<dyn MeshDecoder>>,
}

impl fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLoader")
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

impl ModelLoader {
    /// Loader without a mesh-compression decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the decoder used for compressed glTF primitives.
    #[must_use]
    pub fn with_mesh_decoder(mut self, decoder: Box<dyn MeshDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Fetch and parse `source`.
    ///
    /// For OBJ the material library is fetched and parsed first; only the
    /// geometry transfer is reported to `observer`.
    ///
    /// # Errors
    ///
    /// [`LoadError::Transfer`] if a file cannot be fetched,
    /// [`LoadError::Parse`] if it cannot be parsed, [`LoadError::Empty`] if
    /// it holds no triangles, and [`LoadError::UnsupportedCompression`] for
    /// compressed glTF without a decoder. A glTF source naming a decoder
    /// asset hands it to the registered decoder first, failing with
    /// [`LoadError::MissingDecoder`] or [`LoadError::Decoder`].
    pub async fn load<F: AssetFetcher>(
        &self,
        fetcher: &F,
        source: &ModelSource,
        observer: &mut dyn ProgressObserver,
    ) -> Result<SceneNode, LoadError> {
        log::info!("loading model {}", source.primary_path());
        let root = match source {
            ModelSource::Gltf { path, decoder } => {
                if let Some(asset) = decoder {
                    self.configure_decoder(asset)?;
                }
                let bytes = fetcher.fetch(path, observer).await?;
                gltf::parse_gltf(&bytes, self.decoder.as_deref(), file_stem(path))?
            }
            ModelSource::Obj { obj, mtl } => {
                let materials = fetcher.fetch(mtl, &mut |_: LoadProgress| {}).await?;
                let library = obj::MaterialLibrary::parse(&materials)?;
                let geometry = fetcher.fetch(obj, observer).await?;
                obj::parse_obj(&geometry, &library, file_stem(obj))?
            }
        };

        let (vertices, triangles) = root.stats();
        if triangles == 0 {
            return Err(LoadError::Empty);
        }
        log::info!("model loaded: {vertices} vertices, {triangles} triangles");
        Ok(root)
    }

    fn configure_decoder(&self, asset: &str) -> Result<(), LoadError> {
        let decoder = self
            .decoder
            .as_deref()
            .ok_or_else(|| LoadError::MissingDecoder(asset.to_owned()))?;
        log::debug!("mesh decoder asset: {asset}");
        decoder
            .configure(asset)
            .map_err(|e| LoadError::Decoder(format!("{asset}: {e}")))
    }
}

/// Load `source` with a default [`ModelLoader`].
///
/// # Errors
///
/// See [`ModelLoader::load`].
pub async fn load_model<F: AssetFetcher>(
    fetcher: &F,
    source: &ModelSource,
    observer: &mut dyn ProgressObserver,
) -> Result<SceneNode, LoadError> {
    ModelLoader::new().load(fetcher, source, observer).await
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    name.split_once('.').map_or(name, |(stem, _)| stem)
}
