//! Centralized viewer options with TOML preset support.
//!
//! Every tunable (camera, lights, background, model source, key bindings)
//! lives here. `Options::default()` is the built-in configuration; the
//! browser host uses it as-is, the desktop host can overlay a TOML file.

mod camera;
mod display;
mod keybindings;
mod lighting;

use std::path::Path;

pub use camera::CameraOptions;
pub use display::{parse_hex_color, DisplayOptions};
pub use keybindings::KeybindingOptions;
pub use lighting::LightingOptions;
use serde::{Deserialize, Serialize};

use crate::error::ViewerError;
use crate::loader::ModelSource;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[lighting]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Camera projection, start-up pose, and orbit parameters.
    pub camera: CameraOptions,
    /// Light rig.
    pub lighting: LightingOptions,
    /// Background and surface settings.
    pub display: DisplayOptions,
    /// Which model to load.
    pub model: ModelSource,
    /// Keyboard binding options.
    pub keybindings: KeybindingOptions,
}

impl Options {
    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OptionsParse`] on malformed TOML.
    pub fn from_toml(text: &str) -> Result<Self, ViewerError> {
        let mut opts: Self = toml::from_str(text)
            .map_err(|e| ViewerError::OptionsParse(e.to_string()))?;
        opts.keybindings.rebuild_reverse_map();
        Ok(opts)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Io`] if the file cannot be read and
    /// [`ViewerError::OptionsParse`] on malformed TOML.
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let content = std::fs::read_to_string(path).map_err(ViewerError::Io)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OptionsParse`] if serialization fails and
    /// [`ViewerError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ViewerError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewerError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ViewerError::Io)?;
        }
        std::fs::write(path, content).map_err(ViewerError::Io)
    }
}
