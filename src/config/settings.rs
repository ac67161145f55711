// Loader settings
// The configuration switch that selects which loader variant serves a model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::loaders::LoaderKind;

/// Framework-level loader selection, read from TOML, e.g.:
///
/// ```toml
/// loader = "safetensors"
/// checkpoint_dir = "/var/models/checkpoints"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Which loader variant to dispatch to
    #[serde(default)]
    pub loader: LoaderKind,

    /// Directory relative checkpoint paths are resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<PathBuf>,
}

impl LoaderSettings {
    pub fn from_toml_file(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            LoadError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}
