// Loader variants and dispatch
//
// The serving layer picks a variant once, at configuration time, via
// LoaderKind; implementations are never swapped in after the fact.

mod megatron;
mod remap;
mod safetensors;

pub use megatron::{ConversionBackend, MegatronLoader};
pub use remap::{IdentityRemap, PrefixStrip, WeightRemapper};
pub use safetensors::SafetensorsLoader;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::{Device, DeviceConfig, LoaderSettings, ModelConfig};
use crate::error::LoadError;
use crate::model::Model;

/// Capability contract every loader variant fulfils.
///
/// Loaders are stateless between calls and safe to share across threads;
/// `load_weights` takes the model exclusively, so concurrent loads of the
/// same instance are ruled out while loads of distinct models are free to
/// run in parallel.
pub trait ModelLoader: Send + Sync {
    /// Construct a runnable model consistent with `model_config`, parameters
    /// initialized (not necessarily trained) and placed per `device_config`.
    fn load_model(
        &self,
        model_config: &ModelConfig,
        device_config: &DeviceConfig,
    ) -> Result<Model, LoadError>;

    /// Load checkpoint weights into `model` in place, remapping checkpoint
    /// tensor names to model parameter names and relocating the parameters
    /// onto `target_device`. Idempotent for identical inputs, and leaves the
    /// model untouched on any failure.
    fn load_weights(
        &self,
        model_config: &ModelConfig,
        model: &mut Model,
        target_device: &Device,
    ) -> Result<(), LoadError>;
}

/// Loader variants selectable by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Safetensors,
    Megatron,
}

impl Default for LoaderKind {
    fn default() -> Self {
        LoaderKind::Safetensors
    }
}

impl std::fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderKind::Safetensors => f.write_str("safetensors"),
            LoaderKind::Megatron => f.write_str("megatron"),
        }
    }
}

impl FromStr for LoaderKind {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safetensors" => Ok(LoaderKind::Safetensors),
            "megatron" => Ok(LoaderKind::Megatron),
            _ => Err(LoadError::Configuration(format!(
                "unknown loader {s:?} (expected safetensors or megatron)"
            ))),
        }
    }
}

/// Build the loader selected by `settings`.
///
/// The Megatron variant comes back unwired; integrations that own a
/// conversion backend construct `MegatronLoader::with_backend` directly
/// instead of going through settings.
pub fn loader_for(settings: &LoaderSettings) -> Box<dyn ModelLoader> {
    match settings.loader {
        LoaderKind::Safetensors => {
            Box::new(SafetensorsLoader::new(settings.checkpoint_dir.clone()))
        }
        LoaderKind::Megatron => Box::new(MegatronLoader::unwired()),
    }
}
