// Safetensors loader - the default loader variant
//
// Initializes a model from its config and fills it from a single-file
// safetensors checkpoint. Validation is two-phase: every checkpoint tensor
// is checked (dtype, name mapping, shape) before the first parameter write,
// so a failing load leaves the model exactly as it was.

use ndarray::{ArrayD, IxDyn};
use safetensors::{Dtype as StDtype, SafeTensors};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::remap::{PrefixStrip, WeightRemapper};
use super::ModelLoader;
use crate::config::{Device, DeviceConfig, ModelConfig};
use crate::error::LoadError;
use crate::model::Model;

/// Default loader: safetensors checkpoints with name remapping
pub struct SafetensorsLoader {
    checkpoint_dir: Option<PathBuf>,
    remapper: Box<dyn WeightRemapper>,
}

impl SafetensorsLoader {
    /// Create a loader resolving relative checkpoint paths against
    /// `checkpoint_dir`. The default remapping strips the "model." root
    /// module prefix HuggingFace exports use.
    pub fn new(checkpoint_dir: Option<PathBuf>) -> Self {
        Self {
            checkpoint_dir,
            remapper: Box::new(PrefixStrip::new("model.")),
        }
    }

    /// Replace the name-remapping scheme
    pub fn with_remapper(mut self, remapper: Box<dyn WeightRemapper>) -> Self {
        self.remapper = remapper;
        self
    }

    fn resolve_checkpoint(&self, model_config: &ModelConfig) -> Result<PathBuf, LoadError> {
        let checkpoint = model_config.checkpoint.as_ref().ok_or_else(|| {
            LoadError::Configuration("model config has no checkpoint path".to_string())
        })?;

        let path = match (&self.checkpoint_dir, checkpoint.is_relative()) {
            (Some(dir), true) => dir.join(checkpoint),
            _ => checkpoint.clone(),
        };

        if !path.exists() {
            return Err(LoadError::CheckpointNotFound { path });
        }
        Ok(path)
    }
}

impl ModelLoader for SafetensorsLoader {
    fn load_model(
        &self,
        model_config: &ModelConfig,
        device_config: &DeviceConfig,
    ) -> Result<Model, LoadError> {
        let device = device_config.resolve()?;
        Model::initialized(model_config, device)
    }

    fn load_weights(
        &self,
        model_config: &ModelConfig,
        model: &mut Model,
        target_device: &Device,
    ) -> Result<(), LoadError> {
        let path = self.resolve_checkpoint(model_config)?;
        info!("loading weights from {}", path.display());

        let bytes = std::fs::read(&path)?;
        let checkpoint =
            SafeTensors::deserialize(&bytes).map_err(|e| LoadError::MalformedCheckpoint {
                path: path.clone(),
                message: e.to_string(),
            })?;

        // Phase 1: map, validate, and decode every checkpoint tensor up front.
        // Nothing is written until the whole checkpoint has passed, so a
        // failing load leaves the model exactly as it was.
        let mut pending: Vec<(String, ArrayD<f32>)> = Vec::new();
        let mut skipped = Vec::new();
        for (checkpoint_name, view) in checkpoint.tensors() {
            if view.dtype() != StDtype::F32 {
                return Err(LoadError::Configuration(format!(
                    "checkpoint tensor {checkpoint_name:?} has dtype {:?}; only f32 checkpoints are handled here, casting belongs to the conversion backend",
                    view.dtype()
                )));
            }

            let target = self.remapper.remap(&checkpoint_name);
            let parameter = match model.parameter(&target) {
                Some(parameter) => parameter,
                None if model_config.strict => {
                    return Err(LoadError::UnmappedParameter(checkpoint_name));
                }
                None => {
                    skipped.push(checkpoint_name);
                    continue;
                }
            };

            if parameter.shape() != view.shape() {
                return Err(LoadError::ShapeMismatch {
                    name: checkpoint_name,
                    checkpoint: view.shape().to_vec(),
                    model: parameter.shape().to_vec(),
                });
            }

            let data = view.data();
            let numel: usize = view.shape().iter().product();
            if data.len() != numel * 4 {
                return Err(LoadError::MalformedCheckpoint {
                    path: path.clone(),
                    message: format!(
                        "tensor {checkpoint_name:?} has {} data bytes for {} elements",
                        data.len(),
                        numel
                    ),
                });
            }

            let values: Vec<f32> = data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            let array = ArrayD::from_shape_vec(IxDyn(view.shape()), values).map_err(|e| {
                LoadError::MalformedCheckpoint {
                    path: path.clone(),
                    message: format!("tensor {checkpoint_name:?}: {e}"),
                }
            })?;

            pending.push((target, array));
        }

        // Phase 2: infallible writes, then relocate everything onto the
        // target device
        let loaded = pending.len();
        for (target, array) in pending {
            // Presence and shape were validated in phase 1
            if let Some(parameter) = model.parameter_mut(&target) {
                parameter.assign(array, *target_device);
            }
        }
        model.relocate(*target_device);

        for name in &skipped {
            warn!("checkpoint tensor {name:?} has no matching model parameter, skipped");
        }
        let untouched = model.len().saturating_sub(loaded);
        if untouched > 0 {
            debug!("{untouched} model parameters not present in checkpoint");
        }
        info!(
            "loaded {loaded} tensors from {} onto {target_device}",
            path.display()
        );
        Ok(())
    }
}
