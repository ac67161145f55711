// Megatron loader - checkpoint conversion delegated to an external backend
//
// The Megatron weight layout (name translation, sharding, dtype casting) is
// owned by a separate conversion system and is not reimplemented here. The
// backend is injected once, at startup; an unwired loader declares the
// capability and refuses all work with NotImplemented.

use std::sync::Arc;
use tracing::{info, warn};

use super::ModelLoader;
use crate::config::{Device, DeviceConfig, ModelConfig};
use crate::error::LoadError;
use crate::model::Model;

/// External conversion system the Megatron loader delegates to
pub trait ConversionBackend: Send + Sync {
    /// Human-readable backend identity, for load-time logs
    fn name(&self) -> &str;

    /// Build a model instance per the config, placed per `device_config`
    fn build_model(
        &self,
        model_config: &ModelConfig,
        device_config: &DeviceConfig,
    ) -> Result<Model, LoadError>;

    /// Map converted checkpoint weights into `model` on `target_device`
    fn map_weights(
        &self,
        model_config: &ModelConfig,
        model: &mut Model,
        target_device: &Device,
    ) -> Result<(), LoadError>;
}

/// Loader variant backed by a Megatron checkpoint conversion system
pub struct MegatronLoader {
    backend: Option<Arc<dyn ConversionBackend>>,
}

impl MegatronLoader {
    /// A loader with no conversion backend. Both operations fail with
    /// NotImplemented until one is injected.
    pub fn unwired() -> Self {
        warn!("megatron loader constructed without a conversion backend");
        Self { backend: None }
    }

    /// A loader delegating to `backend`
    pub fn with_backend(backend: Arc<dyn ConversionBackend>) -> Self {
        info!("megatron loader wired to backend {:?}", backend.name());
        Self {
            backend: Some(backend),
        }
    }

    fn backend(&self) -> Result<&Arc<dyn ConversionBackend>, LoadError> {
        self.backend.as_ref().ok_or(LoadError::NotImplemented(
            "megatron loader has no conversion backend; inject one at startup",
        ))
    }
}

impl ModelLoader for MegatronLoader {
    fn load_model(
        &self,
        model_config: &ModelConfig,
        device_config: &DeviceConfig,
    ) -> Result<Model, LoadError> {
        self.backend()?.build_model(model_config, device_config)
    }

    fn load_weights(
        &self,
        model_config: &ModelConfig,
        model: &mut Model,
        target_device: &Device,
    ) -> Result<(), LoadError> {
        self.backend()?.map_weights(model_config, model, target_device)
    }
}
