// In-memory model: named parameter tensors with a device tag
//
// The map is ordered so iteration (and serialized checkpoints built from it)
// is deterministic. All storage is dense f32; dtype conversion belongs to the
// conversion backend, not here.

use ndarray::{ArrayD, IxDyn};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::{Device, ModelConfig};
use crate::error::LoadError;

/// A single named parameter tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    data: ArrayD<f32>,
    device: Device,
}

impl Parameter {
    pub fn zeros(shape: &[usize], device: Device) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
            device,
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Overwrite the tensor contents and move it to `device`.
    /// The caller must have validated the shape beforehand.
    pub fn assign(&mut self, data: ArrayD<f32>, device: Device) {
        debug_assert_eq!(self.data.shape(), data.shape());
        self.data = data;
        self.device = device;
    }

    pub fn relocate(&mut self, device: Device) {
        self.device = device;
    }
}

/// A caller-owned, mutable set of parameters making up one model instance
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    architecture: String,
    device: Device,
    parameters: BTreeMap<String, Parameter>,
}

impl Model {
    /// Build a model with zero-initialized parameters per the config's
    /// architecture template, placed on `device`.
    pub fn initialized(config: &ModelConfig, device: Device) -> Result<Self, LoadError> {
        config.validate()?;

        let mut parameters = BTreeMap::new();
        let mut total_elements: usize = 0;
        for (name, shape) in config.parameter_shapes() {
            total_elements += shape.iter().product::<usize>();
            parameters.insert(name, Parameter::zeros(&shape, device));
        }

        info!(
            "initialized {} model ({:?}): {} parameters, {} elements, device {}",
            config.architecture,
            config.dtype,
            parameters.len(),
            total_elements,
            device
        );

        Ok(Self {
            architecture: config.architecture.to_string(),
            device,
            parameters,
        })
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters.get_mut(name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Move every parameter (and the model itself) onto `device`
    pub fn relocate(&mut self, device: Device) {
        self.device = device;
        for parameter in self.parameters.values_mut() {
            parameter.relocate(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Architecture, Dtype};

    fn tiny_config() -> ModelConfig {
        ModelConfig {
            architecture: Architecture::Mistral,
            hidden_size: 4,
            num_layers: 1,
            num_heads: 2,
            intermediate_size: 8,
            vocab_size: 10,
            dtype: Dtype::F32,
            checkpoint: None,
            strict: false,
        }
    }

    // --- construction ---

    #[test]
    fn test_initialized_matches_template() {
        let config = tiny_config();
        let model = Model::initialized(&config, Device::Cpu).unwrap();
        assert_eq!(model.len(), config.parameter_shapes().len());
        assert_eq!(model.architecture(), "mistral");
        assert_eq!(model.device(), Device::Cpu);
    }

    #[test]
    fn test_initialized_parameters_are_zero() {
        let model = Model::initialized(&tiny_config(), Device::Cpu).unwrap();
        let embed = model.parameter("embed_tokens.weight").unwrap();
        assert_eq!(embed.shape(), &[10, 4]);
        assert!(embed.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_initialized_rejects_invalid_config() {
        let mut config = tiny_config();
        config.vocab_size = 0;
        assert!(Model::initialized(&config, Device::Cpu).is_err());
    }

    // --- mutation ---

    #[test]
    fn test_assign_overwrites_data_and_device() {
        let mut model = Model::initialized(&tiny_config(), Device::Cpu).unwrap();
        let norm = model.parameter_mut("norm.weight").unwrap();
        let new = ArrayD::from_shape_vec(IxDyn(&[4]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        norm.assign(new.clone(), Device::Cuda(0));
        let norm = model.parameter("norm.weight").unwrap();
        assert_eq!(norm.data(), &new);
        assert_eq!(norm.device(), Device::Cuda(0));
    }

    #[test]
    fn test_relocate_moves_all_parameters() {
        let mut model = Model::initialized(&tiny_config(), Device::Cpu).unwrap();
        model.relocate(Device::Cuda(1));
        assert_eq!(model.device(), Device::Cuda(1));
        assert!(model.parameters().all(|(_, p)| p.device() == Device::Cuda(1)));
    }

    #[test]
    fn test_clone_equality_tracks_state() {
        let model = Model::initialized(&tiny_config(), Device::Cpu).unwrap();
        let mut copy = model.clone();
        assert_eq!(model, copy);
        copy.parameter_mut("norm.weight")
            .unwrap()
            .relocate(Device::Cuda(0));
        assert_ne!(model, copy);
    }
}
