// Modelload - model loading and checkpoint weight mapping for LLM serving
//
// A serving stack picks one loader variant at configuration time (no runtime
// substitution): the safetensors default, or the Megatron variant with an
// injected conversion backend.

pub mod config;
pub mod error;
pub mod loaders;
pub mod model;

pub use config::{Device, DeviceConfig, ExecutionTarget, LoaderSettings, ModelConfig};
pub use error::LoadError;
pub use loaders::{loader_for, LoaderKind, ModelLoader};
pub use model::Model;
