// Configuration module
// Public interface for model, device, and loader-selection configuration

mod device;
mod model;
mod settings;

pub use device::{Device, DeviceConfig, ExecutionTarget};
pub use model::{Architecture, Dtype, ModelConfig};
pub use settings::LoaderSettings;
