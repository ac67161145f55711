// Device configuration and placement
//
// A DeviceConfig is a request (what the user asked for); a Device is what
// resolution produced. CUDA needs the `cuda` feature, Metal needs macOS;
// `auto` picks the best target available in this build and never fails.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::LoadError;

/// Requested execution target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionTarget {
    Auto,
    Cpu,
    Cuda,
    Metal,
}

impl Default for ExecutionTarget {
    fn default() -> Self {
        ExecutionTarget::Auto
    }
}

/// Target compute-device placement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub target: ExecutionTarget,

    /// Accelerator ordinal (ignored for cpu)
    #[serde(default)]
    pub ordinal: usize,
}

impl DeviceConfig {
    pub fn new(target: ExecutionTarget) -> Self {
        Self { target, ordinal: 0 }
    }

    /// Resolve the request into a concrete device handle
    pub fn resolve(&self) -> Result<Device, LoadError> {
        let device = match self.target {
            ExecutionTarget::Cpu => Device::Cpu,

            ExecutionTarget::Cuda => {
                #[cfg(feature = "cuda")]
                {
                    Device::Cuda(self.ordinal)
                }
                #[cfg(not(feature = "cuda"))]
                {
                    return Err(LoadError::DeviceUnavailable(format!(
                        "cuda:{} requested but this build has no CUDA support",
                        self.ordinal
                    )));
                }
            }

            ExecutionTarget::Metal => {
                #[cfg(target_os = "macos")]
                {
                    Device::Metal(self.ordinal)
                }
                #[cfg(not(target_os = "macos"))]
                {
                    return Err(LoadError::DeviceUnavailable(format!(
                        "metal:{} requested on a non-macOS host",
                        self.ordinal
                    )));
                }
            }

            ExecutionTarget::Auto => Device::best_available(),
        };

        debug!("resolved device config {:?} to {}", self.target, device);
        Ok(device)
    }
}

/// A concrete compute target onto which parameters are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl Device {
    /// Best target this build can satisfy, falling back to CPU
    pub fn best_available() -> Device {
        if cfg!(feature = "cuda") {
            Device::Cuda(0)
        } else if cfg!(target_os = "macos") {
            Device::Metal(0)
        } else {
            Device::Cpu
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(n) => write!(f, "cuda:{n}"),
            Device::Metal(n) => write!(f, "metal:{n}"),
        }
    }
}

impl FromStr for Device {
    type Err = LoadError;

    /// Parse "cpu", "cuda:N" / "cuda", "metal:N" / "metal"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, ordinal) = match s.split_once(':') {
            Some((kind, ord)) => {
                let ordinal: usize = ord.parse().map_err(|_| {
                    LoadError::Configuration(format!("bad device ordinal in {s:?}"))
                })?;
                (kind, ordinal)
            }
            None => (s, 0),
        };
        match kind {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(ordinal)),
            "metal" => Ok(Device::Metal(ordinal)),
            _ => Err(LoadError::Configuration(format!(
                "unknown device {s:?} (expected cpu, cuda[:N] or metal[:N])"
            ))),
        }
    }
}
