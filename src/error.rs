// Load error taxonomy
//
// Configuration errors are recoverable by the user fixing their config,
// checkpoint I/O may be retryable, shape/mapping errors mean the model and
// checkpoint are incompatible. Nothing here is recovered locally; errors
// propagate to the loader-dispatch call site.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The selected loader declares the capability but cannot fulfil it.
    /// The Megatron variant returns this until a conversion backend is
    /// wired in at startup.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The model configuration is invalid or unsupported.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The requested device topology cannot be satisfied in this build.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// No checkpoint exists at the resolved path.
    #[error("checkpoint not found: {}", path.display())]
    CheckpointNotFound { path: PathBuf },

    /// A checkpoint tensor disagrees with the model parameter's shape.
    #[error("shape mismatch for {name}: checkpoint {checkpoint:?} vs model {model:?}")]
    ShapeMismatch {
        name: String,
        checkpoint: Vec<usize>,
        model: Vec<usize>,
    },

    /// A checkpoint tensor has no corresponding model parameter (strict mode).
    #[error("checkpoint tensor {0:?} has no matching model parameter")]
    UnmappedParameter(String),

    /// Underlying I/O failure while reading a checkpoint.
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint file could not be parsed as safetensors.
    #[error("malformed checkpoint {}: {message}", path.display())]
    MalformedCheckpoint { path: PathBuf, message: String },
}

impl LoadError {
    /// Whether retrying the same call could plausibly succeed
    /// (transient store failures, as opposed to config/compat errors).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Io(_) | LoadError::CheckpointNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message_names_tensor_and_shapes() {
        let err = LoadError::ShapeMismatch {
            name: "model.embed_tokens.weight".to_string(),
            checkpoint: vec![32000, 4096],
            model: vec![32000, 2048],
        };
        let msg = err.to_string();
        assert!(msg.contains("model.embed_tokens.weight"));
        assert!(msg.contains("4096"));
        assert!(msg.contains("2048"));
    }

    #[test]
    fn test_io_errors_are_retryable_config_errors_are_not() {
        let io = LoadError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "store went away",
        ));
        assert!(io.is_retryable());

        let cfg = LoadError::Configuration("hidden_size must be nonzero".to_string());
        assert!(!cfg.is_retryable());

        let stub = LoadError::NotImplemented("no conversion backend");
        assert!(!stub.is_retryable());
    }
}
