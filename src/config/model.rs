// Model configuration
//
// Accepts HuggingFace-style config.json field names via serde aliases, so a
// checkout of a model repository can be pointed at directly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// Supported architecture families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Llama,
    Qwen2,
    Mistral,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Llama => "llama",
            Architecture::Qwen2 => "qwen2",
            Architecture::Mistral => "mistral",
        }
    }

    /// Whether attention projection biases exist in this family
    fn has_attention_bias(&self) -> bool {
        // Qwen2 ships q/k/v biases; Llama and Mistral do not
        matches!(self, Architecture::Qwen2)
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter data type declared by the model configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    #[serde(alias = "float32")]
    F32,
    #[serde(alias = "float16")]
    F16,
    #[serde(alias = "bfloat16")]
    Bf16,
}

impl Default for Dtype {
    fn default() -> Self {
        Dtype::F32
    }
}

/// Architecture and identity of a model to be loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(alias = "model_type")]
    pub architecture: Architecture,

    pub hidden_size: usize,

    #[serde(alias = "num_hidden_layers")]
    pub num_layers: usize,

    #[serde(alias = "num_attention_heads")]
    pub num_heads: usize,

    pub intermediate_size: usize,

    pub vocab_size: usize,

    #[serde(default, alias = "torch_dtype")]
    pub dtype: Dtype,

    /// Checkpoint to load weights from. Relative paths are resolved against
    /// the loader's checkpoint directory.
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,

    /// Fail on checkpoint tensors with no matching model parameter
    #[serde(default)]
    pub strict: bool,
}

impl ModelConfig {
    /// Read a config from a JSON file (HuggingFace config.json layout)
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ModelConfig = serde_json::from_str(&contents).map_err(|e| {
            LoadError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject dimension combinations no supported architecture can have
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.hidden_size == 0
            || self.num_layers == 0
            || self.num_heads == 0
            || self.intermediate_size == 0
            || self.vocab_size == 0
        {
            return Err(LoadError::Configuration(format!(
                "model dimensions must be nonzero (hidden_size={}, num_layers={}, num_heads={}, intermediate_size={}, vocab_size={})",
                self.hidden_size, self.num_layers, self.num_heads, self.intermediate_size, self.vocab_size
            )));
        }
        if self.hidden_size % self.num_heads != 0 {
            return Err(LoadError::Configuration(format!(
                "hidden_size {} is not divisible by num_heads {}",
                self.hidden_size, self.num_heads
            )));
        }
        Ok(())
    }

    /// Named parameter tensors (and shapes) a model of this config is made of.
    ///
    /// Names follow the HuggingFace transformer convention shared by the
    /// supported families, which is also what safetensors checkpoints use.
    pub fn parameter_shapes(&self) -> Vec<(String, Vec<usize>)> {
        let h = self.hidden_size;
        let i = self.intermediate_size;
        let v = self.vocab_size;

        let mut shapes = Vec::with_capacity(2 + self.num_layers * 11);
        shapes.push(("embed_tokens.weight".to_string(), vec![v, h]));

        for layer in 0..self.num_layers {
            let p = format!("layers.{layer}");
            shapes.push((format!("{p}.input_layernorm.weight"), vec![h]));
            shapes.push((format!("{p}.self_attn.q_proj.weight"), vec![h, h]));
            shapes.push((format!("{p}.self_attn.k_proj.weight"), vec![h, h]));
            shapes.push((format!("{p}.self_attn.v_proj.weight"), vec![h, h]));
            shapes.push((format!("{p}.self_attn.o_proj.weight"), vec![h, h]));
            if self.architecture.has_attention_bias() {
                shapes.push((format!("{p}.self_attn.q_proj.bias"), vec![h]));
                shapes.push((format!("{p}.self_attn.k_proj.bias"), vec![h]));
                shapes.push((format!("{p}.self_attn.v_proj.bias"), vec![h]));
            }
            shapes.push((format!("{p}.post_attention_layernorm.weight"), vec![h]));
            shapes.push((format!("{p}.mlp.gate_proj.weight"), vec![i, h]));
            shapes.push((format!("{p}.mlp.up_proj.weight"), vec![i, h]));
            shapes.push((format!("{p}.mlp.down_proj.weight"), vec![h, i]));
        }

        shapes.push(("norm.weight".to_string(), vec![h]));
        shapes.push(("lm_head.weight".to_string(), vec![v, h]));
        shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config() -> ModelConfig {
        ModelConfig {
            architecture: Architecture::Llama,
            hidden_size: 8,
            num_layers: 2,
            num_heads: 2,
            intermediate_size: 16,
            vocab_size: 32,
            dtype: Dtype::F32,
            checkpoint: None,
            strict: false,
        }
    }

    // --- validation ---

    #[test]
    fn test_valid_config_passes() {
        assert!(tiny_config().validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = tiny_config();
        config.hidden_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nonzero"));
    }

    #[test]
    fn test_indivisible_heads_rejected() {
        let mut config = tiny_config();
        config.num_heads = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("divisible"));
    }

    // --- parameter template ---

    #[test]
    fn test_llama_template_has_no_attention_bias() {
        let shapes = tiny_config().parameter_shapes();
        assert!(shapes.iter().all(|(name, _)| !name.ends_with(".bias")));
    }

    #[test]
    fn test_qwen2_template_has_qkv_biases() {
        let mut config = tiny_config();
        config.architecture = Architecture::Qwen2;
        let shapes = config.parameter_shapes();
        let biases = shapes
            .iter()
            .filter(|(name, _)| name.ends_with(".bias"))
            .count();
        assert_eq!(biases, 3 * config.num_layers);
    }

    #[test]
    fn test_template_shapes_follow_config_dimensions() {
        let config = tiny_config();
        let shapes = config.parameter_shapes();
        let embed = shapes
            .iter()
            .find(|(name, _)| name == "embed_tokens.weight")
            .expect("embedding must be in template");
        assert_eq!(embed.1, vec![config.vocab_size, config.hidden_size]);

        let down = shapes
            .iter()
            .find(|(name, _)| name == "layers.0.mlp.down_proj.weight")
            .expect("mlp down projection must be in template");
        assert_eq!(down.1, vec![config.hidden_size, config.intermediate_size]);
    }

    // --- config.json files ---

    #[test]
    fn test_from_json_file_reads_a_model_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "model_type": "llama",
                "hidden_size": 16,
                "num_hidden_layers": 2,
                "num_attention_heads": 4,
                "intermediate_size": 64,
                "vocab_size": 128,
                "torch_dtype": "bfloat16"
            }"#,
        )
        .unwrap();

        let config = ModelConfig::from_json_file(&path).unwrap();
        assert_eq!(config.architecture, Architecture::Llama);
        assert_eq!(config.hidden_size, 16);
        assert_eq!(config.dtype, Dtype::Bf16);
    }

    #[test]
    fn test_from_json_file_malformed_json_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = ModelConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Configuration(_)));
        assert!(
            err.to_string().contains("config.json"),
            "parse errors must say which file was bad: {err}"
        );
    }

    #[test]
    fn test_from_json_file_missing_file_is_io_error() {
        let err =
            ModelConfig::from_json_file(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_from_json_file_rejects_invalid_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "model_type": "qwen2",
                "hidden_size": 10,
                "num_hidden_layers": 2,
                "num_attention_heads": 3,
                "intermediate_size": 40,
                "vocab_size": 64
            }"#,
        )
        .unwrap();

        let err = ModelConfig::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("divisible"));
    }

    // --- serde ---

    #[test]
    fn test_parses_huggingface_field_names() {
        let json = r#"{
            "model_type": "qwen2",
            "hidden_size": 896,
            "num_hidden_layers": 24,
            "num_attention_heads": 14,
            "intermediate_size": 4864,
            "vocab_size": 151936,
            "torch_dtype": "f32"
        }"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.architecture, Architecture::Qwen2);
        assert_eq!(config.num_layers, 24);
        assert_eq!(config.num_heads, 14);
        assert!(!config.strict, "strict defaults to off");
    }
}
