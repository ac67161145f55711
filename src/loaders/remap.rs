// Checkpoint-name remapping schemes
//
// Checkpoints rarely use exactly the in-memory parameter names; a remapper
// translates one checkpoint tensor name into the model's namespace. The
// Megatron translation scheme is deliberately not defined here; it lives in
// the external conversion backend.

/// Translates checkpoint tensor names into model parameter names
pub trait WeightRemapper: Send + Sync {
    fn remap(&self, checkpoint_name: &str) -> String;
}

/// Checkpoint names already match the model's
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRemap;

impl WeightRemapper for IdentityRemap {
    fn remap(&self, checkpoint_name: &str) -> String {
        checkpoint_name.to_string()
    }
}

/// Strips a fixed prefix, for checkpoints that nest everything under a root
/// module name ("model." in HuggingFace exports, "transformer." in others)
#[derive(Debug, Clone)]
pub struct PrefixStrip {
    prefix: String,
}

impl PrefixStrip {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl WeightRemapper for PrefixStrip {
    fn remap(&self, checkpoint_name: &str) -> String {
        checkpoint_name
            .strip_prefix(&self.prefix)
            .unwrap_or(checkpoint_name)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_a_no_op() {
        assert_eq!(IdentityRemap.remap("norm.weight"), "norm.weight");
    }

    #[test]
    fn test_prefix_strip_removes_root_module() {
        let remap = PrefixStrip::new("model.");
        assert_eq!(remap.remap("model.norm.weight"), "norm.weight");
        assert_eq!(
            remap.remap("model.layers.0.mlp.up_proj.weight"),
            "layers.0.mlp.up_proj.weight"
        );
    }

    #[test]
    fn test_prefix_strip_leaves_unprefixed_names_alone() {
        let remap = PrefixStrip::new("model.");
        assert_eq!(remap.remap("lm_head.weight"), "lm_head.weight");
    }
}
