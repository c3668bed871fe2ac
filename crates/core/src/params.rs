//! Caller-supplied generation parameters.
//!
//! These are collected upstream (API payload) and mapped into the directive
//! set consumed by the workflow resolver. Defaults mirror the CLI the
//! backend grew out of: one image, no upscaling, a random seed, and a
//! two-minute job timeout.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default workflow template file.
pub const DEFAULT_WORKFLOW: &str = "flux1-dev-scale-l.json";

/// Default job timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Parameters for a single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Positive prompt text.
    pub prompt: String,
    /// Negative prompt text, if any.
    pub negative_prompt: Option<String>,
    /// Output width in pixels. Unset fields leave the template's value.
    pub width: Option<u32>,
    /// Output height in pixels.
    pub height: Option<u32>,
    /// Number of sampling steps.
    pub steps: Option<u32>,
    /// Classifier-free guidance scale.
    pub cfg: Option<f64>,
    /// Sampler seed. Defaults to a fresh random value per request.
    pub seed: u64,
    /// Number of images to generate.
    pub batch: u32,
    /// Output scale factor for the upscaler stage.
    pub scale: u32,
    /// Upscaler model name.
    pub upscaler: Option<String>,
    /// LoRA model name.
    pub lora: Option<String>,
    /// LoRA strength, applied to both model and CLIP weights.
    pub lora_strength: Option<f64>,
    /// Workflow template file name.
    pub workflow: String,
    /// How long to wait for the job to complete, in seconds. When unset,
    /// the server's configured default applies.
    pub timeout_secs: Option<u64>,
    /// Optional refiner system-prompt identifier.
    pub refine: Option<String>,
    /// Whether to treat the prompt as an instruction to the LLM to write
    /// the actual prompt.
    pub metaprompt: bool,
    /// Whether a reference image accompanies the request.
    #[serde(skip)]
    pub has_reference_image: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: None,
            width: None,
            height: None,
            steps: None,
            cfg: None,
            seed: rand::random::<u32>() as u64,
            batch: 1,
            scale: 1,
            upscaler: None,
            lora: None,
            lora_strength: None,
            workflow: DEFAULT_WORKFLOW.to_string(),
            timeout_secs: None,
            refine: None,
            metaprompt: false,
            has_reference_image: false,
        }
    }
}

impl GenerationParams {
    /// Validate the parameters for a generation request.
    ///
    /// A prompt or a reference image must be present, and the batch size
    /// must be at least one.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() && !self.has_reference_image {
            return Err(CoreError::Validation(
                "Prompt or reference image is required".to_string(),
            ));
        }
        if self.batch == 0 {
            return Err(CoreError::Validation(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_match_cli_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.batch, 1);
        assert_eq!(params.scale, 1);
        assert_eq!(params.workflow, DEFAULT_WORKFLOW);
        assert!(params.timeout_secs.is_none());
        assert!(params.width.is_none());
        assert!(params.negative_prompt.is_none());
    }

    #[test]
    fn empty_prompt_without_image_is_rejected() {
        let params = GenerationParams::default();
        assert_matches!(params.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn reference_image_satisfies_prompt_requirement() {
        let params = GenerationParams {
            has_reference_image: true,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn zero_batch_is_rejected() {
        let params = GenerationParams {
            prompt: "cat on a sofa".to_string(),
            batch: 0,
            ..Default::default()
        };
        assert_matches!(params.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn unknown_json_fields_are_ignored_and_defaults_fill_in() {
        let params: GenerationParams = serde_json::from_str(
            r#"{ "prompt": "a lighthouse", "steps": 25, "cfg": 3.5, "unknown_field": true }"#,
        )
        .unwrap();
        assert_eq!(params.prompt, "a lighthouse");
        assert_eq!(params.steps, Some(25));
        assert_eq!(params.cfg, Some(3.5));
        assert_eq!(params.batch, 1);
    }
}
