//! Placeholder-directive catalog.
//!
//! Workflow templates mark configurable stages by embedding symbolic markers
//! in node titles (e.g. a KSampler node titled `"{{SAMPLER}} KSampler"`).
//! This module maps [`GenerationParams`] onto the ordered [`DirectiveSet`]
//! the resolver consumes. The resolver treats the markers as opaque
//! patterns; only this catalog knows what they mean.
//!
//! The markers contain literal braces, which the regex engine rejects, so
//! each is escaped via [`Directive::literal`] before compilation.

use serde_json::Value;

use crate::params::GenerationParams;
use crate::workflow::{Directive, DirectiveSet, FieldUpdate};

// ---------------------------------------------------------------------------
// Marker constants
// ---------------------------------------------------------------------------

/// Marks the latent image node (width, height, batch size).
pub const LATENT_IMAGE_MARKER: &str = "{{LATENT-IMAGE}}";

/// Marks the positive prompt text-encode node.
pub const POSITIVE_PROMPT_MARKER: &str = "{{POSITIVE-PROMPT}}";

/// Marks the negative prompt text-encode node.
pub const NEGATIVE_PROMPT_MARKER: &str = "{{NEGATIVE-PROMPT}}";

/// Marks the sampler node (seed, steps, dimensions, CFG).
pub const SAMPLER_MARKER: &str = "{{SAMPLER}}";

/// Marks the upscaler node (scale factor, model).
pub const UPSCALER_MARKER: &str = "{{UPSCALER}}";

/// Marks the LoRA loader node (model name, strengths).
pub const LORA_MARKER: &str = "{{LORA}}";

// ---------------------------------------------------------------------------
// Directive construction
// ---------------------------------------------------------------------------

/// Build the ordered directive set for one generation request.
///
/// Unset optional parameters become no-op sentinels, so a template's own
/// values survive wherever the caller supplied nothing. Some samplers read
/// the seed from `noise_seed` rather than `seed`; both are written so either
/// node variant picks it up.
pub fn directive_set(params: &GenerationParams) -> DirectiveSet {
    vec![
        Directive::literal(
            LATENT_IMAGE_MARKER,
            vec![
                FieldUpdate::maybe("width", params.width.map(Value::from)),
                FieldUpdate::maybe("height", params.height.map(Value::from)),
                FieldUpdate::set("batch_size", params.batch),
            ],
        ),
        Directive::literal(
            POSITIVE_PROMPT_MARKER,
            vec![FieldUpdate::set("text", params.prompt.clone())],
        ),
        Directive::literal(
            NEGATIVE_PROMPT_MARKER,
            vec![FieldUpdate::maybe(
                "text",
                params.negative_prompt.clone().map(Value::from),
            )],
        ),
        Directive::literal(
            SAMPLER_MARKER,
            vec![
                FieldUpdate::set("seed", params.seed),
                FieldUpdate::set("noise_seed", params.seed),
                FieldUpdate::maybe("steps", params.steps.map(Value::from)),
                FieldUpdate::maybe("width", params.width.map(Value::from)),
                FieldUpdate::maybe("height", params.height.map(Value::from)),
                FieldUpdate::maybe("cfg", params.cfg.map(Value::from)),
            ],
        ),
        Directive::literal(
            UPSCALER_MARKER,
            vec![
                FieldUpdate::set("scale_by", params.scale),
                FieldUpdate::maybe("model_name", params.upscaler.clone().map(Value::from)),
            ],
        ),
        Directive::literal(
            LORA_MARKER,
            vec![
                FieldUpdate::maybe("lora_name", params.lora.clone().map(Value::from)),
                FieldUpdate::maybe("strength_model", params.lora_strength.map(Value::from)),
                FieldUpdate::maybe("strength_clip", params.lora_strength.map(Value::from)),
            ],
        ),
    ]
}
