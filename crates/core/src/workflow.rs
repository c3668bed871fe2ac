//! Workflow template resolver.
//!
//! A workflow template is a ComfyUI-style node graph: a JSON object whose
//! top-level keys are node ids and whose values are node objects carrying an
//! optional `_meta.title` string and an optional `inputs` object of
//! scalar-valued fields:
//!
//! ```json
//! {
//!   "3": {
//!     "_meta": { "title": "{{SAMPLER}} KSampler" },
//!     "inputs": { "seed": 42, "steps": 20, "cfg": 7.5 }
//!   }
//! }
//! ```
//!
//! [`resolve`] rewrites input fields of every node whose title matches a
//! [`Directive`]'s pattern. Patterns are case-insensitive and unanchored, so
//! a directive for `"sampler"` fires on a node titled `"KSampler"`.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::CoreError;

/// Replacement values longer than this are truncated in log output.
const LOG_VALUE_MAX_CHARS: usize = 60;

// ---------------------------------------------------------------------------
// Directive types
// ---------------------------------------------------------------------------

/// A single field overwrite within a [`Directive`].
#[derive(Debug, Clone)]
pub struct FieldUpdate {
    /// Input field name within a node's `inputs` object.
    pub field: String,
    /// Replacement value. `None` is the no-op sentinel: the field is left
    /// untouched even when the directive's pattern matches. This is distinct
    /// from `Some(Value::Null)`, which writes an explicit JSON null.
    pub value: Option<Value>,
}

impl FieldUpdate {
    /// An update that overwrites `field` with `value`.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: Some(value.into()),
        }
    }

    /// A no-op update: `field` is named but never touched.
    pub fn skip(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
        }
    }

    /// An update from an optional value (`None` becomes the no-op sentinel).
    pub fn maybe(field: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// A rule pairing a title-matching pattern with field overwrites to apply to
/// matching nodes.
#[derive(Debug, Clone)]
pub struct Directive {
    pattern: Regex,
    updates: Vec<FieldUpdate>,
}

impl Directive {
    /// Compile a directive from a regex pattern.
    ///
    /// The pattern is matched case-insensitively anywhere in a node's title.
    /// An invalid pattern is [`CoreError::MalformedInput`].
    pub fn new(pattern: &str, updates: Vec<FieldUpdate>) -> Result<Self, CoreError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                CoreError::MalformedInput(format!("invalid directive pattern '{pattern}': {e}"))
            })?;
        Ok(Self {
            pattern: compiled,
            updates,
        })
    }

    /// Compile a directive that matches `marker` as literal text.
    ///
    /// Placeholder markers such as `{{SAMPLER}}` contain characters the regex
    /// engine would otherwise reject, so the marker is escaped first.
    pub fn literal(marker: &str, updates: Vec<FieldUpdate>) -> Self {
        Self::new(&regex::escape(marker), updates).expect("escaped pattern always compiles")
    }

    /// The field updates this directive carries, in application order.
    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }
}

/// An ordered sequence of directives.
///
/// Order matters: later directives overwrite fields touched by earlier ones
/// when both match the same node. Duplicate patterns are permitted and all
/// of them apply.
pub type DirectiveSet = Vec<Directive>;

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Apply `directives` to `document`, returning the resolved document.
///
/// Per node, per directive in order: if the directive's pattern matches
/// anywhere in the node's `_meta.title` (missing or non-string titles are
/// matched against the empty string), each non-sentinel [`FieldUpdate`]
/// overwrites the named key in the node's `inputs` -- but only if the key
/// already exists. Fields are never created, untouched fields and value
/// types are preserved exactly, and the whole transformation is a single
/// deterministic pass.
///
/// Nodes that are not JSON objects, have no title, or have no `inputs`
/// object are silently skipped; a directive that matches nothing is a valid
/// no-op. The only error is [`CoreError::MalformedInput`] when `document`
/// itself is not a JSON object.
///
/// One log record is emitted per applied update (field, node title, new
/// value). This is operator visibility only and carries no control-flow
/// significance.
pub fn resolve(mut document: Value, directives: &[Directive]) -> Result<Value, CoreError> {
    let nodes = document.as_object_mut().ok_or_else(|| {
        CoreError::MalformedInput("workflow document must be a JSON object of nodes".to_string())
    })?;

    for node_value in nodes.values_mut() {
        // A non-object node has no title and no inputs; nothing to do.
        let Some(node) = node_value.as_object_mut() else {
            continue;
        };

        let title = node
            .get("_meta")
            .and_then(|meta| meta.get("title"))
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();

        for directive in directives {
            if !directive.pattern.is_match(&title) {
                continue;
            }

            let Some(inputs) = node.get_mut("inputs").and_then(|i| i.as_object_mut()) else {
                continue;
            };

            for update in &directive.updates {
                // No-op sentinel: leave the field alone even if it exists.
                let Some(new_value) = &update.value else {
                    continue;
                };
                // Only overwrite fields the node already has.
                if let Some(slot) = inputs.get_mut(&update.field) {
                    *slot = new_value.clone();
                    tracing::info!(
                        field = %update.field,
                        node = %title,
                        value = %display_value(new_value),
                        "Replaced workflow input"
                    );
                }
            }
        }
    }

    Ok(document)
}

/// Render a replacement value for log output, truncating long strings.
fn display_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > LOG_VALUE_MAX_CHARS {
        let truncated: String = text.chars().take(LOG_VALUE_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn sampler_document() -> Value {
        json!({
            "3": {
                "_meta": { "title": "KSampler" },
                "inputs": { "steps": 20, "seed": 0, "cfg": 7 }
            }
        })
    }

    fn two_node_document() -> Value {
        json!({
            "3": {
                "_meta": { "title": "{{SAMPLER}} KSampler" },
                "inputs": { "steps": 20, "seed": 0, "cfg": 7.5 }
            },
            "5": {
                "_meta": { "title": "{{LATENT-IMAGE}} Empty Latent" },
                "inputs": { "width": 512, "height": 512, "batch_size": 1 }
            },
            "9": {
                "_meta": { "title": "Save Image" },
                "inputs": { "filename_prefix": "out" }
            }
        })
    }

    fn directive(pattern: &str, updates: Vec<FieldUpdate>) -> Directive {
        Directive::new(pattern, updates).unwrap()
    }

    // -- identity and no-op laws ----------------------------------------------

    #[test]
    fn empty_directive_set_is_identity() {
        let doc = two_node_document();
        let resolved = resolve(doc.clone(), &[]).unwrap();
        assert_eq!(resolved, doc);
    }

    #[test]
    fn all_sentinel_updates_leave_document_unchanged() {
        let doc = two_node_document();
        let directives = vec![directive(
            "sampler",
            vec![FieldUpdate::skip("steps"), FieldUpdate::skip("seed")],
        )];
        let resolved = resolve(doc.clone(), &directives).unwrap();
        assert_eq!(resolved, doc);
    }

    #[test]
    fn resolve_is_idempotent_for_constant_directives() {
        let directives = vec![directive(
            "sampler",
            vec![FieldUpdate::set("steps", 30), FieldUpdate::set("seed", 12345)],
        )];
        let once = resolve(sampler_document(), &directives).unwrap();
        let twice = resolve(once.clone(), &directives).unwrap();
        assert_eq!(once, twice);
    }

    // -- matching semantics ---------------------------------------------------

    #[test]
    fn pattern_match_is_case_insensitive() {
        for title in ["KSampler", "SAMPLER CONFIG", "sampler"] {
            let doc = json!({
                "1": {
                    "_meta": { "title": title },
                    "inputs": { "steps": 20 }
                }
            });
            let directives = vec![directive("sampler", vec![FieldUpdate::set("steps", 30)])];
            let resolved = resolve(doc, &directives).unwrap();
            assert_eq!(resolved["1"]["inputs"]["steps"], json!(30), "title: {title}");
        }
    }

    #[test]
    fn non_matching_pattern_leaves_document_unchanged() {
        let doc = two_node_document();
        let directives = vec![directive(
            "upscaler",
            vec![FieldUpdate::set("scale_by", 2)],
        )];
        let resolved = resolve(doc.clone(), &directives).unwrap();
        assert_eq!(resolved, doc);
    }

    #[test]
    fn missing_title_is_treated_as_empty_string() {
        let doc = json!({
            "1": { "inputs": { "steps": 20 } }
        });

        // A pattern requiring text fails to match a title-less node...
        let directives = vec![directive("sampler", vec![FieldUpdate::set("steps", 30)])];
        let resolved = resolve(doc.clone(), &directives).unwrap();
        assert_eq!(resolved["1"]["inputs"]["steps"], json!(20));

        // ...but a pattern that matches the empty string succeeds.
        let directives = vec![directive(".*", vec![FieldUpdate::set("steps", 30)])];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["1"]["inputs"]["steps"], json!(30));
    }

    #[test]
    fn literal_directive_matches_placeholder_markers() {
        let doc = two_node_document();
        let directives = vec![Directive::literal(
            "{{LATENT-IMAGE}}",
            vec![FieldUpdate::set("width", 1024), FieldUpdate::set("height", 768)],
        )];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["5"]["inputs"]["width"], json!(1024));
        assert_eq!(resolved["5"]["inputs"]["height"], json!(768));
        // Other nodes untouched.
        assert_eq!(resolved["3"]["inputs"]["steps"], json!(20));
    }

    // -- field update semantics -----------------------------------------------

    #[test]
    fn fields_are_never_created() {
        let doc = sampler_document();
        let directives = vec![directive(
            "sampler",
            vec![FieldUpdate::set("denoise", 0.5)],
        )];
        let resolved = resolve(doc.clone(), &directives).unwrap();
        assert_eq!(resolved, doc);
        assert!(resolved["3"]["inputs"].get("denoise").is_none());
    }

    #[test]
    fn explicit_null_is_written_but_sentinel_is_not() {
        let doc = sampler_document();
        let directives = vec![directive(
            "sampler",
            vec![
                FieldUpdate::set("seed", Value::Null),
                FieldUpdate::skip("steps"),
            ],
        )];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["3"]["inputs"]["seed"], Value::Null);
        assert_eq!(resolved["3"]["inputs"]["steps"], json!(20));
    }

    #[test]
    fn later_directives_win_on_field_conflicts() {
        let doc = sampler_document();
        let directives = vec![
            directive("sampler", vec![FieldUpdate::set("steps", 10)]),
            directive("ksampler", vec![FieldUpdate::set("steps", 20)]),
        ];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["3"]["inputs"]["steps"], json!(20));
    }

    #[test]
    fn duplicate_patterns_all_apply_in_order() {
        let doc = sampler_document();
        let directives = vec![
            directive("sampler", vec![FieldUpdate::set("steps", 10)]),
            directive("sampler", vec![FieldUpdate::set("seed", 777)]),
        ];
        let resolved = resolve(doc, &directives).unwrap();
        // Both directives fire; neither silently replaces the other.
        assert_eq!(resolved["3"]["inputs"]["steps"], json!(10));
        assert_eq!(resolved["3"]["inputs"]["seed"], json!(777));
    }

    #[test]
    fn concrete_sampler_scenario() {
        // From the upstream contract: steps and seed overwritten, cfg left
        // alone because its update carries the no-op sentinel.
        let doc = sampler_document();
        let directives = vec![directive(
            "sampler",
            vec![
                FieldUpdate::set("steps", 30),
                FieldUpdate::set("seed", 12345),
                FieldUpdate::skip("cfg"),
            ],
        )];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["3"]["inputs"]["steps"], json!(30));
        assert_eq!(resolved["3"]["inputs"]["seed"], json!(12345));
        assert_eq!(resolved["3"]["inputs"]["cfg"], json!(7));
    }

    #[test]
    fn untouched_value_types_are_preserved() {
        let doc = json!({
            "1": {
                "_meta": { "title": "KSampler" },
                "inputs": {
                    "steps": 20,
                    "cfg": 7.5,
                    "sampler_name": "euler",
                    "add_noise": true,
                    "model": ["2", 0]
                }
            }
        });
        let directives = vec![directive("sampler", vec![FieldUpdate::set("steps", 30)])];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["1"]["inputs"]["cfg"], json!(7.5));
        assert_eq!(resolved["1"]["inputs"]["sampler_name"], json!("euler"));
        assert_eq!(resolved["1"]["inputs"]["add_noise"], json!(true));
        assert_eq!(resolved["1"]["inputs"]["model"], json!(["2", 0]));
    }

    // -- degenerate shapes ----------------------------------------------------

    #[test]
    fn node_without_inputs_is_skipped() {
        let doc = json!({
            "1": { "_meta": { "title": "KSampler" } }
        });
        let directives = vec![directive("sampler", vec![FieldUpdate::set("steps", 30)])];
        let resolved = resolve(doc.clone(), &directives).unwrap();
        assert_eq!(resolved, doc);
    }

    #[test]
    fn non_object_node_is_skipped() {
        let doc = json!({
            "1": "not a node",
            "2": {
                "_meta": { "title": "KSampler" },
                "inputs": { "steps": 20 }
            }
        });
        let directives = vec![directive("sampler", vec![FieldUpdate::set("steps", 30)])];
        let resolved = resolve(doc, &directives).unwrap();
        assert_eq!(resolved["1"], json!("not a node"));
        assert_eq!(resolved["2"]["inputs"]["steps"], json!(30));
    }

    #[test]
    fn non_object_document_is_malformed() {
        let directives = vec![directive("sampler", vec![FieldUpdate::set("steps", 30)])];
        let result = resolve(json!(["not", "a", "document"]), &directives);
        assert_matches!(result, Err(CoreError::MalformedInput(_)));
    }

    #[test]
    fn invalid_pattern_is_malformed_input() {
        // A bare `{` is not a valid regex.
        let result = Directive::new("{{SAMPLER}}", vec![]);
        assert_matches!(result, Err(CoreError::MalformedInput(_)));
    }
}
