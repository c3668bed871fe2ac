//! Domain logic for the prompter image-generation backend.
//!
//! The central piece is the workflow template resolver in [`workflow`]:
//! it rewrites input fields of pipeline-description documents (ComfyUI-style
//! node graphs) based on regex directives matched against node titles.
//! The surrounding modules supply the generation-parameter model, the
//! placeholder-directive catalog, template file lookup, and static catalog
//! data served by the API.

pub mod catalog;
pub mod directives;
pub mod error;
pub mod params;
pub mod templates;
pub mod workflow;
