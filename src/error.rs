// src/error.rs

//! Error taxonomy for the token pipeline.
//!
//! Malformed style names and unknown text cases are deliberately *not*
//! errors; they degrade silently (exclusion and an omitted attribute,
//! respectively). Everything that can actually sink the pipeline gets a
//! named kind here so callers of `TokenOrchestrator::run` can tell a dead
//! analyzer from a broken document.

use crate::style::StyleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A style carried a font size no conversion can divide by.
    #[error("style '{style}' has unusable font size {font_size}")]
    BadStyleGeometry { style: String, font_size: f64 },

    /// No scan reply arrived for the given style within the bounded wait.
    /// Without this, a lost reply would stall the pipeline forever.
    #[error("no scan response for style '{style}' within {timeout_ms}ms")]
    RenderTimeout { style: StyleId, timeout_ms: u64 },

    /// The analyzer could not decode the rendered sample. There is no
    /// retry policy, so this is fatal.
    #[error("analyzer failed to decode sample for style '{style}': {reason}")]
    Decode { style: StyleId, reason: String },

    /// The transport was torn down while the pipeline still needed it.
    #[error("transport channel closed before the pipeline finished")]
    ChannelClosed,

    /// The host document failed to enumerate, load, or render.
    #[error("host document error: {0:#}")]
    Provider(anyhow::Error),
}
