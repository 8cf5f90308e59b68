// src/config.rs

//! Export options: the file-based stand-in for the panel's form input.
//!
//! The panel itself is an external collaborator; what it would collect
//! (pixel widths per breakpoint label, fallback stacks per font family,
//! and a group selection) arrives here as an optional JSON file instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// User edits normally typed into the plugin panel. Everything is
/// optional; the default exports every group with untouched breakpoints
/// and single-family stacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Breakpoint label → pixel width ("sm" → "640").
    pub breakpoints: BTreeMap<String, String>,
    /// Primary family → comma-separated fallback stack
    /// ("Inter" → "Helvetica, Arial, sans-serif").
    pub fonts: BTreeMap<String, String>,
    /// Groups to export. Absent means all of them.
    pub selection: Option<Vec<String>>,
}

impl ExportOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading export options {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing export options {}", path.display()))
    }
}
