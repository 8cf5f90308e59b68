// src/panel.rs

//! UI-side editable state and the export transformation.
//!
//! The panel state is ephemeral: it is reconstructed in full from every
//! config snapshot the host hands over, and only its own copy is touched
//! during export. The received store itself is never mutated.

use crate::config::ExportOptions;
use crate::tokens::{TokenMap, TokenStore, TokenValue};
use log::warn;

/// Rewrites a group name for the export file: whitespace runs become
/// single hyphens, everything lowercased.
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
            out.push('-');
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Editable panel state, rebuilt from each config snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    /// Breakpoint label → user-entered pixel value, in discovery order.
    pub breakpoints: Vec<(String, String)>,
    /// Primary font family → user-entered fallback stack.
    pub fonts: Vec<(String, String)>,
    /// Group names selected for export. Everything starts selected.
    pub selected: Vec<String>,
}

impl PanelState {
    /// Harvests the editable surface from a config snapshot: breakpoint
    /// labels from every group's `fontSize` keys and primary families
    /// from `fontFamily[0]`, both deduplicated in discovery order.
    pub fn from_config(config: &TokenStore) -> Self {
        let mut breakpoints: Vec<(String, String)> = Vec::new();
        let mut fonts: Vec<(String, String)> = Vec::new();
        let mut selected = Vec::new();

        for (group, attributes) in config.iter() {
            selected.push(group.to_string());
            let Some(attrs) = attributes.as_object() else {
                continue;
            };
            if let Some(TokenValue::Object(sizes)) = attrs.get("fontSize") {
                for label in sizes.keys() {
                    if !breakpoints.iter().any(|(known, _)| known == label) {
                        breakpoints.push((label.to_string(), String::new()));
                    }
                }
            }
            if let Some(TokenValue::Array(families)) = attrs.get("fontFamily") {
                if let Some(TokenValue::Str(primary)) = families.first() {
                    if !fonts.iter().any(|(known, _)| known == primary) {
                        fonts.push((primary.clone(), String::new()));
                    }
                }
            }
        }

        PanelState {
            breakpoints,
            fonts,
            selected,
        }
    }

    /// Applies user edits, standing in for the panel form. Unknown
    /// breakpoint and font keys are reported and ignored; a selection,
    /// when present, replaces the default all-selected state.
    pub fn apply_options(&mut self, options: &ExportOptions) {
        for (label, px) in &options.breakpoints {
            match self.breakpoints.iter_mut().find(|(known, _)| known == label) {
                Some(slot) => slot.1 = px.clone(),
                None => warn!("panel: no breakpoint '{}' in this document", label),
            }
        }
        for (family, stack) in &options.fonts {
            match self.fonts.iter_mut().find(|(known, _)| known == family) {
                Some(slot) => slot.1 = stack.clone(),
                None => warn!("panel: no font family '{}' in this document", family),
            }
        }
        if let Some(selection) = &options.selection {
            let mut kept = Vec::new();
            for group in selection {
                if self.selected.contains(group) {
                    kept.push(group.clone());
                } else {
                    warn!("panel: no style group '{}' in this document", group);
                }
            }
            self.selected = kept;
        }
    }

    /// Builds the export payload: selected groups only (in config order),
    /// kebab-cased keys, fallback stacks appended to `fontFamily`, and
    /// `fontSize` keys remapped from breakpoint labels to the
    /// user-entered pixel widths suffixed with "px".
    pub fn export(&self, config: &TokenStore) -> TokenValue {
        let mut out = TokenMap::new();
        for (group, attributes) in config.iter() {
            if !self.selected.iter().any(|selected| selected == group) {
                continue;
            }
            let Some(attrs) = attributes.as_object() else {
                continue;
            };
            let mut entry = attrs.clone();

            if let Some(TokenValue::Array(families)) = entry.get_mut("fontFamily") {
                let primary = families
                    .first()
                    .and_then(TokenValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                if let Some((_, stack)) = self.fonts.iter().find(|(known, _)| *known == primary) {
                    for fallback in split_font_stack(stack) {
                        families.push(TokenValue::Str(fallback));
                    }
                }
            }

            let remapped = match entry.get("fontSize") {
                Some(TokenValue::Object(sizes)) => {
                    let mut sized = TokenMap::new();
                    for (label, size) in sizes.iter() {
                        let px = self
                            .breakpoints
                            .iter()
                            .find(|(known, _)| known == label)
                            .map(|(_, px)| px.as_str())
                            .unwrap_or("");
                        sized.insert(format!("{}px", px), size.clone());
                    }
                    Some(TokenValue::Object(sized))
                }
                _ => None,
            };
            if let Some(sizes) = remapped {
                entry.insert("fontSize", sizes);
            }

            out.insert(to_kebab_case(group), TokenValue::Object(entry));
        }
        TokenValue::Object(out)
    }
}

/// Splits a user-entered fallback stack on commas; surrounding whitespace
/// and empty entries are dropped.
fn split_font_stack(stack: &str) -> Vec<String> {
    stack
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
