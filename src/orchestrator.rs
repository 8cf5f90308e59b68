// src/orchestrator.rs

//! Drives the token pipeline over the document's text styles. Each style
//! contributes its CSS-like token attributes, and each style group gets
//! one render/scan round trip to measure its visual crop.
//!
//! The orchestrator is the token store's only writer. It processes styles
//! strictly in document order and keeps at most one render in flight;
//! `AnalyzerLink::request_scan` is its single suspension point.

use crate::error::PipelineError;
use crate::fontstyle::parse_font_style;
use crate::message::ScanBounds;
use crate::provider::StyleProvider;
use crate::style::{self, StyleDefinition};
use crate::tokens::{TokenMap, TokenStore, TokenValue};
use crate::transport::AnalyzerLink;
use log::{debug, info, trace, warn};
use std::collections::HashSet;

/// The fixed glyph run typeset for every crop measurement.
pub const SAMPLE_TEXT: &str = "HHHHH";

/// State machine over the document's styles.
pub struct TokenOrchestrator<'a> {
    provider: &'a mut dyn StyleProvider,
    link: &'a mut dyn AnalyzerLink,
    store: TokenStore,
    /// Groups whose crop has already been requested. The store also holds
    /// a placeholder `crop` object per requested group, but the guard
    /// itself is this set, not the placeholder's presence.
    crop_requested: HashSet<String>,
}

impl<'a> TokenOrchestrator<'a> {
    pub fn new(provider: &'a mut dyn StyleProvider, link: &'a mut dyn AnalyzerLink) -> Self {
        TokenOrchestrator {
            provider,
            link,
            store: TokenStore::new(),
            crop_requested: HashSet::new(),
        }
    }

    /// Runs the pipeline over every qualifying style, hands the finished
    /// store to the UI side, and returns it.
    pub fn run(mut self) -> Result<TokenStore, PipelineError> {
        let styles = self
            .provider
            .list_text_styles()
            .map_err(PipelineError::Provider)?;
        let total = styles.len();
        // Only names with exactly one separator qualify; the rest are
        // silently excluded, not errors.
        let qualifying: Vec<StyleDefinition> = styles
            .into_iter()
            .filter(|def| style::split_style_name(&def.name).is_some())
            .collect();
        info!(
            "orchestrator: {} of {} styles qualify for token derivation",
            qualifying.len(),
            total
        );

        for def in &qualifying {
            self.process_style(def)?;
        }

        let store = self.store;
        self.link.post_config(store.clone())?;
        Ok(store)
    }

    fn process_style(&mut self, def: &StyleDefinition) -> Result<(), PipelineError> {
        let Some((group, variant)) = style::split_style_name(&def.name) else {
            return Ok(());
        };
        trace!(
            "orchestrator: style '{}' -> group '{}', variant '{}'",
            def.name,
            group,
            variant
        );

        // Every conversion below divides by the font size.
        if !def.font_size.is_finite() || def.font_size <= 0.0 {
            return Err(PipelineError::BadStyleGeometry {
                style: def.name.clone(),
                font_size: def.font_size,
            });
        }

        // Attributes that never depend on the rendered sample. Group-level
        // keys are overwritten by every variant; the last one wins.
        self.store.set_path(
            &[group, "fontSize", variant],
            TokenValue::Str(format!("{}px", def.font_size)),
        );
        self.store.set_path(
            &[group, "letterSpacing"],
            TokenValue::Str(format!(
                "{}em",
                style::letter_spacing_em(def.letter_spacing, def.font_size)
            )),
        );
        if let Some(transform) = def.text_case.text_transform() {
            self.store
                .set_path(&[group, "textTransform"], TokenValue::str(transform));
        }
        if let Some(family) = def.font.family() {
            self.store.set_path(
                &[group, "fontFamily"],
                TokenValue::Array(vec![TokenValue::str(family)]),
            );
        }
        let parsed = parse_font_style(def.font.face_label().unwrap_or(""));
        self.store.set_path(
            &[group, "fontWeight"],
            TokenValue::Number(f64::from(parsed.weight)),
        );
        self.store
            .set_path(&[group, "fontStyle"], TokenValue::str(parsed.slant.as_css()));

        // Crop is computed once per group, claimed by whichever variant
        // gets here first.
        if self.crop_requested.contains(group) {
            trace!(
                "orchestrator: crop for group '{}' already requested; skipping",
                group
            );
            return Ok(());
        }

        self.measure_crop(def, group)
    }

    /// Issues the one render/scan round trip for `group` and merges the
    /// crop and the measured line height into the store.
    fn measure_crop(&mut self, def: &StyleDefinition, group: &str) -> Result<(), PipelineError> {
        // Explicit line height first; `Auto` stays null until measured.
        let line_height = style::line_height_ratio(def.line_height, def.font_size);
        self.store.set_path(
            &[group, "lineHeight"],
            line_height.map(TokenValue::Number).unwrap_or(TokenValue::Null),
        );

        // The placeholder goes in before the suspension point so later
        // variants of this group see the crop as already claimed even
        // while the render is in flight.
        self.store
            .set_path(&[group, "crop"], TokenValue::empty_object());
        self.crop_requested.insert(group.to_string());

        if !def.font.is_mixed() {
            self.provider
                .ensure_font_loaded(&def.font)
                .map_err(PipelineError::Provider)?;
        }

        debug!(
            "orchestrator: rendering sample for style '{}' (group '{}')",
            def.name, group
        );
        let bytes = self
            .provider
            .render_sample_glyph_image(&def.id, SAMPLE_TEXT)
            .map_err(PipelineError::Provider)?;

        let bounds = self.link.request_scan(&def.id, bytes)?;
        self.merge_crop(def, group, bounds);
        Ok(())
    }

    fn merge_crop(&mut self, def: &StyleDefinition, group: &str, bounds: ScanBounds) {
        let ScanBounds { top, bottom, height } = bounds;
        if top.is_none() || bottom.is_none() {
            warn!(
                "orchestrator: sample for group '{}' had no opaque pixels; crop bounds stay null",
                group
            );
        }

        let mut crop = TokenMap::new();
        crop.insert("top", opt_number(top));
        crop.insert("bottom", opt_number(bottom));
        crop.insert("fontSize", TokenValue::Number(def.font_size));
        self.store.set_path(&[group, "crop"], TokenValue::Object(crop));

        // A deferred line height resolves to the full rendered extent
        // over the font size.
        if matches!(
            self.store.get_path(&[group, "lineHeight"]),
            Some(TokenValue::Null)
        ) {
            let measured = f64::from(height) / def.font_size;
            debug!(
                "orchestrator: measured line height {} for group '{}'",
                measured, group
            );
            self.store
                .set_path(&[group, "lineHeight"], TokenValue::Number(measured));
        }

        // The final line height, explicit or measured, is mirrored into
        // the crop so its consumers never need the parent key.
        let line_height = self
            .store
            .get_path(&[group, "lineHeight"])
            .cloned()
            .unwrap_or(TokenValue::Null);
        self.store
            .set_path(&[group, "crop", "lineHeight"], line_height);
    }
}

fn opt_number(value: Option<u32>) -> TokenValue {
    value
        .map(|n| TokenValue::Number(f64::from(n)))
        .unwrap_or(TokenValue::Null)
}
