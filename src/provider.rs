// src/provider.rs

//! Boundary with the host document, plus a file-backed stand-in used by
//! the binary and the end-to-end tests.

use crate::style::{FontRef, StyleDefinition, StyleId};
use anyhow::{anyhow, Context, Result};
use image::{Rgba, RgbaImage};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// The privileged host document API.
///
/// `render_sample_glyph_image` creates a transient text node for the
/// render and must discard it before returning, on success and failure
/// alike; nothing of the scratch geometry may survive the call. That
/// discipline is why the orchestrator keeps at most one render in flight.
pub trait StyleProvider {
    /// Enumerates the document's text style definitions, in document order.
    fn list_text_styles(&mut self) -> Result<Vec<StyleDefinition>>;

    /// Loads the style's font so a sample can be typeset. Idempotent.
    /// Never called with a `Mixed` reference.
    fn ensure_font_loaded(&mut self, font: &FontRef) -> Result<()>;

    /// Typesets `sample_text` in the identified style and returns the
    /// rendered image as PNG bytes.
    fn render_sample_glyph_image(&mut self, id: &StyleId, sample_text: &str) -> Result<Vec<u8>>;
}

/// Row range (inclusive) of opaque ink on a synthesized sample canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkBand {
    pub first_row: u32,
    pub last_row: u32,
}

/// Synthetic metrics for one style's sample render. Rows inside `ink`
/// are filled opaque; a missing band leaves the whole canvas transparent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleInk {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub ink: Option<InkBand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FixtureStyle {
    #[serde(flatten)]
    style: StyleDefinition,
    #[serde(default)]
    sample: Option<SampleInk>,
}

/// A document fixture: the styles the "host document" contains, plus the
/// ink metrics its renders would produce. Stands in for a live document
/// connection in the binary and in end-to-end tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDocument {
    styles: Vec<FixtureStyle>,
    #[serde(skip)]
    loaded_fonts: Vec<String>,
    #[serde(skip)]
    renders: usize,
}

impl FixtureDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading document fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing document fixture {}", path.display()))
    }

    /// Builds a fixture in memory; used by tests.
    pub fn from_styles(styles: Vec<(StyleDefinition, Option<SampleInk>)>) -> Self {
        FixtureDocument {
            styles: styles
                .into_iter()
                .map(|(style, sample)| FixtureStyle { style, sample })
                .collect(),
            loaded_fonts: Vec::new(),
            renders: 0,
        }
    }

    /// Number of sample renders performed so far.
    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl StyleProvider for FixtureDocument {
    fn list_text_styles(&mut self) -> Result<Vec<StyleDefinition>> {
        Ok(self.styles.iter().map(|entry| entry.style.clone()).collect())
    }

    fn ensure_font_loaded(&mut self, font: &FontRef) -> Result<()> {
        let family = font
            .family()
            .ok_or_else(|| anyhow!("cannot load a mixed font reference"))?;
        if !self.loaded_fonts.iter().any(|loaded| loaded == family) {
            debug!("fixture: loading font family '{}'", family);
            self.loaded_fonts.push(family.to_string());
        }
        Ok(())
    }

    fn render_sample_glyph_image(&mut self, id: &StyleId, sample_text: &str) -> Result<Vec<u8>> {
        let sample = {
            let entry = self
                .styles
                .iter()
                .find(|entry| &entry.style.id == id)
                .ok_or_else(|| anyhow!("unknown style id '{}'", id))?;
            entry
                .sample
                .clone()
                .ok_or_else(|| anyhow!("no sample metrics for style '{}'", id))?
        };
        trace!(
            "fixture: rendering '{}' in style '{}' on a {}x{} canvas",
            sample_text,
            id,
            sample.width,
            sample.height
        );
        self.renders += 1;
        synthesize_png(&sample)
    }
}

/// Paints the declared ink band onto a transparent canvas and encodes it
/// as PNG, the fixture's version of "typeset the sample and export".
fn synthesize_png(sample: &SampleInk) -> Result<Vec<u8>> {
    let mut frame = RgbaImage::new(sample.width, sample.height);
    if let Some(band) = sample.ink {
        let last = band.last_row.min(sample.height.saturating_sub(1));
        for y in band.first_row..=last {
            for x in 0..sample.width {
                frame.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
    }
    let mut bytes = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("encoding sample PNG")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{decode_sample, scan_alpha_bounds};
    use crate::style::{FontName, LetterSpacing, LineHeight, TextCase};

    fn style(id: &str, name: &str) -> StyleDefinition {
        StyleDefinition {
            id: StyleId::new(id),
            name: name.to_string(),
            font_size: 16.0,
            font: FontRef::Concrete(FontName {
                family: "Inter".to_string(),
                style: "Regular".to_string(),
            }),
            line_height: LineHeight::Auto,
            letter_spacing: LetterSpacing::Percent(0.0),
            text_case: TextCase::Original,
        }
    }

    #[test]
    fn synthesized_ink_survives_the_decode_and_scan() {
        let sample = SampleInk {
            width: 60,
            height: 40,
            ink: Some(InkBand {
                first_row: 8,
                last_row: 33,
            }),
        };
        let bytes = synthesize_png(&sample).unwrap();
        let frame = decode_sample(&bytes).unwrap();
        let bounds = scan_alpha_bounds(&frame);
        assert_eq!(bounds.top, Some(8));
        assert_eq!(bounds.bottom, Some(7));
        assert_eq!(bounds.height, 40);
    }

    #[test]
    fn missing_ink_renders_a_transparent_canvas() {
        let sample = SampleInk {
            width: 10,
            height: 10,
            ink: None,
        };
        let bytes = synthesize_png(&sample).unwrap();
        let bounds = scan_alpha_bounds(&decode_sample(&bytes).unwrap());
        assert_eq!(bounds.top, None);
        assert_eq!(bounds.bottom, None);
    }

    #[test]
    fn rendering_an_unknown_style_fails() {
        let mut doc = FixtureDocument::from_styles(vec![(style("S:1", "Body/sm"), None)]);
        assert!(doc
            .render_sample_glyph_image(&StyleId::new("S:404"), "HHHHH")
            .is_err());
    }

    #[test]
    fn rendering_without_sample_metrics_fails() {
        let mut doc = FixtureDocument::from_styles(vec![(style("S:1", "Body/sm"), None)]);
        assert!(doc
            .render_sample_glyph_image(&StyleId::new("S:1"), "HHHHH")
            .is_err());
        assert_eq!(doc.renders(), 0);
    }

    #[test]
    fn font_loading_is_idempotent() {
        let mut doc = FixtureDocument::from_styles(vec![(style("S:1", "Body/sm"), None)]);
        let font = FontRef::Concrete(FontName {
            family: "Inter".to_string(),
            style: "Regular".to_string(),
        });
        doc.ensure_font_loaded(&font).unwrap();
        doc.ensure_font_loaded(&font).unwrap();
        assert_eq!(doc.loaded_fonts, vec!["Inter".to_string()]);
    }

    #[test]
    fn fixture_parses_from_document_json() {
        let raw = r#"{
            "styles": [
                {
                    "id": "S:1",
                    "name": "Body/sm",
                    "fontSize": 14,
                    "fontName": { "family": "Inter", "style": "Regular" },
                    "lineHeight": { "unit": "AUTO" },
                    "letterSpacing": { "unit": "PERCENT", "value": 0 },
                    "textCase": "ORIGINAL",
                    "sample": { "width": 60, "height": 40, "ink": { "firstRow": 8, "lastRow": 33 } }
                }
            ]
        }"#;
        let mut doc: FixtureDocument = serde_json::from_str(raw).unwrap();
        let styles = doc.list_text_styles().unwrap();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].name, "Body/sm");
        let bytes = doc
            .render_sample_glyph_image(&StyleId::new("S:1"), "HHHHH")
            .unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(doc.renders(), 1);
    }
}
