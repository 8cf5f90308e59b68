// src/style.rs

//! Text style definitions as read from the host document, plus the unit
//! conversions that turn raw style values into CSS-like token values.
//!
//! A style's display name is hierarchical with exactly one `/` separating
//! the group from the variant ("Body/sm"); names with zero or multiple
//! separators never enter the pipeline. All numeric conversions are
//! relative to the style's own font size.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The hierarchical separator in style display names.
pub const NAME_SEPARATOR: char = '/';

/// Unique identity of a text style inside the host document. Doubles as
/// the correlation id for render/scan round trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleId(pub String);

impl StyleId {
    pub fn new(id: impl Into<String>) -> Self {
        StyleId(id.into())
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete font face: family plus face label ("Inter", "Extra Bold").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

/// Font reference on a style. `Mixed` is the host's shared symbolic
/// placeholder for styles spanning multiple faces; it cannot be loaded
/// and carries no family or face label. Serialized as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontRef {
    Concrete(FontName),
    Mixed,
}

impl FontRef {
    pub fn is_mixed(&self) -> bool {
        matches!(self, FontRef::Mixed)
    }

    pub fn family(&self) -> Option<&str> {
        match self {
            FontRef::Concrete(font) => Some(&font.family),
            FontRef::Mixed => None,
        }
    }

    /// The face label the weight/slant parser runs against.
    pub fn face_label(&self) -> Option<&str> {
        match self {
            FontRef::Concrete(font) => Some(&font.style),
            FontRef::Mixed => None,
        }
    }
}

/// Line height as stored on the style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "UPPERCASE")]
pub enum LineHeight {
    Percent(f64),
    Pixels(f64),
    Auto,
}

/// Letter spacing as stored on the style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "UPPERCASE")]
pub enum LetterSpacing {
    Percent(f64),
    Pixels(f64),
}

/// Text case transformation as stored on the style. Host values outside
/// the known four land on `Unknown` and produce no `textTransform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextCase {
    Original,
    Upper,
    Lower,
    Title,
    #[serde(other)]
    Unknown,
}

impl TextCase {
    /// CSS `text-transform` value for this case. `Unknown` degrades to
    /// `None` and the attribute is simply omitted.
    pub fn text_transform(self) -> Option<&'static str> {
        match self {
            TextCase::Original => Some("none"),
            TextCase::Upper => Some("uppercase"),
            TextCase::Lower => Some("lowercase"),
            TextCase::Title => Some("capitalize"),
            TextCase::Unknown => None,
        }
    }
}

/// A text style definition as enumerated by the host document. Read-only
/// to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefinition {
    pub id: StyleId,
    pub name: String,
    pub font_size: f64,
    #[serde(rename = "fontName")]
    pub font: FontRef,
    pub line_height: LineHeight,
    pub letter_spacing: LetterSpacing,
    pub text_case: TextCase,
}

/// Splits a hierarchical style name into `(group, variant)`.
///
/// Only names with exactly one separator qualify; anything else returns
/// `None` and the style is excluded from the pipeline.
pub fn split_style_name(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.split(NAME_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(variant), None) => Some((group, variant)),
        _ => None,
    }
}

/// Letter spacing in `em` units relative to the style's own font size.
pub fn letter_spacing_em(spacing: LetterSpacing, font_size: f64) -> f64 {
    match spacing {
        LetterSpacing::Percent(value) => value / 100.0,
        LetterSpacing::Pixels(value) => value / font_size,
    }
}

/// Explicit line height as a ratio of the font size. `Auto` has no
/// explicit value and defers to the measured sample height.
pub fn line_height_ratio(line_height: LineHeight, font_size: f64) -> Option<f64> {
    match line_height {
        LineHeight::Percent(value) => Some(value / 100.0),
        LineHeight::Pixels(value) => Some(value / font_size),
        LineHeight::Auto => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_names_with_exactly_one_separator() {
        assert_eq!(split_style_name("Body/sm"), Some(("Body", "sm")));
        assert_eq!(split_style_name("Heading/2xl"), Some(("Heading", "2xl")));
        // A trailing separator still counts as one; the variant is empty.
        assert_eq!(split_style_name("Body/"), Some(("Body", "")));
    }

    #[test]
    fn rejects_names_with_zero_or_many_separators() {
        assert_eq!(split_style_name("Body"), None);
        assert_eq!(split_style_name("Marketing/Body/sm"), None);
        assert_eq!(split_style_name(""), None);
    }

    #[test]
    fn letter_spacing_percent_is_relative_to_100() {
        assert_eq!(letter_spacing_em(LetterSpacing::Percent(10.0), 99.0), 0.1);
        assert_eq!(letter_spacing_em(LetterSpacing::Percent(0.0), 14.0), 0.0);
    }

    #[test]
    fn letter_spacing_pixels_is_relative_to_font_size() {
        assert_eq!(letter_spacing_em(LetterSpacing::Pixels(4.0), 16.0), 0.25);
    }

    #[test]
    fn line_height_conversions() {
        assert_eq!(line_height_ratio(LineHeight::Percent(150.0), 18.0), Some(1.5));
        assert_eq!(line_height_ratio(LineHeight::Pixels(28.0), 14.0), Some(2.0));
        assert_eq!(line_height_ratio(LineHeight::Auto, 14.0), None);
    }

    #[test]
    fn text_transform_lookup() {
        assert_eq!(TextCase::Original.text_transform(), Some("none"));
        assert_eq!(TextCase::Upper.text_transform(), Some("uppercase"));
        assert_eq!(TextCase::Lower.text_transform(), Some("lowercase"));
        assert_eq!(TextCase::Title.text_transform(), Some("capitalize"));
        assert_eq!(TextCase::Unknown.text_transform(), None);
    }

    #[test]
    fn style_definition_deserializes_from_document_json() {
        let raw = r#"{
            "id": "S:1a2b",
            "name": "Body/sm",
            "fontSize": 14,
            "fontName": { "family": "Inter", "style": "Regular" },
            "lineHeight": { "unit": "PERCENT", "value": 150 },
            "letterSpacing": { "unit": "PIXELS", "value": 0.5 },
            "textCase": "ORIGINAL"
        }"#;
        let style: StyleDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(style.id, StyleId::new("S:1a2b"));
        assert_eq!(style.font_size, 14.0);
        assert_eq!(style.font.family(), Some("Inter"));
        assert_eq!(style.line_height, LineHeight::Percent(150.0));
        assert_eq!(style.letter_spacing, LetterSpacing::Pixels(0.5));
        assert_eq!(style.text_case, TextCase::Original);
    }

    #[test]
    fn auto_line_height_and_mixed_font_deserialize() {
        let raw = r#"{
            "id": "S:9",
            "name": "Display/lg",
            "fontSize": 48,
            "fontName": null,
            "lineHeight": { "unit": "AUTO" },
            "letterSpacing": { "unit": "PERCENT", "value": -2 },
            "textCase": "UPPER"
        }"#;
        let style: StyleDefinition = serde_json::from_str(raw).unwrap();
        assert!(style.font.is_mixed());
        assert_eq!(style.font.family(), None);
        assert_eq!(style.line_height, LineHeight::Auto);
    }

    #[test]
    fn unknown_text_case_is_tolerated() {
        let style: TextCase = serde_json::from_str(r#""SMALL_CAPS""#).unwrap();
        assert_eq!(style, TextCase::Unknown);
    }
}
