// src/fontstyle.rs

//! Parses a font face label ("Extra Bold Italic") into a numeric CSS
//! weight and a slant.
//!
//! Matching is whole-word and case-insensitive over the label's word
//! tokens, so "Lighthouse" never classifies as light and a run-together
//! "ExtraLight" (a single token) classifies as the 400 default, the same
//! way `\b`-anchored matching would.

/// CSS slant derived from a face label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slant {
    Normal,
    Italic,
    Oblique,
}

impl Slant {
    pub fn as_css(self) -> &'static str {
        match self {
            Slant::Normal => "normal",
            Slant::Italic => "italic",
            Slant::Oblique => "oblique",
        }
    }
}

/// Parsed weight and slant for one face label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFontStyle {
    pub weight: u16,
    pub slant: Slant,
}

/// One weight classification rule, matched against the label's word tokens.
enum WeightRule {
    /// Any one of these words on its own.
    AnyWord(&'static [&'static str]),
    /// A prefix word immediately followed by the base word
    /// ("extra light", "ultra-bold").
    Pair(&'static [&'static str], &'static str),
}

/// Ordered, first match wins. Compound rules sit above their base word so
/// "Extra Light" never falls through to plain light.
const WEIGHT_RULES: &[(WeightRule, u16)] = &[
    (WeightRule::AnyWord(&["thin", "hairline"]), 100),
    (WeightRule::Pair(&["extra", "ultra"], "light"), 200),
    (WeightRule::AnyWord(&["light"]), 300),
    (WeightRule::AnyWord(&["medium"]), 500),
    (WeightRule::Pair(&["semi", "demi"], "bold"), 600),
    (WeightRule::Pair(&["extra", "ultra"], "bold"), 800),
    (WeightRule::AnyWord(&["bold"]), 700),
    (WeightRule::Pair(&["extra", "ultra"], "black"), 950),
    (WeightRule::AnyWord(&["black"]), 900),
];

const DEFAULT_WEIGHT: u16 = 400;

impl WeightRule {
    fn matches(&self, words: &[String]) -> bool {
        match self {
            WeightRule::AnyWord(options) => {
                words.iter().any(|word| options.contains(&word.as_str()))
            }
            WeightRule::Pair(prefixes, base) => words
                .windows(2)
                .any(|pair| prefixes.contains(&pair[0].as_str()) && pair[1] == *base),
        }
    }
}

fn tokenize(label: &str) -> Vec<String> {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

/// Classifies a face label. Weight and slant are independent: both checks
/// run against the same tokens.
pub fn parse_font_style(label: &str) -> ParsedFontStyle {
    let words = tokenize(label);

    let weight = WEIGHT_RULES
        .iter()
        .find(|(rule, _)| rule.matches(&words))
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_WEIGHT);

    let slant = if words.iter().any(|word| word == "italic") {
        Slant::Italic
    } else if words.iter().any(|word| word == "oblique") {
        Slant::Oblique
    } else {
        Slant::Normal
    };

    ParsedFontStyle { weight, slant }
}
