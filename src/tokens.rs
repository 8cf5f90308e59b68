// src/tokens.rs

//! The token tree: a path-addressed, insertion-ordered nested mapping the
//! orchestrator fills while it walks the document's styles.
//!
//! The tree is an explicit tagged structure rather than a generic JSON
//! value: key order must be the order paths were first written (it
//! survives into the export file), and `set_path` decides the kind of a
//! newly created intermediate container from the shape of the *next* path
//! segment (a bare integer index vivifies an array, anything else an
//! object).

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A single value in the token tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Null,
    Number(f64),
    Str(String),
    Array(Vec<TokenValue>),
    Object(TokenMap),
}

impl TokenValue {
    pub fn str(value: impl Into<String>) -> Self {
        TokenValue::Str(value.into())
    }

    pub fn empty_object() -> Self {
        TokenValue::Object(TokenMap::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&TokenMap> {
        match self {
            TokenValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

/// The root of an export session's token tree: group name → attribute
/// map. Built incrementally and handed to the UI side exactly once.
pub type TokenStore = TokenMap;

/// Insertion-ordered string-keyed map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenMap {
    entries: Vec<(String, TokenValue)>,
}

impl TokenMap {
    pub fn new() -> Self {
        TokenMap { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn get(&self, key: &str) -> Option<&TokenValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TokenValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Inserts or overwrites `key` in place; a fresh key appends, so
    /// insertion order is preserved across overwrites.
    pub fn insert(&mut self, key: impl Into<String>, value: TokenValue) {
        let key = key.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(pos) => self.entries[pos].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Descends `path` and returns the value there, or `None` as soon as
    /// any intermediate segment is absent or not a container.
    pub fn get_path(&self, path: &[&str]) -> Option<&TokenValue> {
        let (&head, rest) = path.split_first()?;
        let mut node = self.get(head)?;
        for &segment in rest {
            node = match node {
                TokenValue::Object(map) => map.get(segment)?,
                TokenValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Sets `value` at `path`, creating intermediate containers on demand.
    ///
    /// The terminal segment always overwrites. An intermediate that is
    /// missing (or holds a scalar) is replaced by a fresh container chosen
    /// from the *next* segment's shape; an existing container is descended
    /// into as-is. Sibling keys are never touched.
    pub fn set_path(&mut self, path: &[&str], value: TokenValue) {
        let Some((&head, rest)) = path.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.insert(head, value);
            return;
        }

        let pos = match self.entries.iter().position(|(k, _)| k == head) {
            Some(pos) => pos,
            None => {
                self.entries.push((head.to_string(), TokenValue::Null));
                self.entries.len() - 1
            }
        };
        let slot = &mut self.entries[pos].1;
        ensure_container(slot, looks_like_index(rest[0]));
        set_value_path(slot, rest, value);
    }
}

/// An index-shaped segment (all digits, no embedded `.`) vivifies an
/// array; everything else vivifies an object.
fn looks_like_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn ensure_container(node: &mut TokenValue, wants_array: bool) {
    match node {
        TokenValue::Object(_) | TokenValue::Array(_) => {}
        _ => {
            *node = if wants_array {
                TokenValue::Array(Vec::new())
            } else {
                TokenValue::Object(TokenMap::new())
            };
        }
    }
}

fn set_value_path(node: &mut TokenValue, path: &[&str], value: TokenValue) {
    let Some((&head, rest)) = path.split_first() else {
        return;
    };

    // A non-index key addressed into an array means the slot is really a
    // mapping; replace it before descending.
    if matches!(node, TokenValue::Array(_)) && head.parse::<usize>().is_err() {
        *node = TokenValue::Object(TokenMap::new());
    }

    match node {
        TokenValue::Object(map) => map.set_path(path, value),
        TokenValue::Array(items) => {
            let Ok(index) = head.parse::<usize>() else {
                return;
            };
            if items.len() <= index {
                items.resize(index + 1, TokenValue::Null);
            }
            if rest.is_empty() {
                items[index] = value;
            } else {
                ensure_container(&mut items[index], looks_like_index(rest[0]));
                set_value_path(&mut items[index], rest, value);
            }
        }
        // `ensure_container` ran on the way down; scalars cannot appear.
        _ => {}
    }
}

impl Serialize for TokenValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokenValue::Null => serializer.serialize_unit(),
            // Whole values export as integers so a 700 weight stays `700`.
            TokenValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            TokenValue::Number(n) => serializer.serialize_f64(*n),
            TokenValue::Str(s) => serializer.serialize_str(s),
            TokenValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TokenValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for TokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut root = TokenMap::new();
        root.set_path(&["Body", "fontSize", "sm"], TokenValue::str("14px"));
        assert_eq!(
            root.get_path(&["Body", "fontSize", "sm"]),
            Some(&TokenValue::str("14px"))
        );
    }

    #[test]
    fn absent_paths_are_none() {
        let mut root = TokenMap::new();
        root.set_path(&["Body", "fontSize"], TokenValue::str("14px"));
        assert_eq!(root.get_path(&["Body", "lineHeight"]), None);
        assert_eq!(root.get_path(&["Heading"]), None);
        // Descending through a scalar is absent, not an error.
        assert_eq!(root.get_path(&["Body", "fontSize", "sm"]), None);
    }

    #[test]
    fn sibling_paths_survive_later_sets() {
        let mut root = TokenMap::new();
        root.set_path(&["Body", "fontSize", "sm"], TokenValue::str("14px"));
        root.set_path(&["Body", "fontSize", "lg"], TokenValue::str("18px"));
        root.set_path(&["Body", "lineHeight"], TokenValue::Number(1.5));
        assert_eq!(
            root.get_path(&["Body", "fontSize", "sm"]),
            Some(&TokenValue::str("14px"))
        );
        assert_eq!(
            root.get_path(&["Body", "fontSize", "lg"]),
            Some(&TokenValue::str("18px"))
        );
    }

    #[test]
    fn terminal_segment_overwrites() {
        let mut root = TokenMap::new();
        root.set_path(&["Body", "lineHeight"], TokenValue::Null);
        root.set_path(&["Body", "lineHeight"], TokenValue::Number(2.0));
        assert_eq!(
            root.get_path(&["Body", "lineHeight"]),
            Some(&TokenValue::Number(2.0))
        );
    }

    #[test]
    fn integer_segments_vivify_arrays() {
        let mut root = TokenMap::new();
        root.set_path(&["stack", "2"], TokenValue::str("serif"));
        match root.get_path(&["stack"]) {
            Some(TokenValue::Array(items)) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0], TokenValue::Null);
                assert_eq!(items[1], TokenValue::Null);
                assert_eq!(items[2], TokenValue::str("serif"));
            }
            other => panic!("expected array, got {:?}", other),
        }
        assert_eq!(root.get_path(&["stack", "2"]), Some(&TokenValue::str("serif")));
    }

    #[test]
    fn non_integer_segments_vivify_objects() {
        let mut root = TokenMap::new();
        root.set_path(&["crop", "top"], TokenValue::Number(8.0));
        assert!(matches!(root.get_path(&["crop"]), Some(TokenValue::Object(_))));
    }

    #[test]
    fn insertion_order_is_preserved_through_overwrites() {
        let mut root = TokenMap::new();
        root.set_path(&["Body", "a"], TokenValue::Number(1.0));
        root.set_path(&["Heading", "a"], TokenValue::Number(2.0));
        root.set_path(&["Body", "a"], TokenValue::Number(3.0));
        let keys: Vec<&str> = root.keys().collect();
        assert_eq!(keys, vec!["Body", "Heading"]);
    }

    #[test]
    fn serializes_with_insertion_order_and_integer_numbers() {
        let mut root = TokenMap::new();
        root.set_path(&["Body", "fontWeight"], TokenValue::Number(700.0));
        root.set_path(&["Body", "lineHeight"], TokenValue::Number(1.5));
        root.set_path(&["Body", "crop", "top"], TokenValue::Null);
        root.set_path(
            &["Body", "fontFamily"],
            TokenValue::Array(vec![TokenValue::str("Inter")]),
        );
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(
            json,
            r#"{"Body":{"fontWeight":700,"lineHeight":1.5,"crop":{"top":null},"fontFamily":["Inter"]}}"#
        );
    }
}
