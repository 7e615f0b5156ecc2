//! Scalar metadata overlaid onto DESCRIPTION

use crate::errors::DescriptionError;
use serde_json::{Map, Number, Value};
use std::fmt;

/// A single metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Number(Number),
    Bool(bool),
    /// Non-scalar JSON kept verbatim; only produced when validation is off
    Raw(String),
}

impl MetadataValue {
    fn to_json(&self) -> Value {
        match self {
            MetadataValue::String(s) => Value::String(s.clone()),
            MetadataValue::Number(n) => Value::Number(n.clone()),
            MetadataValue::Bool(b) => Value::Bool(*b),
            MetadataValue::Raw(raw) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // Plain decimal, never exponent notation; `-0.0` prints as `0`
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{}", s),
            MetadataValue::Number(n) => write!(f, "{}", format_number(n)),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

/// Insertion-ordered field name to value map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetadataValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the metadata input.
    ///
    /// With `validate`, every value must be a string, number or boolean. Without
    /// it, nested values are kept as compact JSON text.
    pub fn from_json(text: &str, validate: bool) -> Result<Self, DescriptionError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value, validate)
    }

    pub fn from_value(value: Value, validate: bool) -> Result<Self, DescriptionError> {
        let Value::Object(map) = value else {
            return Err(if validate {
                DescriptionError::InvalidMetadata
            } else {
                DescriptionError::NotAnObject
            });
        };

        let mut metadata = Metadata::new();
        for (key, value) in map {
            let value = match value {
                Value::String(s) => MetadataValue::String(s),
                Value::Number(n) => MetadataValue::Number(n),
                Value::Bool(b) => MetadataValue::Bool(b),
                other if validate => {
                    tracing::debug!("Rejecting non-scalar metadata value for '{}': {}", key, other);
                    return Err(DescriptionError::InvalidMetadata);
                }
                other => MetadataValue::Raw(other.to_string()),
            };
            metadata.entries.push((key, value));
        }

        Ok(metadata)
    }

    /// Set `key`, replacing an identically named entry in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First entry whose key equals `name` ignoring case, with its position
    pub fn find_ignore_case(&self, name: &str) -> Option<(usize, &str, &MetadataValue)> {
        let wanted = name.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .find(|(_, (k, _))| k.to_lowercase() == wanted)
            .map(|(idx, (k, v))| (idx, k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compact JSON rendering for logs
    pub fn to_json_string(&self) -> String {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_scalars() {
        let parsed = Metadata::from_json(
            r#"{"Repository": "cran", "Count": 100, "Ratio": 0.5, "Public": true}"#,
            true,
        );
        let Ok(metadata) = parsed else {
            panic!("scalar metadata should validate");
        };
        assert_eq!(metadata.len(), 4);
        assert_eq!(metadata.get("Count").map(|v| v.to_string()).as_deref(), Some("100"));
        assert_eq!(metadata.get("Ratio").map(|v| v.to_string()).as_deref(), Some("0.5"));
        assert_eq!(metadata.get("Public").map(|v| v.to_string()).as_deref(), Some("true"));
    }

    #[test]
    fn test_rejects_non_objects() {
        for text in ["[1, 2]", "null", "\"text\"", "42"] {
            assert!(
                matches!(
                    Metadata::from_json(text, true),
                    Err(DescriptionError::InvalidMetadata)
                ),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_rejects_structured_values() {
        for text in [r#"{"a": null}"#, r#"{"a": [1]}"#, r#"{"a": {"b": 1}}"#] {
            assert!(matches!(
                Metadata::from_json(text, true),
                Err(DescriptionError::InvalidMetadata)
            ));
        }
    }

    #[test]
    fn test_lenient_keeps_structured_values_as_json() {
        let Ok(metadata) = Metadata::from_json(r#"{"a": [1, 2], "b": null}"#, false) else {
            panic!("lenient parsing should accept nested values");
        };
        assert_eq!(metadata.get("a").map(|v| v.to_string()).as_deref(), Some("[1,2]"));
        assert_eq!(metadata.get("b").map(|v| v.to_string()).as_deref(), Some("null"));
        assert!(matches!(
            Metadata::from_json("[]", false),
            Err(DescriptionError::NotAnObject)
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Metadata::from_json("{not json", true),
            Err(DescriptionError::Json(_))
        ));
    }

    #[test]
    fn test_number_rendering() {
        let Ok(metadata) = Metadata::from_json(r#"{"a": 1.0, "b": -3, "c": 2.5e3, "d": 1e-3}"#, true)
        else {
            panic!("numbers should validate");
        };
        let rendered: Vec<String> = metadata.iter().map(|(_, v)| v.to_string()).collect();
        assert_eq!(rendered, vec!["1", "-3", "2500", "0.001"]);
    }

    #[test]
    fn test_large_and_tiny_floats_stay_decimal() {
        let Ok(metadata) = Metadata::from_json(r#"{"big": 1e21, "tiny": 1e-7, "neg": -0.0}"#, true)
        else {
            panic!("numbers should validate");
        };
        let rendered: Vec<String> = metadata.iter().map(|(_, v)| v.to_string()).collect();
        assert_eq!(rendered, vec!["1000000000000000000000", "0.0000001", "0"]);
    }

    #[test]
    fn test_insert_preserves_position() {
        let mut metadata = Metadata::new();
        metadata.insert("GitSHA", "old");
        metadata.insert("Repository", "cran");
        metadata.insert("GitSHA", "new");

        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["GitSHA", "Repository"]);
        assert_eq!(metadata.get("GitSHA"), Some(&MetadataValue::from("new")));
    }

    #[test]
    fn test_find_ignore_case_returns_first_match() {
        let mut metadata = Metadata::new();
        metadata.insert("sha", "1");
        metadata.insert("SHA", "2");
        assert!(matches!(metadata.find_ignore_case("Sha"), Some((0, "sha", _))));
        assert!(metadata.find_ignore_case("origin").is_none());
    }

    #[test]
    fn test_insertion_order_survives_parsing() {
        let Ok(metadata) = Metadata::from_json(r#"{"z": 1, "a": 2, "m": 3}"#, true) else {
            panic!("metadata should parse");
        };
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(metadata.to_json_string(), r#"{"z":1,"a":2,"m":3}"#);
    }
}
