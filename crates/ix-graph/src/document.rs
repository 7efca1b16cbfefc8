//! Semi-structured payload type for Graph objects.
//!
//! Graph object shapes vary by subtype (compliance policies and Win32 apps
//! carry different nested rule structures), so payloads are kept as JSON
//! maps rather than fixed schemas. Typed accessors exist only for the
//! fields the export pipeline actually reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Graph API object or manifest: a JSON object with free-form fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The object's opaque ID, if present.
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    /// The object's display name, if present.
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("displayName")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Drops every null-valued key. Manifests never serialize nulls; a
    /// field appearing or disappearing across exports is itself the diff
    /// signal.
    pub fn compact(mut self) -> Self {
        self.0.retain(|_, v| !v.is_null());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl TryFrom<Value> for Document {
    type Error = Value;

    /// Fails (returning the value) when the JSON is not an object.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        Document::try_from(json!({
            "id": "abc-1",
            "displayName": "Baseline",
            "description": null,
            "rules": [1, 2, 3]
        }))
        .unwrap()
    }

    #[test]
    fn test_typed_accessors() {
        let doc = sample();
        assert_eq!(doc.id(), Some("abc-1"));
        assert_eq!(doc.display_name(), Some("Baseline"));
        assert!(doc.get("rules").unwrap().is_array());
    }

    #[test]
    fn test_compact_drops_nulls() {
        let doc = sample().compact();
        assert!(!doc.contains_key("description"));
        assert!(doc.contains_key("rules"));
        assert!(doc.iter().all(|(_, v)| !v.is_null()));
    }

    #[test]
    fn test_transparent_serde() {
        let doc = sample();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["id"], "abc-1");
        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_try_from_rejects_non_object() {
        assert!(Document::try_from(json!([1, 2])).is_err());
    }
}
