//! Structural diffing of manifest JSON documents.
//!
//! Element order inside arrays never counts as a change (Graph collection
//! ordering is not stable across exports), and the top-level
//! `lastModifiedDateTime` field is excluded because it moves on every
//! re-export without semantic content change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields excluded from comparison at the document root.
pub const EXCLUDED_FIELDS: &[&str] = &["lastModifiedDateTime"];

/// One changed field: old and/or new value, with the absent side omitted.
/// Value changes carry both; added keys carry only `new`; removed keys
/// carry only `old`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

impl FieldDiff {
    fn changed(old: &Value, new: &Value) -> Self {
        Self {
            old: Some(old.clone()),
            new: Some(new.clone()),
        }
    }

    fn added(new: &Value) -> Self {
        Self {
            old: None,
            new: Some(new.clone()),
        }
    }

    fn removed(old: &Value) -> Self {
        Self {
            old: Some(old.clone()),
            new: None,
        }
    }
}

/// Compares two manifest documents and returns the changed fields keyed by
/// dotted path. Empty means the documents are structurally equal.
pub fn diff_documents(old: &Value, new: &Value) -> BTreeMap<String, FieldDiff> {
    let mut changes = BTreeMap::new();
    diff_value("", old, new, true, &mut changes);
    changes
}

fn diff_value(
    path: &str,
    old: &Value,
    new: &Value,
    at_root: bool,
    changes: &mut BTreeMap<String, FieldDiff>,
) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for (key, old_value) in old_map {
                if at_root && EXCLUDED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let child = join_path(path, key);
                match new_map.get(key) {
                    Some(new_value) => diff_value(&child, old_value, new_value, false, changes),
                    None => {
                        changes.insert(child, FieldDiff::removed(old_value));
                    }
                }
            }
            for (key, new_value) in new_map {
                if at_root && EXCLUDED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                if !old_map.contains_key(key) {
                    changes.insert(join_path(path, key), FieldDiff::added(new_value));
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            if !arrays_equal_unordered(old_items, new_items) {
                changes.insert(path.to_string(), FieldDiff::changed(old, new));
            }
        }
        _ => {
            if old != new {
                changes.insert(path.to_string(), FieldDiff::changed(old, new));
            }
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Multiset equality: same elements with the same multiplicities, order
/// ignored at every nesting level.
fn arrays_equal_unordered(old: &[Value], new: &[Value]) -> bool {
    if old.len() != new.len() {
        return false;
    }
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for v in old {
        *counts.entry(canonical(v)).or_default() += 1;
    }
    for v in new {
        let entry = counts.entry(canonical(v)).or_default();
        *entry -= 1;
        if *entry < 0 {
            return false;
        }
    }
    counts.values().all(|&c| c == 0)
}

/// Canonical text form: the value normalized (object keys sorted, array
/// elements sorted by their own canonical form) and serialized as JSON, so
/// keys containing delimiter characters stay unambiguous. Two semantically
/// equal values canonicalize identically regardless of key or element order.
fn canonical(value: &Value) -> String {
    serde_json::to_string(&normalize(value)).unwrap_or_default()
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for key in keys {
                out.insert(key.clone(), normalize(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut normalized: Vec<Value> = items.iter().map(normalize).collect();
            normalized.sort_by_cached_key(|v| serde_json::to_string(v).unwrap_or_default());
            Value::Array(normalized)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents_have_no_changes() {
        let doc = json!({"id": "a", "rules": [{"x": 1}, {"x": 2}]});
        assert!(diff_documents(&doc, &doc).is_empty());
    }

    #[test]
    fn test_last_modified_only_change_is_ignored() {
        let old = json!({"id": "a", "lastModifiedDateTime": "2024-01-01T00:00:00Z"});
        let new = json!({"id": "a", "lastModifiedDateTime": "2024-06-01T00:00:00Z"});
        assert!(diff_documents(&old, &new).is_empty());
    }

    #[test]
    fn test_nested_last_modified_still_compared() {
        // Only the top-level field is excluded.
        let old = json!({"inner": {"lastModifiedDateTime": "a"}});
        let new = json!({"inner": {"lastModifiedDateTime": "b"}});
        let changes = diff_documents(&old, &new);
        assert!(changes.contains_key("inner.lastModifiedDateTime"));
    }

    #[test]
    fn test_value_change_carries_old_and_new() {
        let old = json!({"displayName": "Before"});
        let new = json!({"displayName": "After"});
        let changes = diff_documents(&old, &new);
        let diff = &changes["displayName"];
        assert_eq!(diff.old, Some(json!("Before")));
        assert_eq!(diff.new, Some(json!("After")));
    }

    #[test]
    fn test_added_and_removed_keys_are_surfaced() {
        let old = json!({"keep": 1, "gone": "x"});
        let new = json!({"keep": 1, "fresh": {"nested": true}});
        let changes = diff_documents(&old, &new);
        assert_eq!(changes["gone"], FieldDiff::removed(&json!("x")));
        assert_eq!(changes["fresh"], FieldDiff::added(&json!({"nested": true})));
        assert!(!changes.contains_key("keep"));
    }

    #[test]
    fn test_array_reorder_is_not_a_change() {
        let old = json!({"returnCodes": [{"code": 0}, {"code": 3010}]});
        let new = json!({"returnCodes": [{"code": 3010}, {"code": 0}]});
        assert!(diff_documents(&old, &new).is_empty());
    }

    #[test]
    fn test_array_content_change_is_reported() {
        let old = json!({"returnCodes": [{"code": 0}]});
        let new = json!({"returnCodes": [{"code": 1}]});
        let changes = diff_documents(&old, &new);
        assert!(changes.contains_key("returnCodes"));
    }

    #[test]
    fn test_array_multiplicity_matters() {
        let old = json!({"a": [1, 1, 2]});
        let new = json!({"a": [1, 2, 2]});
        assert!(!diff_documents(&old, &new).is_empty());
    }

    #[test]
    fn test_keys_containing_delimiters_do_not_collide() {
        // A key with ':' or ',' in it must not canonicalize to the same
        // form as a pair of plain keys.
        let old = json!({"rules": [{"x": 1, "y:1,z": 2}]});
        let new = json!({"rules": [{"x": 1, "y": 1, "z": 2}]});
        let changes = diff_documents(&old, &new);
        assert!(changes.contains_key("rules"));
        assert_ne!(
            canonical(&json!({"y:1,z": 2})),
            canonical(&json!({"y": 1, "z": 2}))
        );
    }

    #[test]
    fn test_canonical_ignores_key_order() {
        let a = json!({"x": 1, "y": [3, 2]});
        let b = json!({"y": [2, 3], "x": 1});
        assert_eq!(canonical(&a), canonical(&b));
    }
}
