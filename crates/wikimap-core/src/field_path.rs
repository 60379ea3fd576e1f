//! Field path resolution over Omeka S records
//!
//! Omeka S exports items as nested JSON-LD: properties hold arrays of value
//! objects (`{"type": "literal", "@value": ...}`, `{"type": "uri", "@id": ...,
//! "o:label": ...}`), and linked resources carry `display_title`. This module
//! walks dot-separated paths into such records and turns whatever it lands on
//! into a display string.
//!
//! Copyright (c) 2025 Wikimap Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

/// Keys that carry the human-readable part of an object, in priority order
pub const VALUE_KEYS: [&str; 7] = [
    "@value",
    "o:label",
    "value",
    "name",
    "title",
    "label",
    "display_title",
];

/// Walk `path` (e.g. `publisher.o:label` or `dcterms:creator.0.@value`) into `record`.
///
/// Objects are indexed by key and arrays by numeric index. Returns `None` as
/// soon as a segment is missing or the current node cannot be indexed.
pub fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve `path` against `record` to a best-effort string; unresolved paths give `""`.
pub fn resolve_field_path(record: &Value, path: &str) -> String {
    match lookup_path(record, path) {
        Some(node) => extract_display_value(node),
        None => {
            tracing::trace!(path, "Field path did not resolve");
            String::new()
        }
    }
}

/// String form of a resolved node.
///
/// Strings are returned verbatim, objects yield their first value-bearing key
/// (see [`VALUE_KEYS`]), arrays join their elements with `", "`, anything else
/// is stringified.
pub fn extract_display_value(node: &Value) -> String {
    match node {
        Value::String(s) => s.clone(),
        Value::Object(map) => VALUE_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .map(extract_display_value)
            .unwrap_or_else(|| stringify(node)),
        Value::Array(items) => items
            .iter()
            .map(extract_display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => stringify(other),
    }
}

/// Convert a sample value from an Omeka record to the string shown to users.
///
/// Typed values pick the key that matters for their type before falling back
/// to the shared [`VALUE_KEYS`] order, so previews and applied mappings agree.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first().map(display_string).unwrap_or_default(),
        Value::Object(map) => {
            let preferred: &[&str] = match map.get("type").and_then(Value::as_str) {
                Some("literal") => &["@value"],
                Some(t) if t.starts_with("numeric:") => &["@value"],
                Some(t) if t.starts_with("valuesuggest:") => &["o:label", "@id"],
                Some("uri") => &["o:label", "@id"],
                Some(t) if t.starts_with("resource") => &["display_title", "o:label", "@id"],
                _ => &[],
            };
            preferred
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|v| !is_blank(v))
                .map(extract_display_value)
                .unwrap_or_else(|| extract_display_value(value))
        }
        other => stringify(other),
    }
}

/// Generic string conversion: scalars coerced, null empty, containers as compact JSON
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> Value {
        json!({
            "o:id": 17,
            "o:title": "Portrait of a Lady",
            "author": {"name": "Jane"},
            "publisher": {"o:label": "Rijksmuseum", "@id": "https://example.org/p/1"},
            "dcterms:creator": [
                {"type": "literal", "@value": "Vermeer"},
                {"type": "literal", "@value": "Anonymous"}
            ],
            "flags": {"public": true},
            "dimensions": {"width": 40}
        })
    }

    #[test]
    fn test_string_terminal_is_verbatim() {
        assert_eq!(resolve_field_path(&item(), "o:title"), "Portrait of a Lady");
        assert_eq!(resolve_field_path(&item(), "author.name"), "Jane");
    }

    #[test]
    fn test_object_terminal_uses_value_keys() {
        assert_eq!(resolve_field_path(&item(), "publisher"), "Rijksmuseum");
        assert_eq!(resolve_field_path(&item(), "author"), "Jane");
    }

    #[test]
    fn test_value_key_priority() {
        let record = json!({"x": {"label": "low", "@value": "high", "name": "mid"}});
        assert_eq!(resolve_field_path(&record, "x"), "high");

        let record = json!({"x": {"display_title": "last", "title": "first"}});
        assert_eq!(resolve_field_path(&record, "x"), "first");
    }

    #[test]
    fn test_array_index_segments() {
        assert_eq!(resolve_field_path(&item(), "dcterms:creator.1.@value"), "Anonymous");
        assert_eq!(resolve_field_path(&item(), "dcterms:creator.5"), "");
        assert_eq!(resolve_field_path(&item(), "dcterms:creator.first"), "");
    }

    #[test]
    fn test_array_terminal_joins_elements() {
        assert_eq!(resolve_field_path(&item(), "dcterms:creator"), "Vermeer, Anonymous");
    }

    #[test]
    fn test_missing_segments_resolve_empty() {
        assert_eq!(resolve_field_path(&item(), "author.email"), "");
        assert_eq!(resolve_field_path(&item(), "o:title.length"), "");
        assert_eq!(resolve_field_path(&json!({}), "author.name"), "");
        assert_eq!(resolve_field_path(&item(), ""), "");
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(resolve_field_path(&item(), "o:id"), "17");
        assert_eq!(resolve_field_path(&item(), "flags.public"), "true");
        assert_eq!(resolve_field_path(&json!({"n": null}), "n"), "");
    }

    #[test]
    fn test_object_without_value_keys_falls_back_to_json() {
        assert_eq!(
            resolve_field_path(&item(), "dimensions"),
            r#"{"width":40}"#
        );
    }

    #[test]
    fn test_display_string_typed_values() {
        assert_eq!(
            display_string(&json!({"type": "literal", "@value": "1642", "o:label": "ignored"})),
            "1642"
        );
        assert_eq!(
            display_string(&json!({"type": "uri", "@id": "https://www.wikidata.org/wiki/Q5", "o:label": "human"})),
            "human"
        );
        assert_eq!(
            display_string(&json!({"type": "uri", "@id": "https://www.wikidata.org/wiki/Q5"})),
            "https://www.wikidata.org/wiki/Q5"
        );
        assert_eq!(
            display_string(&json!({"type": "valuesuggest:wikidata:all", "@id": "http://www.wikidata.org/entity/Q42", "o:label": "Douglas Adams"})),
            "Douglas Adams"
        );
        assert_eq!(
            display_string(&json!({"type": "numeric:timestamp", "@value": "1999-05-01"})),
            "1999-05-01"
        );
        assert_eq!(
            display_string(&json!({"type": "resource:item", "display_title": "Delft", "value_resource_id": 3})),
            "Delft"
        );
    }

    #[test]
    fn test_display_string_untyped_and_arrays() {
        assert_eq!(display_string(&json!([{"@value": "first"}, {"@value": "second"}])), "first");
        assert_eq!(display_string(&json!([])), "");
        assert_eq!(display_string(&json!({"title": "Untyped"})), "Untyped");
        assert_eq!(display_string(&json!(3.5)), "3.5");
    }
}
