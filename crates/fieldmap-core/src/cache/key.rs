//! Cache key construction
//!
//! Keys are built from canonical JSON: object keys are emitted in sorted order at
//! every depth, so logically equal values and option bags produce the same key
//! regardless of how their maps were built.

use crate::transformer::TransformOptions;
use serde_json::Value;

/// Build the cache key for one transformation call
///
/// Absent and empty options share a key.
pub fn cache_key(transformation_id: &str, value: &Value, options: &TransformOptions) -> String {
    let mut key = String::with_capacity(transformation_id.len() + 32);
    key.push_str(transformation_id);
    key.push('\u{1f}');
    write_canonical(value, &mut key);
    key.push('\u{1f}');
    if options.is_empty() {
        key.push_str("{}");
    } else {
        write_canonical_map(options.as_map(), &mut key);
    }
    key
}

/// Canonical JSON rendering of a value
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_canonical_map(map, out),
        // Scalars already render canonically
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_map(map: &serde_json::Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        if let Some(value) = map.get(key) {
            write_canonical(value, out);
        }
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_key_order_does_not_matter() {
        let mut a = Map::new();
        a.insert("b".to_string(), json!(1));
        a.insert("a".to_string(), json!({ "y": 2, "x": 1 }));
        let mut b = Map::new();
        b.insert("a".to_string(), json!({ "x": 1, "y": 2 }));
        b.insert("b".to_string(), json!(1));

        assert_eq!(canonical_json(&Value::Object(a)), canonical_json(&Value::Object(b)));
    }

    #[test]
    fn test_empty_options_match_default() {
        let value = json!("hello");
        assert_eq!(
            cache_key("t", &value, &TransformOptions::new()),
            cache_key("t", &value, &TransformOptions::from_value(json!({})))
        );
    }

    #[test]
    fn test_distinct_inputs_have_distinct_keys() {
        let options = TransformOptions::new();
        let a = cache_key("text_to_number", &json!("1"), &options);
        let b = cache_key("text_to_number", &json!(1), &options);
        let c = cache_key("text_to_select", &json!("1"), &options);
        assert_ne!(a, b);
        assert_ne!(a, c);

        let with_separator = TransformOptions::new().with("separator", ";");
        assert_ne!(a, cache_key("text_to_number", &json!("1"), &with_separator));
    }

    #[test]
    fn test_canonical_escapes_strings() {
        assert_eq!(canonical_json(&json!({ "k\"": "v\n" })), r#"{"k\"":"v\n"}"#);
    }
}
