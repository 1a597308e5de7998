//! Converts nested plain objects to a flat dotted-key map and back.
//!
//! Arrays are opaque leaves here: they are never flattened, since the array
//! codecs handle their own recursion over nested objects.

use std::collections::BTreeMap;

use crate::value::Value;

/// Depth-first walk of `record`: for each key whose value is a plain object
/// (not null, not an array, not `Missing`), prepend `parent.` and recurse;
/// otherwise emit `(full_path, value)`.
pub fn flatten(record: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    flatten_into(record, "", &mut out);
    out
}

fn flatten_into(record: &BTreeMap<String, Value>, prefix: &str, out: &mut BTreeMap<String, Value>) {
    for (key, value) in record {
        let full_path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten_into(nested, &full_path, out),
            other => {
                out.insert(full_path, other.clone());
            }
        }
    }
}

/// Rebuild nested objects from dotted keys. A `Missing` value for a key drops
/// that key entirely from the reconstructed object, distinguishing an absent
/// leaf from an explicit `null`.
pub fn unflatten(flat: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut root = BTreeMap::new();
    for (path, value) in flat {
        if value.is_missing() {
            continue;
        }
        insert_path(&mut root, path, value.clone());
    }
    root
}

fn insert_path(root: &mut BTreeMap<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.');
    let first = parts.next().expect("split always yields at least one part");
    let rest: Vec<&str> = parts.collect();

    if rest.is_empty() {
        root.insert(first.to_string(), value);
        return;
    }

    let entry = root
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(BTreeMap::new()));
    if !matches!(entry, Value::Object(_)) {
        *entry = Value::Object(BTreeMap::new());
    }
    if let Value::Object(nested) = entry {
        insert_path(nested, &rest.join("."), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn flattens_nested_objects() {
        let record = obj(vec![
            ("a", Value::Number(1.0)),
            (
                "b",
                Value::Object(obj(vec![("c", Value::Bool(true)), ("d", Value::Null)])),
            ),
        ]);
        let flat = flatten(&record);
        assert_eq!(flat.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(flat.get("b.c"), Some(&Value::Bool(true)));
        assert_eq!(flat.get("b.d"), Some(&Value::Null));
    }

    #[test]
    fn arrays_are_opaque_leaves() {
        let record = obj(vec![(
            "xs",
            Value::Array(vec![Value::Object(obj(vec![("k", Value::Number(1.0))]))]),
        )]);
        let flat = flatten(&record);
        assert!(flat.contains_key("xs"));
        assert!(!flat.contains_key("xs.k"));
    }

    #[test]
    fn unflatten_drops_missing_keys() {
        let flat = obj(vec![
            ("a", Value::Number(1.0)),
            ("b", Value::Missing),
            ("c.d", Value::Null),
        ]);
        let record = unflatten(&flat);
        assert_eq!(record.get("a"), Some(&Value::Number(1.0)));
        assert!(!record.contains_key("b"));
        match record.get("c") {
            Some(Value::Object(nested)) => assert_eq!(nested.get("d"), Some(&Value::Null)),
            other => panic!("expected nested object, got {other:?}"),
        }
    }

    #[test]
    fn flatten_unflatten_roundtrip() {
        let record = obj(vec![
            ("a", Value::Number(1.0)),
            (
                "b",
                Value::Object(obj(vec![("c", Value::String("x".to_string()))])),
            ),
        ]);
        let flat = flatten(&record);
        let rebuilt = unflatten(&flat);
        assert_eq!(rebuilt, record);
    }
}
