//! Infers a logical field type for a column of values.

use chrono::DateTime;
use uuid::Uuid;

use crate::config::CompressorOptions;
use crate::schema::FieldType;
use crate::value::Value;

/// Inspects the non-null values of `values` (`Missing` is assumed already
/// filtered by the caller) and returns a tag by the first matching rule, in
/// priority order. Empty or all-null columns default to `String`.
pub fn profile(values: &[Value], options: &CompressorOptions) -> FieldType {
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return FieldType::String;
    }

    if non_null.iter().all(|v| is_uuid_string(v)) {
        return FieldType::Uuid;
    }

    if non_null.iter().all(|v| is_timestamp_string(v)) {
        return FieldType::Timestamp;
    }

    if non_null.iter().all(|v| v.as_str().is_some()) {
        let distinct = distinct_count(&non_null);
        if distinct <= options.enum_max_distinct {
            return FieldType::Enum;
        }
    }

    if non_null.iter().all(|v| v.as_bool().is_some()) {
        return FieldType::Boolean;
    }

    if non_null.iter().all(|v| v.as_number().is_some()) {
        return FieldType::Number;
    }

    if non_null.iter().all(|v| v.as_array().is_some()) {
        let all_plain_objects = non_null
            .iter()
            .flat_map(|v| v.as_array().unwrap())
            .all(|item| item.is_null() || item.is_plain_object());
        let has_object = non_null
            .iter()
            .flat_map(|v| v.as_array().unwrap())
            .any(|item| item.is_plain_object());
        if all_plain_objects && has_object {
            return FieldType::Array;
        }

        let all_non_object = non_null
            .iter()
            .flat_map(|v| v.as_array().unwrap())
            .all(|item| !item.is_plain_object());
        if all_non_object {
            return FieldType::ArrayPrimitive;
        }
    }

    FieldType::String
}

fn is_uuid_string(value: &Value) -> bool {
    match value.as_str() {
        Some(s) => Uuid::parse_str(s).is_ok() && is_canonical_hyphenated(s),
        None => false,
    }
}

/// `Uuid::parse_str` also accepts simple (non-hyphenated) and braced forms;
/// the spec requires the canonical 36-char hyphenated form specifically.
fn is_canonical_hyphenated(s: &str) -> bool {
    s.len() == 36
        && s.as_bytes()[8] == b'-'
        && s.as_bytes()[13] == b'-'
        && s.as_bytes()[18] == b'-'
        && s.as_bytes()[23] == b'-'
}

fn is_timestamp_string(value: &Value) -> bool {
    match value.as_str() {
        Some(s) => DateTime::parse_from_rfc3339(s).is_ok(),
        None => false,
    }
}

fn distinct_count(values: &[&Value]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for v in values {
        if let Some(s) = v.as_str() {
            if !seen.contains(&s) {
                seen.push(s);
            }
        }
    }
    seen.len()
}
