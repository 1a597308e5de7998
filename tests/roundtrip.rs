use pretty_assertions::assert_eq;
use sajc::{compress, compress_columnar_post, decompress, Record, Value};

fn rec(pairs: Vec<(&str, Value)>) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn obj(pairs: Vec<(&str, Value)>) -> Value {
    Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// A batch mixing every logical type the profiler can assign, with nested
/// objects, missing keys, explicit nulls, and a nested array of objects.
fn mixed_batch() -> Vec<Record> {
    vec![
        rec(vec![
            ("id", Value::String("550e8400-e29b-41d4-a716-446655440000".to_string())),
            ("created_at", Value::String("2025-01-01T00:00:00.000Z".to_string())),
            ("status", Value::String("ACTIVE".to_string())),
            ("active", Value::Bool(true)),
            ("score", Value::Number(42.0)),
            ("price", Value::Number(19.99)),
            ("tags", Value::Array(vec![Value::String("a".to_string()), Value::String("b".to_string())])),
            (
                "items",
                Value::Array(vec![obj(vec![
                    ("sku", Value::String("X1".to_string())),
                    ("qty", Value::Number(3.0)),
                ])]),
            ),
            (
                "meta",
                obj(vec![("region", Value::String("us-east".to_string()))]),
            ),
            ("deleted_at", Value::String("2025-01-15T00:00:00.000Z".to_string())),
            ("note", Value::Null),
        ]),
        rec(vec![
            ("id", Value::String("550e8400-e29b-41d4-a716-446655440001".to_string())),
            ("created_at", Value::String("2025-01-01T00:00:01.500Z".to_string())),
            ("status", Value::String("INACTIVE".to_string())),
            ("active", Value::Bool(false)),
            ("score", Value::Number(7.0)),
            ("price", Value::Number(5.5)),
            ("tags", Value::Array(vec![Value::String("c".to_string())])),
            (
                "items",
                Value::Array(vec![
                    obj(vec![
                        ("sku", Value::String("X2".to_string())),
                        ("qty", Value::Number(1.0)),
                    ]),
                    obj(vec![
                        ("sku", Value::String("X3".to_string())),
                        ("qty", Value::Number(2.0)),
                    ]),
                ]),
            ),
            // "meta" omitted entirely on this row — exercises MISSING.
            ("deleted_at", Value::String("2025-02-01T00:00:00.000Z".to_string())),
            ("note", Value::String("reviewed".to_string())),
        ]),
    ]
}

#[test]
fn standard_roundtrip_preserves_all_logical_types() {
    let batch = mixed_batch();
    let encoded = compress(&batch).unwrap();
    assert_eq!(&encoded[0..4], b"SAJC");

    let decoded = decompress(&encoded).unwrap();
    assert_eq!(decoded, batch);
}

#[test]
fn columnar_post_roundtrip_preserves_all_logical_types() {
    let batch = mixed_batch();
    let encoded = compress_columnar_post(&batch).unwrap();
    assert_eq!(&encoded[0..4], b"SJCB");

    let decoded = decompress(&encoded).unwrap();
    assert_eq!(decoded, batch);
}

#[test]
fn missing_top_level_key_is_absent_after_roundtrip() {
    let batch = mixed_batch();
    let encoded = compress(&batch).unwrap();
    let decoded = decompress(&encoded).unwrap();
    assert!(!decoded[1].contains_key("meta"));
}

#[test]
fn single_record_batch_roundtrips() {
    let batch = vec![rec(vec![("solo", Value::Number(1.0))])];
    let encoded = compress(&batch).unwrap();
    let decoded = decompress(&encoded).unwrap();
    assert_eq!(decoded, batch);
}

#[test]
fn empty_batch_is_rejected() {
    let batch: Vec<Record> = Vec::new();
    assert!(compress(&batch).is_err());
    assert!(compress_columnar_post(&batch).is_err());
}
