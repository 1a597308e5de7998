//! Codec for columns of arrays-of-primitives: row lengths plus one flat,
//! recursively-typed payload for every element across every row.

use bytes::{Bytes, BytesMut};
use snafu::{ensure, OptionExt};

use crate::config::CompressorOptions;
use crate::error::{ArrayLengthMismatchSnafu, Result, TruncatedSnafu, TypeMismatchSnafu};
use crate::profiler::profile;
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;
use crate::varint::{read_uvarint, write_uvarint};

use super::Codec;

pub struct ArrayPrimitiveCodec {
    options: CompressorOptions,
}

impl ArrayPrimitiveCodec {
    pub fn new(options: CompressorOptions) -> Self {
        Self { options }
    }
}

impl Codec for ArrayPrimitiveCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::ArrayPrimitive
    }

    fn encode(&self, values: &[Value], registry: &CodecRegistry) -> Result<Bytes> {
        let rows: Vec<&[Value]> = values
            .iter()
            .map(|v| {
                v.as_array().context(TypeMismatchSnafu {
                    field_type: FieldType::ArrayPrimitive,
                })
            })
            .collect::<Result<_>>()?;

        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, rows.len() as u32);
        for row in &rows {
            write_uvarint(&mut buf, row.len() as u32);
        }

        let flat: Vec<Value> = rows.iter().flat_map(|row| row.iter().cloned()).collect();
        if flat.is_empty() {
            return Ok(buf.freeze());
        }

        let inner_type = inner_element_type(&flat, &self.options);
        let payload = registry.get(inner_type)?.encode(&flat, registry)?;

        buf.extend_from_slice(&[inner_type.wire_code()]);
        write_uvarint(&mut buf, payload.len() as u32);
        buf.extend_from_slice(&payload);
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], registry: &CodecRegistry) -> Result<Vec<Value>> {
        let mut input = bytes;
        let (row_count, n) = read_uvarint(input)?;
        input = &input[n..];

        let mut lengths = Vec::with_capacity(row_count as usize);
        for _ in 0..row_count {
            let (len, n) = read_uvarint(input)?;
            input = &input[n..];
            lengths.push(len as usize);
        }

        let total: usize = lengths.iter().sum();
        let flat = if total == 0 {
            Vec::new()
        } else {
            ensure!(
                !input.is_empty(),
                TruncatedSnafu {
                    where_: "array-primitive inner type".to_string()
                }
            );
            let inner_type = FieldType::from_wire_code(input[0])?;
            input = &input[1..];
            let (payload_len, n) = read_uvarint(input)?;
            input = &input[n..];
            ensure!(
                input.len() >= payload_len as usize,
                TruncatedSnafu {
                    where_: "array-primitive payload".to_string()
                }
            );
            let payload = &input[..payload_len as usize];
            registry.get(inner_type)?.decode(payload, registry)?
        };

        ensure!(flat.len() == total, ArrayLengthMismatchSnafu);

        let mut out = Vec::with_capacity(lengths.len());
        let mut offset = 0;
        for len in lengths {
            out.push(Value::Array(flat[offset..offset + len].to_vec()));
            offset += len;
        }
        Ok(out)
    }
}

/// The spec's safety-net override: if every non-null element turns out to be
/// numeric but the general-purpose profiler landed on a different tag,
/// prefer `Number` so the flat payload is encoded as densely as possible.
fn inner_element_type(flat: &[Value], options: &CompressorOptions) -> FieldType {
    let detected = profile(flat, options);
    if detected != FieldType::Number {
        let non_null: Vec<&Value> = flat.iter().filter(|v| !v.is_null()).collect();
        if !non_null.is_empty() && non_null.iter().all(|v| v.as_number().is_some()) {
            return FieldType::Number;
        }
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> ArrayPrimitiveCodec {
        ArrayPrimitiveCodec::new(CompressorOptions::default())
    }

    #[test]
    fn roundtrips_number_arrays() {
        let values = vec![
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Array(vec![Value::Number(3.0)]),
            Value::Array(vec![]),
        ];
        let registry = CodecRegistry::default();
        let encoded = codec().encode(&values, &registry).unwrap();
        let decoded = codec().decode(&encoded, &registry).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn all_empty_rows_have_no_payload_block() {
        let values = vec![Value::Array(vec![]), Value::Array(vec![])];
        let registry = CodecRegistry::default();
        let encoded = codec().encode(&values, &registry).unwrap();
        // Varint(rowCount=2) + Varint(len=0) + Varint(len=0), no trailing block.
        assert_eq!(&encoded[..], &[0x02, 0x00, 0x00]);
        let decoded = codec().decode(&encoded, &registry).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn roundtrips_string_arrays() {
        let values = vec![
            Value::Array(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]),
            Value::Array(vec![Value::String("a".to_string())]),
        ];
        let registry = CodecRegistry::default();
        let encoded = codec().encode(&values, &registry).unwrap();
        let decoded = codec().decode(&encoded, &registry).unwrap();
        assert_eq!(decoded, values);
    }
}
