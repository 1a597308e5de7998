//! `Varint(count) | packedBytes`, bit-packed LSB-first, same convention as
//! the validity bitmap.

use bytes::{Bytes, BytesMut};
use snafu::{ensure, OptionExt};

use crate::bitmap::bitmap_len;
use crate::error::{Result, TruncatedSnafu, TypeMismatchSnafu};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;
use crate::varint::{read_uvarint, write_uvarint};

use super::Codec;

pub struct BooleanCodec;

impl Codec for BooleanCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Boolean
    }

    fn encode(&self, values: &[Value], _registry: &CodecRegistry) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, values.len() as u32);

        let mut packed = vec![0u8; bitmap_len(values.len())];
        for (i, value) in values.iter().enumerate() {
            let b = value.as_bool().context(TypeMismatchSnafu {
                field_type: FieldType::Boolean,
            })?;
            if b {
                packed[i / 8] |= 1 << (i % 8);
            }
        }
        buf.extend_from_slice(&packed);
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], _registry: &CodecRegistry) -> Result<Vec<Value>> {
        let (count, n) = read_uvarint(bytes)?;
        let count = count as usize;
        let packed = &bytes[n..];
        ensure!(
            packed.len() >= bitmap_len(count),
            TruncatedSnafu {
                where_: "boolean payload".to_string()
            }
        );
        Ok((0..count)
            .map(|i| Value::Bool(packed[i / 8] & (1 << (i % 8)) != 0))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_literal_bytes() {
        let values: Vec<Value> = [
            true, false, true, true, false, false, true, false, true,
        ]
        .iter()
        .map(|b| Value::Bool(*b))
        .collect();
        let codec = BooleanCodec;
        let registry = CodecRegistry::new();
        let encoded = codec.encode(&values, &registry).unwrap();
        assert_eq!(&encoded[..], &[0x09, 0x4D, 0x01]);

        let decoded = codec.decode(&encoded, &registry).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn body_length_matches_ceil_div_8() {
        let values: Vec<Value> = (0..13).map(|i| Value::Bool(i % 2 == 0)).collect();
        let codec = BooleanCodec;
        let registry = CodecRegistry::new();
        let encoded = codec.encode(&values, &registry).unwrap();
        // 1 byte varint count + ceil(13/8) = 2 bytes
        assert_eq!(encoded.len(), 1 + 2);
    }
}
