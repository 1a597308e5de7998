//! Fixed-width UUID codec: 16 bytes per value, no self-length.

use bytes::{Bytes, BytesMut};
use snafu::{ensure, OptionExt};
use uuid::Uuid;

use crate::error::{InvalidUuidSnafu, Result, TruncatedSnafu, TypeMismatchSnafu};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;

use super::Codec;

pub struct UuidCodec;

impl Codec for UuidCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Uuid
    }

    fn encode(&self, values: &[Value], _registry: &CodecRegistry) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(values.len() * 16);
        for value in values {
            let s = value.as_str().context(TypeMismatchSnafu {
                field_type: FieldType::Uuid,
            })?;
            let uuid = Uuid::parse_str(s).ok().context(InvalidUuidSnafu {
                value: s.to_string(),
            })?;
            buf.extend_from_slice(uuid.as_bytes());
        }
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], _registry: &CodecRegistry) -> Result<Vec<Value>> {
        ensure!(
            bytes.len() % 16 == 0,
            TruncatedSnafu {
                where_: "uuid payload".to_string()
            }
        );
        Ok(bytes
            .chunks_exact(16)
            .map(|chunk| {
                let uuid = Uuid::from_slice(chunk).expect("chunk is exactly 16 bytes");
                Value::String(uuid.hyphenated().to_string())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_length_is_16_per_value() {
        let values = vec![
            Value::String("550e8400-e29b-41d4-a716-446655440000".to_string()),
            Value::String("6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_string()),
        ];
        let codec = UuidCodec;
        let registry = CodecRegistry::new();
        let encoded = codec.encode(&values, &registry).unwrap();
        assert_eq!(encoded.len(), 32);

        let decoded = codec.decode(&encoded, &registry).unwrap();
        assert_eq!(decoded, values);
    }
}
