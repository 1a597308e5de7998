//! Delta-encoded timestamp codec: ISO-8601 strings, narrowed to millisecond
//! epoch integers, delta-coded against the first value.

use bytes::{Buf, Bytes, BytesMut};
use chrono::{DateTime, SecondsFormat, Utc};
use snafu::OptionExt;

use crate::error::{InvalidTimestampSnafu, Result, TruncatedSnafu, TypeMismatchSnafu};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;
use crate::varint::{read_zigzag_varint, write_zigzag_varint};

use super::Codec;

pub struct TimestampCodec;

impl Codec for TimestampCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Timestamp
    }

    fn encode(&self, values: &[Value], _registry: &CodecRegistry) -> Result<Bytes> {
        if values.is_empty() {
            return Ok(Bytes::new());
        }

        let millis: Vec<i64> = values
            .iter()
            .map(parse_millis)
            .collect::<Result<_>>()?;

        let base = millis[0];
        let mut buf = BytesMut::with_capacity(8 + values.len() * 2);
        buf.extend_from_slice(&base.to_le_bytes());
        for t in &millis {
            write_zigzag_varint(&mut buf, t - base);
        }
        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], _registry: &CodecRegistry) -> Result<Vec<Value>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let mut input = bytes;
        let base_bytes = input.get(..8).context(TruncatedSnafu {
            where_: "timestamp base".to_string(),
        })?;
        let base = i64::from_le_bytes(base_bytes.try_into().unwrap());
        input.advance(8);

        let mut out = Vec::new();
        while !input.is_empty() {
            let (delta, n) = read_zigzag_varint(input)?;
            input.advance(n);
            out.push(millis_to_value(base + delta));
        }
        Ok(out)
    }
}

fn parse_millis(value: &Value) -> Result<i64> {
    let s = value.as_str().context(TypeMismatchSnafu {
        field_type: FieldType::Timestamp,
    })?;
    let parsed = DateTime::parse_from_rfc3339(s)
        .ok()
        .context(InvalidTimestampSnafu {
            value: s.to_string(),
        })?;
    Ok(parsed.timestamp_millis())
}

fn millis_to_value(millis: i64) -> Value {
    let dt: DateTime<Utc> = DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap());
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_base_and_deltas() {
        let values = vec![
            Value::String("2025-01-01T00:00:00.000Z".to_string()),
            Value::String("2025-01-01T00:00:00.001Z".to_string()),
        ];
        let codec = TimestampCodec;
        let registry = CodecRegistry::new();
        let encoded = codec.encode(&values, &registry).unwrap();

        assert_eq!(&encoded[8..9], &[0x00]);
        assert_eq!(&encoded[9..10], &[0x02]);

        let decoded = codec.decode(&encoded, &registry).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn empty_column_is_empty_buffer() {
        let codec = TimestampCodec;
        let registry = CodecRegistry::new();
        let encoded = codec.encode(&[], &registry).unwrap();
        assert!(encoded.is_empty());
        assert!(codec.decode(&encoded, &registry).unwrap().is_empty());
    }
}
