//! Wraps any codec with `MISSING`-awareness via a leading row count and
//! validity bitmap. This is the sole entry point the compressor uses per
//! column — individual codecs only ever see compacted non-`MISSING` values.

use bytes::{Bytes, BytesMut};
use snafu::ensure;

use crate::bitmap::{bit_is_set, bitmap_len, build_bitmap, compact_non_missing, popcount};
use crate::codec::Codec;
use crate::error::{BitmapMismatchSnafu, Result, TruncatedSnafu};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;

/// Layout: `u32 LE rowCount | bitmap | innerCodec.encode(nonNulls)`.
pub struct NullableCodec<'a> {
    inner: &'a dyn Codec,
}

impl<'a> NullableCodec<'a> {
    pub fn new(inner: &'a dyn Codec) -> Self {
        Self { inner }
    }

    pub fn encode(&self, values: &[Value], registry: &CodecRegistry) -> Result<Bytes> {
        let row_count = values.len() as u32;
        let bitmap = build_bitmap(values);
        let non_nulls = compact_non_missing(values);
        let inner_payload = self.inner.encode(&non_nulls, registry)?;

        let mut buf = BytesMut::with_capacity(4 + bitmap.len() + inner_payload.len());
        buf.extend_from_slice(&row_count.to_le_bytes());
        buf.extend_from_slice(&bitmap);
        buf.extend_from_slice(&inner_payload);
        Ok(buf.freeze())
    }

    pub fn decode(&self, bytes: &[u8], registry: &CodecRegistry) -> Result<Vec<Value>> {
        ensure!(
            bytes.len() >= 4,
            TruncatedSnafu {
                where_: "nullable row count".to_string()
            }
        );
        let row_count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let bitmap_end = 4 + bitmap_len(row_count);
        ensure!(
            bytes.len() >= bitmap_end,
            TruncatedSnafu {
                where_: "nullable bitmap".to_string()
            }
        );
        let bitmap = &bytes[4..bitmap_end];
        let expected_non_nulls = popcount(bitmap);

        let decoded_non_nulls = self.inner.decode(&bytes[bitmap_end..], registry)?;
        ensure!(
            decoded_non_nulls.len() == expected_non_nulls,
            BitmapMismatchSnafu {
                expected: expected_non_nulls,
                got: decoded_non_nulls.len(),
            }
        );

        let mut out = Vec::with_capacity(row_count);
        let mut cursor = decoded_non_nulls.into_iter();
        for i in 0..row_count {
            if bit_is_set(bitmap, i) {
                out.push(cursor.next().expect("popcount matches decoded length"));
            } else {
                out.push(Value::Missing);
            }
        }
        Ok(out)
    }
}

/// Convenience for call sites that only hold a `FieldType`, not a codec
/// reference directly.
pub fn encode_column(
    field_type: FieldType,
    values: &[Value],
    registry: &CodecRegistry,
) -> Result<Bytes> {
    let codec = registry.get(field_type)?;
    NullableCodec::new(codec.as_ref()).encode(values, registry)
}

pub fn decode_column(
    field_type: FieldType,
    bytes: &[u8],
    registry: &CodecRegistry,
) -> Result<Vec<Value>> {
    let codec = registry.get(field_type)?;
    NullableCodec::new(codec.as_ref()).decode(bytes, registry)
}
