//! The top-level orchestrator: `compress`, `compress_columnar_post`, and
//! `decompress`, plus the shared prepare phase they build on.

use std::collections::{BTreeMap, BTreeSet};

use bytes::{Bytes, BytesMut};
use tracing::{debug, instrument};

use crate::byte_codec::{ByteCodec, DeflateByteCodec};
use crate::column::{pivot, Column};
use crate::config::CompressorOptions;
use crate::error::{EmptyBatchSnafu, Result, RoundTripFailedSnafu};
use crate::flatten::{flatten, unflatten};
use crate::nullable::{decode_column, encode_column};
use crate::profiler::profile;
use crate::registry::CodecRegistry;
use crate::schema::{BatchHeader, FieldSchema, MAGIC_COLUMNAR_POST, MAGIC_STANDARD};
use crate::value::{Record, Value};
use snafu::ensure;

/// A prepared column: its resolved type and its already-validated encoded
/// bytes, ready to be laid out on the wire.
struct PreparedColumn {
    schema: FieldSchema,
    encoded: Bytes,
}

pub struct SemanticCompressor {
    registry: CodecRegistry,
    options: CompressorOptions,
    byte_codec: Box<dyn ByteCodec + Send + Sync>,
}

impl SemanticCompressor {
    pub fn new() -> Self {
        Self::with_options(CompressorOptions::default())
    }

    pub fn with_options(options: CompressorOptions) -> Self {
        Self {
            registry: CodecRegistry::with_default_profile(options),
            options,
            byte_codec: Box::new(DeflateByteCodec::new()),
        }
    }

    #[instrument(level = "debug", skip_all, fields(rows = records.len()))]
    pub fn compress(&self, records: &[Record]) -> Result<Bytes> {
        let prepared = self.prepare(records)?;
        let mut buf = BytesMut::new();
        let header = BatchHeader::new(
            *MAGIC_STANDARD,
            prepared.iter().map(|c| c.schema.clone()).collect(),
        );
        header.encode(&mut buf);
        for column in &prepared {
            buf.extend_from_slice(&column.encoded);
        }
        debug!(bytes = buf.len(), "compressed batch");
        Ok(buf.freeze())
    }

    #[instrument(level = "debug", skip_all, fields(rows = records.len()))]
    pub fn compress_columnar_post(&self, records: &[Record]) -> Result<Bytes> {
        let prepared = self.prepare(records)?;

        let mut fields = Vec::with_capacity(prepared.len());
        let mut compressed_columns = Vec::with_capacity(prepared.len());
        for column in &prepared {
            let compressed = self.byte_codec.compress(&column.encoded)?;
            fields.push(FieldSchema {
                name: column.schema.name.clone(),
                field_type: column.schema.field_type,
                byte_length: compressed.len() as u32,
            });
            compressed_columns.push(compressed);
        }

        let mut buf = BytesMut::new();
        let header = BatchHeader::new(*MAGIC_COLUMNAR_POST, fields);
        header.encode(&mut buf);
        for column in &compressed_columns {
            buf.extend_from_slice(column);
        }
        debug!(bytes = buf.len(), "compressed batch (columnar post)");
        Ok(buf.freeze())
    }

    #[instrument(level = "debug", skip_all, fields(bytes = bytes.len()))]
    pub fn decompress(&self, bytes: &[u8]) -> Result<Vec<Record>> {
        let mut input = bytes;
        let header = BatchHeader::decode(&mut input)?;
        let columnar_post = header.is_columnar_post();

        let mut decoded_columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(header.fields.len());
        for field in &header.fields {
            ensure!(
                input.len() >= field.byte_length as usize,
                crate::error::TruncatedSnafu {
                    where_: format!("column '{}'", field.name)
                }
            );
            let raw = &input[..field.byte_length as usize];
            input = &input[field.byte_length as usize..];

            let column_bytes = if columnar_post {
                self.byte_codec.decompress(raw)?
            } else {
                Bytes::copy_from_slice(raw)
            };
            let values = decode_column(field.field_type, &column_bytes, &self.registry)?;
            decoded_columns.push((field.name.clone(), values));
        }

        let row_count = decoded_columns
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0);

        let mut records = Vec::with_capacity(row_count);
        for i in 0..row_count {
            let mut flat: BTreeMap<String, Value> = BTreeMap::new();
            for (name, values) in &decoded_columns {
                flat.insert(name.clone(), values[i].clone());
            }
            records.push(unflatten(&flat));
        }
        debug!(rows = records.len(), "decompressed batch");
        Ok(records)
    }

    fn prepare(&self, records: &[Record]) -> Result<Vec<PreparedColumn>> {
        ensure!(!records.is_empty(), EmptyBatchSnafu);

        let mut top_keys: BTreeSet<&str> = BTreeSet::new();
        for record in records {
            top_keys.extend(record.keys().map(String::as_str));
        }

        let sparse_records: Vec<Record> = records
            .iter()
            .map(|record| {
                top_keys
                    .iter()
                    .map(|&k| (k.to_string(), record.get(k).cloned().unwrap_or(Value::Missing)))
                    .collect()
            })
            .collect();

        let flattened: Vec<BTreeMap<String, Value>> =
            sparse_records.iter().map(flatten).collect();
        let columns: Vec<Column> = pivot(&flattened);

        columns
            .into_iter()
            .map(|column| self.prepare_column(column))
            .collect()
    }

    fn prepare_column(&self, column: Column) -> Result<PreparedColumn> {
        let non_missing: Vec<Value> = column
            .values
            .iter()
            .filter(|v| !v.is_missing())
            .cloned()
            .collect();
        let field_type = if non_missing.is_empty() {
            profile(&column.values, &self.options)
        } else {
            profile(&non_missing, &self.options)
        };

        let encoded = encode_column(field_type, &column.values, &self.registry)?;
        let decoded = decode_column(field_type, &encoded, &self.registry)?;
        // Decimal-mode numbers aren't bit-exact after a round trip through
        // `v * 10^s` / `v / 10^s` (spec.md §9, SPEC_FULL.md §9.4); compare
        // with the same tolerance the number codec uses to pick that mode.
        let roundtrips = decoded.len() == column.values.len()
            && decoded
                .iter()
                .zip(column.values.iter())
                .all(|(a, b)| a.approx_eq(b, self.options.decimal_tolerance));
        ensure!(
            roundtrips,
            RoundTripFailedSnafu {
                field: column.name.clone(),
                field_type,
            }
        );

        Ok(PreparedColumn {
            schema: FieldSchema {
                name: column.name,
                field_type,
                byte_length: encoded.len() as u32,
            },
            encoded,
        })
    }
}

impl Default for SemanticCompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Compresses `records` into the standard `SAJC` container using a
/// default-configured compressor.
pub fn compress(records: &[Record]) -> Result<Bytes> {
    SemanticCompressor::new().compress(records)
}

/// Compresses `records` into the `SJCB` container, post-compressing each
/// column with the opaque byte codec.
pub fn compress_columnar_post(records: &[Record]) -> Result<Bytes> {
    SemanticCompressor::new().compress_columnar_post(records)
}

/// Decompresses a buffer produced by either [`compress`] or
/// [`compress_columnar_post`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<Record>> {
    SemanticCompressor::new().decompress(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: Vec<(&str, Value)>) -> Record {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn roundtrips_mixed_batch_standard() {
        let records = vec![
            rec(vec![
                ("id", Value::String("550e8400-e29b-41d4-a716-446655440000".to_string())),
                ("count", Value::Number(1.0)),
                ("active", Value::Bool(true)),
            ]),
            rec(vec![
                ("id", Value::String("550e8400-e29b-41d4-a716-446655440001".to_string())),
                ("count", Value::Number(2.0)),
                ("active", Value::Bool(false)),
            ]),
        ];
        let compressor = SemanticCompressor::new();
        let encoded = compressor.compress(&records).unwrap();
        let decoded = compressor.decompress(&encoded).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn roundtrips_with_missing_keys() {
        let records = vec![
            rec(vec![("a", Value::Number(1.0)), ("b", Value::Bool(true))]),
            rec(vec![("a", Value::Number(2.0))]),
        ];
        let compressor = SemanticCompressor::new();
        let encoded = compressor.compress(&records).unwrap();
        let decoded = compressor.decompress(&encoded).unwrap();
        assert_eq!(decoded[0], records[0]);
        assert!(!decoded[1].contains_key("b"));
    }

    #[test]
    fn columnar_post_roundtrips() {
        let records = vec![
            rec(vec![("name", Value::String("alice".to_string()))]),
            rec(vec![("name", Value::String("bob".to_string()))]),
        ];
        let compressor = SemanticCompressor::new();
        let encoded = compressor.compress_columnar_post(&records).unwrap();
        assert_eq!(&encoded[0..4], crate::schema::MAGIC_COLUMNAR_POST);
        let decoded = compressor.decompress(&encoded).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let compressor = SemanticCompressor::new();
        assert!(compressor.compress(&[]).is_err());
    }

    #[test]
    fn free_functions_delegate_to_default_instance() {
        let records = vec![rec(vec![("x", Value::Number(1.0))])];
        let encoded = compress(&records).unwrap();
        let decoded = decompress(&encoded).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn decimal_mode_number_within_tolerance_is_accepted() {
        // 0.30000000000000004 lands on decimal scale 1 (scaled = 3.000...04,
        // within 1e-9 of 3) but decodes to 0.29999999999999998, a different
        // `f64` bit pattern. The self-check must accept this within the
        // decimal codec's own tolerance rather than rejecting the batch.
        let records = vec![rec(vec![("x", Value::Number(0.30000000000000004))])];
        let compressor = SemanticCompressor::new();
        let encoded = compressor.compress(&records).unwrap();
        let decoded = compressor.decompress(&encoded).unwrap();
        match (&records[0]["x"], &decoded[0]["x"]) {
            (Value::Number(a), Value::Number(b)) => assert!((a - b).abs() < 1e-9),
            other => panic!("expected numbers, got {other:?}"),
        }
    }
}
