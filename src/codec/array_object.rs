//! Codec for columns of arrays-of-objects: the concatenation of every inner
//! object, across every row, is flattened and pivoted into nested columns
//! exactly once, then each nested column is encoded with its own (unwrapped)
//! codec.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use snafu::{ensure, OptionExt};

use crate::column::pivot;
use crate::config::CompressorOptions;
use crate::error::{ArrayLengthMismatchSnafu, Result, TruncatedSnafu, TypeMismatchSnafu};
use crate::flatten::{flatten, unflatten};
use crate::profiler::profile;
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;
use crate::varint::{read_uvarint, write_uvarint};

use super::Codec;

pub struct ArrayObjectCodec {
    options: CompressorOptions,
}

impl ArrayObjectCodec {
    pub fn new(options: CompressorOptions) -> Self {
        Self { options }
    }
}

impl Codec for ArrayObjectCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Array
    }

    fn encode(&self, values: &[Value], registry: &CodecRegistry) -> Result<Bytes> {
        let rows: Vec<&[Value]> = values
            .iter()
            .map(|v| {
                v.as_array().context(TypeMismatchSnafu {
                    field_type: FieldType::Array,
                })
            })
            .collect::<Result<_>>()?;

        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, rows.len() as u32);
        for row in &rows {
            write_uvarint(&mut buf, row.len() as u32);
        }

        let flat_items: Vec<&BTreeMap<String, Value>> = rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|item| {
                item.as_object().context(TypeMismatchSnafu {
                    field_type: FieldType::Array,
                })
            })
            .collect::<Result<_>>()?;

        if flat_items.is_empty() {
            return Ok(buf.freeze());
        }

        let flattened: Vec<BTreeMap<String, Value>> =
            flat_items.into_iter().map(flatten).collect();
        let columns = pivot(&flattened);

        write_uvarint(&mut buf, columns.len() as u32);
        for column in &columns {
            // Absence isn't tracked at this level: an item that never had the
            // key and one that has it set to `null` become indistinguishable.
            let column_values: Vec<Value> = column
                .values
                .iter()
                .map(|v| if v.is_missing() { Value::Null } else { v.clone() })
                .collect();

            let field_type = profile(&column_values, &self.options);
            let payload = registry.get(field_type)?.encode(&column_values, registry)?;

            debug_assert!(column.name.len() <= u8::MAX as usize, "nested field name too long");
            buf.extend_from_slice(&[column.name.len() as u8]);
            buf.extend_from_slice(column.name.as_bytes());
            buf.extend_from_slice(&[field_type.wire_code()]);
            write_uvarint(&mut buf, payload.len() as u32);
            buf.extend_from_slice(&payload);
        }

        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], registry: &CodecRegistry) -> Result<Vec<Value>> {
        let mut input = bytes;
        let (array_count, n) = read_uvarint(input)?;
        input = &input[n..];

        let mut lengths = Vec::with_capacity(array_count as usize);
        for _ in 0..array_count {
            let (len, n) = read_uvarint(input)?;
            input = &input[n..];
            lengths.push(len as usize);
        }

        let total: usize = lengths.iter().sum();
        let items = if total == 0 {
            Vec::new()
        } else {
            let (field_count, n) = read_uvarint(input)?;
            input = &input[n..];

            let mut nested_columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                ensure!(
                    !input.is_empty(),
                    TruncatedSnafu {
                        where_: "nested field name length".to_string()
                    }
                );
                let name_len = input[0] as usize;
                input = &input[1..];
                ensure!(
                    input.len() >= name_len,
                    TruncatedSnafu {
                        where_: "nested field name".to_string()
                    }
                );
                let name = String::from_utf8(input[..name_len].to_vec()).map_err(|_| {
                    TruncatedSnafu {
                        where_: "nested field name (invalid utf-8)".to_string(),
                    }
                    .build()
                })?;
                input = &input[name_len..];

                ensure!(
                    !input.is_empty(),
                    TruncatedSnafu {
                        where_: "nested field type code".to_string()
                    }
                );
                let field_type = FieldType::from_wire_code(input[0])?;
                input = &input[1..];

                let (payload_len, n) = read_uvarint(input)?;
                input = &input[n..];
                ensure!(
                    input.len() >= payload_len as usize,
                    TruncatedSnafu {
                        where_: "nested field payload".to_string()
                    }
                );
                let payload = &input[..payload_len as usize];
                input = &input[payload_len as usize..];

                let values = registry.get(field_type)?.decode(payload, registry)?;
                ensure!(values.len() == total, ArrayLengthMismatchSnafu);
                nested_columns.push((name, values));
            }

            let mut items = Vec::with_capacity(total);
            for i in 0..total {
                let mut record: BTreeMap<String, Value> = BTreeMap::new();
                for (name, values) in &nested_columns {
                    let value = match &values[i] {
                        Value::Null => Value::Missing,
                        other => other.clone(),
                    };
                    record.insert(name.clone(), value);
                }
                items.push(Value::Object(unflatten(&record)));
            }
            items
        };

        let mut out = Vec::with_capacity(lengths.len());
        let mut offset = 0;
        for len in lengths {
            out.push(Value::Array(items[offset..offset + len].to_vec()));
            offset += len;
        }
        Ok(out)
    }
}
