//! Low-cardinality string codec with byte or nibble-packed indices.

use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use snafu::ensure;

use crate::error::{
    DictIndexOutOfRangeSnafu, EnumStringTooLongSnafu, Result, TruncatedSnafu, TypeMismatchSnafu,
};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;

use super::Codec;

const NULL_MARKER: u8 = 255;
const NIBBLE_THRESHOLD: usize = 16;

pub struct EnumCodec;

impl Codec for EnumCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Enum
    }

    fn encode(&self, values: &[Value], _registry: &CodecRegistry) -> Result<Bytes> {
        let entries: Vec<Option<&str>> = values
            .iter()
            .map(|v| match v {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(s.as_str())),
                _ => TypeMismatchSnafu {
                    field_type: FieldType::Enum,
                }
                .fail(),
            })
            .collect::<Result<_>>()?;

        let mut dict: Vec<Option<&str>> = Vec::new();
        let mut index_of: HashMap<Option<&str>, usize> = HashMap::new();
        let mut indices = Vec::with_capacity(entries.len());
        for entry in &entries {
            let idx = *index_of.entry(*entry).or_insert_with(|| {
                dict.push(*entry);
                dict.len() - 1
            });
            indices.push(idx);
        }

        for entry in &dict {
            if let Some(s) = entry {
                ensure!(s.len() < 255, EnumStringTooLongSnafu);
            }
        }

        let mut buf = BytesMut::new();
        buf.put_u32_le(values.len() as u32);
        debug_assert!(dict.len() <= u8::MAX as usize, "enum cardinality overflow");
        buf.extend_from_slice(&[dict.len() as u8]);

        for entry in &dict {
            match entry {
                None => buf.extend_from_slice(&[NULL_MARKER]),
                Some(s) => {
                    buf.extend_from_slice(&[s.len() as u8]);
                    buf.extend_from_slice(s.as_bytes());
                }
            }
        }

        if dict.len() > NIBBLE_THRESHOLD {
            for &idx in &indices {
                buf.extend_from_slice(&[idx as u8]);
            }
        } else {
            let mut nibbles = indices.iter().map(|&i| i as u8);
            loop {
                let high = match nibbles.next() {
                    Some(n) => n,
                    None => break,
                };
                let low = nibbles.next();
                let byte = match low {
                    Some(low) => (high << 4) | low,
                    None => high << 4,
                };
                buf.extend_from_slice(&[byte]);
            }
        }

        Ok(buf.freeze())
    }

    fn decode(&self, bytes: &[u8], _registry: &CodecRegistry) -> Result<Vec<Value>> {
        let mut input = bytes;
        ensure!(
            input.len() >= 5,
            TruncatedSnafu {
                where_: "enum header".to_string()
            }
        );
        let count = input.get_u32_le() as usize;
        let unique_count = input.get_u8() as usize;

        let mut dict = Vec::with_capacity(unique_count);
        for _ in 0..unique_count {
            ensure!(
                !input.is_empty(),
                TruncatedSnafu {
                    where_: "enum dictionary entry".to_string()
                }
            );
            let marker = input[0];
            input.advance(1);
            if marker == NULL_MARKER {
                dict.push(Value::Null);
            } else {
                let len = marker as usize;
                ensure!(
                    input.len() >= len,
                    TruncatedSnafu {
                        where_: "enum dictionary string".to_string()
                    }
                );
                let s = String::from_utf8(input[..len].to_vec()).map_err(|_| {
                    TruncatedSnafu {
                        where_: "enum dictionary string (invalid utf-8)".to_string(),
                    }
                    .build()
                })?;
                input.advance(len);
                dict.push(Value::String(s));
            }
        }

        let mut out = Vec::with_capacity(count);
        if unique_count > NIBBLE_THRESHOLD {
            ensure!(
                input.len() >= count,
                TruncatedSnafu {
                    where_: "enum indices".to_string()
                }
            );
            for &byte in &input[..count] {
                out.push(lookup(&dict, byte as usize)?);
            }
        } else {
            let needed_bytes = count.div_ceil(2);
            ensure!(
                input.len() >= needed_bytes,
                TruncatedSnafu {
                    where_: "enum indices".to_string()
                }
            );
            let mut produced = 0;
            for &byte in &input[..needed_bytes] {
                let high = byte >> 4;
                out.push(lookup(&dict, high as usize)?);
                produced += 1;
                if produced == count {
                    break;
                }
                let low = byte & 0x0f;
                out.push(lookup(&dict, low as usize)?);
                produced += 1;
            }
        }

        Ok(out)
    }
}

fn lookup(dict: &[Value], idx: usize) -> Result<Value> {
    ensure!(idx < dict.len(), DictIndexOutOfRangeSnafu);
    Ok(dict[idx].clone())
}
