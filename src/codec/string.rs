//! Adaptive string codec: raw per-value mode for high-cardinality columns,
//! dictionary + (standard or run-length) index stream otherwise.

use std::collections::HashMap;

use bytes::{Buf, Bytes, BytesMut};
use snafu::{ensure, ResultExt};

use crate::config::CompressorOptions;
use crate::error::{
    DictIndexOutOfRangeSnafu, Result, TruncatedSnafu, TypeMismatchSnafu, UnknownModeSnafu,
    Utf8Snafu,
};
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;
use crate::varint::{read_uvarint, write_uvarint};

use super::Codec;

const MODE_RAW: u8 = 0x00;
const MODE_STANDARD: u8 = 0x01;
const MODE_RLE: u8 = 0x02;

pub struct StringCodec {
    options: CompressorOptions,
}

impl StringCodec {
    pub fn new(options: CompressorOptions) -> Self {
        Self { options }
    }
}

impl Codec for StringCodec {
    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::String
    }

    fn encode(&self, values: &[Value], _registry: &CodecRegistry) -> Result<Bytes> {
        let entries: Vec<Option<&str>> = values
            .iter()
            .map(|v| match v {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(s.as_str())),
                _ => TypeMismatchSnafu {
                    field_type: FieldType::String,
                }
                .fail(),
            })
            .collect::<Result<_>>()?;

        let (dict, indices) = build_dictionary(&entries);
        let use_raw =
            dict.len() as f64 >= self.options.string_dictionary_ratio * entries.len() as f64;

        if use_raw {
            let mut buf = BytesMut::new();
            buf.extend_from_slice(&[MODE_RAW]);
            for entry in &entries {
                write_entry(&mut buf, *entry);
            }
            return Ok(buf.freeze());
        }

        let mut dict_header = BytesMut::new();
        write_uvarint(&mut dict_header, dict.len() as u32);
        for entry in &dict {
            write_entry(&mut dict_header, *entry);
        }

        let mut standard = BytesMut::new();
        for &idx in &indices {
            write_uvarint(&mut standard, idx as u32);
        }

        let mut rle = BytesMut::new();
        let mut i = 0;
        while i < indices.len() {
            let idx = indices[i];
            let mut run_len = 1;
            while i + run_len < indices.len() && indices[i + run_len] == idx {
                run_len += 1;
            }
            write_uvarint(&mut rle, idx as u32);
            write_uvarint(&mut rle, run_len as u32);
            i += run_len;
        }

        let mut out = BytesMut::new();
        if rle.len() < standard.len() {
            out.extend_from_slice(&[MODE_RLE]);
            out.extend_from_slice(&dict_header);
            out.extend_from_slice(&rle);
        } else {
            out.extend_from_slice(&[MODE_STANDARD]);
            out.extend_from_slice(&dict_header);
            out.extend_from_slice(&standard);
        }
        Ok(out.freeze())
    }

    fn decode(&self, bytes: &[u8], _registry: &CodecRegistry) -> Result<Vec<Value>> {
        ensure!(
            !bytes.is_empty(),
            TruncatedSnafu {
                where_: "string mode byte".to_string()
            }
        );
        let mode = bytes[0];
        let mut input = &bytes[1..];

        match mode {
            MODE_RAW => {
                let mut out = Vec::new();
                while !input.is_empty() {
                    out.push(read_entry(&mut input)?);
                }
                Ok(out)
            }
            MODE_STANDARD | MODE_RLE => {
                let (count, n) = read_uvarint(input)?;
                input.advance(n);
                let mut dict = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    dict.push(read_entry(&mut input)?);
                }

                let mut out = Vec::new();
                if mode == MODE_STANDARD {
                    while !input.is_empty() {
                        let (idx, n) = read_uvarint(input)?;
                        input.advance(n);
                        out.push(lookup(&dict, idx as usize)?);
                    }
                } else {
                    while !input.is_empty() {
                        let (idx, n) = read_uvarint(input)?;
                        input.advance(n);
                        let (run_len, n) = read_uvarint(input)?;
                        input.advance(n);
                        let value = lookup(&dict, idx as usize)?;
                        for _ in 0..run_len {
                            out.push(value.clone());
                        }
                    }
                }
                Ok(out)
            }
            other => UnknownModeSnafu {
                codec: "string",
                byte: other,
            }
            .fail(),
        }
    }
}

fn build_dictionary<'a>(entries: &[Option<&'a str>]) -> (Vec<Option<&'a str>>, Vec<usize>) {
    let mut dict: Vec<Option<&'a str>> = Vec::new();
    let mut index_of: HashMap<Option<&'a str>, usize> = HashMap::new();
    let mut indices = Vec::with_capacity(entries.len());

    for entry in entries {
        let idx = *index_of.entry(*entry).or_insert_with(|| {
            dict.push(*entry);
            dict.len() - 1
        });
        indices.push(idx);
    }
    (dict, indices)
}

fn write_entry(buf: &mut BytesMut, entry: Option<&str>) {
    match entry {
        None => write_uvarint(buf, 0),
        Some(s) => {
            write_uvarint(buf, s.len() as u32 + 1);
            buf.extend_from_slice(s.as_bytes());
        }
    }
}

/// Reads one null-aware length-prefixed entry, advancing `input` past it.
fn read_entry(input: &mut &[u8]) -> Result<Value> {
    let (len_plus, n) = read_uvarint(input)?;
    input.advance(n);
    if len_plus == 0 {
        return Ok(Value::Null);
    }
    let len = (len_plus - 1) as usize;
    ensure!(
        input.len() >= len,
        TruncatedSnafu {
            where_: "string entry".to_string()
        }
    );
    let bytes = input[..len].to_vec();
    input.advance(len);
    let s = String::from_utf8(bytes).context(Utf8Snafu)?;
    Ok(Value::String(s))
}

fn lookup(dict: &[Value], idx: usize) -> Result<Value> {
    dict.get(idx)
        .cloned()
        .ok_or_else(|| DictIndexOutOfRangeSnafu.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> StringCodec {
        StringCodec::new(CompressorOptions::default())
    }

    fn strs(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::String(s.to_string())).collect()
    }

    #[test]
    fn high_cardinality_uses_raw_mode() {
        let values = strs(&["a", "b", "c", "d", "e"]);
        let registry = CodecRegistry::new();
        let encoded = codec().encode(&values, &registry).unwrap();
        assert_eq!(encoded[0], MODE_RAW);
        assert_eq!(codec().decode(&encoded, &registry).unwrap(), values);
    }

    #[test]
    fn low_cardinality_uses_dictionary_mode() {
        let values = strs(&["x", "x", "x", "y", "x", "x"]);
        let registry = CodecRegistry::new();
        let encoded = codec().encode(&values, &registry).unwrap();
        assert!(encoded[0] == MODE_STANDARD || encoded[0] == MODE_RLE);
        assert_eq!(codec().decode(&encoded, &registry).unwrap(), values);
    }

    #[test]
    fn nulls_are_dictionary_entries() {
        let values = vec![
            Value::String("a".to_string()),
            Value::Null,
            Value::String("a".to_string()),
            Value::Null,
        ];
        let registry = CodecRegistry::new();
        let encoded = codec().encode(&values, &registry).unwrap();
        assert_eq!(codec().decode(&encoded, &registry).unwrap(), values);
    }

    #[test]
    fn rle_beats_standard_on_long_runs() {
        let mut items = vec!["a"; 100];
        items.extend(vec!["b"; 100]);
        let values = strs(&items);
        let registry = CodecRegistry::new();
        let encoded = codec().encode(&values, &registry).unwrap();
        assert_eq!(encoded[0], MODE_RLE);
        assert_eq!(codec().decode(&encoded, &registry).unwrap(), values);
    }
}
