//! Logical field types and the self-describing batch header.

use bytes::{Buf, BufMut, BytesMut};
use snafu::{ensure, OptionExt};

use crate::error::{InvalidMagicSnafu, Result, TruncatedSnafu};

pub const MAGIC_STANDARD: &[u8; 4] = b"SAJC";
pub const MAGIC_COLUMNAR_POST: &[u8; 4] = b"SJCB";
pub const FORMAT_VERSION: u8 = 1;

/// Closed tag set for the logical type a column is profiled to. `Object` is
/// present for completeness of the wire tag space but never appears in a
/// column schema: objects are flattened away before pivoting and
/// reconstructed structurally, not stored as a typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String = 0,
    Number = 1,
    Boolean = 2,
    Timestamp = 3,
    Uuid = 4,
    Enum = 5,
    Object = 6,
    Array = 7,
    ArrayPrimitive = 8,
}

impl FieldType {
    pub fn wire_code(self) -> u8 {
        self as u8
    }

    pub fn from_wire_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => FieldType::String,
            1 => FieldType::Number,
            2 => FieldType::Boolean,
            3 => FieldType::Timestamp,
            4 => FieldType::Uuid,
            5 => FieldType::Enum,
            6 => FieldType::Object,
            7 => FieldType::Array,
            8 => FieldType::ArrayPrimitive,
            other => {
                return TruncatedSnafu {
                    where_: format!("unrecognized field type code {other}"),
                }
                .fail()
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    pub byte_length: u32,
}

impl FieldSchema {
    fn encode(&self, buf: &mut BytesMut) {
        let name_bytes = self.name.as_bytes();
        debug_assert!(name_bytes.len() <= u8::MAX as usize, "field name too long");
        buf.put_u8(name_bytes.len() as u8);
        buf.put_slice(name_bytes);
        buf.put_u8(self.field_type.wire_code());
        buf.put_u32_le(self.byte_length);
    }

    fn decode(input: &mut &[u8]) -> Result<Self> {
        let name_len = read_u8(input)? as usize;
        ensure!(
            input.len() >= name_len,
            TruncatedSnafu {
                where_: "field schema name".to_string()
            }
        );
        let name = String::from_utf8(input[..name_len].to_vec())
            .ok()
            .context(TruncatedSnafu {
                where_: "field schema name (invalid utf-8)".to_string(),
            })?;
        input.advance(name_len);

        let type_code = read_u8(input)?;
        let field_type = FieldType::from_wire_code(type_code)?;

        ensure!(
            input.len() >= 4,
            TruncatedSnafu {
                where_: "field schema byte length".to_string()
            }
        );
        let byte_length = input.get_u32_le();

        Ok(FieldSchema {
            name,
            field_type,
            byte_length,
        })
    }
}

/// The header binding a schema to the sequence of encoded columns that
/// follow it on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub fields: Vec<FieldSchema>,
}

impl BatchHeader {
    pub fn new(magic: [u8; 4], fields: Vec<FieldSchema>) -> Self {
        Self {
            magic,
            version: FORMAT_VERSION,
            fields,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.magic);
        buf.put_u8(self.version);
        debug_assert!(self.fields.len() <= u16::MAX as usize, "too many fields");
        buf.put_u16_le(self.fields.len() as u16);
        for field in &self.fields {
            field.encode(buf);
        }
    }

    pub fn decode(input: &mut &[u8]) -> Result<Self> {
        ensure!(
            input.len() >= 4,
            TruncatedSnafu {
                where_: "magic".to_string()
            }
        );
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&input[..4]);
        ensure!(
            &magic == MAGIC_STANDARD || &magic == MAGIC_COLUMNAR_POST,
            InvalidMagicSnafu
        );
        input.advance(4);

        let version = read_u8(input)?;

        ensure!(
            input.len() >= 2,
            TruncatedSnafu {
                where_: "field count".to_string()
            }
        );
        let field_count = input.get_u16_le();

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            fields.push(FieldSchema::decode(input)?);
        }

        Ok(BatchHeader {
            magic,
            version,
            fields,
        })
    }

    pub fn is_columnar_post(&self) -> bool {
        &self.magic == MAGIC_COLUMNAR_POST
    }
}

fn read_u8(input: &mut &[u8]) -> Result<u8> {
    ensure!(
        !input.is_empty(),
        TruncatedSnafu {
            where_: "byte".to_string()
        }
    );
    let byte = input[0];
    input.advance(1);
    Ok(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = BatchHeader::new(
            *MAGIC_STANDARD,
            vec![
                FieldSchema {
                    name: "a".to_string(),
                    field_type: FieldType::Number,
                    byte_length: 12,
                },
                FieldSchema {
                    name: "b.c".to_string(),
                    field_type: FieldType::String,
                    byte_length: 44,
                },
            ],
        );
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        let mut slice: &[u8] = &buf;
        let decoded = BatchHeader::decode(&mut slice).unwrap();
        assert_eq!(decoded, header);
        assert!(slice.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut slice: &[u8] = b"XXXX\x01\x00\x00";
        assert!(BatchHeader::decode(&mut slice).is_err());
    }
}
