//! One codec per logical field type, dispatched through the [`crate::registry::CodecRegistry`].
//!
//! The abstraction is deliberately small: a codec only needs to encode and
//! decode the non-`MISSING` values of a column. Presence/absence is handled
//! once, uniformly, by the nullable wrapper above this layer.

pub mod array_object;
pub mod array_primitive;
pub mod boolean;
pub mod enum_codec;
pub mod number;
pub mod string;
pub mod timestamp;
pub mod uuid_codec;

use bytes::Bytes;

use crate::error::Result;
use crate::registry::CodecRegistry;
use crate::schema::FieldType;
use crate::value::Value;

/// A codec for one logical field type. Array codecs hold no state of their
/// own across calls; they're handed the registry at encode/decode time so
/// they can resolve the codec for their inner element type without owning a
/// reference to the registry that owns them.
pub trait Codec {
    fn supports(&self, field_type: FieldType) -> bool;

    /// Encode `values` (already stripped of `MISSING`) into a self-contained
    /// byte payload.
    fn encode(&self, values: &[Value], registry: &CodecRegistry) -> Result<Bytes>;

    /// Decode a payload produced by `encode` back into its values, in order.
    fn decode(&self, bytes: &[u8], registry: &CodecRegistry) -> Result<Vec<Value>>;
}
