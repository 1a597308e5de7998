//! Maps a logical [`FieldType`] to the codec instance that handles it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::codec::array_object::ArrayObjectCodec;
use crate::codec::array_primitive::ArrayPrimitiveCodec;
use crate::codec::boolean::BooleanCodec;
use crate::codec::enum_codec::EnumCodec;
use crate::codec::number::NumberCodec;
use crate::codec::string::StringCodec;
use crate::codec::timestamp::TimestampCodec;
use crate::codec::uuid_codec::UuidCodec;
use crate::codec::Codec;
use crate::config::CompressorOptions;
use crate::error::{NoCodecSnafu, Result};
use crate::schema::FieldType;

/// Owns one codec instance per registered logical type. Array codecs are
/// handed the registry by reference at encode/decode time rather than owning
/// a reference to it themselves, so a registry can hold array codecs without
/// a self-referential cycle.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<FieldType, Arc<dyn Codec + Send + Sync>>,
}

impl CodecRegistry {
    /// An empty registry with nothing registered. Useful in codec unit tests
    /// that only exercise a single codec directly and never recurse through
    /// the registry.
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// The registry used by the compressor by default: every codec this
    /// crate ships, including `Enum`, registered under its logical type.
    pub fn with_default_profile(options: CompressorOptions) -> Self {
        let mut registry = Self::new();
        registry.register(FieldType::String, Arc::new(StringCodec::new(options)));
        registry.register(FieldType::Number, Arc::new(NumberCodec::new(options)));
        registry.register(FieldType::Boolean, Arc::new(BooleanCodec));
        registry.register(FieldType::Timestamp, Arc::new(TimestampCodec));
        registry.register(FieldType::Uuid, Arc::new(UuidCodec));
        registry.register(FieldType::Enum, Arc::new(EnumCodec));
        registry.register(
            FieldType::ArrayPrimitive,
            Arc::new(ArrayPrimitiveCodec::new(options)),
        );
        registry.register(FieldType::Array, Arc::new(ArrayObjectCodec::new(options)));
        registry
    }

    /// Registers `codec` for `field_type`, overwriting any existing
    /// registration (and logging a warning, since that is almost always a
    /// configuration mistake rather than an intended override).
    pub fn register(&mut self, field_type: FieldType, codec: Arc<dyn Codec + Send + Sync>) {
        if self.codecs.insert(field_type, codec).is_some() {
            warn!(?field_type, "codec registration overwritten");
        }
    }

    pub fn get(&self, field_type: FieldType) -> Result<&Arc<dyn Codec + Send + Sync>> {
        self.codecs.get(&field_type).ok_or_else(|| {
            NoCodecSnafu { field_type }.build()
        })
    }

    pub fn supports(&self, field_type: FieldType) -> bool {
        self.codecs.contains_key(&field_type)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_default_profile(CompressorOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_has_no_codecs() {
        let registry = CodecRegistry::new();
        assert!(!registry.supports(FieldType::Number));
        assert!(registry.get(FieldType::Number).is_err());
    }

    #[test]
    fn default_profile_registers_every_type() {
        let registry = CodecRegistry::default();
        for field_type in [
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Timestamp,
            FieldType::Uuid,
            FieldType::Enum,
            FieldType::ArrayPrimitive,
            FieldType::Array,
        ] {
            assert!(registry.supports(field_type));
        }
    }

    #[test]
    fn register_overwrites_existing() {
        let mut registry = CodecRegistry::new();
        registry.register(FieldType::Boolean, Arc::new(BooleanCodec));
        registry.register(FieldType::Boolean, Arc::new(BooleanCodec));
        assert!(registry.supports(FieldType::Boolean));
    }
}
